//! Process-wide registry of thread-bound execution contexts.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use keystone_artifact::{ArtifactExecutionTrail, Clock, MonotonicClock};
use keystone_config::Config;
use keystone_core::{
    AnonymousUser, CacheFacade, MemoryCacheFacade, MemoryMessageFacade, MessageFacadeFactory,
    UserFacade,
};
use keystone_tools::{ToolFactory, ToolFactoryRegistry, ToolRegistry};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::context::{ContextSeed, ExecutionContext};
use crate::error::{ContextError, ContextResult};
use crate::stack::ContextStack;
use crate::thread::ThreadKey;

/// Builds the user facade for each new context.
pub type UserFacadeFactory = Arc<dyn Fn() -> Arc<dyn UserFacade> + Send + Sync>;

pub(crate) struct FactoryInner {
    contexts: DashMap<ThreadKey, ExecutionContext>,
    destroyed: AtomicBool,
    tool_factories: Arc<ToolFactoryRegistry>,
    cache: Arc<dyn CacheFacade>,
    users: UserFacadeFactory,
    messages: MessageFacadeFactory,
    config: Arc<Config>,
    runtime: Option<Handle>,
    clock: Arc<dyn Clock>,
}

impl FactoryInner {
    /// Seed for a context with nothing carried over.
    pub(crate) fn fresh_seed(self: &Arc<Self>) -> ContextSeed {
        let skip_stats = self.config.context.skip_stats;
        let retention = if skip_stats {
            Some(0)
        } else {
            self.config.trail.retention()
        };
        ContextSeed {
            factory: Arc::downgrade(self),
            skip_stats,
            scope: ContextStack::new(),
            trail: ArtifactExecutionTrail::with_clock(Arc::clone(&self.clock))
                .with_max_retained_roots(retention),
            tools: ToolRegistry::new(Arc::clone(&self.tool_factories))
                .with_strict_singleton_args(self.config.tools.strict_singleton_args),
            user: (self.users)(),
            message: (self.messages)(),
            cache: Arc::clone(&self.cache),
        }
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    pub(crate) fn runtime(&self) -> Option<&Handle> {
        self.runtime.as_ref()
    }

    /// Bind a freshly built context under a key nothing else can hold.
    pub(crate) fn adopt(&self, key: ThreadKey, ctx: &ExecutionContext) {
        if let Some(previous) = self.contexts.insert(key, ctx.clone()) {
            warn!(
                context_id = %previous.id(),
                "Replaced execution context bound to a reused thread key"
            );
        }
    }

    /// Remove `key` if it is bound to `ctx`.
    pub(crate) fn unbind(&self, key: &ThreadKey, ctx: &ExecutionContext) {
        if self
            .contexts
            .remove_if(key, |_, bound| bound.same_as(ctx))
            .is_some()
        {
            debug!(context_id = %ctx.id(), thread = %key, "Execution context unbound");
        }
    }
}

/// Binds one [`ExecutionContext`] to each logical thread of work.
///
/// Contexts are created lazily on first lookup for a thread and can be
/// handed off to another thread explicitly. Cloning yields another handle to
/// the same factory.
///
/// # Example
///
/// ```rust
/// use keystone_context::ExecutionContextFactory;
/// use serde_json::json;
///
/// let factory = ExecutionContextFactory::builder().build();
/// let ctx = factory.get_execution_context().unwrap();
/// ctx.put("orderId", json!("100")).unwrap();
///
/// let again = factory.get_execution_context().unwrap();
/// assert!(again.same_as(&ctx));
///
/// factory.destroy();
/// assert!(ctx.is_destroyed());
/// ```
#[derive(Clone)]
pub struct ExecutionContextFactory {
    inner: Arc<FactoryInner>,
}

impl fmt::Debug for ExecutionContextFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContextFactory")
            .field("active", &self.inner.contexts.len())
            .field("destroyed", &self.is_destroyed())
            .field("tool_factories", &self.inner.tool_factories)
            .field("has_runtime", &self.inner.runtime.is_some())
            .finish_non_exhaustive()
    }
}

impl ExecutionContextFactory {
    /// Start building a factory.
    #[must_use]
    pub fn builder() -> ExecutionContextFactoryBuilder {
        ExecutionContextFactoryBuilder::new()
    }

    /// A factory with the given configuration and default collaborators.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::builder().with_config(config).build()
    }

    pub(crate) fn from_inner(inner: Arc<FactoryInner>) -> Self {
        Self { inner }
    }

    fn ensure_live(&self) -> ContextResult<()> {
        if self.inner.is_destroyed() {
            return Err(ContextError::FactoryDestroyed);
        }
        Ok(())
    }

    /// The context bound to the calling thread, created if there is none.
    ///
    /// # Errors
    ///
    /// [`ContextError::FactoryDestroyed`] after [`destroy`](Self::destroy).
    pub fn get_execution_context(&self) -> ContextResult<ExecutionContext> {
        self.get_execution_context_for(ThreadKey::current())
    }

    /// The context bound to `key`, created if there is none.
    ///
    /// A destroyed context still bound to `key` is replaced.
    ///
    /// # Errors
    ///
    /// [`ContextError::FactoryDestroyed`] after [`destroy`](Self::destroy).
    pub fn get_execution_context_for(&self, key: ThreadKey) -> ContextResult<ExecutionContext> {
        self.ensure_live()?;
        let ctx = match self.inner.contexts.entry(key) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_destroyed() {
                    let ctx = self.create_bound(entry.key().clone());
                    entry.insert(ctx.clone());
                    ctx
                } else {
                    entry.get().clone()
                }
            },
            Entry::Vacant(entry) => {
                let ctx = self.create_bound(entry.key().clone());
                entry.insert(ctx.clone());
                ctx
            },
        };

        // Lost a race with destroy(); don't leak a context it never saw.
        if self.inner.is_destroyed() {
            ctx.destroy();
            return Err(ContextError::FactoryDestroyed);
        }
        Ok(ctx)
    }

    fn create_bound(&self, key: ThreadKey) -> ExecutionContext {
        ExecutionContext::from_seed(self.inner.fresh_seed(), key.clone(), Some(key))
    }

    /// A new context bound to no thread.
    ///
    /// Bind it with [`use_execution_context_in_thread`](Self::use_execution_context_in_thread)
    /// or destroy it directly.
    ///
    /// # Errors
    ///
    /// [`ContextError::FactoryDestroyed`] after [`destroy`](Self::destroy).
    pub fn new_execution_context(&self) -> ContextResult<ExecutionContext> {
        self.ensure_live()?;
        Ok(ExecutionContext::from_seed(
            self.inner.fresh_seed(),
            ThreadKey::current(),
            None,
        ))
    }

    /// Bind `ctx` to the calling thread.
    ///
    /// # Errors
    ///
    /// As [`use_execution_context_in_thread_for`](Self::use_execution_context_in_thread_for).
    pub fn use_execution_context_in_thread(&self, ctx: &ExecutionContext) -> ContextResult<()> {
        self.use_execution_context_in_thread_for(ThreadKey::current(), ctx)
    }

    /// Bind `ctx` to `key`, moving it off any key it was bound to before.
    ///
    /// Binding the context already bound to `key` is a no-op, and a destroyed
    /// context left under `key` is replaced.
    ///
    /// # Errors
    ///
    /// [`ContextError::AlreadyBound`] if another live context is bound to
    /// `key`, [`ContextError::AlreadyDestroyed`] if `ctx` is destroyed,
    /// [`ContextError::FactoryDestroyed`] after [`destroy`](Self::destroy).
    pub fn use_execution_context_in_thread_for(
        &self,
        key: ThreadKey,
        ctx: &ExecutionContext,
    ) -> ContextResult<()> {
        self.ensure_live()?;
        ctx.ensure_live()?;

        match self.inner.contexts.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                let bound = entry.get();
                if bound.same_as(ctx) {
                    return Ok(());
                }
                if !bound.is_destroyed() {
                    return Err(ContextError::AlreadyBound {
                        key: key.to_string(),
                        existing: bound.id(),
                    });
                }
                entry.insert(ctx.clone());
            },
            Entry::Vacant(entry) => {
                entry.insert(ctx.clone());
            },
        }

        // The entry guard is gone; the old key may share its shard.
        if let Some(previous) = ctx.replace_binding(Some(key.clone())) {
            if previous != key {
                self.inner.unbind(&previous, ctx);
            }
        }
        debug!(context_id = %ctx.id(), thread = %key, "Execution context bound");
        Ok(())
    }

    /// Destroy the context bound to the calling thread, if any.
    pub fn destroy_active_execution_context(&self) -> bool {
        self.destroy_active_execution_context_for(&ThreadKey::current())
    }

    /// Destroy the context bound to `key`, if any.
    ///
    /// Returns whether a live context was destroyed.
    pub fn destroy_active_execution_context_for(&self, key: &ThreadKey) -> bool {
        let bound = self.inner.contexts.get(key).map(|entry| entry.value().clone());
        let Some(ctx) = bound else {
            return false;
        };
        let destroyed = ctx.destroy();
        self.inner.unbind(key, &ctx);
        destroyed
    }

    /// Destroy every bound context and shut the tool factories down.
    ///
    /// Idempotent. Afterwards no new contexts are handed out.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }

        let contexts: Vec<ExecutionContext> = self
            .inner
            .contexts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        self.inner.contexts.clear();

        let count = contexts.len();
        for ctx in contexts {
            ctx.destroy();
        }

        let failures = self.inner.tool_factories.destroy_all();
        info!(
            contexts = count,
            tool_factory_failures = failures.len(),
            "Execution context factory destroyed"
        );
    }

    /// Whether [`destroy`](Self::destroy) has run.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.inner.is_destroyed()
    }

    /// Number of contexts currently bound to a thread.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.inner.contexts.len()
    }

    /// The shared tool factory registry.
    #[must_use]
    pub fn tool_factories(&self) -> &Arc<ToolFactoryRegistry> {
        &self.inner.tool_factories
    }

    /// Look up a tool factory by name.
    #[must_use]
    pub fn get_tool_factory(&self, name: &str) -> Option<Arc<dyn ToolFactory>> {
        self.inner.tool_factories.get(name)
    }

    /// The configuration this factory was built with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// The runtime async work is dispatched to, if any.
    #[must_use]
    pub fn runtime(&self) -> Option<&Handle> {
        self.inner.runtime()
    }
}

/// Builder for [`ExecutionContextFactory`].
///
/// Defaults: [`Config::default`], no tool factories, a
/// [`MemoryCacheFacade`] with the configured cache names, an
/// [`AnonymousUser`], a fresh [`MemoryMessageFacade`] per context, and the
/// tokio runtime the builder runs in, if any.
pub struct ExecutionContextFactoryBuilder {
    config: Config,
    tool_factories: Arc<ToolFactoryRegistry>,
    cache: Option<Arc<dyn CacheFacade>>,
    users: Option<UserFacadeFactory>,
    messages: Option<MessageFacadeFactory>,
    runtime: Option<Handle>,
    detect_runtime: bool,
    clock: Option<Arc<dyn Clock>>,
}

impl fmt::Debug for ExecutionContextFactoryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContextFactoryBuilder")
            .field("config", &self.config)
            .field("tool_factories", &self.tool_factories)
            .field("detect_runtime", &self.detect_runtime)
            .finish_non_exhaustive()
    }
}

impl Default for ExecutionContextFactoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionContextFactoryBuilder {
    /// A builder with every default.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            tool_factories: Arc::new(ToolFactoryRegistry::new()),
            cache: None,
            users: None,
            messages: None,
            runtime: None,
            detect_runtime: true,
            clock: None,
        }
    }

    /// Use this configuration.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Resolve tools through this registry.
    #[must_use]
    pub fn with_tool_factories(mut self, registry: Arc<ToolFactoryRegistry>) -> Self {
        self.tool_factories = registry;
        self
    }

    /// Register one more tool factory.
    #[must_use]
    pub fn with_tool_factory(mut self, factory: Arc<dyn ToolFactory>) -> Self {
        Arc::make_mut(&mut self.tool_factories).register(factory);
        self
    }

    /// Use this cache facade instead of an in-memory one.
    #[must_use]
    pub fn with_cache_facade(mut self, cache: Arc<dyn CacheFacade>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Share one user facade between every context.
    #[must_use]
    pub fn with_user_facade(self, user: Arc<dyn UserFacade>) -> Self {
        self.with_user_facade_factory(Arc::new(move || Arc::clone(&user)))
    }

    /// Build a user facade per context.
    #[must_use]
    pub fn with_user_facade_factory(mut self, users: UserFacadeFactory) -> Self {
        self.users = Some(users);
        self
    }

    /// Build a message facade per context.
    #[must_use]
    pub fn with_message_facade_factory(mut self, messages: MessageFacadeFactory) -> Self {
        self.messages = Some(messages);
        self
    }

    /// Dispatch async work to this runtime.
    #[must_use]
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Don't dispatch async work at all, even inside a runtime.
    #[must_use]
    pub fn without_runtime(mut self) -> Self {
        self.runtime = None;
        self.detect_runtime = false;
        self
    }

    /// Time artifact invocations with this clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the factory.
    #[must_use]
    pub fn build(self) -> ExecutionContextFactory {
        let cache: Arc<dyn CacheFacade> = match self.cache {
            Some(cache) => cache,
            None => Arc::new(MemoryCacheFacade::new(
                self.config.cache.names.iter().cloned(),
            )),
        };
        let users: UserFacadeFactory = match self.users {
            Some(users) => users,
            None => Arc::new(|| Arc::new(AnonymousUser) as Arc<dyn UserFacade>),
        };
        let messages = self.messages.unwrap_or_else(MemoryMessageFacade::factory);
        let runtime = match self.runtime {
            Some(handle) => Some(handle),
            None if self.detect_runtime => Handle::try_current().ok(),
            None => None,
        };
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(MonotonicClock::new()),
        };

        info!(
            tool_factories = self.tool_factories.len(),
            caches = cache.cache_names().len(),
            skip_stats = self.config.context.skip_stats,
            has_runtime = runtime.is_some(),
            "Execution context factory created"
        );

        ExecutionContextFactory {
            inner: Arc::new(FactoryInner {
                contexts: DashMap::new(),
                destroyed: AtomicBool::new(false),
                tool_factories: self.tool_factories,
                cache,
                users,
                messages,
                config: Arc::new(self.config),
                runtime,
                clock,
            }),
        }
    }
}
