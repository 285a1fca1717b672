//! The per-thread execution context.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use keystone_artifact::{
    ArtifactExecutionTrail, ArtifactType, AuthorizationRecord, AuthzAction, AuthzOutcome,
    ConsolidatedReport, NodeId,
};
use keystone_config::{L10N_MESSAGE_CACHE, TARPIT_HIT_CACHE};
use keystone_core::{Cache, CacheFacade, ContextId, MessageFacade, Timestamp, UserFacade};
use keystone_telemetry::DiagnosticContext;
use keystone_tools::{ToolInstance, ToolRegistry};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{ContextError, ContextResult};
use crate::factory::{ExecutionContextFactory, FactoryInner};
use crate::stack::ContextStack;
use crate::thread::ThreadKey;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything a new context starts from.
pub(crate) struct ContextSeed {
    pub(crate) factory: Weak<FactoryInner>,
    pub(crate) skip_stats: bool,
    pub(crate) scope: ContextStack,
    pub(crate) trail: ArtifactExecutionTrail,
    pub(crate) tools: ToolRegistry,
    pub(crate) user: Arc<dyn UserFacade>,
    pub(crate) message: Arc<dyn MessageFacade>,
    pub(crate) cache: Arc<dyn CacheFacade>,
}

struct ContextInner {
    id: ContextId,
    for_thread: ThreadKey,
    created_at: Timestamp,
    factory: Weak<FactoryInner>,
    skip_stats: bool,
    destroyed: AtomicBool,
    /// Key this context is bound under in the factory, if any.
    binding: Mutex<Option<ThreadKey>>,
    scope: Mutex<ContextStack>,
    trail: Mutex<ArtifactExecutionTrail>,
    tools: Mutex<ToolRegistry>,
    diagnostics: Mutex<DiagnosticContext>,
    user: Arc<dyn UserFacade>,
    message: Arc<dyn MessageFacade>,
    cache: Arc<dyn CacheFacade>,
}

/// State for one logical thread of work.
///
/// Bundles the variable scopes, the artifact execution trail, resolved tool
/// instances and the user, message and cache collaborators. Cloning yields
/// another handle to the same context. The handle may move between threads
/// but must not be mutated from two of them at once.
///
/// Once [`destroy`](Self::destroy) has run, every operation other than the
/// identity getters fails with [`ContextError::AlreadyDestroyed`].
#[derive(Clone)]
pub struct ExecutionContext {
    inner: Arc<ContextInner>,
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("id", &self.inner.id)
            .field("for_thread", &self.inner.for_thread)
            .field("skip_stats", &self.inner.skip_stats)
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}

impl ExecutionContext {
    pub(crate) fn from_seed(
        seed: ContextSeed,
        for_thread: ThreadKey,
        binding: Option<ThreadKey>,
    ) -> Self {
        let id = ContextId::new();
        let diagnostics = DiagnosticContext::new(id.0, for_thread.to_string());
        debug!(context_id = %id, thread = %for_thread, "Execution context created");
        Self {
            inner: Arc::new(ContextInner {
                id,
                for_thread,
                created_at: Timestamp::now(),
                factory: seed.factory,
                skip_stats: seed.skip_stats,
                destroyed: AtomicBool::new(false),
                binding: Mutex::new(binding),
                scope: Mutex::new(seed.scope),
                trail: Mutex::new(seed.trail),
                tools: Mutex::new(seed.tools),
                diagnostics: Mutex::new(diagnostics),
                user: seed.user,
                message: seed.message,
                cache: seed.cache,
            }),
        }
    }

    /// Seed for a context that continues this one's work elsewhere.
    ///
    /// Carries a snapshot of the visible variables, the inheritable
    /// authorization and the user and message collaborators.
    pub(crate) fn child_seed(&self, factory: &Arc<FactoryInner>) -> ContextSeed {
        let mut seed = factory.fresh_seed();
        seed.scope = lock(&self.inner.scope).to_child();
        seed.trail = ArtifactExecutionTrail::inherit_from(&lock(&self.inner.trail));
        seed.user = Arc::clone(&self.inner.user);
        seed.message = Arc::clone(&self.inner.message);
        seed
    }

    // -----------------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------------

    /// Unique ID of this context.
    #[must_use]
    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    /// The logical thread this context was created for.
    #[must_use]
    pub fn for_thread(&self) -> &ThreadKey {
        &self.inner.for_thread
    }

    /// The key this context is currently bound under, if any.
    #[must_use]
    pub fn bound_thread(&self) -> Option<ThreadKey> {
        lock(&self.inner.binding).clone()
    }

    /// When this context was created.
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.inner.created_at
    }

    /// Whether artifact statistics are skipped for this context.
    #[must_use]
    pub fn skip_stats(&self) -> bool {
        self.inner.skip_stats
    }

    /// Whether [`destroy`](Self::destroy) has run.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::Acquire)
    }

    /// Whether `other` is a handle to this same context.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Wall-clock time now.
    #[must_use]
    pub fn now_timestamp(&self) -> Timestamp {
        Timestamp::now()
    }

    /// The factory that created this context.
    ///
    /// # Errors
    ///
    /// [`ContextError::FactoryUnavailable`] if the factory has been dropped.
    pub fn factory(&self) -> ContextResult<ExecutionContextFactory> {
        self.factory_inner().map(ExecutionContextFactory::from_inner)
    }

    pub(crate) fn factory_inner(&self) -> ContextResult<Arc<FactoryInner>> {
        self.inner
            .factory
            .upgrade()
            .ok_or(ContextError::FactoryUnavailable)
    }

    pub(crate) fn ensure_live(&self) -> ContextResult<()> {
        if self.is_destroyed() {
            return Err(ContextError::AlreadyDestroyed(self.inner.id));
        }
        Ok(())
    }

    pub(crate) fn replace_binding(&self, key: Option<ThreadKey>) -> Option<ThreadKey> {
        std::mem::replace(&mut *lock(&self.inner.binding), key)
    }

    // -----------------------------------------------------------------------
    // Scopes
    // -----------------------------------------------------------------------

    /// Run `f` with exclusive access to the variable scopes.
    ///
    /// # Errors
    ///
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn with_context<R>(&self, f: impl FnOnce(&mut ContextStack) -> R) -> ContextResult<R> {
        self.ensure_live()?;
        Ok(f(&mut lock(&self.inner.scope)))
    }

    /// Open a new innermost scope.
    ///
    /// # Errors
    ///
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn push_scope(&self) -> ContextResult<()> {
        self.with_context(ContextStack::push)
    }

    /// Close the innermost scope, returning its variables.
    ///
    /// # Errors
    ///
    /// [`ContextError::ScopeUnderflow`] at the root scope,
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn pop_scope(&self) -> ContextResult<Map<String, Value>> {
        self.with_context(ContextStack::pop)?
    }

    /// Look a variable up, innermost scope first.
    ///
    /// # Errors
    ///
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn get(&self, name: &str) -> ContextResult<Option<Value>> {
        self.with_context(|stack| stack.get(name).cloned())
    }

    /// Set a variable in the innermost scope.
    ///
    /// # Errors
    ///
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn put(&self, name: impl Into<String>, value: Value) -> ContextResult<Option<Value>> {
        self.with_context(|stack| stack.put(name, value))
    }

    /// Remove a variable from the innermost scope.
    ///
    /// # Errors
    ///
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn remove(&self, name: &str) -> ContextResult<Option<Value>> {
        self.with_context(|stack| stack.remove(name))
    }

    /// Whether any scope defines `name`.
    ///
    /// # Errors
    ///
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn contains(&self, name: &str) -> ContextResult<bool> {
        self.with_context(|stack| stack.contains_key(name))
    }

    /// Look a variable up in the root scope.
    ///
    /// # Errors
    ///
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn root_get(&self, name: &str) -> ContextResult<Option<Value>> {
        self.with_context(|stack| stack.root_get(name).cloned())
    }

    /// Set a variable in the root scope.
    ///
    /// # Errors
    ///
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn root_put(&self, name: impl Into<String>, value: Value) -> ContextResult<Option<Value>> {
        self.with_context(|stack| stack.root_put(name, value))
    }

    /// Number of open scopes, including the root.
    ///
    /// # Errors
    ///
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn scope_depth(&self) -> ContextResult<usize> {
        self.with_context(|stack| stack.depth())
    }

    /// Every visible variable, inner scopes winning.
    ///
    /// # Errors
    ///
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn snapshot(&self) -> ContextResult<Map<String, Value>> {
        self.with_context(|stack| stack.snapshot())
    }

    // -----------------------------------------------------------------------
    // Artifact trail
    // -----------------------------------------------------------------------

    /// Run `f` with exclusive access to the artifact execution trail.
    ///
    /// # Errors
    ///
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn with_trail<R>(
        &self,
        f: impl FnOnce(&mut ArtifactExecutionTrail) -> R,
    ) -> ContextResult<R> {
        self.ensure_live()?;
        Ok(f(&mut lock(&self.inner.trail)))
    }

    /// Start an artifact invocation nested in the current one.
    ///
    /// # Errors
    ///
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn push_artifact(
        &self,
        name: impl Into<String>,
        artifact_type: ArtifactType,
        action: Option<AuthzAction>,
    ) -> ContextResult<NodeId> {
        self.with_trail(|trail| trail.push(name, artifact_type, action))
    }

    /// Complete the current artifact invocation.
    ///
    /// # Errors
    ///
    /// [`ContextError::Artifact`] if nothing is running,
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn pop_artifact(&self) -> ContextResult<NodeId> {
        Ok(self.with_trail(ArtifactExecutionTrail::pop)??)
    }

    /// Complete the current artifact invocation, checking its name.
    ///
    /// # Errors
    ///
    /// [`ContextError::Artifact`] if nothing is running or another artifact
    /// is on top, [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn pop_artifact_expecting(&self, name: &str) -> ContextResult<NodeId> {
        Ok(self.with_trail(|trail| trail.pop_expecting(name))??)
    }

    /// Record the authorization decision for the current artifact.
    ///
    /// A denial is a recorded outcome, not an error; it is also reported to
    /// the message facade.
    ///
    /// # Errors
    ///
    /// [`ContextError::Artifact`] if nothing is running or a decision was
    /// already recorded, [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn record_authorization(
        &self,
        record: AuthorizationRecord,
        inheritable: bool,
    ) -> ContextResult<()> {
        let denial = self.with_trail(|trail| {
            let denial = if record.is_granted() {
                None
            } else {
                trail.current().map(|node| {
                    let action = record
                        .action
                        .or(node.action())
                        .map_or("any action", AuthzAction::description);
                    (
                        node.name().to_owned(),
                        node.artifact_type().description(),
                        action,
                    )
                })
            };
            trail
                .record_authorization(record.clone(), inheritable)
                .map(|()| denial)
        })??;

        if let Some((name, type_description, action)) = denial {
            let user = record
                .user_id
                .or_else(|| self.inner.user.user_id())
                .unwrap_or_else(|| "[No User]".to_owned());
            info!(
                context_id = %self.inner.id,
                user_id = %user,
                artifact = %name,
                action,
                "Authorization denied"
            );
            self.inner.message.add_error(format!(
                "User {user} is not authorized for {action} on {type_description} {name}"
            ));
        }
        Ok(())
    }

    /// The authorization outcome in effect for the current artifact.
    ///
    /// # Errors
    ///
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn current_authorization_allowed(&self) -> ContextResult<Option<AuthzOutcome>> {
        self.with_trail(|trail| trail.current_authorization_allowed())
    }

    /// Per-artifact statistics over the completed invocation trees.
    ///
    /// # Errors
    ///
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn artifact_report(&self) -> ContextResult<ConsolidatedReport> {
        Ok(self.with_trail(|trail| trail.consolidate_completed())??)
    }

    // -----------------------------------------------------------------------
    // Tools
    // -----------------------------------------------------------------------

    /// Resolve a tool instance by name.
    ///
    /// # Errors
    ///
    /// [`ContextError::Tool`] if the tool is unknown or cannot be created,
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn get_tool_instance(&self, name: &str, args: &[Value]) -> ContextResult<ToolInstance> {
        self.ensure_live()?;
        Ok(lock(&self.inner.tools).get_tool_instance(name, args)?)
    }

    /// Resolve a tool instance of concrete type `T`.
    ///
    /// # Errors
    ///
    /// As [`get_tool_instance`](Self::get_tool_instance), plus a type
    /// mismatch if the instance is not a `T`.
    pub fn get_tool<T: Any + Send + Sync>(
        &self,
        name: &str,
        args: &[Value],
    ) -> ContextResult<Arc<T>> {
        self.ensure_live()?;
        Ok(lock(&self.inner.tools).get_tool::<T>(name, args)?)
    }

    // -----------------------------------------------------------------------
    // Collaborators
    // -----------------------------------------------------------------------

    /// The user facade.
    ///
    /// # Errors
    ///
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn user(&self) -> ContextResult<Arc<dyn UserFacade>> {
        self.ensure_live()?;
        Ok(Arc::clone(&self.inner.user))
    }

    /// The message facade.
    ///
    /// # Errors
    ///
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn message(&self) -> ContextResult<Arc<dyn MessageFacade>> {
        self.ensure_live()?;
        Ok(Arc::clone(&self.inner.message))
    }

    /// The cache facade.
    ///
    /// # Errors
    ///
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn cache(&self) -> ContextResult<Arc<dyn CacheFacade>> {
        self.ensure_live()?;
        Ok(Arc::clone(&self.inner.cache))
    }

    /// The localized message cache.
    ///
    /// # Errors
    ///
    /// [`ContextError::Core`] if the cache is not configured,
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn l10n_message_cache(&self) -> ContextResult<Arc<Cache>> {
        self.ensure_live()?;
        Ok(self.inner.cache.get_cache(L10N_MESSAGE_CACHE)?)
    }

    /// The artifact tarpit hit cache.
    ///
    /// # Errors
    ///
    /// [`ContextError::Core`] if the cache is not configured,
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn tarpit_hit_cache(&self) -> ContextResult<Arc<Cache>> {
        self.ensure_live()?;
        Ok(self.inner.cache.get_cache(TARPIT_HIT_CACHE)?)
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    /// Copy the user and visitor IDs into the diagnostic fields.
    ///
    /// # Errors
    ///
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn init_user_diagnostics(&self) -> ContextResult<()> {
        self.ensure_live()?;
        let mut diagnostics = lock(&self.inner.diagnostics);
        if let Some(user_id) = self.inner.user.user_id() {
            diagnostics.set_user_id(user_id);
        }
        if let Some(visitor_id) = self.inner.user.visitor_id() {
            diagnostics.set_visitor_id(visitor_id);
        }
        Ok(())
    }

    /// Set a diagnostic correlation field.
    ///
    /// # Errors
    ///
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn put_diagnostic(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> ContextResult<Option<String>> {
        self.ensure_live()?;
        Ok(lock(&self.inner.diagnostics).put(key, value))
    }

    /// A copy of the diagnostic correlation fields.
    ///
    /// # Errors
    ///
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn diagnostics(&self) -> ContextResult<DiagnosticContext> {
        self.ensure_live()?;
        Ok(lock(&self.inner.diagnostics).clone())
    }

    /// Span carrying this context's ID, thread and correlation fields.
    ///
    /// Counts as an identity getter: after destroy the span still carries
    /// the ID and thread, with no correlation fields.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        lock(&self.inner.diagnostics).span()
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Tear the context down.
    ///
    /// Releases tool instances, unbinds from the factory, discards the trail
    /// and scopes, and clears the diagnostic fields. Release failures are
    /// reported to the message facade and do not stop the teardown. Returns
    /// `false` if the context was already destroyed.
    pub fn destroy(&self) -> bool {
        if self.inner.destroyed.swap(true, Ordering::AcqRel) {
            return false;
        }

        let report = lock(&self.inner.tools).release_all();
        for failure in &report.failures {
            self.inner
                .message
                .add_error(format!("Error releasing tool: {failure}"));
        }

        if let Some(key) = self.replace_binding(None) {
            if let Some(factory) = self.inner.factory.upgrade() {
                factory.unbind(&key, self);
            }
        }

        let trail = std::mem::take(&mut *lock(&self.inner.trail));
        *lock(&self.inner.scope) = ContextStack::new();
        lock(&self.inner.diagnostics).clear();

        debug!(
            context_id = %self.inner.id,
            thread = %self.inner.for_thread,
            released = report.released,
            release_failures = report.failures.len(),
            artifacts = trail.nodes().len(),
            "Execution context destroyed"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_artifact::AuthzType;
    use keystone_core::{MemoryMessageFacade, StaticUser};
    use serde_json::json;

    fn factory() -> ExecutionContextFactory {
        ExecutionContextFactory::builder()
            .with_user_facade(Arc::new(StaticUser::new("john.doe").with_visitor("v-1")))
            .without_runtime()
            .build()
    }

    #[test]
    fn test_scope_operations() {
        let factory = factory();
        let ctx = factory.new_execution_context().unwrap();

        ctx.put("orderId", json!("100")).unwrap();
        ctx.push_scope().unwrap();
        ctx.put("orderId", json!("200")).unwrap();
        assert_eq!(ctx.get("orderId").unwrap(), Some(json!("200")));
        assert_eq!(ctx.scope_depth().unwrap(), 2);

        let popped = ctx.pop_scope().unwrap();
        assert_eq!(popped["orderId"], json!("200"));
        assert_eq!(ctx.get("orderId").unwrap(), Some(json!("100")));
        assert!(matches!(ctx.pop_scope(), Err(ContextError::ScopeUnderflow)));
    }

    #[test]
    fn test_operations_fail_after_destroy() {
        let factory = factory();
        let ctx = factory.new_execution_context().unwrap();
        let id = ctx.id();
        assert!(ctx.destroy());

        assert!(matches!(ctx.get("x"), Err(ContextError::AlreadyDestroyed(d)) if d == id));
        assert!(ctx.push_artifact("svc", ArtifactType::Service, None).is_err());
        assert!(ctx.get_tool_instance("any", &[]).is_err());
        assert!(ctx.user().is_err());
        assert_eq!(ctx.id(), id);
        assert!(ctx.is_destroyed());
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let factory = factory();
        let ctx = factory.new_execution_context().unwrap();
        assert!(ctx.destroy());
        assert!(!ctx.destroy());
    }

    #[test]
    fn test_denied_authorization_reported_to_messages() {
        let message = Arc::new(MemoryMessageFacade::new());
        let shared = Arc::clone(&message);
        let factory = ExecutionContextFactory::builder()
            .with_user_facade(Arc::new(StaticUser::new("john.doe")))
            .with_message_facade_factory(Arc::new(move || {
                Arc::clone(&shared) as Arc<dyn MessageFacade>
            }))
            .without_runtime()
            .build();
        let ctx = factory.new_execution_context().unwrap();

        ctx.push_artifact("order.Order", ArtifactType::Entity, Some(AuthzAction::Update))
            .unwrap();
        ctx.record_authorization(AuthorizationRecord::denied(AuthzType::Deny), false)
            .unwrap();

        assert_eq!(
            ctx.current_authorization_allowed().unwrap(),
            Some(AuthzOutcome::Denied)
        );
        assert_eq!(
            message.errors(),
            vec!["User john.doe is not authorized for Update on Entity order.Order".to_owned()]
        );
    }

    #[test]
    fn test_granted_authorization_not_reported() {
        let factory = factory();
        let ctx = factory.new_execution_context().unwrap();
        ctx.push_artifact("svc", ArtifactType::Service, None).unwrap();
        ctx.record_authorization(AuthorizationRecord::granted(AuthzType::Allow), true)
            .unwrap();
        assert!(!ctx.message().unwrap().has_error());

        let twice = ctx.record_authorization(AuthorizationRecord::granted(AuthzType::Allow), true);
        assert!(matches!(twice, Err(ContextError::Artifact(_))));
    }

    #[test]
    fn test_well_known_caches() {
        let factory = factory();
        let ctx = factory.new_execution_context().unwrap();
        ctx.l10n_message_cache()
            .unwrap()
            .put("greeting", json!("hello"));
        assert_eq!(
            ctx.cache()
                .unwrap()
                .get_cache(L10N_MESSAGE_CACHE)
                .unwrap()
                .get("greeting"),
            Some(json!("hello"))
        );
        assert_eq!(ctx.tarpit_hit_cache().unwrap().name(), TARPIT_HIT_CACHE);
    }

    #[test]
    fn test_user_diagnostics_and_clear_on_destroy() {
        let factory = factory();
        let ctx = factory.new_execution_context().unwrap();
        ctx.init_user_diagnostics().unwrap();
        ctx.put_diagnostic("request", "r-9").unwrap();

        let diagnostics = ctx.diagnostics().unwrap();
        assert_eq!(diagnostics.user_id(), Some("john.doe"));
        assert_eq!(diagnostics.visitor_id(), Some("v-1"));
        assert_eq!(diagnostics.context_id, ctx.id().0);

        ctx.destroy();
        assert!(lock(&ctx.inner.diagnostics).is_empty());
        assert!(matches!(
            ctx.diagnostics(),
            Err(ContextError::AlreadyDestroyed(id)) if id == ctx.id()
        ));
        assert!(matches!(
            ctx.put_diagnostic("request", "r-10"),
            Err(ContextError::AlreadyDestroyed(_))
        ));
        let _span = ctx.span();
    }

    #[test]
    fn test_artifact_report_through_context() {
        let factory = factory();
        let ctx = factory.new_execution_context().unwrap();
        ctx.push_artifact("svc", ArtifactType::Service, None).unwrap();
        ctx.push_artifact("order.Order", ArtifactType::Entity, Some(AuthzAction::View))
            .unwrap();
        ctx.pop_artifact_expecting("order.Order").unwrap();
        ctx.pop_artifact().unwrap();
        assert!(ctx.pop_artifact().is_err());

        let report = ctx.artifact_report().unwrap();
        assert_eq!(report.flat.len(), 2);
        assert!(report.stats("svc", ArtifactType::Service).is_some());
    }

    #[test]
    fn test_skip_stats_retains_no_completed_trees() {
        let mut config = keystone_config::Config::default();
        config.context.skip_stats = true;
        let factory = ExecutionContextFactory::builder()
            .with_config(config)
            .without_runtime()
            .build();
        let ctx = factory.new_execution_context().unwrap();
        assert!(ctx.skip_stats());

        for name in ["first", "second"] {
            ctx.push_artifact(name, ArtifactType::Service, None).unwrap();
            ctx.pop_artifact().unwrap();
        }
        let roots = ctx.with_trail(|trail| trail.roots().len()).unwrap();
        assert_eq!(roots, 1);
    }
}
