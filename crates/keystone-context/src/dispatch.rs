//! Handing units of work to other tasks and threads.
//!
//! The worker never shares the caller's context. [`ExecutionContext::run_async`]
//! derives a new one from the caller's; [`ExecutionContext::run_in_worker_thread`]
//! starts from a fresh one. Either way the worker's context is bound to the
//! worker's [`ThreadKey`] while the work runs and destroyed when it ends,
//! panics included.

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::{Instrument, debug};

use crate::context::ExecutionContext;
use crate::error::{ContextError, ContextResult};
use crate::factory::ExecutionContextFactory;
use crate::thread::ThreadKey;

/// Destroys a worker's context when the work finishes or unwinds.
struct DestroyOnDrop(ExecutionContext);

impl Drop for DestroyOnDrop {
    fn drop(&mut self) {
        self.0.destroy();
    }
}

/// Destroys whatever context is bound to a worker's key when it finishes.
struct DestroyActiveOnDrop {
    factory: ExecutionContextFactory,
    key: ThreadKey,
}

impl Drop for DestroyActiveOnDrop {
    fn drop(&mut self) {
        self.factory.destroy_active_execution_context_for(&self.key);
    }
}

impl ExecutionContext {
    /// Run `work` as a tokio task with a context derived from this one.
    ///
    /// The new context starts with a snapshot of the variables visible now,
    /// the authorization the current artifact lets descendants inherit, and
    /// the same user and message collaborators. Tools are not shared. No
    /// ordering is implied between separate calls.
    ///
    /// If the factory is destroyed before the task starts, `work` still runs
    /// but receives an already destroyed context that is never bound.
    ///
    /// # Errors
    ///
    /// [`ContextError::NoExecutor`] if the factory has no runtime,
    /// [`ContextError::FactoryDestroyed`] or
    /// [`ContextError::FactoryUnavailable`] if it is gone,
    /// [`ContextError::AlreadyDestroyed`] after destroy.
    pub fn run_async<F, Fut, T>(&self, work: F) -> ContextResult<JoinHandle<T>>
    where
        F: FnOnce(Self) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.ensure_live()?;
        let factory = self.factory_inner()?;
        if factory.is_destroyed() {
            return Err(ContextError::FactoryDestroyed);
        }
        let runtime = factory.runtime().cloned().ok_or(ContextError::NoExecutor)?;

        let seed = self.child_seed(&factory);
        let parent = self.id();
        debug!(context_id = %parent, "Dispatching async work");

        Ok(runtime.spawn(async move {
            let key = ThreadKey::current();
            let ctx = Self::from_seed(seed, key.clone(), Some(key.clone()));
            if !factory.is_destroyed() {
                factory.adopt(key, &ctx);
            }
            // Destroyed after submission, possibly mid-adopt.
            if factory.is_destroyed() {
                ctx.destroy();
            }
            drop(factory);

            let guard = DestroyOnDrop(ctx.clone());
            let span = ctx.span();
            debug!(parent: &span, parent_context_id = %parent, "Async work started");
            let output = work(ctx).instrument(span).await;
            drop(guard);
            output
        }))
    }

    /// Run blocking `work` on the runtime's blocking pool with a fresh
    /// context.
    ///
    /// Nothing is carried over from this context. The worker gets its
    /// context from the factory for its own key and it is destroyed when
    /// `work` returns.
    ///
    /// # Errors
    ///
    /// As [`run_async`](Self::run_async). The handle yields
    /// [`ContextError::FactoryDestroyed`] if the factory is destroyed before
    /// the work starts.
    pub fn run_in_worker_thread<F, T>(&self, work: F) -> ContextResult<JoinHandle<ContextResult<T>>>
    where
        F: FnOnce(Self) -> T + Send + 'static,
        T: Send + 'static,
    {
        self.ensure_live()?;
        let factory = self.factory()?;
        if factory.is_destroyed() {
            return Err(ContextError::FactoryDestroyed);
        }
        let runtime = factory.runtime().cloned().ok_or(ContextError::NoExecutor)?;
        debug!(context_id = %self.id(), "Dispatching worker thread");

        Ok(runtime.spawn_blocking(move || {
            let key = ThreadKey::current();
            let ctx = factory.get_execution_context_for(key.clone())?;
            let _guard = DestroyActiveOnDrop { factory, key };
            let _entered = ctx.span().entered();
            Ok(work(ctx))
        }))
    }
}
