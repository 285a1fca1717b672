//! Sample tool factories.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use keystone_tools::{ToolError, ToolFactory, ToolInstance, ToolPolicy, ToolResult};
use serde_json::Value;

/// Instance handed out by [`CounterToolFactory`].
#[derive(Debug)]
pub struct CounterTool {
    /// Creation sequence number, starting at 1.
    pub serial: usize,
    /// Arguments the instance was created with.
    pub args: Vec<Value>,
}

/// Counts creations, releases and factory shutdowns.
///
/// Clones share their counters, so a test can keep one clone and register
/// the other.
#[derive(Debug, Clone)]
pub struct CounterToolFactory {
    name: String,
    policy: ToolPolicy,
    created: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
    destroyed: Arc<AtomicUsize>,
}

impl CounterToolFactory {
    /// A singleton counter tool.
    #[must_use]
    pub fn singleton(name: impl Into<String>) -> Self {
        Self::new(name, ToolPolicy::Singleton)
    }

    /// A per-call counter tool.
    #[must_use]
    pub fn per_call(name: impl Into<String>) -> Self {
        Self::new(name, ToolPolicy::PerCall)
    }

    fn new(name: impl Into<String>, policy: ToolPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            created: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicUsize::new(0)),
            destroyed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Instances created so far.
    #[must_use]
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Instances released so far.
    #[must_use]
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Times the factory shutdown hook ran.
    #[must_use]
    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl ToolFactory for CounterToolFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn policy(&self) -> ToolPolicy {
        self.policy
    }

    fn create(&self, args: &[Value]) -> ToolResult<ToolInstance> {
        let previous = self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(CounterTool {
            serial: previous.saturating_add(1),
            args: args.to_vec(),
        }))
    }

    fn release(&self, _instance: &ToolInstance) -> ToolResult<()> {
        self.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn destroy(&self) -> ToolResult<()> {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A singleton tool whose release hook always fails.
#[derive(Debug, Clone)]
pub struct FailingReleaseToolFactory {
    name: String,
    attempts: Arc<AtomicUsize>,
}

impl FailingReleaseToolFactory {
    /// A failing tool registered under `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Release attempts so far.
    #[must_use]
    pub fn release_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl ToolFactory for FailingReleaseToolFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn policy(&self) -> ToolPolicy {
        ToolPolicy::Singleton
    }

    fn create(&self, _args: &[Value]) -> ToolResult<ToolInstance> {
        Ok(Arc::new(()))
    }

    fn release(&self, _instance: &ToolInstance) -> ToolResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ToolError::ReleaseFailed {
            name: self.name.clone(),
            reason: "connection already closed".to_owned(),
        })
    }
}
