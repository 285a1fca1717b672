//! Tool factories and the process-wide factory registry.

use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{ToolError, ToolResult};

/// A resolved tool. Callers downcast to the concrete type.
pub type ToolInstance = Arc<dyn Any + Send + Sync>;

/// How instances of a tool are reused within one execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolPolicy {
    /// One instance per context, created on first use.
    Singleton,
    /// A new instance on every lookup.
    PerCall,
}

/// Creates instances of one named tool.
pub trait ToolFactory: Send + Sync {
    /// Name the tool is looked up by.
    fn name(&self) -> &str;

    /// Reuse policy.
    fn policy(&self) -> ToolPolicy;

    /// Create an instance.
    ///
    /// # Errors
    ///
    /// Typically [`ToolError::CreateFailed`].
    fn create(&self, args: &[Value]) -> ToolResult<ToolInstance>;

    /// Shut down one instance when its context ends.
    ///
    /// # Errors
    ///
    /// Typically [`ToolError::ReleaseFailed`].
    fn release(&self, _instance: &ToolInstance) -> ToolResult<()> {
        Ok(())
    }

    /// Shut down the factory itself when the execution context factory is
    /// destroyed.
    ///
    /// # Errors
    ///
    /// Typically [`ToolError::ReleaseFailed`].
    fn destroy(&self) -> ToolResult<()> {
        Ok(())
    }
}

/// Name to factory map shared by every execution context of a process.
#[derive(Default, Clone)]
pub struct ToolFactoryRegistry {
    factories: HashMap<String, Arc<dyn ToolFactory>>,
}

impl fmt::Debug for ToolFactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolFactoryRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolFactoryRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under its own name, replacing any previous one.
    pub fn register(&mut self, factory: Arc<dyn ToolFactory>) {
        let name = factory.name().to_string();
        if self.factories.insert(name.clone(), factory).is_some() {
            warn!(tool = %name, "Replaced existing tool factory");
        } else {
            debug!(tool = %name, "Registered tool factory");
        }
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with_factory(mut self, factory: Arc<dyn ToolFactory>) -> Self {
        self.register(factory);
        self
    }

    /// Look up a factory.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolFactory>> {
        self.factories.get(name).cloned()
    }

    /// Whether a factory is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered tool names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered factories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no factory is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Call every factory's [`destroy`](ToolFactory::destroy) hook.
    ///
    /// Failures are logged and returned; they do not stop the remaining hooks.
    pub fn destroy_all(&self) -> Vec<ToolError> {
        let mut failures = Vec::new();
        for name in self.names() {
            let Some(factory) = self.factories.get(&name) else {
                continue;
            };
            if let Err(e) = factory.destroy() {
                warn!(tool = %name, error = %e, "Tool factory destroy failed");
                failures.push(e);
            }
        }
        info!(
            factories = self.factories.len(),
            failures = failures.len(),
            "Tool factories destroyed"
        );
        failures
    }
}
