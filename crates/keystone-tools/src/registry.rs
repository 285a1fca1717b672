//! Per-context tool resolution.

use serde_json::Value;
use std::any::{Any, type_name};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

use crate::error::{ToolError, ToolResult};
use crate::factory::{ToolFactory, ToolFactoryRegistry, ToolInstance, ToolPolicy};

struct Created {
    factory: Arc<dyn ToolFactory>,
    instance: ToolInstance,
    args: Vec<Value>,
}

/// A per-call instance, owned by the caller. Dropped instances are pruned.
struct Lent {
    name: String,
    factory: Arc<dyn ToolFactory>,
    instance: Weak<dyn Any + Send + Sync>,
}

/// Outcome of [`ToolRegistry::release_all`].
#[derive(Debug, Default)]
pub struct ReleaseReport {
    /// Number of instances whose release hook succeeded.
    pub released: usize,
    /// Release hook failures, in release order.
    pub failures: Vec<ToolError>,
}

impl ReleaseReport {
    /// Whether every release hook succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Tool instances resolved by one execution context.
///
/// Singletons are created on first lookup and reused until
/// [`release_all`](Self::release_all). Per-call instances are created on
/// every lookup and belong to the caller; the registry only keeps a weak
/// reference so an instance still alive at release time is released too.
pub struct ToolRegistry {
    factories: Arc<ToolFactoryRegistry>,
    singletons: HashMap<String, Created>,
    per_call: Vec<Lent>,
    strict_singleton_args: bool,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("singletons", &self.singletons.keys().collect::<Vec<_>>())
            .field("per_call", &self.per_call.len())
            .field("strict_singleton_args", &self.strict_singleton_args)
            .finish_non_exhaustive()
    }
}

impl ToolRegistry {
    /// Create an empty registry resolving through `factories`.
    #[must_use]
    pub fn new(factories: Arc<ToolFactoryRegistry>) -> Self {
        Self {
            factories,
            singletons: HashMap::new(),
            per_call: Vec::new(),
            strict_singleton_args: false,
        }
    }

    /// Reject singleton lookups whose arguments differ from the ones the
    /// instance was created with, instead of logging a warning.
    #[must_use]
    pub fn with_strict_singleton_args(mut self, strict: bool) -> Self {
        self.strict_singleton_args = strict;
        self
    }

    /// Resolve a tool instance.
    ///
    /// A singleton already created by this registry is returned as is. When
    /// `args` differ from the creation arguments the cached instance still
    /// wins and a warning is logged, or in strict mode
    /// [`ToolError::ArgumentMismatch`] is returned.
    ///
    /// # Errors
    ///
    /// [`ToolError::NotFound`] for an unregistered name, or the factory's
    /// creation error.
    pub fn get_tool_instance(&mut self, name: &str, args: &[Value]) -> ToolResult<ToolInstance> {
        if let Some(cached) = self.singletons.get(name) {
            if cached.args.as_slice() != args {
                if self.strict_singleton_args {
                    return Err(ToolError::ArgumentMismatch {
                        name: name.to_string(),
                    });
                }
                warn!(
                    tool = %name,
                    "Singleton tool requested with different arguments, returning existing instance"
                );
            }
            return Ok(Arc::clone(&cached.instance));
        }

        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        let instance = factory.create(args)?;
        let policy = factory.policy();
        debug!(tool = %name, ?policy, "Tool instance created");

        match policy {
            ToolPolicy::Singleton => {
                let created = Created {
                    factory,
                    instance: Arc::clone(&instance),
                    args: args.to_vec(),
                };
                self.singletons.insert(name.to_string(), created);
            }
            ToolPolicy::PerCall => {
                self.per_call.retain(|lent| lent.instance.strong_count() > 0);
                self.per_call.push(Lent {
                    name: name.to_string(),
                    factory,
                    instance: Arc::downgrade(&instance),
                });
            }
        }
        Ok(instance)
    }

    /// Resolve a tool instance of concrete type `T`.
    ///
    /// # Errors
    ///
    /// As [`get_tool_instance`](Self::get_tool_instance), plus
    /// [`ToolError::TypeMismatch`] if the instance is not a `T`.
    pub fn get_tool<T: Any + Send + Sync>(
        &mut self,
        name: &str,
        args: &[Value],
    ) -> ToolResult<Arc<T>> {
        self.get_tool_instance(name, args)?
            .downcast::<T>()
            .map_err(|_| ToolError::TypeMismatch {
                name: name.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Whether a singleton instance for `name` is cached.
    #[must_use]
    pub fn is_cached(&self, name: &str) -> bool {
        self.singletons.contains_key(name)
    }

    /// Number of live instances this registry will release.
    #[must_use]
    pub fn live_instances(&self) -> usize {
        let lent = self
            .per_call
            .iter()
            .filter(|lent| lent.instance.strong_count() > 0)
            .count();
        self.singletons.len().saturating_add(lent)
    }

    /// The shared factory registry.
    #[must_use]
    pub fn factories(&self) -> &Arc<ToolFactoryRegistry> {
        &self.factories
    }

    /// Release every instance created by this registry and forget them.
    ///
    /// Each failing release hook is logged and collected; the remaining
    /// instances are still released.
    pub fn release_all(&mut self) -> ReleaseReport {
        let mut report = ReleaseReport::default();
        let mut singletons: Vec<(String, Created)> = self.singletons.drain().collect();
        singletons.sort_by(|a, b| a.0.cmp(&b.0));

        let lent = self.per_call.drain(..).filter_map(|lent| {
            let instance = lent.instance.upgrade()?;
            Some((lent.name, lent.factory, instance))
        });
        let cached = singletons
            .into_iter()
            .map(|(name, created)| (name, created.factory, created.instance));

        for (name, factory, instance) in lent.chain(cached) {
            match factory.release(&instance) {
                Ok(()) => report.released = report.released.saturating_add(1),
                Err(e) => {
                    warn!(tool = %name, error = %e, "Tool release failed");
                    report.failures.push(e);
                }
            }
        }
        if report.released > 0 || !report.failures.is_empty() {
            debug!(
                released = report.released,
                failures = report.failures.len(),
                "Tool instances released"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Renderer {
        template: String,
    }

    struct RendererFactory {
        policy: ToolPolicy,
        created: AtomicUsize,
        released: AtomicUsize,
        fail_release: bool,
    }

    impl RendererFactory {
        fn new(policy: ToolPolicy) -> Self {
            Self {
                policy,
                created: AtomicUsize::new(0),
                released: AtomicUsize::new(0),
                fail_release: false,
            }
        }
    }

    impl ToolFactory for RendererFactory {
        fn name(&self) -> &str {
            match self.policy {
                ToolPolicy::Singleton => "renderer",
                ToolPolicy::PerCall => "renderer.per_call",
            }
        }

        fn policy(&self) -> ToolPolicy {
            self.policy
        }

        fn create(&self, args: &[Value]) -> ToolResult<ToolInstance> {
            self.created.fetch_add(1, Ordering::SeqCst);
            let template = args
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::CreateFailed {
                    name: self.name().to_string(),
                    reason: "missing template".into(),
                })?;
            Ok(Arc::new(Renderer {
                template: template.to_string(),
            }))
        }

        fn release(&self, _instance: &ToolInstance) -> ToolResult<()> {
            self.released.fetch_add(1, Ordering::SeqCst);
            if self.fail_release {
                return Err(ToolError::ReleaseFailed {
                    name: self.name().to_string(),
                    reason: "flush failed".into(),
                });
            }
            Ok(())
        }
    }

    fn registry_with(factories: &[Arc<RendererFactory>]) -> ToolRegistry {
        let mut shared = ToolFactoryRegistry::new();
        for f in factories {
            shared.register(f.clone());
        }
        ToolRegistry::new(Arc::new(shared))
    }

    #[test]
    fn test_unregistered_tool_not_found() {
        let mut registry = registry_with(&[]);
        let err = registry.get_tool_instance("x", &[]).unwrap_err();
        assert!(matches!(err, ToolError::NotFound(ref n) if n == "x"));
    }

    #[test]
    fn test_singleton_reused() {
        let factory = Arc::new(RendererFactory::new(ToolPolicy::Singleton));
        let mut registry = registry_with(&[factory.clone()]);

        let a: Arc<Renderer> = registry.get_tool("renderer", &[json!("page.ftl")]).unwrap();
        let b: Arc<Renderer> = registry.get_tool("renderer", &[json!("page.ftl")]).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(factory.created.load(Ordering::SeqCst), 1);
        assert!(registry.is_cached("renderer"));
    }

    #[test]
    fn test_singleton_different_args_returns_cached() {
        let factory = Arc::new(RendererFactory::new(ToolPolicy::Singleton));
        let mut registry = registry_with(&[factory.clone()]);

        let a: Arc<Renderer> = registry.get_tool("renderer", &[json!("a.ftl")]).unwrap();
        let b: Arc<Renderer> = registry.get_tool("renderer", &[json!("b.ftl")]).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.template, "a.ftl");
    }

    #[test]
    fn test_singleton_different_args_strict() {
        let factory = Arc::new(RendererFactory::new(ToolPolicy::Singleton));
        let mut registry = registry_with(&[factory]).with_strict_singleton_args(true);

        registry.get_tool_instance("renderer", &[json!("a.ftl")]).unwrap();
        let err = registry
            .get_tool_instance("renderer", &[json!("b.ftl")])
            .unwrap_err();
        assert!(matches!(err, ToolError::ArgumentMismatch { ref name } if name == "renderer"));
        registry.get_tool_instance("renderer", &[json!("a.ftl")]).unwrap();
    }

    #[test]
    fn test_per_call_creates_each_time() {
        let factory = Arc::new(RendererFactory::new(ToolPolicy::PerCall));
        let mut registry = registry_with(&[factory.clone()]);

        let a = registry
            .get_tool_instance("renderer.per_call", &[json!("a.ftl")])
            .unwrap();
        let b = registry
            .get_tool_instance("renderer.per_call", &[json!("a.ftl")])
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(factory.created.load(Ordering::SeqCst), 2);
        assert!(!registry.is_cached("renderer.per_call"));
        assert_eq!(registry.live_instances(), 2);
    }

    #[test]
    fn test_dropped_per_call_instances_not_retained() {
        let factory = Arc::new(RendererFactory::new(ToolPolicy::PerCall));
        let mut registry = registry_with(&[factory.clone()]);

        for _ in 0..1_000 {
            registry
                .get_tool_instance("renderer.per_call", &[json!("a.ftl")])
                .unwrap();
        }
        let kept = registry
            .get_tool_instance("renderer.per_call", &[json!("b.ftl")])
            .unwrap();
        assert_eq!(registry.live_instances(), 1);
        assert!(registry.per_call.len() <= 2);

        let report = registry.release_all();
        assert_eq!(report.released, 1);
        assert_eq!(factory.released.load(Ordering::SeqCst), 1);
        drop(kept);
    }

    #[test]
    fn test_type_mismatch_at_resolution() {
        let factory = Arc::new(RendererFactory::new(ToolPolicy::Singleton));
        let mut registry = registry_with(&[factory]);

        let err = registry
            .get_tool::<String>("renderer", &[json!("a.ftl")])
            .unwrap_err();
        assert!(matches!(err, ToolError::TypeMismatch { ref name, .. } if name == "renderer"));
    }

    #[test]
    fn test_create_failure_not_cached() {
        let factory = Arc::new(RendererFactory::new(ToolPolicy::Singleton));
        let mut registry = registry_with(&[factory]);

        let err = registry.get_tool_instance("renderer", &[]).unwrap_err();
        assert!(matches!(err, ToolError::CreateFailed { .. }));
        assert!(!registry.is_cached("renderer"));
    }

    #[test]
    fn test_release_all_continues_past_failures() {
        let failing = Arc::new(RendererFactory {
            fail_release: true,
            ..RendererFactory::new(ToolPolicy::Singleton)
        });
        let per_call = Arc::new(RendererFactory::new(ToolPolicy::PerCall));
        let mut registry = registry_with(&[failing.clone(), per_call.clone()]);

        registry.get_tool_instance("renderer", &[json!("a")]).unwrap();
        let _b = registry.get_tool_instance("renderer.per_call", &[json!("b")]).unwrap();
        let _c = registry.get_tool_instance("renderer.per_call", &[json!("c")]).unwrap();

        let report = registry.release_all();
        assert_eq!(report.released, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(!report.is_clean());
        assert_eq!(failing.released.load(Ordering::SeqCst), 1);
        assert_eq!(per_call.released.load(Ordering::SeqCst), 2);
        assert_eq!(registry.live_instances(), 0);

        // Next lookup creates a fresh singleton.
        registry.get_tool_instance("renderer", &[json!("a")]).unwrap();
        assert_eq!(failing.created.load(Ordering::SeqCst), 2);
        assert!(registry.release_all().failures.len() == 1);
    }
}
