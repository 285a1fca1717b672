//! Ready-made configurations and factories.

use std::sync::Arc;

use keystone_artifact::ManualClock;
use keystone_config::Config;
use keystone_context::ExecutionContextFactory;

use crate::tools::CounterToolFactory;

/// Default configuration with the trail keeping every completed tree.
#[must_use]
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.trail.max_retained_roots = 0;
    config
}

/// A factory with [`test_config`] and default collaborators.
///
/// Picks up the current tokio runtime, if any, for async dispatch.
#[must_use]
pub fn test_factory() -> ExecutionContextFactory {
    ExecutionContextFactory::builder()
        .with_config(test_config())
        .build()
}

/// A factory with a singleton `counter` tool and a per-call `scratch` tool.
///
/// Returns the factory and the registered counter factory.
#[must_use]
pub fn test_factory_with_tools() -> (ExecutionContextFactory, CounterToolFactory) {
    let counter = CounterToolFactory::singleton("counter");
    let factory = ExecutionContextFactory::builder()
        .with_config(test_config())
        .with_tool_factory(Arc::new(counter.clone()))
        .with_tool_factory(Arc::new(CounterToolFactory::per_call("scratch")))
        .build();
    (factory, counter)
}

/// A factory timed by a manual clock, with the clock.
#[must_use]
pub fn test_factory_with_clock() -> (ExecutionContextFactory, ManualClock) {
    let clock = ManualClock::new();
    let factory = ExecutionContextFactory::builder()
        .with_config(test_config())
        .with_clock(Arc::new(clock.clone()))
        .build();
    (factory, clock)
}
