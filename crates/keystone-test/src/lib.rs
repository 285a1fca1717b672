//! Keystone Test - Shared test utilities for Keystone.
//!
//! Mock collaborators, sample tool factories and ready-made factories for
//! use as a dev-dependency.
//!
//! ```toml
//! [dev-dependencies]
//! keystone-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use keystone_test::{CounterToolFactory, test_factory_with_tools};
//!
//! #[test]
//! fn test_singleton_tool() {
//!     let (factory, counter) = test_factory_with_tools();
//!     let ctx = factory.get_execution_context().unwrap();
//!     ctx.get_tool_instance("counter", &[]).unwrap();
//!     assert_eq!(counter.created(), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod mocks;
pub mod tools;

pub use fixtures::*;
pub use mocks::*;
pub use tools::*;

/// Install a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`; repeated calls are no-ops.
pub fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,keystone_context=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
