//! Keystone Context - per-thread execution contexts.
//!
//! An [`ExecutionContext`] carries everything one logical thread of work
//! needs: scoped variables, the trail of artifacts it has executed with
//! their authorization decisions and timings, tool instances, and the user,
//! message and cache collaborators. The [`ExecutionContextFactory`] binds
//! one context to each [`ThreadKey`], creating it on first use and
//! destroying it when the work is done.
//!
//! # Example
//!
//! ```rust
//! use keystone_artifact::{ArtifactType, AuthzAction};
//! use keystone_context::ExecutionContextFactory;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), keystone_context::ContextError> {
//! let factory = ExecutionContextFactory::builder().build();
//! let ctx = factory.get_execution_context()?;
//!
//! ctx.push_artifact("order.placeOrder", ArtifactType::Service, Some(AuthzAction::Create))?;
//! ctx.push_scope()?;
//! ctx.put("orderId", json!("100"))?;
//! ctx.pop_scope()?;
//! ctx.pop_artifact()?;
//!
//! let report = ctx.artifact_report()?;
//! assert_eq!(report.flat.len(), 1);
//!
//! factory.destroy_active_execution_context();
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod dispatch;
mod error;
mod factory;
mod logging;
mod stack;
mod thread;

pub use context::ExecutionContext;
pub use error::{ContextError, ContextResult};
pub use factory::{ExecutionContextFactory, ExecutionContextFactoryBuilder, UserFacadeFactory};
pub use logging::{init_logging, log_config};
pub use stack::ContextStack;
pub use thread::ThreadKey;
