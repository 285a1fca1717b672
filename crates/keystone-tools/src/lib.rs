//! Keystone Tools - named tool factories and per-context instance resolution.
//!
//! A tool is any helper object a unit of work looks up by name: a template
//! renderer, a mail sender, a script engine. The embedding application
//! registers a [`ToolFactory`] per tool in a process-wide
//! [`ToolFactoryRegistry`]. Each execution context owns a [`ToolRegistry`]
//! that resolves names through the factories, caches singletons for the
//! context's lifetime and releases every instance when the context ends.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod factory;
mod registry;

pub use error::{ToolError, ToolResult};
pub use factory::{ToolFactory, ToolFactoryRegistry, ToolInstance, ToolPolicy};
pub use registry::{ReleaseReport, ToolRegistry};
