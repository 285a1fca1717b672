//! Keystone Core - Foundation types and collaborator interfaces.
//!
//! This crate provides:
//! - Identifier newtypes shared by the execution context crates
//! - The narrow collaborator interfaces an execution context calls through:
//!   [`UserFacade`], [`MessageFacade`] and [`CacheFacade`]
//! - In-memory implementations of those interfaces for embedding and tests
//!
//! Nothing in here knows about artifacts, tools or thread binding. Those live
//! in `keystone-artifact`, `keystone-tools` and `keystone-context`.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod cache;
pub mod error;
pub mod message;
pub mod types;
pub mod user;

pub use cache::{Cache, CacheFacade, MemoryCacheFacade};
pub use error::{CoreError, CoreResult};
pub use message::{MemoryMessageFacade, MessageFacade, MessageFacadeFactory};
pub use types::{ContextId, Timestamp};
pub use user::{AnonymousUser, StaticUser, UserFacade};
