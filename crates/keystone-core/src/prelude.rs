//! Prelude module - commonly used types for convenient import.
//!
//! Use `use keystone_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{CoreError, CoreResult};

// Identifiers
pub use crate::{ContextId, Timestamp};

// Collaborators
pub use crate::{Cache, CacheFacade, MemoryCacheFacade};
pub use crate::{MemoryMessageFacade, MessageFacade, MessageFacadeFactory};
pub use crate::{AnonymousUser, StaticUser, UserFacade};
