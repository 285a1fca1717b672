//! Prelude module - commonly used types for convenient import.
//!
//! Use `use keystone_context::prelude::*;` to import all essential types.

pub use crate::{ContextError, ContextResult};

pub use crate::{ContextStack, ExecutionContext, ExecutionContextFactory, ThreadKey};

pub use keystone_artifact::{ArtifactType, AuthorizationRecord, AuthzAction, AuthzOutcome, AuthzType};
