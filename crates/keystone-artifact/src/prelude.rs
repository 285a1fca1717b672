//! Prelude module - commonly used types for convenient import.
//!
//! Use `use keystone_artifact::prelude::*;` to import all essential types.

// Errors
pub use crate::{ArtifactError, ArtifactResult};

// Trail
pub use crate::{ArtifactExecutionNode, ArtifactExecutionTrail, NodeId};

// Vocabulary
pub use crate::{ArtifactType, AuthorizationRecord, AuthzAction, AuthzOutcome, AuthzType};

// Reports
pub use crate::{ArtifactStats, ConsolidatedNode, ConsolidatedReport};

// Clocks
pub use crate::{Clock, ManualClock, MonotonicClock};
