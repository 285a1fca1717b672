//! Artifact trail error types.

use thiserror::Error;

/// Misuse of the artifact trail API.
///
/// Every variant is a caller contract violation. None of them are retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactError {
    /// Pop or authorization with no open artifact (unbalanced push/pop).
    #[error("artifact trail is empty: {operation} without a matching push")]
    EmptyTrail {
        /// The operation that found the trail empty.
        operation: &'static str,
    },

    /// Authorization recorded twice on the same artifact invocation.
    #[error("authorization already recorded for {name}")]
    AlreadyAuthorized {
        /// Artifact name.
        name: String,
    },

    /// Timing requested for an artifact that has not completed.
    #[error("artifact {name} has not completed")]
    NotCompleted {
        /// Artifact name.
        name: String,
    },

    /// The artifact on top of the trail is not the one the caller finished.
    #[error("expected to pop {expected} but the current artifact is {actual}")]
    UnexpectedPop {
        /// The artifact the caller meant to finish.
        expected: String,
        /// The artifact actually on top.
        actual: String,
    },

    /// A node ID that does not belong to this trail.
    #[error("unknown artifact node: {0}")]
    UnknownNode(usize),

    /// An action name that is not one of view/create/update/delete/all.
    #[error("unknown authorization action: {0}")]
    UnknownAction(String),
}

/// Result type for artifact trail operations.
pub type ArtifactResult<T> = Result<T, ArtifactError>;
