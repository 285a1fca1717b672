//! Execution context error types.

use keystone_artifact::ArtifactError;
use keystone_core::{ContextId, CoreError};
use keystone_telemetry::TelemetryError;
use keystone_tools::ToolError;
use thiserror::Error;

/// Errors from execution contexts and their factory.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The context has been destroyed.
    #[error("execution context {0} has been destroyed")]
    AlreadyDestroyed(ContextId),

    /// The factory has been destroyed and hands out no more contexts.
    #[error("execution context factory has been destroyed")]
    FactoryDestroyed,

    /// A different live context is already bound to the thread.
    #[error("thread {key} is already bound to execution context {existing}")]
    AlreadyBound {
        /// The thread key.
        key: String,
        /// The context bound to it.
        existing: ContextId,
    },

    /// `pop_scope` with only the root scope left.
    #[error("cannot pop the root scope")]
    ScopeUnderflow,

    /// Async dispatch without a tokio runtime.
    #[error("no async runtime available to run work on")]
    NoExecutor,

    /// The factory that created the context has been dropped.
    #[error("execution context factory is no longer available")]
    FactoryUnavailable,

    /// Artifact trail misuse.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// Tool resolution failure.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// Collaborator lookup failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Logging setup failure.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// Result type for execution context operations.
pub type ContextResult<T> = Result<T, ContextError>;
