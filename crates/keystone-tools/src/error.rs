//! Tool resolution error types.

use thiserror::Error;

/// Errors resolving, creating or releasing tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No factory registered under this name.
    #[error("tool not found: {0}")]
    NotFound(String),

    /// The instance is not of the requested type.
    #[error("tool {name} is not a {expected}")]
    TypeMismatch {
        /// Tool name.
        name: String,
        /// Requested Rust type.
        expected: &'static str,
    },

    /// The factory failed to create an instance.
    #[error("failed to create tool {name}: {reason}")]
    CreateFailed {
        /// Tool name.
        name: String,
        /// Factory-provided reason.
        reason: String,
    },

    /// The instance or factory shutdown hook failed.
    #[error("failed to release tool {name}: {reason}")]
    ReleaseFailed {
        /// Tool name.
        name: String,
        /// Factory-provided reason.
        reason: String,
    },

    /// A singleton was requested again with different arguments while the
    /// registry runs in strict mode.
    #[error("singleton tool {name} already created with different arguments")]
    ArgumentMismatch {
        /// Tool name.
        name: String,
    },
}

/// Result type for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;
