//! Core error types.

use thiserror::Error;

/// Errors raised by the collaborator facades.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The requested cache name is not configured.
    #[error("cache not found: {name}")]
    CacheNotFound {
        /// The cache name that was requested.
        name: String,
    },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
