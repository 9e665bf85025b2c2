//! Error types for wire packaging.

use thiserror::Error;

/// Result type for wire packaging operations.
pub type WireResult<T> = Result<T, WireError>;

/// Errors that can occur while packaging frames.
#[derive(Debug, Error)]
pub enum WireError {
    /// A payload failed to serialize to JSON.
    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
