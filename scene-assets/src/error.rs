//! Error types for asset loading and resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for asset operations.
pub type AssetResult<T> = Result<T, AssetError>;

/// Errors that can occur while loading or resolving a mesh asset.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Referenced asset file does not exist.
    #[error("asset file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// XML-level parsing error.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// Structurally invalid asset content.
    #[error("invalid asset content: {message}")]
    InvalidContent {
        /// Description of what was invalid.
        message: String,
    },

    /// An `instance_geometry` reference did not resolve.
    #[error("asset references undefined geometry: {url}")]
    MissingGeometry {
        /// The unresolved url.
        url: String,
    },

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AssetError {
    /// Create an `InvalidContent` error with the given message.
    #[must_use]
    pub fn invalid_content(message: impl Into<String>) -> Self {
        Self::InvalidContent {
            message: message.into(),
        }
    }
}
