//! Error types for scene assembly.

use thiserror::Error;

use scene_assets::AssetError;
use scene_urdf::UrdfError;

use crate::validate::ValidationError;

/// Result type for scene assembly operations.
pub type BuildResult<T> = Result<T, BuildError>;

/// Errors that can occur while assembling a scene.
///
/// There is no partial-success mode: any of these aborts the conversion
/// for the input as a whole, and no frames are emitted for it.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The robot description failed to parse.
    #[error(transparent)]
    Parse(#[from] UrdfError),

    /// A referenced mesh asset failed to load.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// The assembled scene broke a data-model invariant.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An introspection record carried an unknown type code.
    #[error("unknown {kind} type code from introspection source: {code}")]
    UnknownTypeCode {
        /// What the code was supposed to classify.
        kind: &'static str,
        /// The unrecognized code.
        code: i32,
    },

    /// A visual-shape record referenced a link index with no link.
    #[error("visual shape record references unknown link index {index}")]
    UnknownLinkIndex {
        /// The unresolvable link index.
        index: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
