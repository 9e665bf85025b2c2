//! Mesh asset loading for the scene conversion pipeline.
//!
//! A [`GeometryResolver`] turns external mesh references from a robot
//! description into a [`ResolvedAsset`]: flattened, renderer-frame
//! [`MeshFragment`]s plus the materials they reference:
//!
//! 1. the referenced asset is loaded through an [`AssetSource`] (COLLADA
//!    by default),
//! 2. each placed node's 4x4 transform is split into a proper rotation and
//!    a translation by SVD polar decomposition,
//! 3. positions, rotations, vertices, and normals are mapped into renderer
//!    axes via `scene_types::axes`, and triangle winding is reversed to
//!    match the renderer's front-face convention,
//! 4. the result is cached by resolved file path for the life of the
//!    resolver.
//!
//! [`MeshFragment`]: scene_types::MeshFragment

mod dae;
mod error;
mod resolver;

pub use dae::{load_dae, parse_dae_str, AssetDocument, AssetNode, AssetPrimitive};
pub use error::{AssetError, AssetResult};
pub use resolver::{
    decompose_transform, AssetSource, ColladaSource, GeometryResolver, ResolvedAsset,
};
