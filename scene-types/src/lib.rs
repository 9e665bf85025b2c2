//! Core data model for the robot-description conversion pipeline.
//!
//! This crate defines the validated scene representation produced by the
//! conversion stages and consumed by the wire packager:
//!
//! - [`Scene`] - one robot's kinematic and visual structure
//! - [`Link`] / [`Joint`] - the kinematic tree
//! - [`Visual`] / [`MeshFragment`] / [`Material`] - renderable geometry
//! - [`Shape`] - standalone shape-table entries from the introspection path
//!
//! It also owns the [`axes`] module: the single source of truth for the
//! source-frame to renderer-frame coordinate mapping. Every other crate in
//! the pipeline calls into `axes` rather than re-deriving constants.
//!
//! Types here are plain data with serde derives; they perform no I/O and
//! hold no caches.

pub mod axes;
mod material;
mod mesh;
mod scene;
mod shape;

pub use material::{Material, Rgba};
pub use mesh::MeshFragment;
pub use scene::{GeometryKind, Joint, JointKind, JointLimits, Link, Origin, Scene, Visual};
pub use shape::{Shape, ShapeKind};

/// Re-export of the vector type used throughout the pipeline.
pub use nalgebra::Vector3;
