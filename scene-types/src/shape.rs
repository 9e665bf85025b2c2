//! Standalone shape-table entries.
//!
//! Shapes come from the physics-introspection source path: geometry read
//! back from a live engine rather than parsed from markup. They are keyed
//! by name and independent of any [`crate::Scene`].

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::mesh::MeshFragment;

/// Shape geometry class reported by the introspection source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ShapeKind {
    /// Arbitrary triangle geometry.
    Geometric,
    /// Box.
    Box,
    /// Sphere.
    Sphere,
    /// Cylinder.
    Cylinder,
    /// Capsule.
    Capsule,
    /// Infinite plane.
    Plane,
}

impl ShapeKind {
    /// Wire name of this shape kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Geometric => "GEOMETRIC",
            Self::Box => "BOX",
            Self::Sphere => "SPHERE",
            Self::Cylinder => "CYLINDER",
            Self::Capsule => "CAPSULE",
            Self::Plane => "PLANE",
        }
    }
}

/// One named shape from the introspection source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Shape name, unique within the table.
    pub name: String,
    /// Geometry class.
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    /// Position in renderer axes.
    pub position: Vector3<f64>,
    /// Roll/pitch/yaw rotation in renderer axes.
    pub rotation: Vector3<f64>,
    /// Kind-specific dimensions (half extents, radius/length, ...).
    pub dimensions: Vec<f64>,
    /// Mesh fragments for `Geometric` shapes, empty otherwise.
    pub meshes: Vec<MeshFragment>,
}
