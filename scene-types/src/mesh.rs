//! Positioned triangle geometry.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// One positioned, triangulated piece of renderable geometry.
///
/// Indices form a flat triangle list. Normals are either absent or
/// per-vertex: `normals.len()` is `0` or `vertices.len()`; the validator
/// rejects anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshFragment {
    /// Fragment name (the asset node it came from).
    pub name: String,
    /// Translation in the visual frame, already in renderer axes.
    pub position: Vector3<f64>,
    /// Roll/pitch/yaw rotation in the visual frame, already in renderer axes.
    pub rotation: Vector3<f64>,
    /// Per-axis scale.
    pub scale: Vector3<f64>,
    /// Triangle list indices into `vertices`.
    pub indices: Vec<u32>,
    /// Vertex positions, already in renderer axes.
    pub vertices: Vec<Vector3<f64>>,
    /// Per-vertex normals, or empty.
    pub normals: Vec<Vector3<f64>>,
    /// Name of the material to render with, if any.
    pub material: Option<String>,
}

impl MeshFragment {
    /// Number of triangles in this fragment.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether the normal list satisfies the per-vertex invariant.
    #[must_use]
    pub fn normals_consistent(&self) -> bool {
        self.normals.is_empty() || self.normals.len() == self.vertices.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn fragment(vertex_count: usize, normal_count: usize) -> MeshFragment {
        MeshFragment {
            name: "node".into(),
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            indices: vec![0, 1, 2],
            vertices: vec![Vector3::zeros(); vertex_count],
            normals: vec![Vector3::zeros(); normal_count],
            material: None,
        }
    }

    #[test]
    fn normals_empty_or_per_vertex() {
        assert!(fragment(3, 0).normals_consistent());
        assert!(fragment(3, 3).normals_consistent());
        assert!(!fragment(3, 2).normals_consistent());
    }

    #[test]
    fn triangle_count_is_index_triples() {
        assert_eq!(fragment(3, 0).triangle_count(), 1);
    }
}
