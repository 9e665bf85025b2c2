//! Geometry resolution: asset loading, transform decomposition, and the
//! per-file fragment cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use nalgebra::{Matrix3, Matrix4, Rotation3, Vector3};
use tracing::debug;

use scene_types::{axes, Material, MeshFragment};

use crate::dae;
use crate::error::{AssetError, AssetResult};

/// The contract the resolver requires from an asset-format library.
///
/// Implementations return the asset's placed geometry nodes and materials;
/// everything else (decomposition, axis mapping, caching) is
/// format-independent, so swapping asset libraries cannot change pipeline
/// behavior.
pub trait AssetSource {
    /// Load the given asset file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or its content is invalid.
    fn load(&self, path: &Path) -> AssetResult<dae::AssetDocument>;
}

/// The default source: COLLADA files via [`dae::load_dae`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ColladaSource;

impl AssetSource for ColladaSource {
    fn load(&self, path: &Path) -> AssetResult<dae::AssetDocument> {
        dae::load_dae(path)
    }
}

/// A resolved asset: renderer-frame fragments plus the materials they
/// reference.
#[derive(Debug, Clone)]
pub struct ResolvedAsset {
    /// Flattened mesh fragments in renderer axes.
    pub fragments: Vec<MeshFragment>,
    /// Materials declared by the asset.
    pub materials: Vec<Material>,
}

/// Resolves external mesh references into flattened fragment lists.
///
/// Results are memoized by fully-resolved path for the life of the
/// resolver: two visuals pointing at the same file (two identical gripper
/// fingers, say) share one fragment list and one asset load. The cache is
/// never invalidated; a conversion run is single-shot.
pub struct GeometryResolver {
    source: Box<dyn AssetSource>,
    cache: HashMap<PathBuf, Arc<ResolvedAsset>>,
    reverse_winding: bool,
}

impl GeometryResolver {
    /// Create a resolver over the given asset source.
    ///
    /// Winding reversal defaults to on, matching the renderer's front-face
    /// convention for asset-authored meshes.
    #[must_use]
    pub fn new(source: Box<dyn AssetSource>) -> Self {
        Self {
            source,
            cache: HashMap::new(),
            reverse_winding: true,
        }
    }

    /// Create a resolver reading COLLADA files from disk.
    #[must_use]
    pub fn collada() -> Self {
        Self::new(Box::new(ColladaSource))
    }

    /// Set whether triangle winding is reversed.
    ///
    /// The introspection source path keeps the engine's winding and turns
    /// this off.
    #[must_use]
    pub fn with_winding_reversal(mut self, reverse: bool) -> Self {
        self.reverse_winding = reverse;
        self
    }

    /// Resolve a mesh file reference into its fragments and materials.
    ///
    /// # Errors
    ///
    /// Returns an error if the asset cannot be loaded or a node transform
    /// cannot be decomposed.
    pub fn resolve(&mut self, path: &Path) -> AssetResult<Arc<ResolvedAsset>> {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if let Some(asset) = self.cache.get(&key) {
            debug!(path = %key.display(), "fragment cache hit");
            return Ok(Arc::clone(asset));
        }

        debug!(path = %key.display(), "loading mesh asset");
        let document = self.source.load(path)?;

        let mut fragments = Vec::new();
        for node in &document.nodes {
            fragments.extend(self.fragments_for_node(node)?);
        }

        let asset = Arc::new(ResolvedAsset {
            fragments,
            materials: document.materials,
        });
        self.cache.insert(key, Arc::clone(&asset));
        Ok(asset)
    }

    /// Number of cached files.
    #[must_use]
    pub fn cached_files(&self) -> usize {
        self.cache.len()
    }

    /// Convert one asset node into renderer-frame fragments.
    fn fragments_for_node(&self, node: &dae::AssetNode) -> AssetResult<Vec<MeshFragment>> {
        let (rotation, translation) = decompose_transform(&node.transform).ok_or_else(|| {
            AssetError::invalid_content(format!(
                "non-decomposable transform on node '{}'",
                node.id
            ))
        })?;

        let position = axes::map_position(translation);
        let (roll, pitch, yaw) = rotation.euler_angles();
        let rotation = axes::map_mesh_euler(Vector3::new(roll, pitch, yaw));

        Ok(node
            .primitives
            .iter()
            .map(|prim| {
                let indices = if self.reverse_winding {
                    reverse_winding(&prim.indices)
                } else {
                    prim.indices.clone()
                };
                MeshFragment {
                    name: node.id.clone(),
                    position,
                    rotation,
                    scale: Vector3::new(1.0, 1.0, 1.0),
                    indices,
                    vertices: prim.positions.iter().copied().map(axes::map_position).collect(),
                    normals: prim.normals.iter().copied().map(axes::map_position).collect(),
                    material: prim.material.clone(),
                }
            })
            .collect())
    }
}

impl std::fmt::Debug for GeometryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeometryResolver")
            .field("cached_files", &self.cache.len())
            .field("reverse_winding", &self.reverse_winding)
            .finish_non_exhaustive()
    }
}

/// Reverse each index triple to flip triangle front faces.
fn reverse_winding(indices: &[u32]) -> Vec<u32> {
    indices
        .chunks_exact(3)
        .flat_map(|tri| [tri[2], tri[1], tri[0]])
        .collect()
}

/// Decompose a node transform into a proper rotation and a translation.
///
/// The rotation is recovered from the upper-left 3x3 block by SVD polar
/// decomposition (`R = U * Vᵀ`, with a sign flip when the product would
/// mirror), which stays orthonormal even when the authored matrix carries
/// slight numerical drift or scale. Returns `None` only if the SVD does
/// not converge.
#[must_use]
pub fn decompose_transform(m: &Matrix4<f64>) -> Option<(Rotation3<f64>, Vector3<f64>)> {
    let block: Matrix3<f64> = m.fixed_view::<3, 3>(0, 0).into_owned();
    let svd = block.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;

    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        let mut u = u;
        for i in 0..3 {
            u[(i, 2)] = -u[(i, 2)];
        }
        r = u * v_t;
    }

    let translation = Vector3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]);
    Some((Rotation3::from_matrix_unchecked(r), translation))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source that serves one synthetic node and counts loads.
    struct CountingSource {
        loads: Arc<AtomicUsize>,
    }

    impl AssetSource for CountingSource {
        fn load(&self, _path: &Path) -> AssetResult<dae::AssetDocument> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(dae::AssetDocument {
                nodes: vec![dae::AssetNode {
                    id: "node0".into(),
                    transform: Matrix4::identity(),
                    primitives: vec![dae::AssetPrimitive {
                        material: None,
                        positions: vec![
                            Vector3::new(0.0, 0.0, 0.0),
                            Vector3::new(1.0, 0.0, 0.0),
                            Vector3::new(0.0, 1.0, 0.0),
                        ],
                        normals: Vec::new(),
                        indices: vec![0, 1, 2],
                    }],
                }],
                materials: Vec::new(),
            })
        }
    }

    fn counting_resolver() -> (GeometryResolver, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        let resolver = GeometryResolver::new(Box::new(CountingSource {
            loads: Arc::clone(&loads),
        }));
        (resolver, loads)
    }

    #[test]
    fn repeated_resolution_loads_once() {
        let (mut resolver, loads) = counting_resolver();

        let first = resolver.resolve(Path::new("finger.dae")).expect("resolve");
        let second = resolver.resolve(Path::new("finger.dae")).expect("resolve");

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(resolver.cached_files(), 1);
    }

    #[test]
    fn distinct_files_load_separately() {
        let (mut resolver, loads) = counting_resolver();

        resolver.resolve(Path::new("left.dae")).expect("resolve");
        resolver.resolve(Path::new("right.dae")).expect("resolve");

        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.cached_files(), 2);
    }

    #[test]
    fn winding_is_reversed_by_default() {
        let (mut resolver, _) = counting_resolver();
        let asset = resolver.resolve(Path::new("a.dae")).expect("resolve");
        assert_eq!(asset.fragments[0].indices, vec![2, 1, 0]);
    }

    #[test]
    fn winding_reversal_can_be_disabled() {
        let loads = Arc::new(AtomicUsize::new(0));
        let mut resolver = GeometryResolver::new(Box::new(CountingSource {
            loads: Arc::clone(&loads),
        }))
        .with_winding_reversal(false);

        let asset = resolver.resolve(Path::new("a.dae")).expect("resolve");
        assert_eq!(asset.fragments[0].indices, vec![0, 1, 2]);
    }

    #[test]
    fn vertices_are_axis_mapped() {
        let (mut resolver, _) = counting_resolver();
        let asset = resolver.resolve(Path::new("a.dae")).expect("resolve");
        // (1, 0, 0) maps to (0, 0, 1).
        assert_relative_eq!(asset.fragments[0].vertices[1].z, 1.0);
    }

    #[test]
    fn decompose_recovers_rotation_and_translation() {
        let rotation = Rotation3::from_euler_angles(0.3, -0.2, 0.9);
        let translation = Vector3::new(1.0, -2.0, 0.5);

        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation.matrix());
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);

        let (r, t) = decompose_transform(&m).expect("decompose");
        assert_relative_eq!(t.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(t.y, -2.0, epsilon = 1e-12);

        let (roll, pitch, yaw) = r.euler_angles();
        assert_relative_eq!(roll, 0.3, epsilon = 1e-9);
        assert_relative_eq!(pitch, -0.2, epsilon = 1e-9);
        assert_relative_eq!(yaw, 0.9, epsilon = 1e-9);
    }

    #[test]
    fn decompose_normalizes_scaled_rotation() {
        // A uniformly scaled rotation block must still yield a proper
        // orthonormal rotation.
        let rotation = Rotation3::from_euler_angles(0.1, 0.2, 0.3);
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&(rotation.matrix() * 2.0));

        let (r, _) = decompose_transform(&m).expect("decompose");
        assert_relative_eq!(r.matrix().determinant(), 1.0, epsilon = 1e-9);

        let (roll, pitch, yaw) = r.euler_angles();
        assert_relative_eq!(roll, 0.1, epsilon = 1e-9);
        assert_relative_eq!(pitch, 0.2, epsilon = 1e-9);
        assert_relative_eq!(yaw, 0.3, epsilon = 1e-9);
    }
}
