//! Scene assembly from physics-engine introspection records.
//!
//! Some robots exist only inside a running physics engine, with no
//! description file to parse. The engine can still be asked for its joint
//! table and visual-shape table; this module rebuilds a [`Scene`] and a set
//! of standalone [`Shape`]s from those records. Link names are synthesized
//! from indices because the engine does not report them.

use std::path::PathBuf;

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use tracing::debug;

use scene_assets::GeometryResolver;
use scene_types::{
    axes, GeometryKind, Joint, JointKind, Link, Origin, Scene, Shape, ShapeKind, Visual,
};

use crate::error::{BuildError, BuildResult};
use crate::validate::validate;

/// Name given to the synthesized root link.
const ROOT_LINK_NAME: &str = "base";

/// One row of an engine's joint table.
#[derive(Debug, Clone, PartialEq)]
pub struct JointRecord {
    /// Joint index; doubles as the child link index.
    pub index: usize,
    /// Joint name as reported by the engine.
    pub name: String,
    /// Engine joint type code.
    pub kind_code: i32,
    /// Parent link index, or `None` for the root.
    pub parent_index: Option<usize>,
    /// Joint frame translation relative to the parent link, source axes.
    pub position: Vector3<f64>,
    /// Joint frame orientation as an `[x, y, z, w]` quaternion, source axes.
    pub orientation: [f64; 4],
    /// Motion axis in the joint frame, source axes.
    pub axis: Vector3<f64>,
}

/// One row of an engine's visual-shape table.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualShapeRecord {
    /// Link index the shape is attached to; `None` means the base.
    pub link_index: Option<usize>,
    /// Engine geometry type code.
    pub kind_code: i32,
    /// Primitive dimensions, meaning depends on the geometry code.
    pub dimensions: Vector3<f64>,
    /// Mesh file path for mesh geometry, empty otherwise.
    pub mesh_file: String,
    /// Shape frame translation relative to its link, source axes.
    pub position: Vector3<f64>,
    /// Shape frame orientation as an `[x, y, z, w]` quaternion, source axes.
    pub orientation: [f64; 4],
    /// RGBA color reported by the engine.
    pub color: [f64; 4],
}

/// Decode an engine joint type code.
///
/// # Errors
///
/// Returns [`BuildError::UnknownTypeCode`] for codes outside the engine's
/// published set.
pub fn joint_kind_from_code(code: i32) -> BuildResult<JointKind> {
    match code {
        0 => Ok(JointKind::Revolute),
        1 => Ok(JointKind::Prismatic),
        2 => Ok(JointKind::Spherical),
        3 => Ok(JointKind::Planar),
        4 => Ok(JointKind::Fixed),
        _ => Err(BuildError::UnknownTypeCode {
            kind: "joint",
            code,
        }),
    }
}

/// Decode an engine geometry type code.
///
/// # Errors
///
/// Returns [`BuildError::UnknownTypeCode`] for codes outside the engine's
/// published set.
pub fn shape_kind_from_code(code: i32) -> BuildResult<ShapeKind> {
    match code {
        2 => Ok(ShapeKind::Sphere),
        3 => Ok(ShapeKind::Box),
        4 => Ok(ShapeKind::Cylinder),
        5 => Ok(ShapeKind::Geometric),
        6 => Ok(ShapeKind::Plane),
        7 => Ok(ShapeKind::Capsule),
        _ => Err(BuildError::UnknownTypeCode {
            kind: "geometry",
            code,
        }),
    }
}

/// Name synthesized for the link at an engine index.
#[must_use]
pub fn link_name(index: Option<usize>) -> String {
    match index {
        None => ROOT_LINK_NAME.to_string(),
        Some(i) => format!("link_{i}"),
    }
}

/// Rebuild a validated scene from an engine's joint and visual-shape
/// tables.
///
/// Joint records are expected sorted by index; the child link of joint `i`
/// is `link_{i}` and the synthesized root is first in the link list.
///
/// # Errors
///
/// Returns an error if a record carries an unknown type code, a mesh asset
/// fails to load, or the rebuilt scene fails validation.
pub fn scene_from_records(
    name: &str,
    joints: &[JointRecord],
    shapes: &[VisualShapeRecord],
    resolver: &mut GeometryResolver,
) -> BuildResult<Scene> {
    let mut links = Vec::with_capacity(joints.len() + 1);
    links.push(Link {
        name: ROOT_LINK_NAME.to_string(),
        origin: Origin::default(),
        visual_name: None,
    });
    for record in joints {
        links.push(Link {
            name: link_name(Some(record.index)),
            origin: Origin::default(),
            visual_name: None,
        });
    }

    let mut scene_joints = Vec::with_capacity(joints.len());
    for record in joints {
        scene_joints.push(convert_joint_record(record)?);
    }

    let mut visuals = Vec::with_capacity(shapes.len());
    for (n, record) in shapes.iter().enumerate() {
        let owner = link_name(record.link_index);
        let Some(link) = links.iter_mut().find(|l| l.name == owner) else {
            // The root always resolves, so the index is present here.
            return Err(BuildError::UnknownLinkIndex {
                index: record.link_index.unwrap_or_default(),
            });
        };

        // First shape per link wins; engines report extras rarely and the
        // renderer attaches one visual per link. Skipped records never
        // touch the mesh resolver.
        if link.visual_name.is_some() {
            continue;
        }
        let visual = convert_shape_record(record, &owner, n, resolver)?;
        link.visual_name = Some(visual.name.clone());
        visuals.push(visual);
    }

    let scene = Scene {
        name: name.to_string(),
        manipulable: false,
        links,
        joints: scene_joints,
        visuals,
    };

    validate(&scene)?;
    debug!(
        scene = scene.name.as_str(),
        joints = scene.joints.len(),
        "rebuilt scene from introspection records"
    );
    Ok(scene)
}

/// Rebuild standalone shapes from visual-shape records of bodies with no
/// kinematic structure (floors, props).
///
/// Meshes loaded here keep their source winding; the engine already
/// reports render-ready geometry.
///
/// # Errors
///
/// Returns an error if a record carries an unknown geometry code or a mesh
/// asset fails to load.
pub fn shapes_from_records(records: &[VisualShapeRecord]) -> BuildResult<Vec<Shape>> {
    let mut resolver = GeometryResolver::collada().with_winding_reversal(false);
    records
        .iter()
        .enumerate()
        .map(|(n, record)| shape_from_record(record, n, &mut resolver))
        .collect()
}

fn convert_joint_record(record: &JointRecord) -> BuildResult<Joint> {
    let rotation = quaternion_to_source_euler(record.orientation);
    Ok(Joint {
        name: record.name.clone(),
        kind: joint_kind_from_code(record.kind_code)?,
        parent_link: link_name(record.parent_index),
        child_link: link_name(Some(record.index)),
        origin: Origin::new(
            axes::map_position(record.position),
            axes::map_euler(rotation),
        ),
        axis: axes::map_position(record.axis),
        limits: None,
    })
}

fn convert_shape_record(
    record: &VisualShapeRecord,
    owner: &str,
    ordinal: usize,
    resolver: &mut GeometryResolver,
) -> BuildResult<Visual> {
    let shape_kind = shape_kind_from_code(record.kind_code)?;
    let rotation = quaternion_to_source_euler(record.orientation);

    let (kind, scale, meshes) = match shape_kind {
        ShapeKind::Geometric => {
            let asset = resolver.resolve(&PathBuf::from(&record.mesh_file))?;
            (GeometryKind::Mesh, record.dimensions, asset.fragments.clone())
        }
        ShapeKind::Box => (GeometryKind::Box, record.dimensions, Vec::new()),
        ShapeKind::Sphere => {
            let r = record.dimensions.x;
            (GeometryKind::Sphere, Vector3::new(r, r, r), Vec::new())
        }
        // Capsules render as their bounding cylinder.
        ShapeKind::Cylinder | ShapeKind::Capsule | ShapeKind::Plane => {
            (GeometryKind::Cylinder, record.dimensions, Vec::new())
        }
    };

    Ok(Visual {
        name: format!("{owner}_visual_{ordinal}"),
        kind,
        origin: Origin::new(
            axes::map_position(record.position),
            axes::map_visual_euler(rotation),
        ),
        scale,
        meshes,
        materials: Vec::new(),
    })
}

fn shape_from_record(
    record: &VisualShapeRecord,
    ordinal: usize,
    resolver: &mut GeometryResolver,
) -> BuildResult<Shape> {
    let kind = shape_kind_from_code(record.kind_code)?;
    let rotation = quaternion_to_source_euler(record.orientation);

    let meshes = match kind {
        ShapeKind::Geometric => {
            let asset = resolver.resolve(&PathBuf::from(&record.mesh_file))?;
            asset.fragments.clone()
        }
        _ => Vec::new(),
    };

    Ok(Shape {
        name: format!("shape_{ordinal}"),
        kind,
        position: axes::map_position(record.position),
        rotation: axes::map_euler(rotation),
        dimensions: vec![
            record.dimensions.x,
            record.dimensions.y,
            record.dimensions.z,
        ],
        meshes,
    })
}

/// Convert an `[x, y, z, w]` quaternion into source-axes roll/pitch/yaw.
fn quaternion_to_source_euler(q: [f64; 4]) -> Vector3<f64> {
    let quat = UnitQuaternion::from_quaternion(Quaternion::new(q[3], q[0], q[1], q[2]));
    let (roll, pitch, yaw) = quat.euler_angles();
    Vector3::new(roll, pitch, yaw)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn identity_quat() -> [f64; 4] {
        [0.0, 0.0, 0.0, 1.0]
    }

    fn revolute_record(index: usize) -> JointRecord {
        JointRecord {
            index,
            name: format!("joint_{index}"),
            kind_code: 0,
            parent_index: index.checked_sub(1),
            position: Vector3::new(0.0, 0.0, 0.3),
            orientation: identity_quat(),
            axis: Vector3::new(0.0, 0.0, 1.0),
        }
    }

    #[test]
    fn joint_codes_decode() {
        assert_eq!(joint_kind_from_code(0).unwrap(), JointKind::Revolute);
        assert_eq!(joint_kind_from_code(4).unwrap(), JointKind::Fixed);
        assert!(joint_kind_from_code(9).is_err());
    }

    #[test]
    fn geometry_codes_decode() {
        assert_eq!(shape_kind_from_code(5).unwrap(), ShapeKind::Geometric);
        assert_eq!(shape_kind_from_code(6).unwrap(), ShapeKind::Plane);
        assert!(shape_kind_from_code(1).is_err());
    }

    #[test]
    fn link_names_come_from_indices() {
        assert_eq!(link_name(None), "base");
        assert_eq!(link_name(Some(3)), "link_3");
    }

    #[test]
    fn rebuilds_a_two_joint_chain() {
        let joints = vec![revolute_record(0), revolute_record(1)];
        let mut resolver = GeometryResolver::collada();
        let scene = scene_from_records("arm", &joints, &[], &mut resolver).expect("should build");

        assert_eq!(scene.links.len(), 3);
        assert_eq!(scene.start_link(), Some("base"));

        let first = &scene.joints[0];
        assert_eq!(first.parent_link, "base");
        assert_eq!(first.child_link, "link_0");
        let second = &scene.joints[1];
        assert_eq!(second.parent_link, "link_0");
        assert_eq!(second.child_link, "link_1");
    }

    #[test]
    fn joint_frames_are_axis_mapped() {
        let joints = vec![revolute_record(0)];
        let mut resolver = GeometryResolver::collada();
        let scene = scene_from_records("arm", &joints, &[], &mut resolver).expect("should build");

        let joint = &scene.joints[0];
        // Source +Z becomes renderer +Y for both position and axis.
        assert_relative_eq!(joint.origin.position.y, 0.3);
        assert_relative_eq!(joint.axis.y, 1.0);
    }

    #[test]
    fn quaternion_rotations_convert_through_euler() {
        // 90 degrees about source Z.
        let half = FRAC_PI_2 / 2.0;
        let q = [0.0, 0.0, half.sin(), half.cos()];
        let euler = quaternion_to_source_euler(q);
        assert_relative_eq!(euler.z, FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn base_shapes_attach_to_the_root_link() {
        let shape = VisualShapeRecord {
            link_index: None,
            kind_code: 3,
            dimensions: Vector3::new(0.5, 0.5, 0.1),
            mesh_file: String::new(),
            position: Vector3::zeros(),
            orientation: identity_quat(),
            color: [1.0; 4],
        };
        let mut resolver = GeometryResolver::collada();
        let scene = scene_from_records("prop", &[], &[shape], &mut resolver).expect("should build");

        assert_eq!(scene.links[0].visual_name.as_deref(), Some("base_visual_0"));
        assert_eq!(scene.visuals[0].kind, GeometryKind::Box);
    }

    #[test]
    fn standalone_shapes_decode_primitives() {
        let record = VisualShapeRecord {
            link_index: None,
            kind_code: 2,
            dimensions: Vector3::new(0.25, 0.0, 0.0),
            mesh_file: String::new(),
            position: Vector3::new(1.0, 2.0, 3.0),
            orientation: identity_quat(),
            color: [1.0; 4],
        };
        let shapes = shapes_from_records(&[record]).expect("should build");

        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].kind, ShapeKind::Sphere);
        assert_relative_eq!(shapes[0].position.x, -2.0);
        assert_relative_eq!(shapes[0].position.z, 1.0);
    }

    #[test]
    fn unresolvable_link_index_names_the_index() {
        let shape = VisualShapeRecord {
            link_index: Some(7),
            kind_code: 3,
            dimensions: Vector3::new(0.1, 0.1, 0.1),
            mesh_file: String::new(),
            position: Vector3::zeros(),
            orientation: identity_quat(),
            color: [1.0; 4],
        };
        let mut resolver = GeometryResolver::collada();
        let err = scene_from_records("prop", &[], &[shape], &mut resolver)
            .expect_err("should fail");
        assert!(matches!(err, BuildError::UnknownLinkIndex { index: 7 }));
    }

    #[test]
    fn extra_shapes_per_link_are_skipped_without_loading() {
        let box_shape = VisualShapeRecord {
            link_index: None,
            kind_code: 3,
            dimensions: Vector3::new(0.1, 0.1, 0.1),
            mesh_file: String::new(),
            position: Vector3::zeros(),
            orientation: identity_quat(),
            color: [1.0; 4],
        };
        // Loading this mesh would fail; a discarded record must not try.
        let mesh_shape = VisualShapeRecord {
            kind_code: 5,
            mesh_file: "missing.dae".into(),
            ..box_shape.clone()
        };

        let mut resolver = GeometryResolver::collada();
        let scene = scene_from_records("prop", &[], &[box_shape, mesh_shape], &mut resolver)
            .expect("should build");
        assert_eq!(scene.visuals.len(), 1);
        assert_eq!(scene.visuals[0].kind, GeometryKind::Box);
    }

    #[test]
    fn unknown_codes_abort_the_rebuild() {
        let mut record = revolute_record(0);
        record.kind_code = 42;
        let mut resolver = GeometryResolver::collada();
        assert!(scene_from_records("arm", &[record], &[], &mut resolver).is_err());
    }
}
