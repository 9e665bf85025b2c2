//! The validated scene: links, joints, and visuals of one robot.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::material::Material;
use crate::mesh::MeshFragment;

/// A local frame offset: position plus roll/pitch/yaw rotation.
///
/// Defaults to the identity (all zeros) when the source omits it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    /// Translation in the owning frame.
    pub position: Vector3<f64>,
    /// Roll/pitch/yaw rotation in radians.
    pub rotation: Vector3<f64>,
}

impl Default for Origin {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
        }
    }
}

impl Origin {
    /// Create an origin from position and rotation.
    #[must_use]
    pub const fn new(position: Vector3<f64>, rotation: Vector3<f64>) -> Self {
        Self { position, rotation }
    }
}

/// Joint motion type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JointKind {
    /// Rotation about one axis, with limits.
    Revolute,
    /// Translation along one axis.
    Prismatic,
    /// Free rotation about a point.
    Spherical,
    /// Motion in a plane perpendicular to the axis.
    Planar,
    /// Rigid attachment.
    Fixed,
}

impl JointKind {
    /// Wire name of this joint kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Revolute => "REVOLUTE",
            Self::Prismatic => "PRISMATIC",
            Self::Spherical => "SPHERICAL",
            Self::Planar => "PLANAR",
            Self::Fixed => "FIXED",
        }
    }
}

/// Position limits of a joint, in radians or meters depending on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointLimits {
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
}

/// A kinematic connector between two links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Joint {
    /// Joint name, unique within the scene.
    pub name: String,
    /// Motion type.
    #[serde(rename = "type")]
    pub kind: JointKind,
    /// Name of the parent link.
    pub parent_link: String,
    /// Name of the child link.
    pub child_link: String,
    /// Joint frame relative to the parent link, already in renderer axes.
    #[serde(flatten)]
    pub origin: Origin,
    /// Motion axis in the joint frame, already in renderer axes.
    pub axis: Vector3<f64>,
    /// Position limits, if the source declared any.
    pub limits: Option<JointLimits>,
}

/// Geometry subtype of a visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GeometryKind {
    /// Axis-aligned box; dimensions ride in `Visual::scale`.
    Box,
    /// Cylinder along the local axis.
    Cylinder,
    /// Sphere.
    Sphere,
    /// External mesh asset, flattened into `Visual::meshes`.
    Mesh,
}

impl GeometryKind {
    /// Wire name of this geometry kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Box => "BOX",
            Self::Cylinder => "CYLINDER",
            Self::Sphere => "SPHERE",
            Self::Mesh => "MESH",
        }
    }
}

/// Renderable geometry attached to a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visual {
    /// Visual name, unique within the scene.
    pub name: String,
    /// Geometry subtype.
    #[serde(rename = "type")]
    pub kind: GeometryKind,
    /// Visual frame relative to its link, already in renderer axes.
    #[serde(flatten)]
    pub origin: Origin,
    /// Scale, or primitive dimensions for non-mesh geometry.
    pub scale: Vector3<f64>,
    /// Flattened mesh fragments (empty for primitive geometry).
    pub meshes: Vec<MeshFragment>,
    /// Materials referenced by the fragments.
    pub materials: Vec<Material>,
}

/// A rigid body frame in the kinematic tree.
///
/// A link with no visual is a pure kinematic frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// Link name, unique within the scene.
    pub name: String,
    /// Link frame in source axes; the renderer composes these itself.
    #[serde(flatten)]
    pub origin: Origin,
    /// Name of the visual attached to this link, if any.
    pub visual_name: Option<String>,
}

/// One robot's validated kinematic and visual structure.
///
/// Immutable once validated; the packager only reads it. The nominal root
/// is `links[0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Robot name.
    pub name: String,
    /// Whether the renderer may let the user drag this entity around.
    pub manipulable: bool,
    /// Links, root first.
    pub links: Vec<Link>,
    /// Joints connecting the links.
    pub joints: Vec<Joint>,
    /// Visuals referenced by the links.
    pub visuals: Vec<Visual>,
}

impl Scene {
    /// Look up a link by name.
    #[must_use]
    pub fn link(&self, name: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.name == name)
    }

    /// Look up a joint by name.
    #[must_use]
    pub fn joint(&self, name: &str) -> Option<&Joint> {
        self.joints.iter().find(|j| j.name == name)
    }

    /// Look up a visual by name.
    #[must_use]
    pub fn visual(&self, name: &str) -> Option<&Visual> {
        self.visuals.iter().find(|v| v.name == name)
    }

    /// Name of the root link, if the scene has any links.
    #[must_use]
    pub fn start_link(&self) -> Option<&str> {
        self.links.first().map(|l| l.name.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn two_link_scene() -> Scene {
        Scene {
            name: "arm".into(),
            manipulable: false,
            links: vec![
                Link {
                    name: "base".into(),
                    origin: Origin::default(),
                    visual_name: None,
                },
                Link {
                    name: "upper".into(),
                    origin: Origin::default(),
                    visual_name: None,
                },
            ],
            joints: vec![Joint {
                name: "shoulder".into(),
                kind: JointKind::Revolute,
                parent_link: "base".into(),
                child_link: "upper".into(),
                origin: Origin::default(),
                axis: Vector3::new(0.0, 1.0, 0.0),
                limits: Some(JointLimits {
                    lower: -1.57,
                    upper: 1.57,
                }),
            }],
            visuals: Vec::new(),
        }
    }

    #[test]
    fn lookups_by_name() {
        let scene = two_link_scene();
        assert!(scene.link("base").is_some());
        assert!(scene.link("missing").is_none());
        assert!(scene.joint("shoulder").is_some());
        assert_eq!(scene.start_link(), Some("base"));
    }

    #[test]
    fn joint_kind_wire_names() {
        assert_eq!(JointKind::Revolute.as_str(), "REVOLUTE");
        assert_eq!(JointKind::Fixed.as_str(), "FIXED");
    }

    #[test]
    fn joint_serializes_with_wire_field_names() {
        let scene = two_link_scene();
        let json = serde_json::to_value(&scene.joints[0]).expect("serialize");
        assert_eq!(json["type"], "REVOLUTE");
        assert_eq!(json["parentLink"], "base");
        assert_eq!(json["childLink"], "upper");
        assert!(json["position"].is_array());
        assert!(json["rotation"].is_array());
    }
}
