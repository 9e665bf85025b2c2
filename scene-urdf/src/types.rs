//! Intermediate representation of a parsed robot description.
//!
//! These types mirror the source document: per-field defaults have been
//! applied but no axis mapping, asset resolution, or cross-reference
//! checking has happened yet. The document model is built once per input
//! file and discarded after assembly.

use nalgebra::Vector3;

/// A position/rotation offset as it appears in the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UrdfOrigin {
    /// `xyz` attribute, defaulting to zeros.
    pub xyz: Vector3<f64>,
    /// `rpy` attribute in radians, defaulting to zeros.
    pub rpy: Vector3<f64>,
}

impl Default for UrdfOrigin {
    fn default() -> Self {
        Self {
            xyz: Vector3::zeros(),
            rpy: Vector3::zeros(),
        }
    }
}

impl UrdfOrigin {
    /// Create an origin from translation and roll/pitch/yaw.
    #[must_use]
    pub const fn new(xyz: Vector3<f64>, rpy: Vector3<f64>) -> Self {
        Self { xyz, rpy }
    }
}

/// Joint type string from the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrdfJointType {
    /// Limited rotation about an axis.
    Revolute,
    /// Unlimited rotation about an axis.
    Continuous,
    /// Translation along an axis.
    Prismatic,
    /// Rigid connection.
    Fixed,
    /// Unconstrained six-DOF connection.
    Floating,
    /// Planar motion perpendicular to an axis.
    Planar,
}

impl UrdfJointType {
    /// Parse a joint type attribute value.
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "revolute" => Some(Self::Revolute),
            "continuous" => Some(Self::Continuous),
            "prismatic" => Some(Self::Prismatic),
            "fixed" => Some(Self::Fixed),
            "floating" => Some(Self::Floating),
            "planar" => Some(Self::Planar),
            _ => None,
        }
    }
}

/// Geometry subtype, one variant per recognized `<geometry>` child tag.
#[derive(Debug, Clone, PartialEq)]
pub enum UrdfGeometry {
    /// `<box size="x y z"/>`
    Box {
        /// Full extents.
        size: Vector3<f64>,
    },
    /// `<cylinder radius="r" length="l"/>`
    Cylinder {
        /// Cylinder radius.
        radius: f64,
        /// Cylinder length.
        length: f64,
    },
    /// `<sphere radius="r"/>`
    Sphere {
        /// Sphere radius.
        radius: f64,
    },
    /// `<mesh filename="..." scale="x y z"/>`
    Mesh {
        /// Asset reference as written in the document.
        filename: String,
        /// Per-axis scale, defaulting to ones.
        scale: Vector3<f64>,
    },
}

impl UrdfGeometry {
    /// Short tag name of the variant, used when synthesizing visual names.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Box { .. } => "box",
            Self::Cylinder { .. } => "cylinder",
            Self::Sphere { .. } => "sphere",
            Self::Mesh { .. } => "mesh",
        }
    }
}

/// A `<material>` with an inline color.
#[derive(Debug, Clone, PartialEq)]
pub struct UrdfMaterial {
    /// Material name.
    pub name: String,
    /// `rgba` color, if declared inline.
    pub rgba: Option<[f64; 4]>,
}

/// A link's `<visual>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct UrdfVisual {
    /// Optional visual name; assembly synthesizes one when absent.
    pub name: Option<String>,
    /// Optional origin offset.
    pub origin: Option<UrdfOrigin>,
    /// Required geometry.
    pub geometry: UrdfGeometry,
    /// Referenced material name, if any.
    pub material: Option<String>,
}

/// A link's `<collision>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct UrdfCollision {
    /// Optional collision name.
    pub name: Option<String>,
    /// Optional origin offset.
    pub origin: Option<UrdfOrigin>,
    /// Required geometry.
    pub geometry: UrdfGeometry,
}

/// The 6 independent components of an inertia tensor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UrdfInertia {
    /// XX component.
    pub ixx: f64,
    /// XY component.
    pub ixy: f64,
    /// XZ component.
    pub ixz: f64,
    /// YY component.
    pub iyy: f64,
    /// YZ component.
    pub iyz: f64,
    /// ZZ component.
    pub izz: f64,
}

/// A link's `<inertial>` element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UrdfInertial {
    /// Inertial frame offset.
    pub origin: UrdfOrigin,
    /// Mass in kilograms.
    pub mass: f64,
    /// Inertia tensor about the inertial frame.
    pub inertia: UrdfInertia,
}

/// A `<link>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct UrdfLink {
    /// Link name.
    pub name: String,
    /// Optional link-frame origin.
    pub origin: Option<UrdfOrigin>,
    /// Mass properties, if declared.
    pub inertial: Option<UrdfInertial>,
    /// Renderable geometry, if declared.
    pub visual: Option<UrdfVisual>,
    /// Collision geometry, if declared.
    pub collision: Option<UrdfCollision>,
}

impl UrdfLink {
    /// Create a bare link with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: None,
            inertial: None,
            visual: None,
            collision: None,
        }
    }

    /// Attach a visual.
    #[must_use]
    pub fn with_visual(mut self, visual: UrdfVisual) -> Self {
        self.visual = Some(visual);
        self
    }
}

/// `<limit>` element of a joint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UrdfJointLimit {
    /// Lower position bound.
    pub lower: f64,
    /// Upper position bound.
    pub upper: f64,
    /// Maximum effort.
    pub effort: f64,
    /// Maximum velocity.
    pub velocity: f64,
}

/// `<dynamics>` element of a joint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UrdfJointDynamics {
    /// Viscous damping.
    pub damping: f64,
    /// Static friction.
    pub friction: f64,
}

/// A `<joint>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct UrdfJoint {
    /// Joint name.
    pub name: String,
    /// Joint type.
    pub joint_type: UrdfJointType,
    /// Parent link name.
    pub parent: String,
    /// Child link name.
    pub child: String,
    /// Optional joint-frame origin.
    pub origin: Option<UrdfOrigin>,
    /// Motion axis, defaulting to X.
    pub axis: Vector3<f64>,
    /// Position limits, if declared.
    pub limit: Option<UrdfJointLimit>,
    /// Damping and friction, if declared.
    pub dynamics: Option<UrdfJointDynamics>,
    /// `<calibration rising="..."/>`, if declared.
    pub calibration_rising: Option<f64>,
}

impl UrdfJoint {
    /// Create a joint connecting two links.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        joint_type: UrdfJointType,
        parent: impl Into<String>,
        child: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            joint_type,
            parent: parent.into(),
            child: child.into(),
            origin: None,
            axis: Vector3::x(),
            limit: None,
            dynamics: None,
            calibration_rising: None,
        }
    }

    /// Set the joint origin.
    #[must_use]
    pub fn with_origin(mut self, origin: UrdfOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Set the motion axis.
    #[must_use]
    pub fn with_axis(mut self, axis: Vector3<f64>) -> Self {
        self.axis = axis;
        self
    }

    /// Set the position limits.
    #[must_use]
    pub fn with_limit(mut self, limit: UrdfJointLimit) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A parsed robot description: the document model.
#[derive(Debug, Clone, PartialEq)]
pub struct UrdfRobot {
    /// Robot name, from the root attribute or the file's base name.
    pub name: String,
    /// Links in document order.
    pub links: Vec<UrdfLink>,
    /// Joints in document order.
    pub joints: Vec<UrdfJoint>,
    /// Robot-level materials in document order.
    pub materials: Vec<UrdfMaterial>,
}

impl UrdfRobot {
    /// Create an empty robot with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            links: Vec::new(),
            joints: Vec::new(),
            materials: Vec::new(),
        }
    }

    /// Add a link.
    #[must_use]
    pub fn with_link(mut self, link: UrdfLink) -> Self {
        self.links.push(link);
        self
    }

    /// Add a joint.
    #[must_use]
    pub fn with_joint(mut self, joint: UrdfJoint) -> Self {
        self.joints.push(joint);
        self
    }

    /// Look up a link by name.
    #[must_use]
    pub fn link(&self, name: &str) -> Option<&UrdfLink> {
        self.links.iter().find(|l| l.name == name)
    }

    /// Look up a joint by name.
    #[must_use]
    pub fn joint(&self, name: &str) -> Option<&UrdfJoint> {
        self.joints.iter().find(|j| j.name == name)
    }

    /// Look up a robot-level material by name.
    #[must_use]
    pub fn material(&self, name: &str) -> Option<&UrdfMaterial> {
        self.materials.iter().find(|m| m.name == name)
    }
}
