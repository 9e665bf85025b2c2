//! Scene assembly from a parsed robot description.
//!
//! The assembler walks the document model once: joints and visuals are
//! mapped into renderer axes through `scene_types::axes`, mesh references
//! are resolved through the fragment cache, and the finished scene is
//! validated before it is returned. A scene either fully assembles and
//! validates, or the conversion fails as a whole.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use nalgebra::Vector3;
use tracing::debug;

use scene_assets::GeometryResolver;
use scene_types::{
    axes, GeometryKind, Joint, JointKind, JointLimits, Link, Material, Origin, Scene, Visual,
};
use scene_urdf::{
    parse_urdf_str, UrdfGeometry, UrdfJoint, UrdfJointType, UrdfLink, UrdfRobot, UrdfVisual,
};

use crate::error::BuildResult;
use crate::validate::validate;

/// Prefix used by robot descriptions for package-relative asset paths.
const PACKAGE_PREFIX: &str = "package://";

/// Converts robot descriptions into validated scenes.
///
/// # Example
///
/// ```
/// use scene_assets::GeometryResolver;
/// use scene_build::SceneConverter;
///
/// let xml = r#"
///     <robot name="cart">
///         <link name="base">
///             <visual>
///                 <geometry><box size="0.4 0.3 0.1"/></geometry>
///             </visual>
///         </link>
///         <link name="wheel"/>
///         <joint name="axle" type="continuous">
///             <parent link="base"/>
///             <child link="wheel"/>
///             <axis xyz="0 1 0"/>
///         </joint>
///     </robot>
/// "#;
///
/// let mut resolver = GeometryResolver::collada();
/// let scene = SceneConverter::new()
///     .convert_str(xml, "cart", &mut resolver)
///     .expect("should convert");
///
/// assert_eq!(scene.name, "cart");
/// assert_eq!(scene.links.len(), 2);
/// assert_eq!(scene.visuals.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SceneConverter {
    /// Robot name override; defaults to the document's name.
    name: Option<String>,
    /// Directory that `package://` asset references resolve against.
    asset_dir: Option<PathBuf>,
    /// Whether the renderer may manipulate the entity.
    manipulable: bool,
}

impl SceneConverter {
    /// Create a converter with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the robot name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the directory used to resolve relative asset references.
    #[must_use]
    pub fn with_asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = Some(dir.into());
        self
    }

    /// Mark the produced scene as manipulable.
    #[must_use]
    pub fn with_manipulable(mut self, manipulable: bool) -> Self {
        self.manipulable = manipulable;
        self
    }

    /// Convert a robot description file.
    ///
    /// The file's directory becomes the asset directory unless one was set
    /// explicitly, and its base name is the fallback robot name.
    ///
    /// # Errors
    ///
    /// Returns an error if reading, parsing, asset loading, or validation
    /// fails.
    pub fn convert_file(
        &self,
        path: impl AsRef<Path>,
        resolver: &mut GeometryResolver,
    ) -> BuildResult<Scene> {
        let path = path.as_ref();
        let fallback = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "robot".to_string());

        let converter = if self.asset_dir.is_none() {
            let parent = path.parent().unwrap_or_else(|| Path::new("."));
            self.clone().with_asset_dir(parent)
        } else {
            self.clone()
        };

        let xml = fs::read_to_string(path)?;
        converter.convert_str(&xml, &fallback, resolver)
    }

    /// Convert a robot description string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing, asset loading, or validation fails.
    pub fn convert_str(
        &self,
        xml: &str,
        fallback_name: &str,
        resolver: &mut GeometryResolver,
    ) -> BuildResult<Scene> {
        let robot = parse_urdf_str(xml, fallback_name)?;
        self.convert_robot(&robot, resolver)
    }

    /// Convert a parsed document model into a validated scene.
    ///
    /// # Errors
    ///
    /// Returns an error if asset loading or validation fails.
    pub fn convert_robot(
        &self,
        robot: &UrdfRobot,
        resolver: &mut GeometryResolver,
    ) -> BuildResult<Scene> {
        let mut links = Vec::with_capacity(robot.links.len());
        let mut visuals = Vec::new();
        let mut used_names: HashSet<String> = HashSet::new();

        for urdf_link in &robot.links {
            let visual_name = match &urdf_link.visual {
                Some(urdf_visual) => {
                    let visual =
                        self.convert_visual(urdf_visual, urdf_link, robot, &used_names, resolver)?;
                    used_names.insert(visual.name.clone());
                    let name = visual.name.clone();
                    visuals.push(visual);
                    Some(name)
                }
                None => None,
            };
            links.push(convert_link(urdf_link, visual_name));
        }

        let joints = robot.joints.iter().map(convert_joint).collect();

        let scene = Scene {
            name: self
                .name
                .clone()
                .unwrap_or_else(|| robot.name.clone()),
            manipulable: self.manipulable,
            links,
            joints,
            visuals,
        };

        validate(&scene)?;
        debug!(
            scene = scene.name.as_str(),
            links = scene.links.len(),
            joints = scene.joints.len(),
            visuals = scene.visuals.len(),
            "assembled scene"
        );
        Ok(scene)
    }

    /// Convert one visual, resolving its mesh reference if it has one.
    fn convert_visual(
        &self,
        visual: &UrdfVisual,
        link: &UrdfLink,
        robot: &UrdfRobot,
        used_names: &HashSet<String>,
        resolver: &mut GeometryResolver,
    ) -> BuildResult<Visual> {
        let name = unique_visual_name(visual, link, used_names);
        let origin = visual.origin.unwrap_or_default();

        let (kind, scale) = match &visual.geometry {
            UrdfGeometry::Box { size } => (GeometryKind::Box, *size),
            UrdfGeometry::Cylinder { radius, length } => {
                (GeometryKind::Cylinder, Vector3::new(*radius, *length, *radius))
            }
            UrdfGeometry::Sphere { radius } => {
                (GeometryKind::Sphere, Vector3::new(*radius, *radius, *radius))
            }
            UrdfGeometry::Mesh { scale, .. } => (GeometryKind::Mesh, *scale),
        };

        let (meshes, mut materials) = match &visual.geometry {
            UrdfGeometry::Mesh { filename, .. } => {
                let path = self.resolve_file_ref(filename);
                let asset = resolver.resolve(&path)?;
                (asset.fragments.clone(), asset.materials.clone())
            }
            _ => (Vec::new(), Vec::new()),
        };

        // The referenced robot-level material, when it has an inline color,
        // joins whatever the asset declared.
        if let Some(referenced) = visual
            .material
            .as_deref()
            .and_then(|name| robot.material(name))
            .and_then(|m| m.rgba.map(|rgba| Material::diffuse(&m.name, rgba)))
        {
            materials.push(referenced);
        }

        Ok(Visual {
            name,
            kind,
            origin: Origin::new(
                axes::map_position(origin.xyz),
                axes::map_visual_euler(origin.rpy),
            ),
            scale,
            meshes,
            materials,
        })
    }

    /// Resolve an asset reference from the document into a path on disk.
    fn resolve_file_ref(&self, filename: &str) -> PathBuf {
        let dir = self.asset_dir.as_deref().unwrap_or_else(|| Path::new("."));
        match filename.strip_prefix(PACKAGE_PREFIX) {
            Some(relative) => dir.join(relative),
            None => {
                let path = Path::new(filename);
                if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    dir.join(path)
                }
            }
        }
    }
}

/// Convert a link, keeping its origin in source axes.
///
/// The renderer composes link frames hierarchically itself; only joint and
/// visual quantities are mapped.
fn convert_link(link: &UrdfLink, visual_name: Option<String>) -> Link {
    let origin = link.origin.unwrap_or_default();
    Link {
        name: link.name.clone(),
        origin: Origin::new(origin.xyz, origin.rpy),
        visual_name,
    }
}

/// Convert a joint, mapping origin and axis into renderer axes.
fn convert_joint(joint: &UrdfJoint) -> Joint {
    let origin = joint.origin.unwrap_or_default();

    // Continuous joints carry no position limits by definition.
    let limits = match joint.joint_type {
        UrdfJointType::Continuous => None,
        _ => joint.limit.map(|l| JointLimits {
            lower: l.lower,
            upper: l.upper,
        }),
    };

    Joint {
        name: joint.name.clone(),
        kind: joint_kind(joint.joint_type),
        parent_link: joint.parent.clone(),
        child_link: joint.child.clone(),
        origin: Origin::new(
            axes::map_position(origin.xyz),
            axes::map_euler(origin.rpy),
        ),
        axis: axes::map_position(joint.axis),
        limits,
    }
}

/// Map a document joint type onto a renderer joint kind.
fn joint_kind(joint_type: UrdfJointType) -> JointKind {
    match joint_type {
        UrdfJointType::Revolute | UrdfJointType::Continuous => JointKind::Revolute,
        UrdfJointType::Prismatic => JointKind::Prismatic,
        UrdfJointType::Fixed => JointKind::Fixed,
        UrdfJointType::Planar => JointKind::Planar,
        UrdfJointType::Floating => JointKind::Spherical,
    }
}

/// Pick a unique name for a visual.
///
/// Unnamed visuals get `basename(meshFile)_kind` (or `link_kind` for
/// primitives). Two files with identical base names would alias, so a
/// counter suffix disambiguates instead of failing or silently merging.
fn unique_visual_name(visual: &UrdfVisual, link: &UrdfLink, used: &HashSet<String>) -> String {
    let base = visual.name.clone().unwrap_or_else(|| {
        let stem = match &visual.geometry {
            UrdfGeometry::Mesh { filename, .. } => Path::new(filename)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| link.name.clone()),
            _ => link.name.clone(),
        };
        format!("{stem}_{}", visual.geometry.tag())
    });

    if !used.contains(&base) {
        return base;
    }
    let mut counter = 1;
    loop {
        let candidate = format!("{base}_{counter}");
        if !used.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    const CART_URDF: &str = r#"
        <robot name="cart">
            <material name="red">
                <color rgba="1 0 0 1"/>
            </material>
            <link name="base">
                <visual>
                    <origin xyz="1 2 3" rpy="0 0 0"/>
                    <geometry><box size="0.4 0.3 0.1"/></geometry>
                    <material name="red"/>
                </visual>
            </link>
            <link name="wheel"/>
            <joint name="axle" type="continuous">
                <parent link="base"/>
                <child link="wheel"/>
                <origin xyz="0 0.1 0" rpy="0 0 0"/>
                <axis xyz="0 0 1"/>
                <limit lower="-1" upper="1"/>
            </joint>
        </robot>
    "#;

    fn convert(xml: &str) -> Scene {
        let mut resolver = GeometryResolver::collada();
        SceneConverter::new()
            .convert_str(xml, "fallback", &mut resolver)
            .expect("should convert")
    }

    #[test]
    fn assembles_and_validates_a_cart() {
        let scene = convert(CART_URDF);

        assert_eq!(scene.name, "cart");
        assert_eq!(scene.links.len(), 2);
        assert_eq!(scene.joints.len(), 1);
        assert_eq!(scene.visuals.len(), 1);
        assert_eq!(scene.start_link(), Some("base"));
    }

    #[test]
    fn references_resolve_after_assembly() {
        let scene = convert(CART_URDF);

        for joint in &scene.joints {
            assert!(scene.link(&joint.parent_link).is_some());
            assert!(scene.link(&joint.child_link).is_some());
        }
        for link in &scene.links {
            if let Some(visual) = &link.visual_name {
                assert!(scene.visual(visual).is_some());
            }
        }
    }

    #[test]
    fn visual_origin_is_axis_mapped() {
        let scene = convert(CART_URDF);
        let visual = &scene.visuals[0];

        // (1, 2, 3) maps to (-2, 3, 1); zero rotation picks up the fixed
        // visual yaw offset.
        assert_relative_eq!(visual.origin.position.x, -2.0);
        assert_relative_eq!(visual.origin.position.y, 3.0);
        assert_relative_eq!(visual.origin.position.z, 1.0);
        assert_relative_eq!(visual.origin.rotation.y, FRAC_PI_2);
    }

    #[test]
    fn joint_axis_is_axis_mapped() {
        let scene = convert(CART_URDF);
        let axle = scene.joint("axle").expect("axle");

        // Source Z becomes renderer Y.
        assert_relative_eq!(axle.axis.y, 1.0);
        assert_relative_eq!(axle.origin.position.x, -0.1);
    }

    #[test]
    fn link_origin_is_not_axis_mapped() {
        let xml = r#"
            <robot name="r">
                <link name="only">
                    <origin xyz="1 2 3"/>
                </link>
            </robot>
        "#;
        let scene = convert(xml);
        assert_relative_eq!(scene.links[0].origin.position.x, 1.0);
    }

    #[test]
    fn continuous_joints_drop_limits() {
        let scene = convert(CART_URDF);
        assert!(scene.joint("axle").expect("axle").limits.is_none());
    }

    #[test]
    fn joint_kinds_map_onto_renderer_kinds() {
        assert_eq!(joint_kind(UrdfJointType::Continuous), JointKind::Revolute);
        assert_eq!(joint_kind(UrdfJointType::Floating), JointKind::Spherical);
        assert_eq!(joint_kind(UrdfJointType::Fixed), JointKind::Fixed);
    }

    #[test]
    fn referenced_material_color_is_carried() {
        let scene = convert(CART_URDF);
        let visual = &scene.visuals[0];
        assert_eq!(visual.materials.len(), 1);
        assert_eq!(visual.materials[0].name, "red");
        assert_relative_eq!(visual.materials[0].diffuse[0], 1.0);
    }

    #[test]
    fn name_override_wins() {
        let mut resolver = GeometryResolver::collada();
        let scene = SceneConverter::new()
            .with_name("renamed")
            .convert_str(CART_URDF, "fallback", &mut resolver)
            .expect("should convert");
        assert_eq!(scene.name, "renamed");
    }

    #[test]
    fn synthesized_visual_names_are_unique() {
        let used = HashSet::new();
        let link = UrdfLink::new("base");
        let visual = UrdfVisual {
            name: None,
            origin: None,
            geometry: UrdfGeometry::Mesh {
                filename: "package://meshes/finger.dae".into(),
                scale: Vector3::new(1.0, 1.0, 1.0),
            },
            material: None,
        };

        let first = unique_visual_name(&visual, &link, &used);
        assert_eq!(first, "finger_mesh");

        let mut used = used;
        used.insert(first);
        let second = unique_visual_name(&visual, &link, &used);
        assert_eq!(second, "finger_mesh_1");
    }

    #[test]
    fn package_references_resolve_against_the_asset_dir() {
        let converter = SceneConverter::new().with_asset_dir("/models/panda");
        let path = converter.resolve_file_ref("package://meshes/hand.dae");
        assert_eq!(path, PathBuf::from("/models/panda/meshes/hand.dae"));
    }

    #[test]
    fn duplicate_link_names_are_rejected() {
        // Two links named "base" would collapse into one wire map entry.
        let xml = r#"
            <robot name="r">
                <link name="base"/>
                <link name="base"/>
                <link name="arm"/>
            </robot>
        "#;

        let mut resolver = GeometryResolver::collada();
        let result = SceneConverter::new().convert_str(xml, "r", &mut resolver);
        assert!(result.is_err());
    }

    #[test]
    fn degree_rotations_are_rejected_downstream() {
        // 90-degree values written as degrees blow the radian range check.
        let xml = r#"
            <robot name="r">
                <link name="a"/>
                <link name="b"/>
                <joint name="j" type="fixed">
                    <parent link="a"/>
                    <child link="b"/>
                    <origin rpy="90 0 0"/>
                </joint>
            </robot>
        "#;

        let mut resolver = GeometryResolver::collada();
        let result = SceneConverter::new().convert_str(xml, "r", &mut resolver);
        assert!(result.is_err());
    }
}
