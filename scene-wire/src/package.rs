//! Packaging of scenes and shapes into wire frames.
//!
//! Packaging is a pure, deterministic function of its inputs: payload maps
//! are ordered by key and struct fields serialize in declaration order, so
//! the same scene always produces byte-identical frames. Shape frames are
//! packaged before entity frames so the receiver has every referenced
//! shape by the time an entity arrives.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use scene_types::{Joint, Link, MeshFragment, Scene, Shape, ShapeKind, Visual};

use crate::error::WireResult;
use crate::frame::{Frame, FrameKind};

/// Entity payload: one scene keyed for random access by the receiver.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EntityWire<'a> {
    name: &'a str,
    manipulable: bool,
    /// Root link name; `links` is a map and carries no order.
    start_link: Option<&'a str>,
    links: BTreeMap<&'a str, &'a Link>,
    joints: BTreeMap<&'a str, &'a Joint>,
    visuals: BTreeMap<&'a str, &'a Visual>,
}

impl<'a> EntityWire<'a> {
    fn from_scene(scene: &'a Scene) -> Self {
        Self {
            name: &scene.name,
            manipulable: scene.manipulable,
            start_link: scene.start_link(),
            links: scene.links.iter().map(|l| (l.name.as_str(), l)).collect(),
            joints: scene.joints.iter().map(|j| (j.name.as_str(), j)).collect(),
            visuals: scene.visuals.iter().map(|v| (v.name.as_str(), v)).collect(),
        }
    }
}

/// Shape payload: the table entry without its mesh fragments, which travel
/// in a sibling mesh frame.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShapeWire<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: ShapeKind,
    position: &'a nalgebra::Vector3<f64>,
    rotation: &'a nalgebra::Vector3<f64>,
    dimensions: &'a [f64],
}

/// Mesh payload: fragments addressed to a previously sent shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MeshWire<'a> {
    shape: &'a str,
    meshes: &'a [MeshFragment],
}

/// Update payload: a new pose for an already-spawned entity.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateWire<'a> {
    name: &'a str,
    position: &'a nalgebra::Vector3<f64>,
    rotation: &'a nalgebra::Vector3<f64>,
}

/// Package one scene into an entity frame.
///
/// # Errors
///
/// Returns an error if the payload fails to serialize.
pub fn package_scene(scene: &Scene) -> WireResult<Frame> {
    let payload = serde_json::to_string(&EntityWire::from_scene(scene))?;
    debug!(
        scene = scene.name.as_str(),
        bytes = payload.len(),
        "packaged entity frame"
    );
    Ok(Frame::new(FrameKind::Entity, payload))
}

/// Package one shape into a shape frame plus, for mesh-backed shapes, a
/// mesh frame carrying its fragments.
///
/// # Errors
///
/// Returns an error if a payload fails to serialize.
pub fn package_shape(shape: &Shape) -> WireResult<Vec<Frame>> {
    let wire = ShapeWire {
        name: &shape.name,
        kind: shape.kind,
        position: &shape.position,
        rotation: &shape.rotation,
        dimensions: &shape.dimensions,
    };
    let mut frames = vec![Frame::new(FrameKind::Shape, serde_json::to_string(&wire)?)];

    if !shape.meshes.is_empty() {
        let mesh = MeshWire {
            shape: &shape.name,
            meshes: &shape.meshes,
        };
        frames.push(Frame::new(FrameKind::Mesh, serde_json::to_string(&mesh)?));
    }
    Ok(frames)
}

/// Package a pose update for a previously spawned entity.
///
/// Position and rotation are expected already in renderer axes.
///
/// # Errors
///
/// Returns an error if the payload fails to serialize.
pub fn package_update(
    entity: &str,
    position: &nalgebra::Vector3<f64>,
    rotation: &nalgebra::Vector3<f64>,
) -> WireResult<Frame> {
    let wire = UpdateWire {
        name: entity,
        position,
        rotation,
    };
    Ok(Frame::new(FrameKind::Update, serde_json::to_string(&wire)?))
}

/// Package a batch of scenes and shapes, shapes first.
///
/// # Errors
///
/// Returns an error if any payload fails to serialize.
pub fn package(scenes: &[Scene], shapes: &[Shape]) -> WireResult<Vec<Frame>> {
    let mut frames = Vec::new();
    for shape in shapes {
        frames.extend(package_shape(shape)?);
    }
    for scene in scenes {
        frames.push(package_scene(scene)?);
    }
    Ok(frames)
}

/// Package one scene as a full transmission: the entity frame, a spawn
/// instruction, and the end-of-stream beacon.
///
/// # Errors
///
/// Returns an error if the entity payload fails to serialize.
pub fn stream_frames(scene: &Scene) -> WireResult<Vec<Frame>> {
    Ok(vec![
        package_scene(scene)?,
        Frame::spawn(&scene.name),
        Frame::beacon(),
    ])
}

/// Bundle a packaged transmission into one data frame.
///
/// Receivers that cannot act on individual frames (archival sinks, replay
/// tools) take the whole document at once.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn document_frame(frames: &[Frame]) -> WireResult<Frame> {
    Ok(Frame::new(FrameKind::Data, frames_to_json_pretty(frames)?))
}

/// Render frames as a pretty-printed JSON array, for debugging and
/// offline inspection of a transmission.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn frames_to_json_pretty(frames: &[Frame]) -> WireResult<String> {
    #[derive(Serialize)]
    struct FrameView<'a> {
        kind: &'static str,
        payload: &'a str,
    }

    let views: Vec<FrameView<'_>> = frames
        .iter()
        .map(|f| FrameView {
            kind: f.kind.as_str(),
            payload: &f.payload,
        })
        .collect();
    Ok(serde_json::to_string_pretty(&views)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use scene_types::{JointKind, JointLimits, Origin};

    fn sample_scene() -> Scene {
        Scene {
            name: "arm".into(),
            manipulable: true,
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
                    lower: -1.0,
                    upper: 1.0,
                }),
            }],
            visuals: Vec::new(),
        }
    }

    fn sample_shape(meshes: Vec<MeshFragment>) -> Shape {
        Shape {
            name: "floor".into(),
            kind: if meshes.is_empty() {
                ShapeKind::Plane
            } else {
                ShapeKind::Geometric
            },
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
            dimensions: vec![10.0, 10.0, 0.0],
            meshes,
        }
    }

    fn sample_fragment() -> MeshFragment {
        MeshFragment {
            name: "node".into(),
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            indices: vec![0, 1, 2],
            vertices: vec![Vector3::zeros(); 3],
            normals: Vec::new(),
            material: None,
        }
    }

    #[test]
    fn entity_payload_is_keyed_by_name() {
        let frame = package_scene(&sample_scene()).expect("package");
        assert_eq!(frame.kind, FrameKind::Entity);

        let json: serde_json::Value = serde_json::from_str(&frame.payload).expect("json");
        assert_eq!(json["name"], "arm");
        assert_eq!(json["manipulable"], true);
        assert_eq!(json["startLink"], "base");
        assert!(json["links"]["base"].is_object());
        assert!(json["links"]["upper"].is_object());
        assert_eq!(json["joints"]["shoulder"]["type"], "REVOLUTE");
    }

    #[test]
    fn packaging_is_deterministic() {
        let scene = sample_scene();
        let a = package_scene(&scene).expect("package");
        let b = package_scene(&scene).expect("package");
        assert_eq!(a.payload, b.payload);
    }

    #[test]
    fn primitive_shapes_produce_one_frame() {
        let frames = package_shape(&sample_shape(Vec::new())).expect("package");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, FrameKind::Shape);
    }

    #[test]
    fn mesh_shapes_get_a_sibling_mesh_frame() {
        let frames = package_shape(&sample_shape(vec![sample_fragment()])).expect("package");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].kind, FrameKind::Mesh);

        let json: serde_json::Value = serde_json::from_str(&frames[1].payload).expect("json");
        assert_eq!(json["shape"], "floor");
        assert_eq!(json["meshes"].as_array().expect("array").len(), 1);
    }

    #[test]
    fn batches_put_shapes_before_entities() {
        let frames =
            package(&[sample_scene()], &[sample_shape(Vec::new())]).expect("package");
        assert_eq!(frames[0].kind, FrameKind::Shape);
        assert_eq!(frames[1].kind, FrameKind::Entity);
    }

    #[test]
    fn streams_end_with_spawn_and_beacon() {
        let frames = stream_frames(&sample_scene()).expect("package");
        let kinds: Vec<FrameKind> = frames.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![FrameKind::Entity, FrameKind::Spawn, FrameKind::Beacon]
        );
        assert_eq!(frames[1].payload, "arm");
        assert_eq!(frames[2].payload, "Done");
    }

    #[test]
    fn pose_updates_carry_the_entity_name() {
        let frame = package_update(
            "arm",
            &Vector3::new(0.0, 1.0, 0.0),
            &Vector3::new(0.0, 0.5, 0.0),
        )
        .expect("package");
        assert_eq!(frame.kind, FrameKind::Update);

        let json: serde_json::Value = serde_json::from_str(&frame.payload).expect("json");
        assert_eq!(json["name"], "arm");
        assert_eq!(json["position"][1], 1.0);
    }

    #[test]
    fn document_frame_wraps_a_transmission() {
        let frames = stream_frames(&sample_scene()).expect("package");
        let doc = document_frame(&frames).expect("package");
        assert_eq!(doc.kind, FrameKind::Data);

        let json: serde_json::Value = serde_json::from_str(&doc.payload).expect("json");
        assert_eq!(json.as_array().expect("array").len(), 3);
    }

    #[test]
    fn debug_rendering_lists_every_frame() {
        let frames = stream_frames(&sample_scene()).expect("package");
        let text = frames_to_json_pretty(&frames).expect("render");
        let json: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(json.as_array().expect("array").len(), 3);
        assert_eq!(json[0]["kind"], "ENTITY");
    }
}
