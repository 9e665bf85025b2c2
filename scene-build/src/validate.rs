//! Scene invariant checks.
//!
//! Validation is fail-fast: checks run in a fixed order and the first
//! breach aborts, so a scene that reaches the packager is known-good.

use std::collections::HashSet;
use std::f64::consts::TAU;

use nalgebra::Vector3;
use thiserror::Error;

use scene_types::Scene;

/// A scene invariant breach.
///
/// Each variant names the entity and field that failed, with the offending
/// value where there is one.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A name field was empty.
    #[error("empty name on {entity}")]
    EmptyName {
        /// What carried the empty name.
        entity: String,
    },

    /// Two entities of the same kind share a name.
    #[error("duplicate {entity} name '{name}'")]
    DuplicateName {
        /// The entity kind carrying the duplicate.
        entity: &'static str,
        /// The name that appears more than once.
        name: String,
    },

    /// The scene has no links, so it has no root.
    #[error("scene '{scene}' has no links")]
    NoLinks {
        /// The scene name.
        scene: String,
    },

    /// A numeric field was NaN or infinite.
    #[error("non-finite {field} on {entity}")]
    NonFinite {
        /// The entity carrying the value.
        entity: String,
        /// The offending field.
        field: &'static str,
    },

    /// An angular value left the `(-2π, 2π)` range, which indicates a
    /// degrees/radians mix-up upstream.
    #[error("{field} on {entity} out of range: {value} (expected |value| < 2π; degrees instead of radians?)")]
    AngleOutOfRange {
        /// The entity carrying the value.
        entity: String,
        /// The offending field.
        field: &'static str,
        /// The out-of-range component.
        value: f64,
    },

    /// A link references a visual that is not in the scene.
    #[error("link '{link}' references unknown visual '{visual}'")]
    UnresolvedVisual {
        /// The referencing link.
        link: String,
        /// The missing visual name.
        visual: String,
    },

    /// A joint references a link that is not in the scene.
    #[error("joint '{joint}' references unknown link '{link}'")]
    UnresolvedLink {
        /// The referencing joint.
        joint: String,
        /// The missing link name.
        link: String,
    },

    /// A mesh fragment's normals are neither absent nor per-vertex.
    #[error("fragment '{fragment}' of visual '{visual}' has {normals} normals for {vertices} vertices")]
    NormalCountMismatch {
        /// The visual owning the fragment.
        visual: String,
        /// The fragment name.
        fragment: String,
        /// Number of normals found.
        normals: usize,
        /// Number of vertices found.
        vertices: usize,
    },
}

/// Validate a scene against the data-model invariants.
///
/// Check order (first failure wins): names are non-empty and unique per
/// entity kind, the scene has a root link, numeric fields are finite,
/// angular values are inside `(-2π, 2π)`, link visual references resolve,
/// joint link references resolve, fragment normal counts are consistent.
///
/// # Errors
///
/// Returns the first invariant breach found.
pub fn validate(scene: &Scene) -> Result<(), ValidationError> {
    check_names(scene)?;
    check_unique_names(scene)?;

    if scene.links.is_empty() {
        return Err(ValidationError::NoLinks {
            scene: scene.name.clone(),
        });
    }

    check_numerics(scene)?;
    check_angles(scene)?;
    check_visual_refs(scene)?;
    check_joint_refs(scene)?;
    check_normals(scene)?;

    Ok(())
}

/// Every name field must be non-empty.
fn check_names(scene: &Scene) -> Result<(), ValidationError> {
    let empty = |entity: String| ValidationError::EmptyName { entity };

    if scene.name.is_empty() {
        return Err(empty("scene".into()));
    }
    for link in &scene.links {
        if link.name.is_empty() {
            return Err(empty(format!("link of scene '{}'", scene.name)));
        }
    }
    for joint in &scene.joints {
        if joint.name.is_empty() {
            return Err(empty(format!("joint of scene '{}'", scene.name)));
        }
    }
    for visual in &scene.visuals {
        if visual.name.is_empty() {
            return Err(empty(format!("visual of scene '{}'", scene.name)));
        }
        for fragment in &visual.meshes {
            if fragment.name.is_empty() {
                return Err(empty(format!("mesh fragment of visual '{}'", visual.name)));
            }
        }
    }

    Ok(())
}

/// Names must be unique per entity kind.
///
/// The wire payload keys links, joints, and visuals by name; a duplicate
/// would silently overwrite its sibling there.
fn check_unique_names(scene: &Scene) -> Result<(), ValidationError> {
    let kinds: [(&'static str, Vec<&str>); 3] = [
        ("link", scene.links.iter().map(|l| l.name.as_str()).collect()),
        ("joint", scene.joints.iter().map(|j| j.name.as_str()).collect()),
        ("visual", scene.visuals.iter().map(|v| v.name.as_str()).collect()),
    ];

    for (entity, names) in kinds {
        let mut seen = HashSet::new();
        for name in names {
            if !seen.insert(name) {
                return Err(ValidationError::DuplicateName {
                    entity,
                    name: name.to_string(),
                });
            }
        }
    }

    Ok(())
}

/// Origins, axes, and scales must be finite.
fn check_numerics(scene: &Scene) -> Result<(), ValidationError> {
    for link in &scene.links {
        let entity = format!("link '{}'", link.name);
        finite(&entity, "position", &link.origin.position)?;
        finite(&entity, "rotation", &link.origin.rotation)?;
    }
    for joint in &scene.joints {
        let entity = format!("joint '{}'", joint.name);
        finite(&entity, "position", &joint.origin.position)?;
        finite(&entity, "rotation", &joint.origin.rotation)?;
        finite(&entity, "axis", &joint.axis)?;
    }
    for visual in &scene.visuals {
        let entity = format!("visual '{}'", visual.name);
        finite(&entity, "position", &visual.origin.position)?;
        finite(&entity, "rotation", &visual.origin.rotation)?;
        finite(&entity, "scale", &visual.scale)?;
        for fragment in &visual.meshes {
            let entity = format!("fragment '{}' of visual '{}'", fragment.name, visual.name);
            finite(&entity, "position", &fragment.position)?;
            finite(&entity, "rotation", &fragment.rotation)?;
            finite(&entity, "scale", &fragment.scale)?;
        }
    }

    Ok(())
}

/// Rotations, limits, and axis components must lie in `(-2π, 2π)`.
fn check_angles(scene: &Scene) -> Result<(), ValidationError> {
    for link in &scene.links {
        angles(&format!("link '{}'", link.name), "rotation", &link.origin.rotation)?;
    }
    for joint in &scene.joints {
        let entity = format!("joint '{}'", joint.name);
        angles(&entity, "rotation", &joint.origin.rotation)?;
        angles(&entity, "axis", &joint.axis)?;
        if let Some(limits) = &joint.limits {
            for (field, value) in [("lower limit", limits.lower), ("upper limit", limits.upper)] {
                in_angle_range(&entity, field, value)?;
            }
        }
    }
    for visual in &scene.visuals {
        let entity = format!("visual '{}'", visual.name);
        angles(&entity, "rotation", &visual.origin.rotation)?;
        for fragment in &visual.meshes {
            angles(
                &format!("fragment '{}' of visual '{}'", fragment.name, visual.name),
                "rotation",
                &fragment.rotation,
            )?;
        }
    }

    Ok(())
}

/// Every link's visual reference must resolve.
fn check_visual_refs(scene: &Scene) -> Result<(), ValidationError> {
    let visual_names: HashSet<&str> = scene.visuals.iter().map(|v| v.name.as_str()).collect();

    for link in &scene.links {
        if let Some(visual) = &link.visual_name {
            if !visual_names.contains(visual.as_str()) {
                return Err(ValidationError::UnresolvedVisual {
                    link: link.name.clone(),
                    visual: visual.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Every joint's parent and child link must resolve.
fn check_joint_refs(scene: &Scene) -> Result<(), ValidationError> {
    let link_names: HashSet<&str> = scene.links.iter().map(|l| l.name.as_str()).collect();

    for joint in &scene.joints {
        for link in [&joint.parent_link, &joint.child_link] {
            if !link_names.contains(link.as_str()) {
                return Err(ValidationError::UnresolvedLink {
                    joint: joint.name.clone(),
                    link: link.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Fragment normals must be absent or per-vertex.
fn check_normals(scene: &Scene) -> Result<(), ValidationError> {
    for visual in &scene.visuals {
        for fragment in &visual.meshes {
            if !fragment.normals_consistent() {
                return Err(ValidationError::NormalCountMismatch {
                    visual: visual.name.clone(),
                    fragment: fragment.name.clone(),
                    normals: fragment.normals.len(),
                    vertices: fragment.vertices.len(),
                });
            }
        }
    }

    Ok(())
}

fn finite(entity: &str, field: &'static str, v: &Vector3<f64>) -> Result<(), ValidationError> {
    if v.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(ValidationError::NonFinite {
            entity: entity.to_string(),
            field,
        })
    }
}

fn angles(entity: &str, field: &'static str, v: &Vector3<f64>) -> Result<(), ValidationError> {
    for c in v {
        in_angle_range(entity, field, *c)?;
    }
    Ok(())
}

fn in_angle_range(entity: &str, field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.abs() < TAU {
        Ok(())
    } else {
        Err(ValidationError::AngleOutOfRange {
            entity: entity.to_string(),
            field,
            value,
        })
    }
}
