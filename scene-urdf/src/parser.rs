//! URDF XML parser.
//!
//! Builds the [`UrdfRobot`] document model from raw markup. Attribute
//! lookups go through typed-default helpers: absent attributes fall back to
//! their defaults, present-but-malformed values are a hard
//! [`UrdfError::InvalidAttribute`] naming the attribute and the raw value.
//! Unrecognized elements are skipped, never fatal.

use nalgebra::Vector3;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;

use crate::error::{Result, UrdfError};
use crate::types::{
    UrdfCollision, UrdfGeometry, UrdfInertia, UrdfInertial, UrdfJoint, UrdfJointDynamics,
    UrdfJointLimit, UrdfJointType, UrdfLink, UrdfMaterial, UrdfOrigin, UrdfRobot, UrdfVisual,
};

/// Parse a URDF string into the document model.
///
/// `fallback_name` names the robot when the root element carries no `name`
/// attribute; callers pass the file's base name without extension.
///
/// # Errors
///
/// Returns an error if the XML is malformed, the `<robot>` root is absent,
/// or a required element or attribute is missing or malformed.
pub fn parse_urdf_str(xml: &str, fallback_name: &str) -> Result<UrdfRobot> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut robot: Option<UrdfRobot> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"robot" => {
                robot = Some(parse_robot(&mut reader, e, fallback_name)?);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(UrdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    robot.ok_or_else(|| UrdfError::missing_element("robot", "document"))
}

/// Parse the robot element and its children.
fn parse_robot<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    fallback_name: &str,
) -> Result<UrdfRobot> {
    let name = optional_attr(start, "name")?.unwrap_or_else(|| fallback_name.to_string());
    let mut robot = UrdfRobot::new(name);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let elem_name = e.name().as_ref().to_vec();
                match elem_name.as_slice() {
                    b"link" => robot.links.push(parse_link(reader, e)?),
                    b"joint" => robot.joints.push(parse_joint(reader, e)?),
                    b"material" => robot.materials.push(parse_material(reader, e)?),
                    _ => {
                        tracing::debug!(
                            element = %String::from_utf8_lossy(&elem_name),
                            "skipping unrecognized robot child"
                        );
                        skip_element(reader, &elem_name)?;
                    }
                }
            }
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"link" => robot.links.push(UrdfLink::new(required_attr(e, "name")?)),
                b"material" => robot.materials.push(UrdfMaterial {
                    name: required_attr(e, "name")?,
                    rgba: None,
                }),
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"robot" => break,
            Ok(Event::Eof) => return Err(UrdfError::XmlParse("unexpected EOF in robot".into())),
            Ok(_) => {}
            Err(e) => return Err(UrdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(robot)
}

/// Parse a robot-level material element.
///
/// Only the name and an inline `<color rgba>` matter to the pipeline;
/// texture children are skipped.
fn parse_material<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<UrdfMaterial> {
    let name = required_attr(start, "name")?;
    let mut rgba: Option<[f64; 4]> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => {
                if e.name().as_ref() == b"color" {
                    rgba = attr_rgba(e, "rgba")?;
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"material" => break,
            Ok(Event::Eof) => return Err(UrdfError::XmlParse("unexpected EOF in material".into())),
            Ok(_) => {}
            Err(e) => return Err(UrdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(UrdfMaterial { name, rgba })
}

/// Parse a link element.
fn parse_link<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<UrdfLink> {
    let mut link = UrdfLink::new(required_attr(start, "name")?);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let elem_name = e.name().as_ref().to_vec();
                match elem_name.as_slice() {
                    b"inertial" => link.inertial = Some(parse_inertial(reader, &link.name)?),
                    b"visual" => link.visual = Some(parse_visual(reader, e, &link.name)?),
                    b"collision" => link.collision = Some(parse_collision(reader, e, &link.name)?),
                    b"origin" => {
                        link.origin = Some(parse_origin(e)?);
                        skip_element(reader, &elem_name)?;
                    }
                    _ => skip_element(reader, &elem_name)?,
                }
            }
            Ok(Event::Empty(ref e)) => {
                if e.name().as_ref() == b"origin" {
                    link.origin = Some(parse_origin(e)?);
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"link" => break,
            Ok(Event::Eof) => return Err(UrdfError::XmlParse("unexpected EOF in link".into())),
            Ok(_) => {}
            Err(e) => return Err(UrdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(link)
}

/// Parse an inertial element.
fn parse_inertial<R: BufRead>(reader: &mut Reader<R>, link_name: &str) -> Result<UrdfInertial> {
    let mut inertial = UrdfInertial::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => match e.name().as_ref() {
                b"origin" => inertial.origin = parse_origin(e)?,
                b"mass" => {
                    inertial.mass = attr_f64(e, "value")?.ok_or_else(|| {
                        UrdfError::missing_attribute("value", format!("mass of '{link_name}'"))
                    })?;
                }
                b"inertia" => inertial.inertia = parse_inertia(e)?,
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"inertial" => break,
            Ok(Event::Eof) => return Err(UrdfError::XmlParse("unexpected EOF in inertial".into())),
            Ok(_) => {}
            Err(e) => return Err(UrdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(inertial)
}

/// Parse inertia tensor attributes, each defaulting to zero.
fn parse_inertia(e: &BytesStart) -> Result<UrdfInertia> {
    Ok(UrdfInertia {
        ixx: attr_f64_or(e, "ixx", 0.0)?,
        ixy: attr_f64_or(e, "ixy", 0.0)?,
        ixz: attr_f64_or(e, "ixz", 0.0)?,
        iyy: attr_f64_or(e, "iyy", 0.0)?,
        iyz: attr_f64_or(e, "iyz", 0.0)?,
        izz: attr_f64_or(e, "izz", 0.0)?,
    })
}

/// Parse origin element attributes, both defaulting to zeros.
fn parse_origin(e: &BytesStart) -> Result<UrdfOrigin> {
    Ok(UrdfOrigin::new(
        attr_vec3_or(e, "xyz", Vector3::zeros())?,
        attr_vec3_or(e, "rpy", Vector3::zeros())?,
    ))
}

/// Parse a visual element.
fn parse_visual<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    link_name: &str,
) -> Result<UrdfVisual> {
    let name = optional_attr(start, "name")?;
    let mut origin: Option<UrdfOrigin> = None;
    let mut geometry: Option<UrdfGeometry> = None;
    let mut material: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let elem_name = e.name().as_ref().to_vec();
                match elem_name.as_slice() {
                    b"geometry" => {
                        geometry =
                            Some(parse_geometry(reader, &format!("visual of '{link_name}'"))?);
                    }
                    b"material" => {
                        material = optional_attr(e, "name")?;
                        skip_element(reader, &elem_name)?;
                    }
                    b"origin" => {
                        origin = Some(parse_origin(e)?);
                        skip_element(reader, &elem_name)?;
                    }
                    _ => skip_element(reader, &elem_name)?,
                }
            }
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"origin" => origin = Some(parse_origin(e)?),
                b"material" => material = optional_attr(e, "name")?,
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"visual" => break,
            Ok(Event::Eof) => return Err(UrdfError::XmlParse("unexpected EOF in visual".into())),
            Ok(_) => {}
            Err(e) => return Err(UrdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    let geometry =
        geometry.ok_or_else(|| UrdfError::missing_element("geometry", format!("visual of '{link_name}'")))?;

    Ok(UrdfVisual {
        name,
        origin,
        geometry,
        material,
    })
}

/// Parse a collision element.
fn parse_collision<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    link_name: &str,
) -> Result<UrdfCollision> {
    let name = optional_attr(start, "name")?;
    let mut origin: Option<UrdfOrigin> = None;
    let mut geometry: Option<UrdfGeometry> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let elem_name = e.name().as_ref().to_vec();
                match elem_name.as_slice() {
                    b"geometry" => {
                        geometry =
                            Some(parse_geometry(reader, &format!("collision of '{link_name}'"))?);
                    }
                    b"origin" => {
                        origin = Some(parse_origin(e)?);
                        skip_element(reader, &elem_name)?;
                    }
                    _ => skip_element(reader, &elem_name)?,
                }
            }
            Ok(Event::Empty(ref e)) => {
                if e.name().as_ref() == b"origin" {
                    origin = Some(parse_origin(e)?);
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"collision" => break,
            Ok(Event::Eof) => {
                return Err(UrdfError::XmlParse("unexpected EOF in collision".into()));
            }
            Ok(_) => {}
            Err(e) => return Err(UrdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    let geometry = geometry
        .ok_or_else(|| UrdfError::missing_element("geometry", format!("collision of '{link_name}'")))?;

    Ok(UrdfCollision {
        name,
        origin,
        geometry,
    })
}

/// Parse a geometry element, dispatching on which shape child is present.
fn parse_geometry<R: BufRead>(reader: &mut Reader<R>, context: &str) -> Result<UrdfGeometry> {
    let mut buf = Vec::new();
    let mut geometry: Option<UrdfGeometry> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => match e.name().as_ref() {
                b"box" => {
                    let size = attr_vec3_or(e, "size", Vector3::zeros())?;
                    geometry = Some(UrdfGeometry::Box { size });
                }
                b"cylinder" => {
                    geometry = Some(UrdfGeometry::Cylinder {
                        radius: attr_f64(e, "radius")?
                            .ok_or_else(|| UrdfError::missing_attribute("radius", "cylinder"))?,
                        length: attr_f64(e, "length")?
                            .ok_or_else(|| UrdfError::missing_attribute("length", "cylinder"))?,
                    });
                }
                b"sphere" => {
                    geometry = Some(UrdfGeometry::Sphere {
                        radius: attr_f64(e, "radius")?
                            .ok_or_else(|| UrdfError::missing_attribute("radius", "sphere"))?,
                    });
                }
                b"mesh" => {
                    geometry = Some(UrdfGeometry::Mesh {
                        filename: required_attr(e, "filename")?,
                        scale: attr_vec3_or(e, "scale", Vector3::new(1.0, 1.0, 1.0))?,
                    });
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"geometry" => break,
            Ok(Event::Eof) => return Err(UrdfError::XmlParse("unexpected EOF in geometry".into())),
            Ok(_) => {}
            Err(e) => return Err(UrdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    geometry.ok_or_else(|| UrdfError::UnknownGeometry {
        context: context.to_string(),
    })
}

/// Parse a joint element.
fn parse_joint<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<UrdfJoint> {
    let name = required_attr(start, "name")?;
    let type_str = required_attr(start, "type")?;
    let joint_type =
        UrdfJointType::from_str(&type_str).ok_or(UrdfError::UnknownJointType(type_str))?;

    let mut parent: Option<String> = None;
    let mut child: Option<String> = None;
    let mut origin: Option<UrdfOrigin> = None;
    let mut axis = Vector3::x();
    let mut limit: Option<UrdfJointLimit> = None;
    let mut dynamics: Option<UrdfJointDynamics> = None;
    let mut calibration_rising: Option<f64> = None;

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => {
                let elem_name = e.name().as_ref().to_vec();
                match elem_name.as_slice() {
                    b"parent" => parent = Some(required_attr(e, "link")?),
                    b"child" => child = Some(required_attr(e, "link")?),
                    b"origin" => origin = Some(parse_origin(e)?),
                    b"axis" => axis = attr_vec3_or(e, "xyz", Vector3::x())?,
                    b"limit" => {
                        limit = Some(UrdfJointLimit {
                            lower: attr_f64_or(e, "lower", 0.0)?,
                            upper: attr_f64_or(e, "upper", 0.0)?,
                            effort: attr_f64_or(e, "effort", 0.0)?,
                            velocity: attr_f64_or(e, "velocity", 0.0)?,
                        });
                    }
                    b"dynamics" => {
                        dynamics = Some(UrdfJointDynamics {
                            damping: attr_f64_or(e, "damping", 0.0)?,
                            friction: attr_f64_or(e, "friction", 0.0)?,
                        });
                    }
                    b"calibration" => calibration_rising = attr_f64(e, "rising")?,
                    // Recognized but irrelevant to the renderer.
                    b"mimic" | b"safety_controller" => {}
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"joint" => break,
            Ok(Event::Eof) => return Err(UrdfError::XmlParse("unexpected EOF in joint".into())),
            Ok(_) => {}
            Err(e) => return Err(UrdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    let parent =
        parent.ok_or_else(|| UrdfError::missing_element("parent", format!("joint '{name}'")))?;
    let child =
        child.ok_or_else(|| UrdfError::missing_element("child", format!("joint '{name}'")))?;

    Ok(UrdfJoint {
        name,
        joint_type,
        parent,
        child,
        origin,
        axis,
        limit,
        dynamics,
        calibration_rising,
    })
}

// ============================================================================
// Attribute helpers
// ============================================================================

/// Get a required string attribute.
fn required_attr(e: &BytesStart, name: &'static str) -> Result<String> {
    optional_attr(e, name)?.ok_or_else(|| UrdfError::missing_attribute(name, element_name(e)))
}

/// Get an optional string attribute.
fn optional_attr(e: &BytesStart, name: &str) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name.as_bytes() {
            return String::from_utf8(attr.value.to_vec())
                .map(Some)
                .map_err(|_| {
                    UrdfError::invalid_attribute(name, element_name(e), "<non-utf8>", "invalid UTF-8")
                });
        }
    }
    Ok(None)
}

/// Get an optional float attribute; malformed values are an error.
fn attr_f64(e: &BytesStart, name: &str) -> Result<Option<f64>> {
    match optional_attr(e, name)? {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<f64>().map(Some).map_err(|_| {
            UrdfError::invalid_attribute(name, element_name(e), raw, "expected a number")
        }),
    }
}

/// Get a float attribute with a default; malformed values are an error.
fn attr_f64_or(e: &BytesStart, name: &str, default: f64) -> Result<f64> {
    Ok(attr_f64(e, name)?.unwrap_or(default))
}

/// Get a whitespace-separated 3-vector attribute with a default.
///
/// The value must have exactly the arity of the default; malformed numbers
/// and wrong arity are both errors naming the attribute and raw value.
fn attr_vec3_or(e: &BytesStart, name: &str, default: Vector3<f64>) -> Result<Vector3<f64>> {
    match optional_attr(e, name)? {
        None => Ok(default),
        Some(raw) => {
            let parts: Vec<f64> = raw
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<std::result::Result<_, _>>()
                .map_err(|_| {
                    UrdfError::invalid_attribute(name, element_name(e), &raw, "expected numbers")
                })?;
            if parts.len() != 3 {
                return Err(UrdfError::invalid_attribute(
                    name,
                    element_name(e),
                    &raw,
                    format!("expected 3 values, got {}", parts.len()),
                ));
            }
            Ok(Vector3::new(parts[0], parts[1], parts[2]))
        }
    }
}

/// Get a whitespace-separated 4-component color attribute, if present.
fn attr_rgba(e: &BytesStart, name: &str) -> Result<Option<[f64; 4]>> {
    match optional_attr(e, name)? {
        None => Ok(None),
        Some(raw) => {
            let parts: Vec<f64> = raw
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<std::result::Result<_, _>>()
                .map_err(|_| {
                    UrdfError::invalid_attribute(name, element_name(e), &raw, "expected numbers")
                })?;
            if parts.len() != 4 {
                return Err(UrdfError::invalid_attribute(
                    name,
                    element_name(e),
                    &raw,
                    format!("expected 4 values, got {}", parts.len()),
                ));
            }
            Ok(Some([parts[0], parts[1], parts[2], parts[3]]))
        }
    }
}

/// Element name as a string for error messages.
fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

/// Skip an element and all its children.
fn skip_element<R: BufRead>(reader: &mut Reader<R>, name: &[u8]) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == name => depth += 1,
            Ok(Event::End(ref e)) if e.name().as_ref() == name => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(UrdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(())
}
