//! COLLADA (`.dae`) asset loading.
//!
//! Reads the subset of COLLADA that robot-description assets use: geometry
//! libraries with triangle primitives, and visual-scene nodes that place
//! those geometries with a 4x4 transform.
//!
//! # Supported structure
//!
//! ```text
//! <library_effects>
//!   <effect id>
//!     ... <emission|ambient|diffuse|specular><color>r g b a</color>
//!     ... <shininess><float>s</float>
//! <library_materials>
//!   <material id><instance_effect url="#..."/></material>
//! <library_geometries>
//!   <geometry id>
//!     <mesh>
//!       <source id><float_array>...</float_array></source>
//!       <vertices id><input semantic="POSITION" source="#..."/></vertices>
//!       <triangles material><input .../><p>...</p></triangles>
//! <library_visual_scenes>
//!   <node id>
//!     <matrix>16 row-major floats</matrix>
//!     <instance_geometry url="#...">
//!       <instance_material symbol target="#..."/>
//! ```
//!
//! # Limitations
//!
//! - `polylist` and `tristrips` primitives are not supported
//! - Nested node transforms are not composed; each node's own matrix is
//!   taken as its placement (robot assets author one level of nodes)
//! - Normals are attached only when they share the vertex index stream;
//!   otherwise they are dropped and the renderer recomputes them

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use nalgebra::{Matrix4, Vector3};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use scene_types::{Material, Rgba};

use crate::error::{AssetError, AssetResult};

/// One triangle primitive of an asset node.
#[derive(Debug, Clone)]
pub struct AssetPrimitive {
    /// Bound material identifier, if any.
    pub material: Option<String>,
    /// Vertex positions in the asset's authoring frame.
    pub positions: Vec<Vector3<f64>>,
    /// Per-vertex normals, or empty.
    pub normals: Vec<Vector3<f64>>,
    /// Triangle list indices into `positions`.
    pub indices: Vec<u32>,
}

/// A placed geometry node from the asset's visual scene.
#[derive(Debug, Clone)]
pub struct AssetNode {
    /// Node identifier.
    pub id: String,
    /// Node placement as a row-major 4x4 transform.
    pub transform: Matrix4<f64>,
    /// Triangle primitives instanced under this node.
    pub primitives: Vec<AssetPrimitive>,
}

/// Everything loaded from one COLLADA file: placed nodes plus the
/// materials their primitives reference.
#[derive(Debug, Clone, Default)]
pub struct AssetDocument {
    /// Placed geometry nodes, in document order.
    pub nodes: Vec<AssetNode>,
    /// Materials declared by the asset, in document order.
    pub materials: Vec<Material>,
}

/// Load a COLLADA file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its content is not the
/// supported COLLADA subset.
pub fn load_dae(path: impl AsRef<Path>) -> AssetResult<AssetDocument> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AssetError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            AssetError::Io(e)
        }
    })?;
    parse_dae_str(&content)
}

/// Triangle primitive being accumulated while inside `<triangles>`.
#[derive(Debug, Default)]
struct PendingTriangles {
    material_symbol: Option<String>,
    /// `(semantic, source url, offset)` per `<input>`.
    inputs: Vec<(String, String, usize)>,
    indices: Vec<u32>,
}

/// Geometry node being accumulated while inside `<node>`.
#[derive(Debug)]
struct PendingNode {
    id: String,
    transform: Matrix4<f64>,
    primitives: Vec<AssetPrimitive>,
}

/// Raw primitive attached to a geometry before scene placement.
#[derive(Debug, Clone)]
struct GeometryPrimitive {
    material_symbol: Option<String>,
    positions: Vec<Vector3<f64>>,
    normals: Vec<Vector3<f64>>,
    indices: Vec<u32>,
}

/// Color and shininess channels accumulated for one effect.
#[derive(Debug, Clone)]
struct EffectChannels {
    emission: Rgba,
    ambient: Rgba,
    diffuse: Rgba,
    specular: Rgba,
    shininess: f64,
}

impl Default for EffectChannels {
    fn default() -> Self {
        Self {
            emission: [0.0; 4],
            ambient: [0.0; 4],
            diffuse: [0.0; 4],
            specular: [0.0; 4],
            shininess: 0.0,
        }
    }
}

/// Parse COLLADA content into placed geometry nodes and materials.
///
/// # Errors
///
/// Returns an error if the XML is malformed or references do not resolve.
pub fn parse_dae_str(content: &str) -> AssetResult<AssetDocument> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    // Geometry library state.
    let mut sources: HashMap<String, Vec<f64>> = HashMap::new();
    let mut vertices_map: HashMap<String, String> = HashMap::new();
    let mut geometries: HashMap<String, Vec<GeometryPrimitive>> = HashMap::new();

    let mut current_geometry: Option<String> = None;
    let mut current_source: Option<String> = None;
    let mut current_vertices: Option<String> = None;
    let mut triangles: Option<PendingTriangles> = None;
    let mut in_float_array = false;
    let mut in_p = false;
    let mut in_matrix = false;

    // Effect and material library state.
    let mut effects: HashMap<String, EffectChannels> = HashMap::new();
    let mut material_effects: Vec<(String, String)> = Vec::new();
    let mut current_effect: Option<String> = None;
    let mut current_material: Option<String> = None;
    let mut current_channel: Option<Vec<u8>> = None;
    let mut in_color = false;
    let mut in_shininess_float = false;

    // Visual scene state.
    let mut node_stack: Vec<PendingNode> = Vec::new();
    let mut pending_instance: Option<(String, HashMap<String, String>)> = None;
    let mut nodes: Vec<AssetNode> = Vec::new();

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"geometry" => current_geometry = attr(e, "id"),
                b"source" => current_source = attr(e, "id"),
                b"float_array" => in_float_array = true,
                b"vertices" => current_vertices = attr(e, "id"),
                b"input" => handle_input(e, &current_vertices, &mut vertices_map, &mut triangles),
                b"triangles" => {
                    triangles = Some(PendingTriangles {
                        material_symbol: attr(e, "material"),
                        ..PendingTriangles::default()
                    });
                }
                b"p" => in_p = true,
                b"matrix" => in_matrix = true,
                b"effect" => {
                    if let Some(id) = attr(e, "id") {
                        effects.insert(id.clone(), EffectChannels::default());
                        current_effect = Some(id);
                    }
                }
                b"emission" | b"ambient" | b"diffuse" | b"specular" | b"shininess" => {
                    if current_effect.is_some() {
                        current_channel = Some(e.name().as_ref().to_vec());
                    }
                }
                b"color" => in_color = true,
                b"float" => in_shininess_float = true,
                b"material" => current_material = attr(e, "id").or_else(|| attr(e, "name")),
                b"node" => node_stack.push(PendingNode {
                    id: attr(e, "id").or_else(|| attr(e, "name")).unwrap_or_default(),
                    transform: Matrix4::identity(),
                    primitives: Vec::new(),
                }),
                b"instance_geometry" => {
                    let url = attr(e, "url").unwrap_or_default();
                    pending_instance = Some((url, HashMap::new()));
                }
                b"instance_material" => {
                    if let (Some((_, bindings)), Some(symbol)) =
                        (pending_instance.as_mut(), attr(e, "symbol"))
                    {
                        let target = attr(e, "target").unwrap_or_default();
                        bindings.insert(symbol, strip_url(&target).to_string());
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"input" => handle_input(e, &current_vertices, &mut vertices_map, &mut triangles),
                b"instance_material" => {
                    if let (Some((_, bindings)), Some(symbol)) =
                        (pending_instance.as_mut(), attr(e, "symbol"))
                    {
                        let target = attr(e, "target").unwrap_or_default();
                        bindings.insert(symbol, strip_url(&target).to_string());
                    }
                }
                b"instance_geometry" => {
                    let url = attr(e, "url").unwrap_or_default();
                    instance_geometry(
                        &url,
                        &HashMap::new(),
                        &geometries,
                        node_stack.last_mut(),
                    )?;
                }
                b"instance_effect" => {
                    if let (Some(material), Some(url)) = (&current_material, attr(e, "url")) {
                        material_effects.push((material.clone(), strip_url(&url).to_string()));
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| AssetError::XmlParse(e.to_string()))?;
                if in_float_array {
                    if let Some(id) = current_source.clone() {
                        sources.insert(id, parse_floats(&text)?);
                    }
                } else if in_p {
                    if let Some(tri) = triangles.as_mut() {
                        tri.indices = parse_indices(&text)?;
                    }
                } else if in_matrix {
                    if let Some(node) = node_stack.last_mut() {
                        node.transform = parse_matrix(&text)?;
                    }
                } else if in_color || in_shininess_float {
                    if let (Some(effect), Some(channel)) = (&current_effect, &current_channel) {
                        if let Some(channels) = effects.get_mut(effect) {
                            apply_channel(channels, channel, &text)?;
                        }
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"geometry" => current_geometry = None,
                b"source" => current_source = None,
                b"float_array" => in_float_array = false,
                b"vertices" => current_vertices = None,
                b"p" => in_p = false,
                b"matrix" => in_matrix = false,
                b"effect" => current_effect = None,
                b"material" => current_material = None,
                b"emission" | b"ambient" | b"diffuse" | b"specular" | b"shininess" => {
                    current_channel = None;
                }
                b"color" => in_color = false,
                b"float" => in_shininess_float = false,
                b"triangles" => {
                    if let (Some(tri), Some(geom_id)) = (triangles.take(), &current_geometry) {
                        let prim = finish_triangles(tri, &sources, &vertices_map)?;
                        geometries.entry(geom_id.clone()).or_default().push(prim);
                    }
                }
                b"instance_geometry" => {
                    if let Some((url, bindings)) = pending_instance.take() {
                        instance_geometry(&url, &bindings, &geometries, node_stack.last_mut())?;
                    }
                }
                b"node" => {
                    if let Some(node) = node_stack.pop() {
                        if !node.primitives.is_empty() {
                            nodes.push(AssetNode {
                                id: node.id,
                                transform: node.transform,
                                primitives: node.primitives,
                            });
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(AssetError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    let materials = material_effects
        .into_iter()
        .map(|(name, effect_id)| {
            let channels = effects.get(&effect_id).cloned().unwrap_or_default();
            Material {
                name,
                emission: channels.emission,
                ambient: channels.ambient,
                diffuse: channels.diffuse,
                specular: channels.specular,
                shininess: channels.shininess,
            }
        })
        .collect();

    Ok(AssetDocument { nodes, materials })
}

/// Apply one channel value (a 4-component color or a shininess float) to
/// an effect under construction.
fn apply_channel(channels: &mut EffectChannels, channel: &[u8], text: &str) -> AssetResult<()> {
    if channel == b"shininess" {
        channels.shininess = text.trim().parse::<f64>().map_err(|_| {
            AssetError::invalid_content(format!("invalid shininess value: {text:?}"))
        })?;
        return Ok(());
    }

    let floats = parse_floats(text)?;
    if floats.len() != 4 {
        return Err(AssetError::invalid_content(format!(
            "expected 4 color components, got {}",
            floats.len()
        )));
    }
    let color: Rgba = [floats[0], floats[1], floats[2], floats[3]];
    match channel {
        b"emission" => channels.emission = color,
        b"ambient" => channels.ambient = color,
        b"diffuse" => channels.diffuse = color,
        b"specular" => channels.specular = color,
        _ => {}
    }
    Ok(())
}

/// Record an `<input>` element in whichever context it appears.
fn handle_input(
    e: &BytesStart,
    current_vertices: &Option<String>,
    vertices_map: &mut HashMap<String, String>,
    triangles: &mut Option<PendingTriangles>,
) {
    let semantic = attr(e, "semantic").unwrap_or_default();
    let source = attr(e, "source").unwrap_or_default();

    if let Some(tri) = triangles.as_mut() {
        let offset = attr(e, "offset")
            .and_then(|o| o.parse().ok())
            .unwrap_or(0usize);
        tri.inputs
            .push((semantic, strip_url(&source).to_string(), offset));
    } else if let Some(vid) = current_vertices {
        if semantic == "POSITION" {
            vertices_map.insert(vid.clone(), strip_url(&source).to_string());
        }
    }
}

/// Resolve a finished `<triangles>` block against the collected sources.
fn finish_triangles(
    tri: PendingTriangles,
    sources: &HashMap<String, Vec<f64>>,
    vertices_map: &HashMap<String, String>,
) -> AssetResult<GeometryPrimitive> {
    let stride = tri
        .inputs
        .iter()
        .map(|(_, _, offset)| offset + 1)
        .max()
        .unwrap_or(1);

    let (_, vertex_source, vertex_offset) = tri
        .inputs
        .iter()
        .find(|(semantic, _, _)| semantic == "VERTEX")
        .ok_or_else(|| AssetError::invalid_content("triangles without a VERTEX input"))?;

    let position_source = vertices_map
        .get(vertex_source)
        .unwrap_or(vertex_source);
    let positions = sources
        .get(position_source)
        .map(|floats| to_vec3s(floats))
        .ok_or_else(|| AssetError::MissingGeometry {
            url: position_source.clone(),
        })?;

    let indices: Vec<u32> = tri
        .indices
        .iter()
        .skip(*vertex_offset)
        .step_by(stride)
        .copied()
        .collect();

    // Normals only survive when they share the vertex index stream.
    let normals = tri
        .inputs
        .iter()
        .find(|(semantic, _, _)| semantic == "NORMAL")
        .and_then(|(_, source, offset)| {
            let floats = sources.get(source)?;
            let normals = to_vec3s(floats);
            if offset == vertex_offset && normals.len() == positions.len() {
                Some(normals)
            } else {
                tracing::warn!(
                    source = source.as_str(),
                    "dropping normals with their own index stream"
                );
                None
            }
        })
        .unwrap_or_default();

    Ok(GeometryPrimitive {
        material_symbol: tri.material_symbol,
        positions,
        normals,
        indices,
    })
}

/// Attach a geometry instance to the enclosing node.
fn instance_geometry(
    url: &str,
    bindings: &HashMap<String, String>,
    geometries: &HashMap<String, Vec<GeometryPrimitive>>,
    node: Option<&mut PendingNode>,
) -> AssetResult<()> {
    let Some(node) = node else {
        return Ok(());
    };

    let id = strip_url(url);
    let prims = geometries.get(id).ok_or_else(|| AssetError::MissingGeometry {
        url: url.to_string(),
    })?;

    for prim in prims {
        let material = prim
            .material_symbol
            .as_ref()
            .map(|symbol| bindings.get(symbol).cloned().unwrap_or_else(|| symbol.clone()));
        node.primitives.push(AssetPrimitive {
            material,
            positions: prim.positions.clone(),
            normals: prim.normals.clone(),
            indices: prim.indices.clone(),
        });
    }

    Ok(())
}

/// Get an attribute value as a string.
fn attr(e: &BytesStart, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name.as_bytes() {
            return String::from_utf8(attr.value.to_vec()).ok();
        }
    }
    None
}

/// Drop a leading `#` from a url reference.
fn strip_url(url: &str) -> &str {
    url.strip_prefix('#').unwrap_or(url)
}

/// Parse a whitespace-separated float list.
fn parse_floats(text: &str) -> AssetResult<Vec<f64>> {
    text.split_whitespace()
        .map(|t| {
            t.parse::<f64>()
                .map_err(|_| AssetError::invalid_content(format!("invalid float: {t:?}")))
        })
        .collect()
}

/// Parse a whitespace-separated index list.
fn parse_indices(text: &str) -> AssetResult<Vec<u32>> {
    text.split_whitespace()
        .map(|t| {
            t.parse::<u32>()
                .map_err(|_| AssetError::invalid_content(format!("invalid index: {t:?}")))
        })
        .collect()
}

/// Parse 16 row-major floats into a transform.
fn parse_matrix(text: &str) -> AssetResult<Matrix4<f64>> {
    let floats = parse_floats(text)?;
    if floats.len() != 16 {
        return Err(AssetError::invalid_content(format!(
            "expected 16 matrix values, got {}",
            floats.len()
        )));
    }
    Ok(Matrix4::from_row_slice(&floats))
}

/// Group a flat float list into 3-vectors.
fn to_vec3s(floats: &[f64]) -> Vec<Vector3<f64>> {
    floats
        .chunks_exact(3)
        .map(|c| Vector3::new(c[0], c[1], c[2]))
        .collect()
}
