//! Render materials.

use serde::{Deserialize, Serialize};

/// An RGBA color channel, components in `[0, 1]`.
pub type Rgba = [f64; 4];

/// A render material.
///
/// Optional per mesh fragment; fragments without a material fall back to
/// the renderer's default. Channels mirror the common fixed-function set
/// carried by asset libraries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Material name, referenced by [`crate::MeshFragment::material`].
    pub name: String,
    /// Emissive color.
    pub emission: Rgba,
    /// Ambient color.
    pub ambient: Rgba,
    /// Diffuse color.
    pub diffuse: Rgba,
    /// Specular color.
    pub specular: Rgba,
    /// Specular exponent.
    pub shininess: f64,
}

impl Material {
    /// A matte material with the given name and diffuse color.
    #[must_use]
    pub fn diffuse(name: impl Into<String>, diffuse: Rgba) -> Self {
        Self {
            name: name.into(),
            emission: [0.0; 4],
            ambient: [0.0; 4],
            diffuse,
            specular: [0.0; 4],
            shininess: 0.0,
        }
    }
}
