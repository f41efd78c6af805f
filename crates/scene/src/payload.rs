use rtgl_common::Rgba;
use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// A model as it is stored on disk.
///
/// Everything except the geometry is optional; [`SceneGraph::add`] fills in
/// defaults for absent material fields.
///
/// [`SceneGraph::add`]: crate::SceneGraph::add
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub vertices: Vec<f32>,
    pub indices: Vec<u16>,
    /// Per-vertex RGBA.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scalars: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture_coords: Option<Vec<f32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diffuse: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specular: Option<Rgba>,
    #[serde(rename = "Ka", default, skip_serializing_if = "Option::is_none")]
    pub ka: Option<[f32; 3]>,
    #[serde(rename = "Kd", default, skip_serializing_if = "Option::is_none")]
    pub kd: Option<[f32; 3]>,
    #[serde(rename = "Ks", default, skip_serializing_if = "Option::is_none")]
    pub ks: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specular_exponent: Option<f32>,
    #[serde(rename = "Ns", default, skip_serializing_if = "Option::is_none")]
    pub ns: Option<f32>,
    /// MTL dissolve; the fallback for `transparency`.
    #[serde(rename = "d", default, skip_serializing_if = "Option::is_none")]
    pub dissolve: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparency: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub illum: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wireframe: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

impl ModelPayload {
    pub fn from_json(bytes: &[u8]) -> Result<Self, LoadError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Check the geometry is consistent before anything touches the GPU.
    pub fn validate(&self) -> Result<(), LoadError> {
        let invalid = |reason: String| Err(LoadError::InvalidPayload(reason));

        if self.vertices.len() % 3 != 0 {
            return invalid(format!(
                "{} vertex components is not a multiple of 3",
                self.vertices.len()
            ));
        }
        let count = self.vertex_count();
        if count > usize::from(u16::MAX) + 1 {
            return invalid(format!("{count} vertices exceed 16-bit indexing"));
        }
        if let Some(&index) = self.indices.iter().find(|&&i| usize::from(i) >= count) {
            return invalid(format!("index {index} out of range for {count} vertices"));
        }
        if let Some(scalars) = &self.scalars {
            if scalars.len() != count * 4 {
                return invalid(format!(
                    "{} colour components for {count} vertices",
                    scalars.len()
                ));
            }
        }
        if let Some(coords) = &self.texture_coords {
            if coords.len() != count * 2 {
                return invalid(format!(
                    "{} texture coordinate components for {count} vertices",
                    coords.len()
                ));
            }
        }
        Ok(())
    }
}

/// Overrides applied after defaults are filled, like a per-call material tweak.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectAttributes {
    pub alias: Option<String>,
    pub ambient: Option<Rgba>,
    pub diffuse: Option<Rgba>,
    pub specular: Option<Rgba>,
    pub ka: Option<[f32; 3]>,
    pub kd: Option<[f32; 3]>,
    pub ks: Option<[f32; 3]>,
    pub specular_exponent: Option<f32>,
    pub transparency: Option<f32>,
    pub illumination_model: Option<u32>,
    pub wireframe: Option<bool>,
    pub visible: Option<bool>,
}
