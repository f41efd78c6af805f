//! YAML demo manifest: what to load, how to look at it, how long to run.

use std::path::{Path, PathBuf};

use anyhow::Context;
use glam::Vec3;
use rtgl_camera::CameraKind;
use rtgl_common::Viewport;
use rtgl_scene::ObjectAttributes;
use rtgl_transforms::Projection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoManifest {
    pub canvas: Viewport,
    pub camera: CameraConfig,
    pub projection: Projection,
    /// Built-in shaders when absent.
    pub shaders: Option<ShaderPaths>,
    /// Root for model paths, relative to the manifest.
    pub assets: PathBuf,
    pub models: Vec<ModelEntry>,
    pub floor: Option<FloorShape>,
    /// Axis half length.
    pub axis: Option<f32>,
    pub frames: u32,
    pub frame_ms: u64,
    /// Azimuth degrees added per simulation step.
    pub orbit: f32,
    /// Written as single-key maps, `- last: floor`.
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub reorder: Vec<ReorderOp>,
}

impl Default for DemoManifest {
    fn default() -> Self {
        Self {
            canvas: Viewport::default(),
            camera: CameraConfig::default(),
            projection: Projection::default(),
            shaders: None,
            assets: PathBuf::from("."),
            models: Vec::new(),
            floor: None,
            axis: None,
            frames: 60,
            frame_ms: 16,
            orbit: 0.0,
            reorder: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub kind: CameraKind,
    pub home: Vec3,
    pub focus: Vec3,
    pub fov: f32,
    pub azimuth: f32,
    pub elevation: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            kind: CameraKind::Orbiting,
            home: Vec3::new(0.0, 0.0, 10.0),
            focus: Vec3::ZERO,
            fov: 45.0,
            azimuth: 0.0,
            elevation: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

/// One model file, or a model split into `{path}1.json` .. `{path}{parts}.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub path: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub parts: Option<usize>,
    #[serde(flatten)]
    pub attributes: ObjectAttributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorShape {
    pub dimension: f32,
    pub lines: u32,
}

/// A draw-order change applied after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderOp {
    First(String),
    Last(String),
    Sooner(String),
    Later(String),
    Remove(String),
}

impl DemoManifest {
    pub fn parse(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("invalid demo manifest")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        Self::parse(&yaml)
    }
}
