//! Camera project file (camera-project.json).
//! schemaVersion: 1

use serde::{Deserialize, Serialize};

use crate::algorithm::camera_engine::EngineConfig;
use crate::models::camera::{CameraDynamics, CursorGlyph, NormalizedRect, Overscan};
use crate::models::effects::Effect;

pub const SCHEMA_VERSION: u32 = 1;

/// Source recording the effects refer to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingInfo {
    pub id: String,
    /// Source video resolution, in pixels.
    pub width: u32,
    pub height: u32,
    pub duration_ms: f64,
}

/// Rendered output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSettings {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: f64,
}

fn default_fps() -> f64 {
    60.0
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FramingSettings {
    pub overscan: Overscan,
    /// Where the recording sits inside a device mockup, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mockup: Option<NormalizedRect>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraSettings {
    pub dynamics: CameraDynamics,
    pub cursor_glyph: CursorGlyph,
}

/// Root container of camera-project.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraProject {
    pub schema_version: u32,
    pub id: String,
    pub name: String,
    pub recording: RecordingInfo,
    /// Relative to the project file.
    pub events_path: String,
    #[serde(default)]
    pub effects: Vec<Effect>,
    pub output: OutputSettings,
    #[serde(default)]
    pub framing: FramingSettings,
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub engine: EngineConfig,
}
