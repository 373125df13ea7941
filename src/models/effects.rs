//! Generic timeline effect list (effects.json / project `effects`).
//!
//! Only `zoom` and `crop` entries are read by the camera; every other kind is
//! carried through untouched.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::camera::{AutoScale, FollowStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Zoom,
    Crop,
    Background,
    Cursor,
    Keystroke,
    Annotation,
    #[serde(other)]
    Unknown,
}

/// One timeline effect. `data` is kind-specific and decoded lazily.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EffectKind,
    /// Timeline milliseconds.
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub data: serde_json::Value,
}

fn default_enabled() -> bool {
    true
}

/// Raw zoom payload. Every field is optional so that partially written or
/// corrupt projects still load; the parser fills in safe defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZoomEffectData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_scale: Option<AutoScale>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outro_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_strategy: Option<FollowStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoothing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mouse_idle_px: Option<f64>,
}

/// Crop rectangle in normalized source coordinates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CropEffectData {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl Effect {
    pub fn zoom(start_time: f64, end_time: f64, data: ZoomEffectData) -> Self {
        Self::with_data(EffectKind::Zoom, start_time, end_time, &data)
    }

    pub fn crop(start_time: f64, end_time: f64, data: CropEffectData) -> Self {
        Self::with_data(EffectKind::Crop, start_time, end_time, &data)
    }

    fn with_data<T: Serialize>(kind: EffectKind, start_time: f64, end_time: f64, data: &T) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            start_time,
            end_time,
            enabled: true,
            data: serde_json::to_value(data).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Decodes the zoom payload. Undecodable data yields defaults.
    pub fn zoom_data(&self) -> Option<ZoomEffectData> {
        if self.kind != EffectKind::Zoom {
            return None;
        }
        Some(decode_or_default(&self.id, &self.data))
    }

    pub fn crop_data(&self) -> Option<CropEffectData> {
        if self.kind != EffectKind::Crop {
            return None;
        }
        Some(decode_or_default(&self.id, &self.data))
    }
}

fn decode_or_default<T>(id: &str, data: &serde_json::Value) -> T
where
    T: for<'de> Deserialize<'de> + Default,
{
    if data.is_null() {
        return T::default();
    }
    match serde_json::from_value(data.clone()) {
        Ok(decoded) => decoded,
        Err(err) => {
            log::warn!("decode_effect_data: id={id} falling back to defaults: {err}");
            T::default()
        }
    }
}
