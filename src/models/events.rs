//! Pointer sample stream (mouse-events.json).
//! schemaVersion: 1

use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// One pointer event. Coordinates are source pixels, `ts` is source milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PointerEvent {
    Move {
        ts: f64,
        x: f64,
        y: f64,
    },
    Click {
        ts: f64,
        x: f64,
        y: f64,
        button: MouseButton,
    },
    MouseUp {
        ts: f64,
        x: f64,
        y: f64,
        button: MouseButton,
    },
}

impl PointerEvent {
    pub fn ts(&self) -> f64 {
        match self {
            PointerEvent::Move { ts, .. }
            | PointerEvent::Click { ts, .. }
            | PointerEvent::MouseUp { ts, .. } => *ts,
        }
    }

    pub fn position(&self) -> (f64, f64) {
        match self {
            PointerEvent::Move { x, y, .. }
            | PointerEvent::Click { x, y, .. }
            | PointerEvent::MouseUp { x, y, .. } => (*x, *y),
        }
    }
}

/// Root container of mouse-events.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseEventsFile {
    pub schema_version: u32,
    /// Must match the project's recording id.
    pub recording_id: String,
    /// Source resolution the coordinates refer to.
    pub screen_width: u32,
    pub screen_height: u32,
    pub events: Vec<PointerEvent>,
}
