//! Errors for the fallible edges of the crate: project IO, effect ingestion,
//! export workers. The per-frame engine itself never fails.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported {file} schemaVersion: expected {expected}, got {found}")]
    UnsupportedSchema {
        file: &'static str,
        expected: u32,
        found: u32,
    },

    /// Two zoom blocks share part of the timeline.
    #[error("Zoom blocks {first} [{first_start}, {first_end}) and {second} [{second_start}, {second_end}) overlap")]
    OverlappingZoomBlocks {
        first: String,
        first_start: f64,
        first_end: f64,
        second: String,
        second_start: f64,
        second_end: f64,
    },

    #[error("Invalid {what} dimensions {width}x{height}")]
    InvalidDimensions {
        what: &'static str,
        width: u32,
        height: u32,
    },

    #[error("Events file belongs to recording {found}, project expects {expected}")]
    RecordingMismatch { expected: String, found: String },

    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(f64),

    #[error("Export worker failed: {0}")]
    Worker(String),
}

pub type CameraResult<T> = Result<T, CameraError>;
