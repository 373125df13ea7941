//! Frame-to-frame camera velocity, as consumed by motion blur.

use serde::Serialize;

use crate::models::camera::Point;

/// Camera placement of one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraPose {
    pub timeline_ms: f64,
    pub center: Point,
    pub scale: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraMotion {
    /// On-screen content motion in output pixels per second.
    pub pan_px_per_s: Point,
    /// Scale change per second.
    pub zoom_per_s: f64,
}

/// Motion between `previous` and `current`. Content moves opposite to the
/// camera, magnified by the current scale. Zero for non-increasing time.
pub fn camera_motion(
    previous: &CameraPose,
    current: &CameraPose,
    output_size: (u32, u32),
) -> CameraMotion {
    let dt_s = (current.timeline_ms - previous.timeline_ms) / 1_000.0;
    if !(dt_s.is_finite() && dt_s > 0.0) {
        return CameraMotion::default();
    }

    let scale = if current.scale.is_finite() {
        current.scale.max(1.0)
    } else {
        1.0
    };
    let delta = previous.center - current.center;
    let pan = Point::new(
        delta.x * output_size.0 as f64 * scale / dt_s,
        delta.y * output_size.1 as f64 * scale / dt_s,
    );
    let zoom = (current.scale - previous.scale) / dt_s;

    CameraMotion {
        pan_px_per_s: pan.or_finite(Point::ZERO),
        zoom_per_s: if zoom.is_finite() { zoom } else { 0.0 },
    }
}
