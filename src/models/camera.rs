//! Camera data model: zoom directives, physics state, per-frame input/output.

use serde::{Deserialize, Serialize};

use crate::algorithm::cursor_signal::CursorSignal;

/// 2D point or vector. Normalized source space unless stated otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const CENTER: Point = Point { x: 0.5, y: 0.5 };
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Replaces non-finite components with the matching component of `fallback`.
    pub fn or_finite(self, fallback: Point) -> Point {
        Point {
            x: if self.x.is_finite() { self.x } else { fallback.x },
            y: if self.y.is_finite() { self.y } else { fallback.y },
        }
    }
}

impl std::ops::Add for Point {
    type Output = Point;
    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

impl std::ops::Mul<f64> for Point {
    type Output = Point;
    fn mul(self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }
}

/// Rectangle in normalized coordinates (0.0–1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for NormalizedRect {
    fn default() -> Self {
        Self::FULL
    }
}

impl NormalizedRect {
    pub const FULL: NormalizedRect = NormalizedRect {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    pub fn right(self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(self) -> f64 {
        self.y + self.height
    }

    /// `None` for empty or non-finite rectangles.
    pub fn valid(self) -> Option<NormalizedRect> {
        let finite = self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite();
        (finite && self.width > 0.0 && self.height > 0.0).then_some(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoScale {
    #[default]
    Fixed,
    Fill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowStrategy {
    #[default]
    Mouse,
    Center,
    Manual,
}

/// A parsed, sanitized zoom block. Times are timeline milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomDirective {
    pub id: String,
    pub start_time: f64,
    pub end_time: f64,
    /// Fixed scale, always >= 1. Ignored when `auto_scale` is `Fill`.
    pub scale: f64,
    pub auto_scale: AutoScale,
    pub intro_ms: f64,
    pub outro_ms: f64,
    pub follow_strategy: FollowStrategy,
    /// Manual target already divided by the reference screen size.
    pub manual_target: Option<Point>,
    /// 0–100.
    pub smoothing: f64,
    pub mouse_idle_px: f64,
}

impl ZoomDirective {
    pub fn contains(&self, timeline_ms: f64) -> bool {
        timeline_ms >= self.start_time && timeline_ms < self.end_time
    }

    /// Center strategy and fill mode pin the camera to the middle of the frame.
    pub fn is_center_locked(&self) -> bool {
        self.follow_strategy == FollowStrategy::Center || self.auto_scale == AutoScale::Fill
    }

    pub fn follows_cursor(&self) -> bool {
        if self.is_center_locked() {
            return false;
        }
        match self.follow_strategy {
            FollowStrategy::Mouse => true,
            FollowStrategy::Manual => self.manual_target.is_none(),
            FollowStrategy::Center => false,
        }
    }
}

/// Extra margin around the output frame, as fractions of the content size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Overscan {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Overscan {
    pub fn sanitized(self) -> Overscan {
        let clean = |value: f64| if value.is_finite() { value.max(0.0) } else { 0.0 };
        Overscan {
            left: clean(self.left),
            right: clean(self.right),
            top: clean(self.top),
            bottom: clean(self.bottom),
        }
    }

    pub fn is_zero(self) -> bool {
        let clean = self.sanitized();
        clean.left == 0.0 && clean.right == 0.0 && clean.top == 0.0 && clean.bottom == 0.0
    }
}

/// Spring parameters for camera position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpringParams {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
}

impl Default for SpringParams {
    fn default() -> Self {
        CameraDynamics::LegacySmoothness(DEFAULT_LEGACY_SMOOTHNESS).spring()
    }
}

const DEFAULT_LEGACY_SMOOTHNESS: f64 = 50.0;
const LEGACY_STIFFNESS_SHARP: f64 = 320.0;
const LEGACY_STIFFNESS_SMOOTH: f64 = 40.0;

/// Camera dynamics as configured by the user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CameraDynamics {
    Spring(SpringParams),
    LegacySmoothness(f64),
}

impl Default for CameraDynamics {
    fn default() -> Self {
        CameraDynamics::LegacySmoothness(DEFAULT_LEGACY_SMOOTHNESS)
    }
}

impl CameraDynamics {
    pub fn spring(self) -> SpringParams {
        match self {
            CameraDynamics::Spring(params) => SpringParams {
                stiffness: finite_or(params.stiffness, LEGACY_STIFFNESS_SMOOTH).max(0.0001),
                damping: finite_or(params.damping, 0.0).max(0.0),
                mass: finite_or(params.mass, 1.0).max(0.0001),
            },
            CameraDynamics::LegacySmoothness(smoothness) => {
                let t = finite_or(smoothness, DEFAULT_LEGACY_SMOOTHNESS).clamp(0.0, 100.0) / 100.0;
                let stiffness =
                    LEGACY_STIFFNESS_SHARP + (LEGACY_STIFFNESS_SMOOTH - LEGACY_STIFFNESS_SHARP) * t;
                let mass = 1.0;
                SpringParams {
                    stiffness,
                    damping: 2.0 * (stiffness * mass).sqrt(),
                    mass,
                }
            }
        }
    }
}

/// Cursor glyph size and hotspot in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CursorGlyph {
    pub width_px: f64,
    pub height_px: f64,
    pub hotspot_x_px: f64,
    pub hotspot_y_px: f64,
    /// Relative cursor size (1.0 = native).
    pub size: f64,
}

impl Default for CursorGlyph {
    fn default() -> Self {
        Self {
            width_px: 24.0,
            height_px: 32.0,
            hotspot_x_px: 2.0,
            hotspot_y_px: 2.0,
            size: 1.0,
        }
    }
}

/// Physical camera state carried between interactive frames.
///
/// Passed by value into `compute_camera` and returned updated; the engine
/// never mutates a caller-owned instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraPhysicsState {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub scale: f64,
    pub last_time_ms: Option<f64>,
    pub last_source_time_ms: Option<f64>,
    pub cursor_stopped_at_ms: Option<f64>,
    pub frozen_target: Option<Point>,
}

impl Default for CameraPhysicsState {
    fn default() -> Self {
        Self {
            x: 0.5,
            y: 0.5,
            vx: 0.0,
            vy: 0.0,
            scale: 1.0,
            last_time_ms: None,
            last_source_time_ms: None,
            cursor_stopped_at_ms: None,
            frozen_target: None,
        }
    }
}

impl CameraPhysicsState {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn velocity(&self) -> Point {
        Point::new(self.vx, self.vy)
    }

    /// At rest on `center`, as rebuilt for every deterministic frame.
    pub fn settled_at(center: Point, scale: f64, timeline_ms: f64, source_time_ms: f64) -> Self {
        Self {
            x: center.x,
            y: center.y,
            scale,
            last_time_ms: Some(timeline_ms),
            last_source_time_ms: Some(source_time_ms),
            ..Self::default()
        }
    }
}

/// Everything one `compute_camera` call needs.
#[derive(Clone, Copy)]
pub struct CameraComputeInput<'a> {
    pub directives: &'a [ZoomDirective],
    pub timeline_ms: f64,
    pub source_time_ms: f64,
    pub cursor: Option<&'a dyn CursorSignal>,
    pub source_width: u32,
    pub source_height: u32,
    pub output_width: u32,
    pub output_height: u32,
    pub overscan: Overscan,
    pub mockup: Option<NormalizedRect>,
    /// Crop rectangle active at `timeline_ms`, in normalized source space.
    pub crop: Option<NormalizedRect>,
    pub cursor_glyph: CursorGlyph,
    pub force_follow_cursor: bool,
    pub physics: &'a CameraPhysicsState,
    pub deterministic: bool,
    pub dynamics: CameraDynamics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraComputeOutput {
    pub active: Option<ZoomDirective>,
    pub zoom_center: Point,
    pub scale: f64,
    pub physics: CameraPhysicsState,
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}
