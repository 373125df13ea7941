//! Framing space: the coordinate frame bounds and visibility math runs in.
//!
//! Source-normalized coordinates are mapped through the optional mockup
//! rectangle and then through the overscan margins. Without either, framing
//! space equals source space.

use crate::models::camera::{NormalizedRect, Overscan, Point};

const MIN_EXTENT: f64 = 1e-9;

/// Affine map `frame = origin + source * extent`, per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMapping {
    origin: Point,
    extent: Point,
}

impl Default for FrameMapping {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl FrameMapping {
    pub const IDENTITY: FrameMapping = FrameMapping {
        origin: Point::ZERO,
        extent: Point { x: 1.0, y: 1.0 },
    };

    pub fn new(overscan: &Overscan, mockup: Option<&NormalizedRect>) -> Self {
        let mut mapping = Self::IDENTITY;

        if let Some(rect) = mockup.and_then(|rect| rect.valid()) {
            mapping = FrameMapping {
                origin: Point::new(rect.x, rect.y),
                extent: Point::new(rect.width, rect.height),
            };
        }

        let overscan = overscan.sanitized();
        if !overscan.is_zero() {
            let span_x = 1.0 + overscan.left + overscan.right;
            let span_y = 1.0 + overscan.top + overscan.bottom;
            mapping = mapping.then(FrameMapping {
                origin: Point::new(overscan.left / span_x, overscan.top / span_y),
                extent: Point::new(1.0 / span_x, 1.0 / span_y),
            });
        }

        mapping
    }

    /// Applies `self` first, then `outer`.
    fn then(self, outer: FrameMapping) -> FrameMapping {
        FrameMapping {
            origin: Point::new(
                outer.origin.x + self.origin.x * outer.extent.x,
                outer.origin.y + self.origin.y * outer.extent.y,
            ),
            extent: Point::new(self.extent.x * outer.extent.x, self.extent.y * outer.extent.y),
        }
    }

    pub fn extent(&self) -> Point {
        self.extent
    }

    pub fn to_frame(&self, source: Point) -> Point {
        Point::new(
            self.origin.x + source.x * self.extent.x,
            self.origin.y + source.y * self.extent.y,
        )
    }

    pub fn to_source(&self, frame: Point) -> Point {
        let axis = |value: f64, origin: f64, extent: f64| {
            if extent.abs() < MIN_EXTENT {
                value
            } else {
                (value - origin) / extent
            }
        };
        Point::new(
            axis(frame.x, self.origin.x, self.extent.x),
            axis(frame.y, self.origin.y, self.extent.y),
        )
    }

    /// Framing-space vector to source-space vector.
    pub fn delta_to_source(&self, delta: Point) -> Point {
        let axis = |value: f64, extent: f64| {
            if extent.abs() < MIN_EXTENT {
                value
            } else {
                value / extent
            }
        };
        Point::new(axis(delta.x, self.extent.x), axis(delta.y, self.extent.y))
    }

    pub fn rect_to_frame(&self, rect: NormalizedRect) -> Bounds {
        Bounds {
            min: self.to_frame(Point::new(rect.x, rect.y)),
            max: self.to_frame(Point::new(rect.right(), rect.bottom())),
        }
    }
}

/// Axis-aligned bounds in framing space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// The whole framing canvas.
    pub const CANVAS: Bounds = Bounds {
        min: Point::ZERO,
        max: Point { x: 1.0, y: 1.0 },
    };

    pub fn center(&self) -> Point {
        self.min.lerp(self.max, 0.5)
    }
}

/// Content area in framing space: the crop rectangle if one is active,
/// otherwise the full source.
pub fn content_bounds(crop: Option<&NormalizedRect>, mapping: &FrameMapping) -> Bounds {
    let rect = crop
        .and_then(|rect| rect.valid())
        .unwrap_or(NormalizedRect::FULL);
    mapping.rect_to_frame(rect)
}

/// Half the visible extent at a given scale, in framing units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfWindow {
    pub x: f64,
    pub y: f64,
}

/// Half-window for `scale`, widened on whichever axis the output shows more
/// of than the framing canvas (pillar/letterbox).
pub fn half_window(
    scale: f64,
    output_size: (u32, u32),
    source_size: (u32, u32),
    mapping: &FrameMapping,
) -> HalfWindow {
    let safe_scale = if scale.is_finite() && scale > 0.0 {
        scale.max(1.0)
    } else {
        1.0
    };
    let base = 0.5 / safe_scale;

    let ratio = match (aspect(output_size), aspect(source_size)) {
        (Some(output_aspect), Some(source_aspect)) => {
            let extent = mapping.extent();
            let frame_aspect = source_aspect * extent.y / extent.x.max(MIN_EXTENT);
            if frame_aspect.is_finite() && frame_aspect > 0.0 {
                output_aspect / frame_aspect
            } else {
                1.0
            }
        }
        _ => 1.0,
    };

    HalfWindow {
        x: base * ratio.max(1.0),
        y: base * (1.0 / ratio).max(1.0),
    }
}

fn aspect((width, height): (u32, u32)) -> Option<f64> {
    (width > 0 && height > 0).then(|| width as f64 / height as f64)
}
