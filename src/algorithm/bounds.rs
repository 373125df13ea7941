//! Final correction passes, in framing space.
//!
//! Pass 1 clamps the center so the visible window stays inside the allowed
//! region. Pass 2 pushes it back out where needed to keep the live cursor and
//! its glyph on screen. Pass 2 wins.

use crate::algorithm::framing::{Bounds, FrameMapping, HalfWindow};
use crate::models::camera::{CursorGlyph, Point};

/// Keeps `[center - half, center + half]` inside `[min, max]`. A window wider
/// than the range is centered on it.
pub fn clamp_axis(center: f64, half: f64, min: f64, max: f64) -> f64 {
    let mid = (min + max) * 0.5;
    if !center.is_finite() || !half.is_finite() {
        return mid;
    }
    if 2.0 * half >= max - min {
        return mid;
    }
    center.clamp(min + half, max - half)
}

pub fn clamp_to_bounds(center: Point, half: HalfWindow, bounds: Bounds) -> Point {
    Point::new(
        clamp_axis(center.x, half.x, bounds.min.x, bounds.max.x),
        clamp_axis(center.y, half.y, bounds.min.y, bounds.max.y),
    )
}

/// Region pass 1 clamps to: the whole canvas until the camera is zoomed past
/// `1 + zoomed_threshold`, then the content rectangle with the overscan
/// margins left out.
fn clamp_region(scale: f64, content: Bounds, zoomed_threshold: f64) -> Bounds {
    if scale > 1.0 + zoomed_threshold.max(0.0) {
        content
    } else {
        Bounds::CANVAS
    }
}

/// Pass 1.
pub fn clamp_to_content(
    center: Point,
    half: HalfWindow,
    scale: f64,
    content: Bounds,
    zoomed_threshold: f64,
) -> Point {
    clamp_to_bounds(center, half, clamp_region(scale, content, zoomed_threshold))
}

/// Cursor glyph extent in framing space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorFootprint {
    pub min: Point,
    pub max: Point,
}

/// Footprint of the glyph drawn at `cursor_px` (source pixels). `None` when the
/// cursor or the source size is unusable.
pub fn cursor_footprint(
    cursor_px: Point,
    source_size: (u32, u32),
    glyph: &CursorGlyph,
    mapping: &FrameMapping,
) -> Option<CursorFootprint> {
    let (width, height) = source_size;
    if width == 0 || height == 0 || !cursor_px.is_finite() {
        return None;
    }
    let (width, height) = (width as f64, height as f64);
    let size = if glyph.size.is_finite() && glyph.size > 0.0 {
        glyph.size
    } else {
        1.0
    };
    let px = |value: f64| if value.is_finite() { value.max(0.0) } else { 0.0 };

    let left = cursor_px.x - px(glyph.hotspot_x_px) * size;
    let top = cursor_px.y - px(glyph.hotspot_y_px) * size;
    let min = Point::new(left / width, top / height);
    let max = Point::new(
        (left + px(glyph.width_px) * size) / width,
        (top + px(glyph.height_px) * size) / height,
    );

    Some(CursorFootprint {
        min: mapping.to_frame(min),
        max: mapping.to_frame(max),
    })
}

/// Pass 2: moves `center` the least amount that puts the padded footprint
/// inside the visible window. The footprint is clipped to the canvas first.
/// When it cannot fit, the window is aligned to its leading edge.
pub fn project_visibility(
    center: Point,
    half: HalfWindow,
    footprint: CursorFootprint,
    padding_ratio: f64,
) -> Point {
    let padding = if padding_ratio.is_finite() {
        padding_ratio.max(0.0)
    } else {
        0.0
    };
    Point::new(
        project_axis(
            center.x,
            half.x,
            footprint.min.x,
            footprint.max.x,
            padding * half.x,
        ),
        project_axis(
            center.y,
            half.y,
            footprint.min.y,
            footprint.max.y,
            padding * half.y,
        ),
    )
}

fn project_axis(center: f64, half: f64, lo: f64, hi: f64, padding: f64) -> f64 {
    if !center.is_finite() || !half.is_finite() || !lo.is_finite() || !hi.is_finite() {
        return center;
    }
    let lo = (lo - padding).max(0.0);
    let hi = (hi + padding).min(1.0);
    if hi < lo {
        return center;
    }

    if hi - lo > 2.0 * half {
        lo + half
    } else if lo < center - half {
        lo + half
    } else if hi > center + half {
        hi - half
    } else {
        center
    }
}
