//! Desired camera center for the active zoom block.

use crate::algorithm::framing::{Bounds, FrameMapping};
use crate::models::camera::{FollowStrategy, Point, ZoomDirective};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowTarget {
    /// Normalized source space.
    pub center: Point,
    /// Position is pinned to (0.5, 0.5) without physics.
    pub center_locked: bool,
    pub follows_cursor: bool,
}

/// Center the camera rests on outside any block: the middle of the framing
/// canvas, expressed in source space.
pub fn pre_block_center(mapping: &FrameMapping) -> Point {
    mapping.to_source(Bounds::CANVAS.center())
}

/// Where `directive` wants the camera.
///
/// `attractor` is the cursor-follow point in normalized source space (live,
/// settling or frozen); `None` when there is no usable cursor. Follow math
/// runs in framing space through `clamp`, the content clamp for the current
/// half-window.
pub fn resolve_follow_target(
    directive: &ZoomDirective,
    attractor: Option<Point>,
    mapping: &FrameMapping,
    clamp: impl FnOnce(Point) -> Point,
) -> FollowTarget {
    if directive.is_center_locked() {
        return FollowTarget {
            center: Point::CENTER,
            center_locked: true,
            follows_cursor: false,
        };
    }

    let follows_cursor = directive.follows_cursor();
    let point = match (directive.follow_strategy, directive.manual_target) {
        (FollowStrategy::Manual, Some(target)) => Some(target),
        _ if follows_cursor => attractor,
        _ => None,
    };

    let center = match point.filter(|point| point.is_finite()) {
        Some(point) => {
            let framed = clamp(mapping.to_frame(point));
            mapping.to_source(framed)
        }
        None => pre_block_center(mapping),
    };

    FollowTarget {
        center,
        center_locked: false,
        follows_cursor,
    }
}

/// Blends from the pre-block center toward `desired` by the intro progress.
pub fn blend_intro(pre_block: Point, desired: Point, intro_progress: f64) -> Point {
    let t = if intro_progress.is_finite() {
        intro_progress.clamp(0.0, 1.0)
    } else {
        1.0
    };
    if t >= 1.0 {
        return desired;
    }
    pre_block.lerp(desired, t)
}
