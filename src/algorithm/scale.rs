use crate::models::camera::{AutoScale, Overscan, ZoomDirective};

/// Symmetric cubic ease-in-out on `[0, 1]`.
pub fn ease_in_out(t: f64) -> f64 {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 1.0 };
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Scale needed to cover the overscanned output with no letterboxing.
pub fn fill_scale(overscan: &Overscan) -> f64 {
    let overscan = overscan.sanitized();
    (1.0 + overscan.left + overscan.right).max(1.0 + overscan.top + overscan.bottom)
}

pub fn resolve_target_scale(directive: &ZoomDirective, overscan: &Overscan) -> f64 {
    match directive.auto_scale {
        AutoScale::Fill => fill_scale(overscan),
        AutoScale::Fixed if directive.scale.is_finite() => directive.scale.max(1.0),
        AutoScale::Fixed => 1.0,
    }
}

/// Eased intro progress at `timeline_ms`; 1 once the intro has finished.
pub fn intro_progress(directive: &ZoomDirective, timeline_ms: f64) -> f64 {
    ramp(timeline_ms - directive.start_time, directive.intro_ms)
}

/// Eased outro progress: 1 until the outro starts, 0 at the block end.
pub fn outro_progress(directive: &ZoomDirective, timeline_ms: f64) -> f64 {
    ramp(directive.end_time - timeline_ms, directive.outro_ms)
}

/// Combined zoom-in/zoom-out weight in `[0, 1]`.
pub fn zoom_progress(directive: &ZoomDirective, timeline_ms: f64) -> f64 {
    intro_progress(directive, timeline_ms).min(outro_progress(directive, timeline_ms))
}

fn ramp(elapsed_ms: f64, duration_ms: f64) -> f64 {
    if !(duration_ms.is_finite() && duration_ms > 0.0) {
        return 1.0;
    }
    ease_in_out(elapsed_ms / duration_ms)
}

/// Scale commanded at `timeline_ms`: 1 → `target_scale` over the intro, held,
/// then back to 1 over the outro. Never below 1.
pub fn commanded_scale(directive: &ZoomDirective, timeline_ms: f64, target_scale: f64) -> f64 {
    let target = if target_scale.is_finite() {
        target_scale.max(1.0)
    } else {
        1.0
    };
    (1.0 + (target - 1.0) * zoom_progress(directive, timeline_ms)).max(1.0)
}
