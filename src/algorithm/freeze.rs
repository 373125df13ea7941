//! Cursor-freeze hysteresis.
//!
//! Moving -> Dwelling once cursor speed drops under the freeze speed,
//! Dwelling -> Frozen after the dwell period, Frozen -> Moving only above the
//! (higher) unfreeze speed. Nothing freezes below the minimum zoom.

use crate::models::camera::{CameraPhysicsState, Point};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreezeThresholds {
    /// Source px/ms.
    pub freeze_speed: f64,
    /// Source px/ms, above `freeze_speed`.
    pub unfreeze_speed: f64,
    pub dwell_ms: f64,
    pub min_scale: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FreezeState {
    Moving,
    Dwelling { since_ms: f64 },
    /// `anchor` is normalized source space.
    Frozen { anchor: Point },
}

/// One observation fed to the detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreezeSample {
    pub time_ms: f64,
    /// Source px/ms.
    pub speed: f64,
    pub scale: f64,
}

impl FreezeState {
    pub fn from_physics(state: &CameraPhysicsState) -> Self {
        match (state.frozen_target, state.cursor_stopped_at_ms) {
            (Some(anchor), _) if anchor.is_finite() => FreezeState::Frozen { anchor },
            (_, Some(since_ms)) if since_ms.is_finite() => FreezeState::Dwelling { since_ms },
            _ => FreezeState::Moving,
        }
    }

    pub fn write_to(self, state: &mut CameraPhysicsState) {
        match self {
            FreezeState::Moving => {
                state.cursor_stopped_at_ms = None;
                state.frozen_target = None;
            }
            FreezeState::Dwelling { since_ms } => {
                state.cursor_stopped_at_ms = Some(since_ms);
                state.frozen_target = None;
            }
            FreezeState::Frozen { anchor } => {
                state.cursor_stopped_at_ms = None;
                state.frozen_target = Some(anchor);
            }
        }
    }

    /// Re-anchors a frozen state on `base` moved by `delta`. `base` is the
    /// anchor as the camera could actually frame it, so an anchor the clamp
    /// keeps pulling back does not run away. Other states are unchanged.
    pub fn slide(self, base: Point, delta: Point) -> Self {
        match self {
            FreezeState::Frozen { .. } if base.is_finite() && delta.is_finite() => {
                FreezeState::Frozen {
                    anchor: base + delta,
                }
            }
            other => other,
        }
    }

    /// Next state after `sample`. `settle` receives the dwell start and
    /// supplies the anchor on freezing.
    pub fn advance(
        self,
        sample: FreezeSample,
        thresholds: &FreezeThresholds,
        settle: impl FnOnce(f64) -> Option<Point>,
    ) -> Self {
        if !(sample.scale.is_finite() && sample.scale >= thresholds.min_scale) {
            return FreezeState::Moving;
        }
        let speed = if sample.speed.is_finite() {
            sample.speed.max(0.0)
        } else {
            f64::INFINITY
        };

        match self {
            FreezeState::Moving if speed < thresholds.freeze_speed => FreezeState::Dwelling {
                since_ms: sample.time_ms,
            },
            FreezeState::Moving => FreezeState::Moving,
            FreezeState::Dwelling { .. } if speed >= thresholds.freeze_speed => {
                FreezeState::Moving
            }
            FreezeState::Dwelling { since_ms } if sample.time_ms - since_ms >= thresholds.dwell_ms => {
                match settle(since_ms) {
                    Some(anchor) if anchor.is_finite() => FreezeState::Frozen { anchor },
                    _ => FreezeState::Dwelling { since_ms },
                }
            }
            dwelling @ FreezeState::Dwelling { .. } => dwelling,
            FreezeState::Frozen { .. } if speed > thresholds.unfreeze_speed => FreezeState::Moving,
            frozen @ FreezeState::Frozen { .. } => frozen,
        }
    }
}

/// Sampling grid for stateless replay. Grid points are multiples of
/// `step_ms`, so every frame of a block replays the same history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayGrid {
    pub step_ms: f64,
}

impl ReplayGrid {
    fn step(&self) -> f64 {
        if self.step_ms.is_finite() && self.step_ms > 0.0 {
            self.step_ms
        } else {
            16.0
        }
    }

    /// Grid times in `[start_ms, end_ms)`, followed by `end_ms`.
    pub fn times(&self, start_ms: f64, end_ms: f64) -> impl Iterator<Item = f64> {
        let step = self.step();
        let (first, last) = if start_ms.is_finite() && end_ms.is_finite() {
            ((start_ms / step).ceil() as i64, (end_ms / step).ceil() as i64)
        } else {
            (0, 0)
        };

        (first..last)
            .map(move |k| k as f64 * step)
            .filter(move |ms| *ms < end_ms)
            .chain(end_ms.is_finite().then_some(end_ms))
    }
}

/// Replays the detector from `Moving` over `grid` between `start_ms` and
/// `end_ms`. `slide_at` applies the per-frame anchor correction after each
/// step, exactly as a live frame at that time would.
pub fn replay(
    start_ms: f64,
    end_ms: f64,
    grid: &ReplayGrid,
    thresholds: &FreezeThresholds,
    mut sample_at: impl FnMut(f64) -> FreezeSample,
    mut settle_at: impl FnMut(f64, f64) -> Option<Point>,
    mut slide_at: impl FnMut(f64, FreezeState) -> FreezeState,
) -> FreezeState {
    grid.times(start_ms, end_ms)
        .fold(FreezeState::Moving, |state, ms| {
            let next = state.advance(sample_at(ms), thresholds, |since_ms| {
                settle_at(since_ms, ms)
            });
            slide_at(ms, next)
        })
}
