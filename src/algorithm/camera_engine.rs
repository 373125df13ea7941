use serde::{Deserialize, Serialize};

use crate::algorithm::bounds::{clamp_to_content, cursor_footprint, project_visibility};
use crate::algorithm::cursor_signal::CursorSignal;
use crate::algorithm::follow::{blend_intro, pre_block_center, resolve_follow_target, FollowTarget};
use crate::algorithm::framing::{content_bounds, half_window, Bounds, FrameMapping, HalfWindow};
use crate::algorithm::freeze::{replay, FreezeSample, FreezeState, FreezeThresholds, ReplayGrid};
use crate::algorithm::physics::{classify_step, integrate, SnapReason, StepKind, StepLimits};
use crate::algorithm::scale::{commanded_scale, intro_progress, resolve_target_scale};
use crate::algorithm::zoom_blocks::find_active_directive;
use crate::models::camera::{
    CameraComputeInput, CameraComputeOutput, CameraPhysicsState, Point, ZoomDirective,
};

/// Engine tunables. Every field can be overridden from a project file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub seek_threshold_ms: f64,
    pub max_frame_delta_ms: f64,
    pub max_substep_ms: f64,
    pub settle_position_epsilon: f64,
    pub settle_velocity_epsilon: f64,
    pub freeze_speed_px_per_ms: f64,
    pub unfreeze_speed_px_per_ms: f64,
    pub dwell_ms: f64,
    pub freeze_min_scale: f64,
    pub freeze_replay_step_ms: f64,
    pub zoomed_clamp_threshold: f64,
    pub visibility_padding_ratio: f64,
    pub velocity_window_ms: f64,
    pub max_smoothing_window_ms: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seek_threshold_ms: 500.0,
            max_frame_delta_ms: 200.0,
            max_substep_ms: 16.0,
            settle_position_epsilon: 1e-4,
            settle_velocity_epsilon: 1e-3,
            freeze_speed_px_per_ms: 0.05,
            unfreeze_speed_px_per_ms: 0.5,
            dwell_ms: 400.0,
            freeze_min_scale: 1.1,
            freeze_replay_step_ms: 16.0,
            zoomed_clamp_threshold: 0.01,
            visibility_padding_ratio: 0.04,
            velocity_window_ms: 48.0,
            max_smoothing_window_ms: 240.0,
        }
    }
}

impl EngineConfig {
    pub fn step_limits(&self) -> StepLimits {
        StepLimits {
            seek_threshold_ms: self.seek_threshold_ms,
            max_frame_delta_ms: self.max_frame_delta_ms,
            max_substep_ms: self.max_substep_ms,
            settle_position_epsilon: self.settle_position_epsilon,
            settle_velocity_epsilon: self.settle_velocity_epsilon,
        }
    }

    pub fn freeze_thresholds(&self) -> FreezeThresholds {
        FreezeThresholds {
            freeze_speed: self.freeze_speed_px_per_ms,
            unfreeze_speed: self.unfreeze_speed_px_per_ms.max(self.freeze_speed_px_per_ms),
            dwell_ms: self.dwell_ms,
            min_scale: self.freeze_min_scale,
        }
    }

    pub fn replay_grid(&self) -> ReplayGrid {
        ReplayGrid {
            step_ms: self.freeze_replay_step_ms,
        }
    }
}

/// Cursor access for one frame, in normalized source space.
struct CursorView<'a> {
    signal: &'a dyn CursorSignal,
    size: (u32, u32),
}

impl<'a> CursorView<'a> {
    fn new(signal: &'a dyn CursorSignal, input: &CameraComputeInput<'_>) -> Option<Self> {
        let size = if input.source_width > 0 && input.source_height > 0 {
            (input.source_width, input.source_height)
        } else {
            signal.source_size()
        };
        (size.0 > 0 && size.1 > 0).then_some(Self { signal, size })
    }

    fn normalize(&self, px: Point) -> Point {
        Point::new(px.x / self.size.0 as f64, px.y / self.size.1 as f64)
    }

    fn raw_px(&self, source_ms: f64) -> Option<Point> {
        self.signal.position_at(source_ms).filter(|p| p.is_finite())
    }

    fn smoothed(&self, source_ms: f64, smoothing: f64) -> Option<Point> {
        self.signal
            .smoothed_position_at(source_ms, smoothing)
            .filter(|p| p.is_finite())
            .map(|p| self.normalize(p))
    }

    fn settle(&self, since_ms: f64, source_ms: f64, smoothing: f64) -> Option<Point> {
        self.signal
            .settle_position(since_ms, source_ms, smoothing)
            .filter(|p| p.is_finite())
            .map(|p| self.normalize(p))
    }

    fn speed(&self, source_ms: f64, config: &EngineConfig, jitter_px: f64) -> f64 {
        self.signal
            .velocity_at(source_ms, config.velocity_window_ms, jitter_px)
            .map(Point::length)
            .unwrap_or(0.0)
    }
}

/// Frame geometry that does not depend on time: mapping, content and cursor.
/// Shared by the live frame and the freeze replay so both place the camera
/// the same way.
struct Stage<'a> {
    input: &'a CameraComputeInput<'a>,
    config: &'a EngineConfig,
    mapping: FrameMapping,
    pre_block: Point,
    source_size: (u32, u32),
    content: Bounds,
    cursor: Option<CursorView<'a>>,
}

impl<'a> Stage<'a> {
    fn new(input: &'a CameraComputeInput<'a>, config: &'a EngineConfig) -> Self {
        let mapping = FrameMapping::new(&input.overscan, input.mockup.as_ref());
        let cursor = input.cursor.and_then(|signal| CursorView::new(signal, input));
        let source_size = cursor
            .as_ref()
            .map(|cursor| cursor.size)
            .unwrap_or((input.source_width, input.source_height));
        Self {
            input,
            config,
            mapping,
            pre_block: pre_block_center(&mapping),
            source_size,
            content: content_bounds(input.crop.as_ref(), &mapping),
            cursor,
        }
    }

    fn half(&self, scale: f64) -> HalfWindow {
        half_window(
            scale,
            (self.input.output_width, self.input.output_height),
            self.source_size,
            &self.mapping,
        )
    }

    fn clamp(&self, framed: Point, half: HalfWindow, scale: f64) -> Point {
        clamp_to_content(
            framed,
            half,
            scale,
            self.content,
            self.config.zoomed_clamp_threshold,
        )
    }

    fn attractor(
        &self,
        directive: &ZoomDirective,
        freeze: FreezeState,
        source_ms: f64,
    ) -> Option<Point> {
        let cursor = self.cursor.as_ref()?;
        match freeze {
            FreezeState::Frozen { anchor } => Some(anchor),
            FreezeState::Dwelling { since_ms } => {
                cursor.settle(since_ms, source_ms, directive.smoothing)
            }
            FreezeState::Moving => cursor.smoothed(source_ms, directive.smoothing),
        }
    }

    fn follow(
        &self,
        directive: &ZoomDirective,
        attractor: Option<Point>,
        half: HalfWindow,
        scale: f64,
    ) -> FollowTarget {
        resolve_follow_target(directive, attractor, &self.mapping, |framed| {
            self.clamp(framed, half, scale)
        })
    }

    fn desired(
        &self,
        directive: Option<&ZoomDirective>,
        follow: &FollowTarget,
        timeline_ms: f64,
    ) -> Point {
        if follow.center_locked {
            return Point::CENTER;
        }
        let progress = directive
            .map(|directive| intro_progress(directive, timeline_ms))
            .unwrap_or(1.0);
        blend_intro(self.pre_block, follow.center, progress).or_finite(self.pre_block)
    }

    /// Both bounds passes on `position` (source space). Returns the framed
    /// position before and after correction.
    fn project(
        &self,
        position: Point,
        half: HalfWindow,
        scale: f64,
        follows_cursor: bool,
        source_ms: f64,
    ) -> (Point, Point) {
        let framed = self.mapping.to_frame(position);
        let mut corrected = self.clamp(framed, half, scale);
        if follows_cursor {
            let footprint = self.cursor.as_ref().and_then(|cursor| {
                let raw = cursor.raw_px(source_ms)?;
                cursor_footprint(raw, cursor.size, &self.input.cursor_glyph, &self.mapping)
            });
            if let Some(footprint) = footprint {
                corrected = project_visibility(
                    corrected,
                    half,
                    footprint,
                    self.config.visibility_padding_ratio,
                );
            }
        }
        (framed, corrected)
    }

    /// Anchor correction a deterministic frame at `timeline_ms` applies.
    fn slide_frozen(
        &self,
        directive: &ZoomDirective,
        state: FreezeState,
        timeline_ms: f64,
        source_ms: f64,
        scale: f64,
    ) -> FreezeState {
        let FreezeState::Frozen { anchor } = state else {
            return state;
        };
        let half = self.half(scale);
        let follow = self.follow(directive, Some(anchor), half, scale);
        let position = self.desired(Some(directive), &follow, timeline_ms);
        let (framed, corrected) =
            self.project(position, half, scale, follow.follows_cursor, source_ms);
        state.slide(follow.center, self.mapping.delta_to_source(corrected - framed))
    }
}

/// Computes the camera for one frame.
///
/// Deterministic mode is a pure function of the input minus `physics`;
/// interactive mode advances `physics` and returns the successor state.
pub fn compute_camera(input: &CameraComputeInput<'_>, config: &EngineConfig) -> CameraComputeOutput {
    let stage = Stage::new(input, config);
    let directive = find_active_directive(input.directives, input.timeline_ms);

    let scale = directive
        .map(|directive| {
            let target = resolve_target_scale(directive, &input.overscan);
            commanded_scale(directive, input.timeline_ms, target)
        })
        .unwrap_or(1.0);

    if input.force_follow_cursor {
        return forced_follow(input, directive, stage.cursor.as_ref(), scale, stage.pre_block);
    }

    let half = stage.half(scale);
    let step = (!input.deterministic).then(|| {
        classify_step(
            input.physics,
            input.timeline_ms,
            input.source_time_ms,
            &config.step_limits(),
        )
    });

    let freeze = match directive {
        Some(directive) if directive.follows_cursor() => {
            resolve_freeze(&stage, directive, scale, step)
        }
        _ => FreezeState::Moving,
    };

    let follow = match directive {
        Some(directive) => {
            let attractor = stage.attractor(directive, freeze, input.source_time_ms);
            stage.follow(directive, attractor, half, scale)
        }
        None => FollowTarget {
            center: stage.pre_block,
            center_locked: false,
            follows_cursor: false,
        },
    };
    let desired = stage.desired(directive, &follow, input.timeline_ms);

    let (position, velocity) = match step {
        None => (desired, Point::ZERO),
        Some(_) if follow.center_locked => (Point::CENTER, Point::ZERO),
        Some(StepKind::Snap(reason)) => {
            log_snap(reason, input);
            (desired, Point::ZERO)
        }
        Some(StepKind::Hold) => (input.physics.position(), input.physics.velocity()),
        Some(StepKind::Integrate { dt_ms }) => integrate(
            input.physics.position(),
            input.physics.velocity(),
            desired,
            dt_ms,
            input.dynamics.spring(),
            &config.step_limits(),
        ),
    };

    let (center, velocity, freeze) = if follow.center_locked {
        (Point::CENTER, Point::ZERO, freeze)
    } else {
        let (framed, corrected) = stage.project(
            position,
            half,
            scale,
            follow.follows_cursor,
            input.source_time_ms,
        );
        let delta = corrected - framed;
        let velocity = Point::new(
            if delta.x != 0.0 { 0.0 } else { velocity.x },
            if delta.y != 0.0 { 0.0 } else { velocity.y },
        );
        let center = stage.mapping.to_source(corrected).or_finite(stage.pre_block);
        let freeze = freeze.slide(follow.center, stage.mapping.delta_to_source(delta));
        (center, velocity, freeze)
    };

    let mut physics = if input.deterministic {
        CameraPhysicsState::settled_at(center, scale, input.timeline_ms, input.source_time_ms)
    } else {
        CameraPhysicsState {
            x: center.x,
            y: center.y,
            vx: velocity.x,
            vy: velocity.y,
            scale,
            last_time_ms: Some(input.timeline_ms),
            last_source_time_ms: Some(input.source_time_ms),
            cursor_stopped_at_ms: None,
            frozen_target: None,
        }
    };
    freeze.write_to(&mut physics);

    CameraComputeOutput {
        active: directive.cloned(),
        zoom_center: center,
        scale,
        physics,
    }
}

/// Freeze state for this frame. Interactive frames advance the carried state
/// by one sample. Deterministic and snapped frames rebuild it by replaying the
/// block from the first moment it is zoomed far enough to freeze; nothing is
/// frozen before that, so the replay needs no carried state.
fn resolve_freeze(
    stage: &Stage<'_>,
    directive: &ZoomDirective,
    scale: f64,
    step: Option<StepKind>,
) -> FreezeState {
    let Some(cursor) = stage.cursor.as_ref() else {
        return FreezeState::Moving;
    };
    let input = stage.input;
    let config = stage.config;
    let thresholds = config.freeze_thresholds();
    let jitter_px = directive.mouse_idle_px;
    let now_ms = input.source_time_ms;

    match step {
        Some(StepKind::Integrate { .. }) | Some(StepKind::Hold) => {
            let previous = FreezeState::from_physics(input.physics);
            let sample = FreezeSample {
                time_ms: now_ms,
                speed: cursor.speed(now_ms, config, jitter_px),
                scale,
            };
            let next = previous.advance(sample, &thresholds, |since_ms| {
                cursor.settle(since_ms, now_ms, directive.smoothing)
            });
            if std::mem::discriminant(&next) != std::mem::discriminant(&previous) {
                log::debug!(
                    "compute_camera: freeze {:?} -> {:?} at source_ms={}",
                    previous,
                    next,
                    now_ms
                );
            }
            next
        }
        None | Some(StepKind::Snap(_)) => {
            let target = resolve_target_scale(directive, &input.overscan);
            if !(target >= thresholds.min_scale) {
                return FreezeState::Moving;
            }
            let timeline_offset = input.timeline_ms - now_ms;
            let scale_at =
                |source_ms: f64| commanded_scale(directive, source_ms + timeline_offset, target);
            let grid = config.replay_grid();
            let start_ms = grid
                .times(directive.start_time - timeline_offset, now_ms)
                .find(|&ms| scale_at(ms) >= thresholds.min_scale)
                .unwrap_or(now_ms);

            replay(
                start_ms,
                now_ms,
                &grid,
                &thresholds,
                |source_ms| FreezeSample {
                    time_ms: source_ms,
                    speed: cursor.speed(source_ms, config, jitter_px),
                    scale: scale_at(source_ms),
                },
                |since_ms, source_ms| cursor.settle(since_ms, source_ms, directive.smoothing),
                |source_ms, state| {
                    stage.slide_frozen(
                        directive,
                        state,
                        source_ms + timeline_offset,
                        source_ms,
                        scale_at(source_ms),
                    )
                },
            )
        }
    }
}

/// Drag-to-reposition: the camera sits on the raw cursor, physics is
/// overwritten to match and nothing else runs.
fn forced_follow(
    input: &CameraComputeInput<'_>,
    directive: Option<&ZoomDirective>,
    cursor: Option<&CursorView<'_>>,
    scale: f64,
    pre_block: Point,
) -> CameraComputeOutput {
    let center = cursor
        .and_then(|cursor| cursor.raw_px(input.source_time_ms).map(|px| cursor.normalize(px)))
        .unwrap_or(pre_block)
        .or_finite(pre_block);

    CameraComputeOutput {
        active: directive.cloned(),
        zoom_center: center,
        scale,
        physics: CameraPhysicsState::settled_at(
            center,
            scale,
            input.timeline_ms,
            input.source_time_ms,
        ),
    }
}

fn log_snap(reason: SnapReason, input: &CameraComputeInput<'_>) {
    log::debug!(
        "compute_camera: snap reason={:?} timeline_ms={} source_ms={} last_ms={:?}",
        reason,
        input.timeline_ms,
        input.source_time_ms,
        input.physics.last_time_ms
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::cursor_signal::MouseTrack;
    use crate::models::camera::{
        AutoScale, CameraDynamics, CursorGlyph, FollowStrategy, NormalizedRect, Overscan,
    };
    use crate::models::events::PointerEvent;

    const W: u32 = 1920;
    const H: u32 = 1080;

    fn block(start: f64, end: f64, intro_ms: f64) -> ZoomDirective {
        ZoomDirective {
            id: "z1".to_string(),
            start_time: start,
            end_time: end,
            scale: 2.0,
            auto_scale: AutoScale::Fixed,
            intro_ms,
            outro_ms: intro_ms,
            follow_strategy: FollowStrategy::Mouse,
            manual_target: None,
            smoothing: 0.0,
            mouse_idle_px: 3.0,
        }
    }

    fn still_cursor(x: f64, y: f64) -> MouseTrack {
        MouseTrack::from_events(&[PointerEvent::Move { ts: 0.0, x, y }], W, H)
    }

    fn moving_cursor() -> MouseTrack {
        let events = (0..=200)
            .map(|idx| {
                let ts = idx as f64 * 25.0;
                PointerEvent::Move {
                    ts,
                    x: 960.0 + 700.0 * (ts / 700.0).sin(),
                    y: 540.0 + 400.0 * (ts / 1_100.0).cos(),
                }
            })
            .collect::<Vec<_>>();
        MouseTrack::from_events(&events, W, H)
    }

    fn input<'a>(
        directives: &'a [ZoomDirective],
        cursor: &'a MouseTrack,
        physics: &'a CameraPhysicsState,
        timeline_ms: f64,
        deterministic: bool,
    ) -> CameraComputeInput<'a> {
        CameraComputeInput {
            directives,
            timeline_ms,
            source_time_ms: timeline_ms,
            cursor: Some(cursor),
            source_width: W,
            source_height: H,
            output_width: W,
            output_height: H,
            overscan: Overscan::default(),
            mockup: None,
            crop: None,
            cursor_glyph: CursorGlyph::default(),
            force_follow_cursor: false,
            physics,
            deterministic,
            dynamics: CameraDynamics::default(),
        }
    }

    fn footprint_inside(center: Point, scale: f64, cursor_px: Point) -> bool {
        let half = 0.5 / scale;
        let left = (cursor_px.x - 2.0) / W as f64;
        let right = left + 24.0 / W as f64;
        let top = (cursor_px.y - 2.0) / H as f64;
        let bottom = top + 32.0 / H as f64;
        left >= center.x - half
            && right <= center.x + half
            && top >= center.y - half
            && bottom <= center.y + half
    }

    #[test]
    fn deterministic_frames_do_not_depend_on_call_order() {
        let directives = vec![block(1_000.0, 4_000.0, 400.0)];
        let cursor = moving_cursor();
        let fresh = CameraPhysicsState::default();
        let config = EngineConfig::default();
        let times = (0..300).map(|idx| idx as f64 * 1_000.0 / 60.0).collect::<Vec<_>>();

        let forward = times
            .iter()
            .map(|&ts| compute_camera(&input(&directives, &cursor, &fresh, ts, true), &config))
            .collect::<Vec<_>>();
        let mut backward = times
            .iter()
            .rev()
            .map(|&ts| compute_camera(&input(&directives, &cursor, &fresh, ts, true), &config))
            .collect::<Vec<_>>();
        backward.reverse();

        for (a, b) in forward.iter().zip(&backward) {
            assert_eq!(a.zoom_center.x.to_bits(), b.zoom_center.x.to_bits());
            assert_eq!(a.zoom_center.y.to_bits(), b.zoom_center.y.to_bits());
            assert_eq!(a.scale.to_bits(), b.scale.to_bits());
        }
    }

    #[test]
    fn deterministic_mode_ignores_carried_physics() {
        let directives = vec![block(0.0, 4_000.0, 0.0)];
        let cursor = moving_cursor();
        let config = EngineConfig::default();
        let stale = CameraPhysicsState {
            x: 0.1,
            y: 0.9,
            vx: 3.0,
            vy: -2.0,
            last_time_ms: Some(1_990.0),
            frozen_target: Some(Point::new(0.2, 0.2)),
            ..CameraPhysicsState::default()
        };
        let a = compute_camera(
            &input(&directives, &cursor, &CameraPhysicsState::default(), 2_000.0, true),
            &config,
        );
        let b = compute_camera(&input(&directives, &cursor, &stale, 2_000.0, true), &config);
        assert_eq!(a.zoom_center, b.zoom_center);
        assert_eq!(a.physics, b.physics);
    }

    #[test]
    fn scale_is_never_below_one() {
        let mut odd = block(500.0, 900.0, 2_000.0);
        odd.scale = 0.2;
        let directives = vec![odd, block(1_000.0, 1_400.0, 0.0)];
        let cursor = moving_cursor();
        let fresh = CameraPhysicsState::default();
        let config = EngineConfig::default();
        for idx in 0..100 {
            let ts = idx as f64 * 20.0;
            for deterministic in [true, false] {
                let out =
                    compute_camera(&input(&directives, &cursor, &fresh, ts, deterministic), &config);
                assert!(out.scale >= 1.0, "scale {} at {ts}", out.scale);
            }
        }
    }

    #[test]
    fn intro_starts_at_pre_block_center_and_reaches_target_scale() {
        let directives = vec![block(1_000.0, 5_000.0, 500.0)];
        let cursor = still_cursor(1_800.0, 200.0);
        let fresh = CameraPhysicsState::default();
        let config = EngineConfig::default();

        let start = compute_camera(&input(&directives, &cursor, &fresh, 1_000.0, true), &config);
        assert_eq!(start.scale, 1.0);
        assert_eq!(start.zoom_center, Point::CENTER);
        assert!(start.active.is_some());

        let ramped = compute_camera(&input(&directives, &cursor, &fresh, 1_500.0, true), &config);
        assert!((ramped.scale - 2.0).abs() < 1e-9);
        assert!(footprint_inside(ramped.zoom_center, ramped.scale, Point::new(1_800.0, 200.0)));

        let mid = compute_camera(&input(&directives, &cursor, &fresh, 1_250.0, true), &config);
        assert!(mid.zoom_center.x > 0.5 && mid.zoom_center.x < ramped.zoom_center.x);
    }

    #[test]
    fn seek_snaps_position_to_target_with_zero_velocity() {
        let directives = vec![block(0.0, 10_000.0, 0.0)];
        let cursor = moving_cursor();
        let config = EngineConfig::default();

        let mut physics = CameraPhysicsState::default();
        for idx in 0..30 {
            let ts = 1_000.0 + idx as f64 * 16.0;
            physics = compute_camera(&input(&directives, &cursor, &physics, ts, false), &config).physics;
        }
        let seeked = compute_camera(&input(&directives, &cursor, &physics, 6_000.0, false), &config);
        let target = compute_camera(
            &input(&directives, &cursor, &CameraPhysicsState::default(), 6_000.0, true),
            &config,
        );
        assert_eq!(seeked.zoom_center, target.zoom_center);
        assert_eq!(seeked.physics.position(), seeked.zoom_center);
        assert_eq!(seeked.physics.velocity(), Point::ZERO);
    }

    #[test]
    fn large_delta_snaps_instead_of_integrating() {
        let directives = vec![block(0.0, 10_000.0, 0.0)];
        let cursor = moving_cursor();
        let config = EngineConfig::default();
        let physics = CameraPhysicsState {
            x: 0.3,
            y: 0.3,
            vx: 1.0,
            vy: 1.0,
            scale: 2.0,
            last_time_ms: Some(3_000.0),
            last_source_time_ms: Some(3_000.0),
            ..CameraPhysicsState::default()
        };
        let out = compute_camera(&input(&directives, &cursor, &physics, 3_300.0, false), &config);
        let target = compute_camera(
            &input(&directives, &cursor, &CameraPhysicsState::default(), 3_300.0, true),
            &config,
        );
        assert_eq!(out.zoom_center, target.zoom_center);
        assert_eq!(out.physics.velocity(), Point::ZERO);
    }

    #[test]
    fn center_lock_bypasses_spring() {
        let mut fill = block(0.0, 10_000.0, 0.0);
        fill.auto_scale = AutoScale::Fill;
        let directives = vec![fill];
        let cursor = still_cursor(100.0, 100.0);
        let config = EngineConfig::default();
        let physics = CameraPhysicsState {
            x: 0.2,
            y: 0.8,
            vx: 0.5,
            vy: 0.5,
            last_time_ms: Some(1_000.0),
            last_source_time_ms: Some(1_000.0),
            ..CameraPhysicsState::default()
        };
        let mut frame = input(&directives, &cursor, &physics, 1_016.0, false);
        frame.overscan = Overscan {
            left: 0.1,
            right: 0.1,
            top: 0.0,
            bottom: 0.0,
        };
        let out = compute_camera(&frame, &config);
        assert_eq!(out.zoom_center, Point::CENTER);
        assert_eq!(out.physics.velocity(), Point::ZERO);
        assert!((out.scale - 1.2).abs() < 1e-9);
    }

    #[test]
    fn interactive_playback_converges_on_deterministic_path() {
        let directives = vec![block(0.0, 20_000.0, 0.0)];
        let cursor = still_cursor(1_400.0, 700.0);
        let config = EngineConfig::default();

        let mut physics = CameraPhysicsState {
            last_time_ms: Some(0.0),
            last_source_time_ms: Some(0.0),
            ..CameraPhysicsState::default()
        };
        let mut last = None;
        for idx in 1..=240 {
            let ts = idx as f64 * 1_000.0 / 60.0;
            let out = compute_camera(&input(&directives, &cursor, &physics, ts, false), &config);
            physics = out.physics.clone();
            last = Some((ts, out));
        }
        let (ts, interactive) = last.expect("frames");
        let exported = compute_camera(
            &input(&directives, &cursor, &CameraPhysicsState::default(), ts, true),
            &config,
        );
        assert!((interactive.zoom_center - exported.zoom_center).length() < 1e-3);
    }

    #[test]
    fn cursor_visibility_beats_crop_clamp() {
        let directives = vec![block(0.0, 10_000.0, 0.0)];
        let cursor_px = Point::new(0.59 * W as f64, 0.5 * H as f64);
        let cursor = still_cursor(cursor_px.x, cursor_px.y);
        let fresh = CameraPhysicsState::default();
        let config = EngineConfig::default();
        let crop = NormalizedRect {
            x: 0.0,
            y: 0.2,
            width: 0.6,
            height: 0.6,
        };

        let mut frame = input(&directives, &cursor, &fresh, 2_000.0, true);
        frame.crop = Some(crop);
        let out = compute_camera(&frame, &config);

        assert!(footprint_inside(out.zoom_center, out.scale, cursor_px));
        assert!(out.zoom_center.x + 0.5 / out.scale > crop.right());
    }

    #[test]
    fn visibility_push_slides_frozen_anchor() {
        let directives = vec![block(0.0, 10_000.0, 0.0)];
        let cursor_px = Point::new(0.9 * W as f64, 0.5 * H as f64);
        let cursor = still_cursor(cursor_px.x, cursor_px.y);
        let config = EngineConfig::default();
        let physics = CameraPhysicsState {
            scale: 2.0,
            last_time_ms: Some(1_000.0),
            last_source_time_ms: Some(1_000.0),
            frozen_target: Some(Point::CENTER),
            ..CameraPhysicsState::default()
        };

        let out = compute_camera(&input(&directives, &cursor, &physics, 1_016.0, false), &config);
        assert!(out.zoom_center.x > 0.5);
        assert!(footprint_inside(out.zoom_center, out.scale, cursor_px));
        let anchor = out.physics.frozen_target.expect("still frozen");
        assert!((anchor.x - out.zoom_center.x).abs() < 1e-12);
        assert!((anchor.y - 0.5).abs() < 1e-12);
        assert_eq!(out.physics.vx, 0.0);

        let next = compute_camera(&input(&directives, &cursor, &out.physics, 1_032.0, false), &config);
        assert!((next.zoom_center.x - out.zoom_center.x).abs() < 1e-9, "no snap back");
    }

    fn track(points: &[(f64, f64, f64)]) -> MouseTrack {
        let events = points
            .iter()
            .map(|&(ts, x, y)| PointerEvent::Move { ts, x, y })
            .collect::<Vec<_>>();
        MouseTrack::from_events(&events, W, H)
    }

    #[test]
    fn export_keeps_freeze_taken_long_before_slow_drift() {
        let directives = vec![block(0.0, 10_000.0, 300.0)];
        // Still for 2 s, then drifting at 0.2 px/ms: between the freeze and
        // unfreeze speeds, and long enough to reach the window edge.
        let cursor = track(&[(0.0, 960.0, 540.0), (2_000.0, 960.0, 540.0), (6_000.0, 1_760.0, 540.0)]);
        let config = EngineConfig::default();

        let mut physics = CameraPhysicsState::default();
        let mut last = None;
        for idx in 0..=330 {
            let ts = idx as f64 * 1_000.0 / 60.0;
            let out = compute_camera(&input(&directives, &cursor, &physics, ts, false), &config);
            physics = out.physics.clone();
            last = Some((ts, out));
        }
        let (ts, interactive) = last.expect("frames");
        let exported = compute_camera(
            &input(&directives, &cursor, &CameraPhysicsState::default(), ts, true),
            &config,
        );

        assert!(interactive.physics.frozen_target.is_some());
        assert!(exported.physics.frozen_target.is_some());
        let gap_px = (interactive.zoom_center.x - exported.zoom_center.x).abs() * W as f64;
        assert!(gap_px < 20.0, "playback and export differ by {gap_px}px");

        let cursor_px = cursor.position_at(ts).expect("cursor");
        assert!(footprint_inside(exported.zoom_center, exported.scale, cursor_px));
    }

    #[test]
    fn exported_center_is_continuous_across_cursor_stop() {
        let mut follow = block(0.0, 5_000.0, 0.0);
        follow.smoothing = 30.0;
        let directives = vec![follow];
        let cursor = track(&[(0.0, 500.0, 540.0), (1_000.0, 1_300.0, 540.0)]);
        let fresh = CameraPhysicsState::default();
        let config = EngineConfig::default();

        let frames = (0..=120)
            .map(|idx| {
                let ts = idx as f64 * 1_000.0 / 60.0;
                compute_camera(&input(&directives, &cursor, &fresh, ts, true), &config)
            })
            .collect::<Vec<_>>();

        for pair in frames.windows(2) {
            let jump_px = (pair[1].zoom_center.x - pair[0].zoom_center.x).abs() * W as f64;
            assert!(jump_px < 20.0, "center jumped {jump_px}px in one frame");
        }
        assert!(frames
            .iter()
            .any(|frame| frame.physics.cursor_stopped_at_ms.is_some()));
        let last = frames.last().expect("frames");
        let anchor = last.physics.frozen_target.expect("frozen after the dwell");
        assert!((anchor.x * W as f64 - 1_300.0).abs() < 1.0);
    }

    #[test]
    fn force_follow_overrides_everything() {
        let directives = vec![block(0.0, 10_000.0, 0.0)];
        let cursor = still_cursor(192.0, 108.0);
        let physics = CameraPhysicsState {
            x: 0.9,
            y: 0.9,
            vx: 1.0,
            last_time_ms: Some(1_000.0),
            ..CameraPhysicsState::default()
        };
        let mut frame = input(&directives, &cursor, &physics, 1_016.0, false);
        frame.force_follow_cursor = true;
        let out = compute_camera(&frame, &EngineConfig::default());
        assert!((out.zoom_center.x - 0.1).abs() < 1e-12);
        assert!((out.zoom_center.y - 0.1).abs() < 1e-12);
        assert_eq!(out.physics.position(), out.zoom_center);
        assert_eq!(out.physics.velocity(), Point::ZERO);
    }

    #[test]
    fn no_active_block_rests_at_pre_block_center() {
        let directives = vec![block(5_000.0, 6_000.0, 0.0)];
        let cursor = still_cursor(10.0, 10.0);
        let fresh = CameraPhysicsState::default();
        let out = compute_camera(
            &input(&directives, &cursor, &fresh, 1_000.0, true),
            &EngineConfig::default(),
        );
        assert!(out.active.is_none());
        assert_eq!(out.scale, 1.0);
        assert_eq!(out.zoom_center, Point::CENTER);
    }

    #[test]
    fn config_accepts_partial_overrides() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"seekThresholdMs":250.0,"dwellMs":600.0}"#).expect("config");
        assert_eq!(config.seek_threshold_ms, 250.0);
        assert_eq!(config.dwell_ms, 600.0);
        assert_eq!(config.max_substep_ms, EngineConfig::default().max_substep_ms);
    }
}
