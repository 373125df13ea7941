//! Spring integration of the camera position (interactive regime only).

use crate::models::camera::{CameraPhysicsState, Point, SpringParams};

/// One-dimensional damped spring, advanced with semi-implicit Euler.
#[derive(Debug, Clone, Copy)]
pub struct Spring {
    pub current_pos: f64,
    pub target_pos: f64,
    pub velocity: f64,
    pub k: f64,
    pub c: f64,
    pub m: f64,
}

impl Spring {
    pub fn new(current_pos: f64, target_pos: f64, velocity: f64, params: SpringParams) -> Self {
        Self {
            current_pos,
            target_pos,
            velocity,
            k: params.stiffness.max(0.0001),
            c: params.damping.max(0.0),
            m: params.mass.max(0.0001),
        }
    }

    pub fn critical_damping(stiffness: f64, mass: f64) -> f64 {
        2.0 * (stiffness.max(0.0001) * mass.max(0.0001)).sqrt()
    }

    /// Advances by `dt` seconds and returns the new position.
    pub fn tick(&mut self, dt: f64) -> f64 {
        let safe_dt = dt.max(0.000_001);
        let acceleration =
            (self.k * (self.target_pos - self.current_pos) - self.c * self.velocity) / self.m;
        self.velocity += acceleration * safe_dt;
        self.current_pos += self.velocity * safe_dt;
        self.current_pos
    }
}

/// Step limits and settle tolerances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepLimits {
    pub seek_threshold_ms: f64,
    pub max_frame_delta_ms: f64,
    pub max_substep_ms: f64,
    pub settle_position_epsilon: f64,
    pub settle_velocity_epsilon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapReason {
    FreshSession,
    Seek,
    LargeDelta,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepKind {
    /// Jump to the target with zero velocity.
    Snap(SnapReason),
    /// Same timestamp as the previous call.
    Hold,
    Integrate { dt_ms: f64 },
}

/// Decides how to advance from `previous` to `timeline_ms`.
pub fn classify_step(
    previous: &CameraPhysicsState,
    timeline_ms: f64,
    source_time_ms: f64,
    limits: &StepLimits,
) -> StepKind {
    let Some(last_ms) = previous.last_time_ms.filter(|ms| ms.is_finite()) else {
        return StepKind::Snap(SnapReason::FreshSession);
    };
    if !previous.position().is_finite() || !previous.velocity().is_finite() {
        return StepKind::Snap(SnapReason::FreshSession);
    }

    let dt_ms = timeline_ms - last_ms;
    if !dt_ms.is_finite() || dt_ms < 0.0 || dt_ms > limits.seek_threshold_ms {
        return StepKind::Snap(SnapReason::Seek);
    }
    if let Some(last_source_ms) = previous.last_source_time_ms.filter(|ms| ms.is_finite()) {
        let source_dt_ms = source_time_ms - last_source_ms;
        if !source_dt_ms.is_finite() || (source_dt_ms - dt_ms).abs() > limits.seek_threshold_ms {
            return StepKind::Snap(SnapReason::Seek);
        }
    }
    if dt_ms > limits.max_frame_delta_ms {
        return StepKind::Snap(SnapReason::LargeDelta);
    }
    if dt_ms == 0.0 {
        return StepKind::Hold;
    }
    StepKind::Integrate { dt_ms }
}

/// Integrates position and velocity toward `target` over `dt_ms`, in
/// sub-steps no longer than `max_substep_ms`. Settles exactly on the target
/// once both errors are below the epsilons.
pub fn integrate(
    position: Point,
    velocity: Point,
    target: Point,
    dt_ms: f64,
    params: SpringParams,
    limits: &StepLimits,
) -> (Point, Point) {
    let mut spring_x = Spring::new(position.x, target.x, velocity.x, params);
    let mut spring_y = Spring::new(position.y, target.y, velocity.y, params);

    let max_substep_ms = if limits.max_substep_ms.is_finite() && limits.max_substep_ms > 0.0 {
        limits.max_substep_ms
    } else {
        16.0
    };
    let mut remaining_ms = dt_ms.max(0.0);
    while remaining_ms > 0.0 {
        let step_ms = remaining_ms.min(max_substep_ms);
        spring_x.tick(step_ms / 1_000.0);
        spring_y.tick(step_ms / 1_000.0);
        remaining_ms -= step_ms;
    }

    let (x, vx) = settle(spring_x, limits);
    let (y, vy) = settle(spring_y, limits);
    (Point::new(x, y), Point::new(vx, vy))
}

fn settle(spring: Spring, limits: &StepLimits) -> (f64, f64) {
    if !spring.current_pos.is_finite() || !spring.velocity.is_finite() {
        return (spring.target_pos, 0.0);
    }
    let near = (spring.current_pos - spring.target_pos).abs() < limits.settle_position_epsilon;
    let slow = spring.velocity.abs() < limits.settle_velocity_epsilon;
    if near && slow {
        (spring.target_pos, 0.0)
    } else {
        (spring.current_pos, spring.velocity)
    }
}
