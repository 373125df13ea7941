//! Camera-track sampling for a whole project.
//!
//! Export runs the deterministic regime on several blocking workers, each
//! walking its frames in its own order; playback runs the interactive regime
//! sequentially, threading physics from frame to frame.

use std::ops::Range;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::algorithm::camera_engine::{compute_camera, EngineConfig};
use crate::algorithm::cursor_signal::{CursorSession, CursorSignal, MouseTrack};
use crate::algorithm::motion::{camera_motion, CameraMotion, CameraPose};
use crate::algorithm::zoom_blocks::EffectTimeline;
use crate::commands::project::LoadedProject;
use crate::error::{CameraError, CameraResult};
use crate::models::camera::{
    CameraComputeInput, CameraComputeOutput, CameraDynamics, CameraPhysicsState, CursorGlyph,
    NormalizedRect, Overscan, Point,
};
use crate::models::events::MouseEventsFile;
use crate::models::project::CameraProject;

const PROGRESS_EVERY_FRAMES: usize = 64;

/// One sampled frame of the camera track.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraFrame {
    pub frame: u64,
    pub timeline_ms: f64,
    pub center: Point,
    pub scale: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom_block_id: Option<String>,
    pub motion: CameraMotion,
}

impl CameraFrame {
    fn from_output(frame: u64, timeline_ms: f64, output: CameraComputeOutput) -> Self {
        Self {
            frame,
            timeline_ms,
            center: output.zoom_center,
            scale: output.scale,
            zoom_block_id: output.active.map(|directive| directive.id),
            motion: CameraMotion::default(),
        }
    }

    fn pose(&self) -> CameraPose {
        CameraPose {
            timeline_ms: self.timeline_ms,
            center: self.center,
            scale: self.scale,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportStatus {
    pub is_running: bool,
    pub progress: f64,
    pub frames_done: u64,
    pub frames_total: u64,
    pub message: String,
    pub error: Option<String>,
}

#[derive(Clone, Default)]
pub struct ExportState(pub Arc<Mutex<ExportStatus>>);

impl ExportState {
    pub fn snapshot(&self) -> ExportStatus {
        self.0
            .lock()
            .map(|status| status.clone())
            .unwrap_or_default()
    }
}

fn update_status(state: &ExportState, updater: impl FnOnce(&mut ExportStatus)) {
    if let Ok(mut status) = state.0.lock() {
        updater(&mut status);
    }
}

/// Everything that stays fixed for one recording session.
pub struct TrackContext {
    timeline: EffectTimeline,
    cursor: Option<CursorSession>,
    source_size: (u32, u32),
    output_size: (u32, u32),
    fps: f64,
    duration_ms: f64,
    overscan: Overscan,
    mockup: Option<NormalizedRect>,
    cursor_glyph: CursorGlyph,
    dynamics: CameraDynamics,
    config: EngineConfig,
}

impl TrackContext {
    pub fn from_loaded(loaded: &LoadedProject) -> CameraResult<Self> {
        Self::new(&loaded.project, loaded.events.as_ref())
    }

    pub fn new(project: &CameraProject, events: Option<&MouseEventsFile>) -> CameraResult<Self> {
        let timeline = EffectTimeline::from_effects(&project.effects)?;
        if !(project.output.fps.is_finite() && project.output.fps > 0.0) {
            return Err(CameraError::InvalidFrameRate(project.output.fps));
        }
        let source_size = (project.recording.width, project.recording.height);

        let cursor = events.map(|events| {
            let track = MouseTrack::from_events(&events.events, source_size.0, source_size.1)
                .with_max_smoothing_window(project.engine.max_smoothing_window_ms);
            CursorSession::new(events.recording_id.clone(), track)
        });

        log::info!(
            "track_context: project={} blocks={} cursor={} output={}x{}@{}",
            project.id,
            timeline.directives().len(),
            cursor.is_some(),
            project.output.width,
            project.output.height,
            project.output.fps
        );

        Ok(Self {
            timeline,
            cursor,
            source_size,
            output_size: (project.output.width, project.output.height),
            fps: project.output.fps,
            duration_ms: project.recording.duration_ms,
            overscan: project.framing.overscan,
            mockup: project.framing.mockup,
            cursor_glyph: project.camera.cursor_glyph,
            dynamics: project.camera.dynamics,
            config: project.engine.clone(),
        })
    }

    pub fn frame_count(&self) -> u64 {
        let frames = (self.duration_ms * self.fps / 1_000.0).ceil();
        if frames.is_finite() && frames > 0.0 {
            frames as u64
        } else {
            0
        }
    }

    pub fn frame_time_ms(&self, frame: u64) -> f64 {
        frame as f64 * 1_000.0 / self.fps
    }

    fn input<'a>(
        &'a self,
        timeline_ms: f64,
        physics: &'a CameraPhysicsState,
        deterministic: bool,
    ) -> CameraComputeInput<'a> {
        CameraComputeInput {
            directives: self.timeline.directives(),
            timeline_ms,
            source_time_ms: timeline_ms,
            cursor: self.cursor.as_ref().map(|cursor| cursor as &dyn CursorSignal),
            source_width: self.source_size.0,
            source_height: self.source_size.1,
            output_width: self.output_size.0,
            output_height: self.output_size.1,
            overscan: self.overscan,
            mockup: self.mockup,
            crop: self.timeline.active_crop(timeline_ms),
            cursor_glyph: self.cursor_glyph,
            force_follow_cursor: false,
            physics,
            deterministic,
            dynamics: self.dynamics,
        }
    }

    /// Deterministic frame: depends on nothing but `frame`.
    pub fn compute_frame(&self, frame: u64) -> CameraFrame {
        let timeline_ms = self.frame_time_ms(frame);
        let fresh = CameraPhysicsState::default();
        let output = compute_camera(&self.input(timeline_ms, &fresh, true), &self.config);
        CameraFrame::from_output(frame, timeline_ms, output)
    }

    /// Interactive frame: advances `physics`.
    pub fn step_frame(
        &self,
        frame: u64,
        physics: &CameraPhysicsState,
    ) -> (CameraFrame, CameraPhysicsState) {
        let timeline_ms = self.frame_time_ms(frame);
        let mut output = compute_camera(&self.input(timeline_ms, physics, false), &self.config);
        let next = std::mem::take(&mut output.physics);
        (CameraFrame::from_output(frame, timeline_ms, output), next)
    }

    /// Drops cached cursor smoothing, e.g. after the track was edited.
    pub fn invalidate_cursor_cache(&self) {
        if let Some(cursor) = &self.cursor {
            cursor.cache().invalidate();
        }
    }
}

/// Splits `frames` across `workers` blocking tasks. Worker `w` takes every
/// `workers`-th frame starting at `w`, newest first; results are reassembled
/// by frame index.
pub async fn export_camera_track(
    context: Arc<TrackContext>,
    frames: Range<u64>,
    workers: usize,
    state: &ExportState,
) -> CameraResult<Vec<CameraFrame>> {
    let workers = workers.max(1);
    let total = frames.end.saturating_sub(frames.start);
    log::info!(
        "export_camera_track: frames={}..{} workers={workers}",
        frames.start,
        frames.end
    );
    update_status(state, |status| {
        *status = ExportStatus {
            is_running: true,
            frames_total: total,
            message: format!("Sampling {total} frames on {workers} workers"),
            ..ExportStatus::default()
        };
    });

    let mut handles = Vec::with_capacity(workers);
    for worker in 0..workers {
        let context = context.clone();
        let state = state.clone();
        let indices = frames
            .clone()
            .skip(worker)
            .step_by(workers)
            .collect::<Vec<_>>();
        handles.push(tokio::task::spawn_blocking(move || {
            let mut sampled = Vec::with_capacity(indices.len());
            for (done, frame) in indices.into_iter().rev().enumerate() {
                sampled.push(context.compute_frame(frame));
                if (done + 1) % PROGRESS_EVERY_FRAMES == 0 {
                    report_progress(&state, PROGRESS_EVERY_FRAMES as u64);
                }
            }
            report_progress(&state, (sampled.len() % PROGRESS_EVERY_FRAMES) as u64);
            sampled
        }));
    }

    let mut slots: Vec<Option<CameraFrame>> = vec![None; total as usize];
    for handle in handles {
        let sampled = match handle.await {
            Ok(sampled) => sampled,
            Err(e) => {
                let err = CameraError::Worker(e.to_string());
                update_status(state, |status| {
                    status.is_running = false;
                    status.message = "Export failed".to_string();
                    status.error = Some(err.to_string());
                });
                return Err(err);
            }
        };
        for frame in sampled {
            let slot = (frame.frame - frames.start) as usize;
            slots[slot] = Some(frame);
        }
    }

    let mut track = slots.into_iter().flatten().collect::<Vec<_>>();
    attach_motion(&mut track, context.output_size);

    update_status(state, |status| {
        status.is_running = false;
        status.progress = 1.0;
        status.message = "Export finished".to_string();
    });
    log::info!("export_camera_track: finished frames={}", track.len());
    Ok(track)
}

fn report_progress(state: &ExportState, frames: u64) {
    if frames == 0 {
        return;
    }
    update_status(state, |status| {
        status.frames_done += frames;
        if status.frames_total > 0 {
            status.progress = status.frames_done as f64 / status.frames_total as f64;
        }
    });
}

/// Sequential interactive pass, as live playback would produce it. Runs on
/// one blocking worker.
pub async fn playback_camera_track(
    context: Arc<TrackContext>,
    frames: Range<u64>,
) -> CameraResult<Vec<CameraFrame>> {
    log::info!(
        "playback_camera_track: frames={}..{}",
        frames.start,
        frames.end
    );
    tokio::task::spawn_blocking(move || sample_playback(&context, frames))
        .await
        .map_err(|e| CameraError::Worker(e.to_string()))
}

fn sample_playback(context: &TrackContext, frames: Range<u64>) -> Vec<CameraFrame> {
    let mut physics = CameraPhysicsState::default();
    let mut track = Vec::with_capacity(frames.end.saturating_sub(frames.start) as usize);
    for frame in frames {
        let (sampled, next) = context.step_frame(frame, &physics);
        physics = next;
        track.push(sampled);
    }
    attach_motion(&mut track, context.output_size);
    track
}

/// Fills in each frame's motion from its predecessor. The first frame of the
/// track stays at rest.
fn attach_motion(track: &mut [CameraFrame], output_size: (u32, u32)) {
    for idx in 1..track.len() {
        let previous = track[idx - 1].pose();
        let current = track[idx].pose();
        track[idx].motion = camera_motion(&previous, &current, output_size);
    }
}
