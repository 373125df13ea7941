//! Cursor signal: interpolated pointer position, velocity and settle point
//! for any source time, plus the session-scoped smoothing cache.

use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};

use lru::LruCache;

use crate::models::camera::Point;
use crate::models::events::PointerEvent;

const SAMPLE_STEP_MS: f64 = 8.0;
const DEFAULT_MAX_SMOOTHING_WINDOW_MS: f64 = 240.0;
const SMOOTHING_CACHE_CAPACITY: usize = 4_096;

/// Read-only pointer signal consumed by the camera engine.
///
/// Positions are source pixels, velocities source pixels per millisecond.
pub trait CursorSignal: Send + Sync {
    fn source_size(&self) -> (u32, u32);

    /// Raw interpolated position.
    fn position_at(&self, source_ms: f64) -> Option<Point>;

    /// Position after the directive's smoothing (0–100).
    fn smoothed_position_at(&self, source_ms: f64, _smoothing: f64) -> Option<Point> {
        self.position_at(source_ms)
    }

    /// Displacement over the trailing `window_ms`, divided by the window.
    /// Displacements shorter than `jitter_px` count as zero.
    fn velocity_at(&self, source_ms: f64, window_ms: f64, jitter_px: f64) -> Option<Point> {
        let window_ms = if window_ms.is_finite() {
            window_ms.max(1.0)
        } else {
            1.0
        };
        let now = self.position_at(source_ms)?;
        let before = self.position_at(source_ms - window_ms)?;
        let delta = now - before;
        if delta.length() < jitter_px.max(0.0) {
            return Some(Point::ZERO);
        }
        Some(delta * (1.0 / window_ms))
    }

    /// Mean smoothed position over the dwell `[since_ms, source_ms]`. Equals
    /// the smoothed position when the dwell has just begun.
    fn settle_position(&self, since_ms: f64, source_ms: f64, smoothing: f64) -> Option<Point> {
        trailing_mean(source_ms, source_ms - since_ms, |ms| {
            self.smoothed_position_at(ms, smoothing)
        })
    }
}

fn trailing_mean(
    source_ms: f64,
    window_ms: f64,
    mut sample: impl FnMut(f64) -> Option<Point>,
) -> Option<Point> {
    if !source_ms.is_finite() {
        return None;
    }
    let window_ms = if window_ms.is_finite() {
        window_ms.max(0.0)
    } else {
        0.0
    };
    let steps = (window_ms / SAMPLE_STEP_MS).ceil() as usize;

    let mut sum = Point::ZERO;
    let mut count = 0usize;
    for step in 0..=steps {
        let ms = (source_ms - step as f64 * SAMPLE_STEP_MS).max(source_ms - window_ms);
        if let Some(point) = sample(ms) {
            sum = sum + point;
            count += 1;
        }
    }
    (count > 0).then(|| sum * (1.0 / count as f64))
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TrackSample {
    ts: f64,
    position: Point,
    is_click: bool,
}

/// Pointer samples of one recording, sorted and de-duplicated.
#[derive(Debug, Clone)]
pub struct MouseTrack {
    samples: Vec<TrackSample>,
    source_width: u32,
    source_height: u32,
    max_smoothing_window_ms: f64,
}

impl MouseTrack {
    pub fn from_events(events: &[PointerEvent], source_width: u32, source_height: u32) -> Self {
        let samples = events
            .iter()
            .filter_map(|event| {
                let (x, y) = event.position();
                let position = Point::new(x, y);
                (event.ts().is_finite() && position.is_finite()).then(|| TrackSample {
                    ts: event.ts(),
                    position,
                    is_click: matches!(event, PointerEvent::Click { .. }),
                })
            })
            .collect::<Vec<_>>();

        Self {
            samples: dedupe_samples(samples),
            source_width,
            source_height,
            max_smoothing_window_ms: DEFAULT_MAX_SMOOTHING_WINDOW_MS,
        }
    }

    /// Trailing window used at smoothing 100.
    pub fn with_max_smoothing_window(mut self, window_ms: f64) -> Self {
        if window_ms.is_finite() && window_ms >= 0.0 {
            self.max_smoothing_window_ms = window_ms;
        }
        self
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn smoothing_window_ms(&self, smoothing: f64) -> f64 {
        let smoothing = if smoothing.is_finite() {
            smoothing.clamp(0.0, 100.0)
        } else {
            0.0
        };
        self.max_smoothing_window_ms * smoothing / 100.0
    }
}

fn dedupe_samples(mut samples: Vec<TrackSample>) -> Vec<TrackSample> {
    samples.sort_by(|left, right| left.ts.total_cmp(&right.ts));
    let mut deduped: Vec<TrackSample> = Vec::with_capacity(samples.len());

    for sample in samples {
        if let Some(last) = deduped.last_mut() {
            if sample.ts == last.ts {
                if sample.is_click || !last.is_click {
                    *last = sample;
                }
                continue;
            }
        }
        deduped.push(sample);
    }

    deduped
}

impl CursorSignal for MouseTrack {
    fn source_size(&self) -> (u32, u32) {
        (self.source_width, self.source_height)
    }

    fn position_at(&self, source_ms: f64) -> Option<Point> {
        if !source_ms.is_finite() {
            return None;
        }
        let first = self.samples.first()?;
        let last = self.samples.last()?;
        if source_ms <= first.ts {
            return Some(first.position);
        }
        if source_ms >= last.ts {
            return Some(last.position);
        }

        let idx = self.samples.partition_point(|sample| sample.ts <= source_ms);
        let left = self.samples[idx - 1];
        let right = self.samples[idx];
        let span = right.ts - left.ts;
        if span <= 0.0 {
            return Some(right.position);
        }
        let ratio = ((source_ms - left.ts) / span).clamp(0.0, 1.0);
        Some(left.position.lerp(right.position, ratio))
    }

    fn smoothed_position_at(&self, source_ms: f64, smoothing: f64) -> Option<Point> {
        let window_ms = self.smoothing_window_ms(smoothing);
        if window_ms <= 0.0 {
            return self.position_at(source_ms);
        }
        trailing_mean(source_ms, window_ms, |ms| self.position_at(ms))
    }
}

/// Memo of smoothed positions keyed by (timestamp µs, smoothing).
///
/// Purely an optimization; invalidate it whenever the underlying track
/// changes.
pub struct SmoothingCache {
    entries: Mutex<LruCache<(i64, u32), Point>>,
}

impl Default for SmoothingCache {
    fn default() -> Self {
        Self::with_capacity(SMOOTHING_CACHE_CAPACITY)
    }
}

impl SmoothingCache {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn key(source_ms: f64, smoothing: f64) -> (i64, u32) {
        (
            (source_ms * 1_000.0).round() as i64,
            (smoothing.clamp(0.0, 100.0) * 1_000.0).round() as u32,
        )
    }

    /// `compute` receives the timestamp rounded to the key's microsecond, so
    /// the cached value does not depend on which caller filled it.
    pub fn get_or_compute(
        &self,
        source_ms: f64,
        smoothing: f64,
        compute: impl FnOnce(f64) -> Option<Point>,
    ) -> Option<Point> {
        if !source_ms.is_finite() || !smoothing.is_finite() {
            return compute(source_ms);
        }
        let key = Self::key(source_ms, smoothing);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(point) = entries.get(&key) {
            return Some(*point);
        }
        let point = compute(key.0 as f64 / 1_000.0)?;
        entries.put(key, point);
        Some(point)
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn invalidate(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let dropped = entries.len();
        entries.clear();
        log::debug!("smoothing_cache.invalidate: dropped={dropped}");
    }
}

/// Cursor signal of the recording currently open in a playback or export
/// session, with its own smoothing cache.
pub struct CursorSession {
    recording_id: String,
    track: MouseTrack,
    cache: SmoothingCache,
}

impl CursorSession {
    pub fn new(recording_id: impl Into<String>, track: MouseTrack) -> Self {
        Self {
            recording_id: recording_id.into(),
            track,
            cache: SmoothingCache::default(),
        }
    }

    pub fn recording_id(&self) -> &str {
        &self.recording_id
    }

    pub fn cache(&self) -> &SmoothingCache {
        &self.cache
    }

    /// Swaps the track and drops every cached smoothing result.
    pub fn switch_recording(&mut self, recording_id: impl Into<String>, track: MouseTrack) {
        let recording_id = recording_id.into();
        if recording_id == self.recording_id {
            return;
        }
        log::debug!(
            "cursor_session.switch_recording: from={} to={recording_id} samples={}",
            self.recording_id,
            track.len()
        );
        self.recording_id = recording_id;
        self.track = track;
        self.cache.invalidate();
    }
}

impl CursorSignal for CursorSession {
    fn source_size(&self) -> (u32, u32) {
        self.track.source_size()
    }

    fn position_at(&self, source_ms: f64) -> Option<Point> {
        self.track.position_at(source_ms)
    }

    fn smoothed_position_at(&self, source_ms: f64, smoothing: f64) -> Option<Point> {
        self.cache.get_or_compute(source_ms, smoothing, |rounded_ms| {
            self.track.smoothed_position_at(rounded_ms, smoothing)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::events::MouseButton;

    fn move_event(ts: f64, x: f64, y: f64) -> PointerEvent {
        PointerEvent::Move { ts, x, y }
    }

    fn track(events: &[PointerEvent]) -> MouseTrack {
        MouseTrack::from_events(events, 1920, 1080)
    }

    #[test]
    fn interpolates_between_samples_and_clamps_at_ends() {
        let track = track(&[move_event(100.0, 0.0, 0.0), move_event(200.0, 100.0, 50.0)]);
        assert_eq!(track.position_at(0.0), Some(Point::new(0.0, 0.0)));
        assert_eq!(track.position_at(150.0), Some(Point::new(50.0, 25.0)));
        assert_eq!(track.position_at(500.0), Some(Point::new(100.0, 50.0)));
        assert_eq!(track.position_at(f64::NAN), None);
        assert_eq!(MouseTrack::from_events(&[], 1920, 1080).position_at(0.0), None);
    }

    #[test]
    fn unsorted_and_duplicate_events_are_normalized() {
        let track = track(&[
            move_event(200.0, 200.0, 0.0),
            PointerEvent::Click {
                ts: 100.0,
                x: 10.0,
                y: 10.0,
                button: MouseButton::Left,
            },
            move_event(100.0, 99.0, 99.0),
            move_event(50.0, f64::NAN, 0.0),
        ]);
        assert_eq!(track.len(), 2);
        assert_eq!(track.position_at(100.0), Some(Point::new(10.0, 10.0)));
    }

    #[test]
    fn velocity_ignores_jitter_below_threshold() {
        let track = track(&[move_event(0.0, 100.0, 100.0), move_event(48.0, 102.0, 100.0)]);
        assert_eq!(track.velocity_at(48.0, 48.0, 3.0), Some(Point::ZERO));

        let velocity = track.velocity_at(48.0, 48.0, 1.0).expect("velocity");
        assert!((velocity.x - 2.0 / 48.0).abs() < 1e-12);
    }

    #[test]
    fn settle_position_averages_the_dwell_only() {
        let track = track(&[move_event(0.0, 0.0, 0.0), move_event(400.0, 400.0, 0.0)]);
        let settle = track.settle_position(0.0, 400.0, 0.0).expect("settle");
        assert!((settle.x - 200.0).abs() < 1e-9);

        let started = track.settle_position(300.0, 300.0, 50.0).expect("dwell start");
        assert_eq!(Some(started), track.smoothed_position_at(300.0, 50.0));
    }

    #[test]
    fn smoothing_lags_behind_raw_position() {
        let track = track(&[move_event(0.0, 0.0, 0.0), move_event(1_000.0, 1_000.0, 0.0)]);
        let raw = track.position_at(500.0).expect("raw");
        let smooth = track.smoothed_position_at(500.0, 100.0).expect("smooth");
        assert!(smooth.x < raw.x);
        assert_eq!(track.smoothed_position_at(500.0, 0.0), Some(raw));
    }

    #[test]
    fn session_cache_is_invalidated_on_recording_switch() {
        let mut session = CursorSession::new(
            "rec-a",
            track(&[move_event(0.0, 0.0, 0.0), move_event(100.0, 100.0, 0.0)]),
        );
        let first = session.smoothed_position_at(50.0, 40.0).expect("first");
        assert_eq!(session.cache().len(), 1);
        assert_eq!(session.smoothed_position_at(50.0, 40.0), Some(first));
        assert_eq!(session.cache().len(), 1);

        session.switch_recording(
            "rec-b",
            track(&[move_event(0.0, 500.0, 0.0), move_event(100.0, 600.0, 0.0)]),
        );
        assert!(session.cache().is_empty());
        let second = session.smoothed_position_at(50.0, 40.0).expect("second");
        assert!(second.x > first.x);
        assert_eq!(session.recording_id(), "rec-b");
    }
}
