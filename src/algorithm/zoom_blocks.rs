use crate::error::CameraError;
use crate::models::camera::{FollowStrategy, NormalizedRect, Point, ZoomDirective};
use crate::models::effects::{Effect, EffectKind, ZoomEffectData};

const DEFAULT_SMOOTHING: f64 = 50.0;
const DEFAULT_MOUSE_IDLE_PX: f64 = 3.0;

/// Crop rectangle active over `[start_time, end_time)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    pub start_time: f64,
    pub end_time: f64,
    pub rect: NormalizedRect,
}

/// Extracts enabled zoom blocks, sanitized and sorted by start time.
///
/// Blocks with a non-finite or empty time range are dropped. Overlap is not
/// checked here; see [`find_overlap`] and [`EffectTimeline::from_effects`].
pub fn parse_zoom_directives(effects: &[Effect]) -> Vec<ZoomDirective> {
    let mut directives = effects
        .iter()
        .filter(|effect| effect.enabled && effect.kind == EffectKind::Zoom)
        .filter_map(|effect| {
            let data = effect.zoom_data().unwrap_or_default();
            directive_from_effect(effect, &data)
        })
        .collect::<Vec<_>>();

    directives.sort_by(|left, right| left.start_time.total_cmp(&right.start_time));
    directives
}

fn directive_from_effect(effect: &Effect, data: &ZoomEffectData) -> Option<ZoomDirective> {
    if !effect.start_time.is_finite()
        || !effect.end_time.is_finite()
        || effect.end_time <= effect.start_time
    {
        log::warn!(
            "parse_zoom_directives: dropping id={} with range [{}, {})",
            effect.id,
            effect.start_time,
            effect.end_time
        );
        return None;
    }

    let scale = match data.scale {
        Some(scale) if scale.is_finite() => scale.max(1.0),
        Some(scale) => {
            log::warn!("parse_zoom_directives: id={} non-finite scale={scale}", effect.id);
            1.0
        }
        None => 1.0,
    };

    Some(ZoomDirective {
        id: effect.id.clone(),
        start_time: effect.start_time,
        end_time: effect.end_time,
        scale,
        auto_scale: data.auto_scale.unwrap_or_default(),
        intro_ms: non_negative(data.intro_ms, 0.0),
        outro_ms: non_negative(data.outro_ms, 0.0),
        follow_strategy: data.follow_strategy.unwrap_or_default(),
        manual_target: manual_target(effect, data),
        smoothing: non_negative(data.smoothing, DEFAULT_SMOOTHING).min(100.0),
        mouse_idle_px: non_negative(data.mouse_idle_px, DEFAULT_MOUSE_IDLE_PX),
    })
}

fn manual_target(effect: &Effect, data: &ZoomEffectData) -> Option<Point> {
    if data.follow_strategy != Some(FollowStrategy::Manual) {
        return None;
    }
    let (target_x, target_y) = (data.target_x?, data.target_y?);

    let screen = match (data.screen_width, data.screen_height) {
        (Some(width), Some(height))
            if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 =>
        {
            Some((width, height))
        }
        _ => None,
    };

    match screen {
        Some((width, height)) if target_x.is_finite() && target_y.is_finite() => {
            Some(Point::new(target_x / width, target_y / height))
        }
        _ => {
            log::warn!(
                "parse_zoom_directives: id={} unusable manual target, centering",
                effect.id
            );
            Some(Point::CENTER)
        }
    }
}

fn non_negative(value: Option<f64>, fallback: f64) -> f64 {
    match value {
        Some(value) if value.is_finite() => value.max(0.0),
        _ => fallback,
    }
}

/// Extracts enabled crop regions, sorted by start time.
pub fn parse_crop_regions(effects: &[Effect]) -> Vec<CropRegion> {
    let mut regions = effects
        .iter()
        .filter(|effect| effect.enabled && effect.kind == EffectKind::Crop)
        .filter(|effect| effect.end_time > effect.start_time)
        .filter_map(|effect| {
            let data = effect.crop_data()?;
            let rect = NormalizedRect {
                x: data.x.unwrap_or(0.0),
                y: data.y.unwrap_or(0.0),
                width: data.width.unwrap_or(1.0),
                height: data.height.unwrap_or(1.0),
            };
            let rect = clip_to_unit(rect.valid()?)?;
            Some(CropRegion {
                start_time: effect.start_time,
                end_time: effect.end_time,
                rect,
            })
        })
        .collect::<Vec<_>>();
    regions.sort_by(|left, right| left.start_time.total_cmp(&right.start_time));
    regions
}

fn clip_to_unit(rect: NormalizedRect) -> Option<NormalizedRect> {
    let left = rect.x.clamp(0.0, 1.0);
    let top = rect.y.clamp(0.0, 1.0);
    let right = rect.right().clamp(0.0, 1.0);
    let bottom = rect.bottom().clamp(0.0, 1.0);
    NormalizedRect {
        x: left,
        y: top,
        width: right - left,
        height: bottom - top,
    }
    .valid()
}

/// First pair of sorted directives whose intervals intersect.
pub fn find_overlap(directives: &[ZoomDirective]) -> Option<(usize, usize)> {
    directives
        .windows(2)
        .position(|pair| pair[1].start_time < pair[0].end_time)
        .map(|idx| (idx, idx + 1))
}

/// The directive whose `[start_time, end_time)` contains `timeline_ms`.
///
/// Callers must pass sorted, non-overlapping directives; on overlap the first
/// match in list order wins.
pub fn find_active_directive(
    directives: &[ZoomDirective],
    timeline_ms: f64,
) -> Option<&ZoomDirective> {
    debug_assert!(
        find_overlap(directives).is_none(),
        "zoom directives overlap; reject them at ingestion"
    );
    directives.iter().find(|directive| directive.contains(timeline_ms))
}

/// Validated zoom and crop tracks of one project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectTimeline {
    directives: Vec<ZoomDirective>,
    crops: Vec<CropRegion>,
}

impl EffectTimeline {
    pub fn from_effects(effects: &[Effect]) -> Result<Self, CameraError> {
        let directives = parse_zoom_directives(effects);
        if let Some((first, second)) = find_overlap(&directives) {
            let (first, second) = (&directives[first], &directives[second]);
            return Err(CameraError::OverlappingZoomBlocks {
                first: first.id.clone(),
                first_start: first.start_time,
                first_end: first.end_time,
                second: second.id.clone(),
                second_start: second.start_time,
                second_end: second.end_time,
            });
        }

        Ok(Self {
            directives,
            crops: parse_crop_regions(effects),
        })
    }

    pub fn directives(&self) -> &[ZoomDirective] {
        &self.directives
    }

    pub fn active_zoom(&self, timeline_ms: f64) -> Option<&ZoomDirective> {
        find_active_directive(&self.directives, timeline_ms)
    }

    /// Crop rectangle in effect at `timeline_ms`; the latest-starting one wins.
    pub fn active_crop(&self, timeline_ms: f64) -> Option<NormalizedRect> {
        self.crops
            .iter()
            .rev()
            .find(|crop| timeline_ms >= crop.start_time && timeline_ms < crop.end_time)
            .map(|crop| crop.rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::effects::CropEffectData;

    fn zoom(start: f64, end: f64, data: ZoomEffectData) -> Effect {
        Effect::zoom(start, end, data)
    }

    fn scaled(scale: f64) -> ZoomEffectData {
        ZoomEffectData {
            scale: Some(scale),
            ..ZoomEffectData::default()
        }
    }

    #[test]
    fn parses_sorted_enabled_zoom_blocks_only() {
        let mut disabled = zoom(500.0, 600.0, scaled(2.0));
        disabled.enabled = false;
        let effects = vec![
            zoom(2_000.0, 3_000.0, scaled(2.0)),
            Effect::crop(0.0, 10_000.0, CropEffectData::default()),
            disabled,
            zoom(0.0, 1_000.0, scaled(1.5)),
        ];
        let directives = parse_zoom_directives(&effects);
        assert_eq!(directives.len(), 2);
        assert_eq!(directives[0].start_time, 0.0);
        assert_eq!(directives[1].start_time, 2_000.0);
    }

    #[test]
    fn non_finite_fields_get_safe_defaults() {
        // Built in memory: JSON cannot carry NaN, corrupt values arrive this way.
        let data = ZoomEffectData {
            scale: Some(f64::NAN),
            intro_ms: Some(f64::INFINITY),
            outro_ms: Some(-20.0),
            follow_strategy: Some(FollowStrategy::Manual),
            target_x: Some(f64::NAN),
            target_y: Some(100.0),
            screen_width: Some(1_920.0),
            screen_height: Some(1_080.0),
            ..ZoomEffectData::default()
        };
        let effect = zoom(0.0, 1_000.0, ZoomEffectData::default());
        let directive = directive_from_effect(&effect, &data).expect("directive");
        assert_eq!(directive.scale, 1.0);
        assert_eq!(directive.intro_ms, 0.0);
        assert_eq!(directive.outro_ms, 0.0);
        assert_eq!(directive.manual_target, Some(Point::CENTER));
    }

    #[test]
    fn manual_target_is_normalized_by_reference_screen() {
        let effects = vec![zoom(
            0.0,
            1_000.0,
            ZoomEffectData {
                scale: Some(2.0),
                follow_strategy: Some(FollowStrategy::Manual),
                target_x: Some(480.0),
                target_y: Some(810.0),
                screen_width: Some(1_920.0),
                screen_height: Some(1_080.0),
                ..ZoomEffectData::default()
            },
        )];
        let directive = &parse_zoom_directives(&effects)[0];
        let target = directive.manual_target.expect("manual target");
        assert!((target.x - 0.25).abs() < 1e-9);
        assert!((target.y - 0.75).abs() < 1e-9);
    }

    #[test]
    fn manual_without_target_has_no_manual_point() {
        let effects = vec![zoom(
            0.0,
            1_000.0,
            ZoomEffectData {
                follow_strategy: Some(FollowStrategy::Manual),
                target_x: Some(10.0),
                ..ZoomEffectData::default()
            },
        )];
        let directive = &parse_zoom_directives(&effects)[0];
        assert!(directive.manual_target.is_none());
        assert!(directive.follows_cursor());
    }

    #[test]
    fn empty_ranges_are_dropped() {
        let effects = vec![zoom(1_000.0, 1_000.0, scaled(2.0)), zoom(5.0, f64::NAN, scaled(2.0))];
        assert!(parse_zoom_directives(&effects).is_empty());
    }

    #[test]
    fn active_directive_uses_half_open_interval() {
        let timeline = EffectTimeline::from_effects(&[
            zoom(0.0, 1_000.0, scaled(2.0)),
            zoom(1_000.0, 2_000.0, scaled(3.0)),
        ])
        .expect("adjacent blocks are valid");
        assert_eq!(timeline.active_zoom(999.0).map(|d| d.scale), Some(2.0));
        assert_eq!(timeline.active_zoom(1_000.0).map(|d| d.scale), Some(3.0));
        assert!(timeline.active_zoom(2_000.0).is_none());
        assert!(timeline.active_zoom(-1.0).is_none());
    }

    #[test]
    fn overlapping_blocks_are_rejected_at_ingestion() {
        let result = EffectTimeline::from_effects(&[
            zoom(0.0, 1_500.0, scaled(2.0)),
            zoom(1_000.0, 2_000.0, scaled(3.0)),
        ]);
        assert!(matches!(
            result,
            Err(CameraError::OverlappingZoomBlocks { first_end, second_start, .. })
                if first_end == 1_500.0 && second_start == 1_000.0
        ));
    }

    #[test]
    fn crop_regions_are_clipped_and_latest_wins() {
        let timeline = EffectTimeline::from_effects(&[
            Effect::crop(
                0.0,
                5_000.0,
                CropEffectData {
                    x: Some(0.5),
                    y: Some(0.0),
                    width: Some(0.8),
                    height: Some(0.5),
                },
            ),
            Effect::crop(
                1_000.0,
                2_000.0,
                CropEffectData {
                    x: Some(0.1),
                    y: Some(0.1),
                    width: Some(0.2),
                    height: Some(0.2),
                },
            ),
        ])
        .expect("crop timeline");

        let outer = timeline.active_crop(500.0).expect("outer crop");
        assert!((outer.width - 0.5).abs() < 1e-9);
        let inner = timeline.active_crop(1_500.0).expect("inner crop");
        assert!((inner.x - 0.1).abs() < 1e-9);
        assert!(timeline.active_crop(6_000.0).is_none());
    }
}
