//! Timeline assembly.
//!
//! Scenes are laid back-to-back on the primary tracks with the narration
//! audio as the timing anchor:
//!
//! 1. **Video:** the selected image spans the narration, scaled up, with an
//!    exit zoom animation as long as the segment.
//! 2. **Audio:** the narration over the same span, trimmed to its own length.
//! 3. **Subtitles:** cues re-based to the scene start and clamped to its span.
//! 4. **Overlay and effect:** one caption and one effect over the whole
//!    timeline, attached after every scene is placed.
//!
//! Scenes without a narration pair are skipped and do not move the cursor.

use storyreel_common::clock::{floor_duration_us, secs_to_us};
use storyreel_common::config::AssemblyConfig;
use storyreel_common::error::{StoryreelError, StoryreelResult};
use storyreel_project_model::material::MaterialKind;
use storyreel_project_model::scene::{Cue, SceneAsset, SceneId};
use storyreel_project_model::timeline::{
    Animation, AnimationPhase, Canvas, ClipTransform, EffectParam, EffectStyle, Segment,
    SegmentStyle, TextAlign, TextBorder, TextStyle, TimeRange, Timeline, TimelineError, Track,
    TrackKind,
};

use crate::registry::MaterialRegistry;

pub const AUDIO_TRACK: &str = "audio";
pub const VIDEO_TRACK: &str = "video";
pub const OVERLAY_TRACK: &str = "overlay";
pub const SUBTITLE_TRACK: &str = "subtitle";
pub const EFFECT_TRACK: &str = "effect";

/// Where a scene landed on the primary tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenePlacement {
    pub scene_id: SceneId,
    pub range: TimeRange,
}

/// Outcome of a build: the timeline and the processed/skipped tally.
#[derive(Debug, Clone)]
pub struct AssemblyReport {
    pub timeline: Timeline,
    /// Placed scenes in timeline order.
    pub placements: Vec<ScenePlacement>,
    pub skipped: Vec<SceneId>,
}

impl AssemblyReport {
    pub fn processed(&self) -> usize {
        self.placements.len()
    }

    pub fn placement(&self, scene: &SceneId) -> Option<&ScenePlacement> {
        self.placements.iter().find(|p| &p.scene_id == scene)
    }
}

/// Builds the multi-track timeline from resolved scenes.
#[derive(Debug, Clone)]
pub struct TimelineAssembler {
    config: AssemblyConfig,
}

impl TimelineAssembler {
    pub fn new(config: AssemblyConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(AssemblyConfig::default())
    }

    /// Lay out `scenes` in order. Materials are taken from (or added to)
    /// `registry`, so segment material ids always resolve.
    pub fn build(
        &self,
        scenes: &[SceneAsset],
        canvas: Canvas,
        registry: &mut MaterialRegistry,
    ) -> StoryreelResult<AssemblyReport> {
        let mut timeline = Self::create_tracks(canvas)?;
        let mut placements = Vec::new();
        let mut skipped = Vec::new();
        let mut cursor_us = 0u64;

        for scene in scenes {
            let Some(narration) = &scene.narration else {
                let err = StoryreelError::missing_asset(
                    scene.scene_id.as_str(),
                    "no narration audio/subtitle pair",
                );
                tracing::warn!(error = %err, "Skipping scene");
                skipped.push(scene.scene_id.clone());
                continue;
            };

            let audio = registry.register(&narration.audio_path, MaterialKind::Audio);
            let image = registry.register(&scene.selected_image, MaterialKind::Image);

            let duration_us = floor_duration_us(
                audio
                    .duration_us
                    .unwrap_or_else(|| secs_to_us(self.config.fallback_duration_secs)),
            );
            let range = TimeRange::new(cursor_us, duration_us);

            timeline
                .push_segment(VIDEO_TRACK, self.video_segment(&image.id, range))
                .map_err(timeline_error)?;
            timeline
                .push_segment(AUDIO_TRACK, self.audio_segment(&audio.id, range))
                .map_err(timeline_error)?;
            self.place_cues(&mut timeline, &scene.scene_id, &narration.cues, range)?;

            tracing::debug!(
                scene = %scene.scene_id,
                start_us = range.start_us,
                duration_us,
                cues = narration.cues.len(),
                "Placed scene"
            );
            placements.push(ScenePlacement {
                scene_id: scene.scene_id.clone(),
                range,
            });
            cursor_us = range.end_us();
        }

        if timeline.total_duration_us > 0 {
            self.attach_overlay(&mut timeline)?;
            self.attach_effect(&mut timeline);
        }

        tracing::info!(
            processed = placements.len(),
            skipped = skipped.len(),
            total_duration_us = timeline.total_duration_us,
            "Timeline assembled"
        );

        Ok(AssemblyReport {
            timeline,
            placements,
            skipped,
        })
    }

    /// The five tracks, audio lowest and effect topmost.
    fn create_tracks(canvas: Canvas) -> StoryreelResult<Timeline> {
        let mut timeline = Timeline::new(canvas);
        for track in [
            Track::new(AUDIO_TRACK, TrackKind::Audio, 0),
            Track::new(VIDEO_TRACK, TrackKind::Video, 1),
            Track::new(OVERLAY_TRACK, TrackKind::Text, 2),
            Track::new(SUBTITLE_TRACK, TrackKind::Text, 3).with_flag(1),
            Track::new(EFFECT_TRACK, TrackKind::Effect, 4),
        ] {
            timeline.add_track(track).map_err(timeline_error)?;
        }
        Ok(timeline)
    }

    fn video_segment(&self, material_id: &str, range: TimeRange) -> Segment {
        let exit = &self.config.exit_animation;
        Segment {
            id: new_id(),
            material_id: Some(material_id.to_string()),
            target: range,
            source: Some(TimeRange::new(0, range.duration_us)),
            style: SegmentStyle::Video {
                clip: ClipTransform {
                    scale: self.config.video_scale,
                    ..ClipTransform::default()
                },
                animations: vec![Animation {
                    name: exit.name.clone(),
                    animation_id: exit.animation_id.clone(),
                    resource_id: exit.resource_id.clone(),
                    phase: AnimationPhase::Outro,
                    duration_us: range.duration_us,
                }],
            },
        }
    }

    fn audio_segment(&self, material_id: &str, range: TimeRange) -> Segment {
        Segment {
            id: new_id(),
            material_id: Some(material_id.to_string()),
            target: range,
            source: Some(TimeRange::new(0, range.duration_us)),
            style: SegmentStyle::Audio {
                volume: self.config.audio_gain,
            },
        }
    }

    /// Place cues relative to the first cue, inside the scene's span.
    fn place_cues(
        &self,
        timeline: &mut Timeline,
        scene: &SceneId,
        cues: &[Cue],
        range: TimeRange,
    ) -> StoryreelResult<()> {
        let Some(first) = cues.first() else {
            return Ok(());
        };
        let base_us = first.start_us;
        let scene_end_us = range.end_us();

        for cue in cues {
            let start_us = range.start_us + cue.start_us.saturating_sub(base_us);
            if start_us >= scene_end_us {
                tracing::warn!(scene = %scene, cue = cue.index, "Cue starts after narration ends, dropped");
                continue;
            }

            let previous_end_us = timeline
                .track(SUBTITLE_TRACK)
                .map_or(0, Track::end_us);
            if start_us < previous_end_us {
                tracing::warn!(scene = %scene, cue = cue.index, "Cue overlaps previous cue, dropped");
                continue;
            }

            let wanted_end_us = start_us + floor_duration_us(cue.duration_us());
            if wanted_end_us > scene_end_us {
                tracing::warn!(scene = %scene, cue = cue.index, "Cue runs past narration, shortened");
            }
            let end_us = wanted_end_us.min(scene_end_us);

            let segment = Segment {
                id: new_id(),
                material_id: None,
                target: TimeRange::new(start_us, end_us - start_us),
                source: None,
                style: SegmentStyle::Text {
                    text: cue.text.clone(),
                    style: self.subtitle_style(),
                },
            };
            timeline
                .push_segment(SUBTITLE_TRACK, segment)
                .map_err(timeline_error)?;
        }
        Ok(())
    }

    fn subtitle_style(&self) -> TextStyle {
        let style = &self.config.subtitle;
        TextStyle {
            size: style.size,
            color: style.color,
            alpha: 1.0,
            align: TextAlign::Center,
            auto_wrapping: true,
            max_line_width: style.max_line_width,
            border: Some(TextBorder {
                color: style.border_color,
                alpha: style.border_alpha,
                width: style.border_width,
            }),
            clip: ClipTransform {
                transform_y: style.transform_y,
                ..ClipTransform::default()
            },
        }
    }

    fn attach_overlay(&self, timeline: &mut Timeline) -> StoryreelResult<()> {
        let overlay = &self.config.overlay;
        if overlay.text.trim().is_empty() {
            tracing::debug!("Overlay text empty, no caption attached");
            return Ok(());
        }

        let segment = Segment {
            id: new_id(),
            material_id: None,
            target: TimeRange::new(0, timeline.total_duration_us),
            source: None,
            style: SegmentStyle::Text {
                text: overlay.text.clone(),
                style: TextStyle {
                    size: overlay.size,
                    color: overlay.color,
                    alpha: overlay.alpha,
                    align: TextAlign::Center,
                    auto_wrapping: true,
                    max_line_width: overlay.max_line_width,
                    border: None,
                    clip: ClipTransform {
                        transform_y: overlay.transform_y,
                        ..ClipTransform::default()
                    },
                },
            },
        };
        timeline
            .push_segment(OVERLAY_TRACK, segment)
            .map_err(timeline_error)
    }

    /// Best effort: a failure is logged and the timeline stays as it is.
    fn attach_effect(&self, timeline: &mut Timeline) {
        let effect = &self.config.effect;
        if effect.param_names.len() != effect.params.len() {
            tracing::warn!(
                effect = %effect.name,
                names = effect.param_names.len(),
                values = effect.params.len(),
                "Effect parameters do not line up, effect not attached"
            );
            return;
        }

        let segment = Segment {
            id: new_id(),
            material_id: None,
            target: TimeRange::new(0, timeline.total_duration_us),
            source: None,
            style: SegmentStyle::Effect(EffectStyle {
                name: effect.name.clone(),
                effect_id: effect.effect_id.clone(),
                resource_id: effect.resource_id.clone(),
                params: effect
                    .param_names
                    .iter()
                    .zip(&effect.params)
                    .map(|(name, value)| EffectParam {
                        name: name.clone(),
                        value: *value,
                    })
                    .collect(),
            }),
        };

        if let Err(e) = timeline.push_segment(EFFECT_TRACK, segment) {
            tracing::warn!(effect = %effect.name, error = %e, "Effect not attached");
        }
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn timeline_error(e: TimelineError) -> StoryreelError {
    StoryreelError::timeline(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    use chrono::{DateTime, Utc};
    use storyreel_common::clock::HostClock;
    use storyreel_project_model::material::Dimensions;
    use storyreel_project_model::scene::Narration;

    use crate::probe::MediaProbe;

    /// Durations by file name; everything else fails.
    struct TableProbe(HashMap<String, u64>);

    impl MediaProbe for TableProbe {
        fn created_at(&self, path: &Path) -> StoryreelResult<DateTime<Utc>> {
            Err(StoryreelError::probe(path, "none"))
        }

        fn audio_duration_us(&self, path: &Path) -> StoryreelResult<u64> {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            self.0
                .get(&name)
                .copied()
                .ok_or_else(|| StoryreelError::probe(path, "unknown"))
        }

        fn image_dimensions(&self, _path: &Path) -> StoryreelResult<Dimensions> {
            Ok(Dimensions {
                width: 1080,
                height: 1920,
            })
        }
    }

    fn registry(durations: &[(&str, u64)]) -> MaterialRegistry {
        let table = durations
            .iter()
            .map(|(name, us)| (name.to_string(), *us))
            .collect();
        MaterialRegistry::new(Box::new(TableProbe(table)), HostClock::from_unix_secs(0))
            .with_fallback_duration_us(10_000_000)
    }

    fn scene(id: &str, cues: Vec<Cue>, narrated: bool) -> SceneAsset {
        let dir = PathBuf::from("/scenes");
        SceneAsset {
            scene_id: SceneId::from(id),
            candidates: vec![dir.join(format!("{id}_1.jpeg"))],
            selected_image: dir.join(format!("{id}_1.jpeg")),
            narration: narrated.then(|| Narration {
                audio_path: dir.join(format!("{id}.mp3")),
                subtitle_path: dir.join(format!("{id}.srt")),
                cues,
            }),
        }
    }

    fn canvas() -> Canvas {
        Canvas {
            width: 1080,
            height: 1920,
        }
    }

    fn texts(timeline: &Timeline, track: &str) -> Vec<(u64, u64)> {
        timeline
            .track(track)
            .unwrap()
            .segments
            .iter()
            .map(|s| (s.target.start_us, s.target.end_us()))
            .collect()
    }

    #[test]
    fn test_tracks_stack_in_fixed_order() {
        let mut reg = registry(&[]);
        let report = TimelineAssembler::with_defaults()
            .build(&[], canvas(), &mut reg)
            .unwrap();
        let order: Vec<&str> = report
            .timeline
            .tracks_by_render_order()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(order, vec!["audio", "video", "overlay", "subtitle", "effect"]);
        assert_eq!(report.timeline.track(SUBTITLE_TRACK).unwrap().flag, 1);
    }

    #[test]
    fn test_empty_timeline_gets_no_overlay_or_effect() {
        let mut reg = registry(&[]);
        let report = TimelineAssembler::with_defaults()
            .build(&[scene("scene1", vec![], false)], canvas(), &mut reg)
            .unwrap();
        assert_eq!(report.timeline.total_duration_us, 0);
        assert!(report.timeline.track(OVERLAY_TRACK).unwrap().segments.is_empty());
        assert!(report.timeline.track(EFFECT_TRACK).unwrap().segments.is_empty());
        assert_eq!(report.skipped, vec![SceneId::from("scene1")]);
    }

    #[test]
    fn test_two_scene_scenario() {
        let mut reg = registry(&[("scene1.mp3", 2_000_000), ("scene2.mp3", 3_500_000)]);
        let hello = || vec![Cue::new(1, 0, 1_000_000, "hello")];
        let report = TimelineAssembler::with_defaults()
            .build(
                &[scene("scene1", hello(), true), scene("scene2", hello(), true)],
                canvas(),
                &mut reg,
            )
            .unwrap();
        let tl = &report.timeline;

        assert_eq!(texts(tl, VIDEO_TRACK), vec![(0, 2_000_000), (2_000_000, 5_500_000)]);
        assert_eq!(texts(tl, AUDIO_TRACK), vec![(0, 2_000_000), (2_000_000, 5_500_000)]);
        assert_eq!(
            texts(tl, SUBTITLE_TRACK),
            vec![(0, 1_000_000), (2_000_000, 3_000_000)]
        );
        assert_eq!(tl.total_duration_us, 5_500_000);
        assert_eq!(texts(tl, OVERLAY_TRACK), vec![(0, 5_500_000)]);
        assert_eq!(texts(tl, EFFECT_TRACK), vec![(0, 5_500_000)]);
    }

    #[test]
    fn test_video_style_and_audio_trim() {
        let mut reg = registry(&[("scene1.mp3", 2_000_000)]);
        let report = TimelineAssembler::with_defaults()
            .build(&[scene("scene1", vec![], true)], canvas(), &mut reg)
            .unwrap();
        let tl = &report.timeline;

        let video = &tl.track(VIDEO_TRACK).unwrap().segments[0];
        match &video.style {
            SegmentStyle::Video { clip, animations } => {
                assert!((clip.scale - 1.10).abs() < 1e-9);
                assert_eq!(animations.len(), 1);
                assert_eq!(animations[0].phase, AnimationPhase::Outro);
                assert_eq!(animations[0].duration_us, 2_000_000);
            }
            other => panic!("unexpected style {other:?}"),
        }

        let audio = &tl.track(AUDIO_TRACK).unwrap().segments[0];
        assert_eq!(audio.source, Some(TimeRange::new(0, 2_000_000)));
        assert!(matches!(audio.style, SegmentStyle::Audio { volume } if (volume - 3.16).abs() < 1e-9));

        let image_id = video.material_id.as_deref().unwrap();
        assert_eq!(reg.get(image_id).unwrap().display_name, "scene1_1.jpeg");
    }

    #[test]
    fn test_cues_are_rebased_and_clamped() {
        let mut reg = registry(&[("scene1.mp3", 3_000_000)]);
        let cues = vec![
            Cue::new(1, 60_000_000, 61_000_000, "a"),
            Cue::new(2, 60_500_000, 61_500_000, "overlapping"),
            Cue::new(3, 61_500_000, 64_000_000, "long"),
            Cue::new(4, 64_000_000, 65_000_000, "late"),
            Cue::new(5, 62_900_000, 62_900_000, "instant"),
        ];
        let report = TimelineAssembler::with_defaults()
            .build(&[scene("scene1", cues, true)], canvas(), &mut reg)
            .unwrap();

        assert_eq!(
            texts(&report.timeline, SUBTITLE_TRACK),
            vec![(0, 1_000_000), (1_500_000, 3_000_000)]
        );
    }

    #[test]
    fn test_probe_failure_uses_fallback_duration() {
        let mut reg = registry(&[]);
        let report = TimelineAssembler::with_defaults()
            .build(&[scene("scene1", vec![], true)], canvas(), &mut reg)
            .unwrap();
        assert_eq!(report.timeline.total_duration_us, 10_000_000);
    }

    #[test]
    fn test_zero_duration_is_floored() {
        let mut reg = registry(&[("scene1.mp3", 0), ("scene2.mp3", 5)]);
        let report = TimelineAssembler::with_defaults()
            .build(
                &[scene("scene1", vec![], true), scene("scene2", vec![], true)],
                canvas(),
                &mut reg,
            )
            .unwrap();
        assert_eq!(texts(&report.timeline, VIDEO_TRACK), vec![(0, 1), (1, 6)]);
    }

    #[test]
    fn test_mismatched_effect_params_leave_timeline_intact() {
        let mut config = AssemblyConfig::default();
        config.effect.params = vec![33.0];
        let mut reg = registry(&[("scene1.mp3", 1_000_000)]);
        let report = TimelineAssembler::new(config)
            .build(&[scene("scene1", vec![], true)], canvas(), &mut reg)
            .unwrap();
        assert!(report.timeline.track(EFFECT_TRACK).unwrap().segments.is_empty());
        assert_eq!(report.timeline.track(OVERLAY_TRACK).unwrap().segments.len(), 1);
        assert_eq!(report.processed(), 1);
    }
}
