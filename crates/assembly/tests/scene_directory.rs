use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use proptest::prelude::*;

use storyreel_assembly::{
    AssetResolver, FsProbe, ImageSelectionPolicy, MaterialRegistry, MediaProbe,
    TimelineAssembler, AUDIO_TRACK, SUBTITLE_TRACK, VIDEO_TRACK,
};
use storyreel_common::clock::HostClock;
use storyreel_common::error::{StoryreelError, StoryreelResult};
use storyreel_project_model::material::{Dimensions, MaterialKind};
use storyreel_project_model::scene::{Cue, Narration, SceneAsset, SceneId};
use storyreel_project_model::timeline::Canvas;

const CANVAS: Canvas = Canvas {
    width: 1080,
    height: 1920,
};

fn write_wav(path: &Path, millis: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..(millis * 8) {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

fn write_png(path: &Path) {
    image::RgbImage::new(9, 16).save(path).unwrap();
}

/// scene1 (2.0 s) and scene2 (3.5 s) fully paired, scene3 with audio only.
fn scene_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    for scene in ["scene1", "scene2", "scene3"] {
        for i in 1..=3 {
            write_png(&root.join(format!("{scene}_{i}.png")));
        }
    }
    write_wav(&root.join("scene1.wav"), 2_000);
    write_wav(&root.join("scene2.wav"), 3_500);
    write_wav(&root.join("scene3.wav"), 1_000);
    // Absolute timing baked into the files must not leak into the timeline.
    std::fs::write(
        root.join("scene1.srt"),
        "1\n00:00:00,000 --> 00:00:01,000\nhello\n\n",
    )
    .unwrap();
    std::fs::write(
        root.join("scene2.srt"),
        "1\n00:00:42,000 --> 00:00:43,000\nhello\n\n",
    )
    .unwrap();
    dir
}

fn spans(report: &storyreel_assembly::AssemblyReport, track: &str) -> Vec<(u64, u64)> {
    report
        .timeline
        .track(track)
        .unwrap()
        .segments
        .iter()
        .map(|s| (s.target.start_us, s.target.end_us()))
        .collect()
}

#[test]
fn scene_directory_assembles_back_to_back() {
    let dir = scene_dir();
    let resolver = AssetResolver::with_defaults();
    let scenes = resolver
        .resolve(dir.path(), &ImageSelectionPolicy::Random { seed: Some(7) }, None)
        .unwrap();
    assert_eq!(scenes.len(), 3);

    let mut registry = MaterialRegistry::new(Box::new(FsProbe), HostClock::now());
    let report = TimelineAssembler::with_defaults()
        .build(&scenes, CANVAS, &mut registry)
        .unwrap();

    assert_eq!(
        spans(&report, VIDEO_TRACK),
        vec![(0, 2_000_000), (2_000_000, 5_500_000)]
    );
    assert_eq!(spans(&report, AUDIO_TRACK), spans(&report, VIDEO_TRACK));
    assert_eq!(
        spans(&report, SUBTITLE_TRACK),
        vec![(0, 1_000_000), (2_000_000, 3_000_000)]
    );
    assert_eq!(report.skipped, vec![SceneId::from("scene3")]);
    assert_eq!(report.processed(), 2);

    let image = registry
        .lookup(&scenes[0].selected_image)
        .expect("selected image is registered");
    assert_eq!(
        image.dimensions,
        Some(Dimensions {
            width: 9,
            height: 16
        })
    );
}

#[test]
fn seeded_selection_is_stable_across_runs() {
    let dir = scene_dir();
    let resolver = AssetResolver::with_defaults();
    let policy = ImageSelectionPolicy::Random { seed: Some(2024) };
    let first: Vec<PathBuf> = resolver
        .resolve(dir.path(), &policy, None)
        .unwrap()
        .into_iter()
        .map(|s| s.selected_image)
        .collect();
    for _ in 0..5 {
        let again: Vec<PathBuf> = resolver
            .resolve(dir.path(), &policy, None)
            .unwrap()
            .into_iter()
            .map(|s| s.selected_image)
            .collect();
        assert_eq!(first, again);
    }
}

#[test]
fn reruns_assign_fresh_material_ids() {
    let dir = scene_dir();
    let audio = dir.path().join("scene1.wav");
    let mut first = MaterialRegistry::new(Box::new(FsProbe), HostClock::now());
    let mut second = MaterialRegistry::new(Box::new(FsProbe), HostClock::now());
    let a = first.register(&audio, MaterialKind::Audio);
    let b = second.register(&audio, MaterialKind::Audio);
    assert_ne!(a.id, b.id);
    assert_eq!(a.duration_us, b.duration_us);
}

/// Durations keyed by file name.
struct TableProbe(HashMap<String, u64>);

impl MediaProbe for TableProbe {
    fn created_at(&self, _path: &Path) -> StoryreelResult<DateTime<Utc>> {
        Ok(DateTime::<Utc>::default())
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

proptest! {
    #[test]
    fn scene_starts_are_prefix_sums_of_placed_durations(
        layout in prop::collection::vec((1u64..20_000_000, any::<bool>()), 1..12)
    ) {
        let mut durations = HashMap::new();
        let mut scenes = Vec::new();
        for (i, (duration, narrated)) in layout.iter().enumerate() {
            let id = format!("scene{}", i + 1);
            durations.insert(format!("{id}.mp3"), *duration);
            scenes.push(SceneAsset {
                scene_id: SceneId::new(id.as_str()),
                candidates: vec![PathBuf::from(format!("/s/{id}_1.jpeg"))],
                selected_image: PathBuf::from(format!("/s/{id}_1.jpeg")),
                narration: narrated.then(|| Narration {
                    audio_path: PathBuf::from(format!("/s/{id}.mp3")),
                    subtitle_path: PathBuf::from(format!("/s/{id}.srt")),
                    cues: vec![Cue::new(1, 5_000, 5_000 + duration / 2, "x")],
                }),
            });
        }

        let mut registry = MaterialRegistry::new(
            Box::new(TableProbe(durations)),
            HostClock::from_unix_secs(0),
        );
        let report = TimelineAssembler::with_defaults()
            .build(&scenes, CANVAS, &mut registry)
            .unwrap();

        let mut expected_start = 0;
        let mut placed = report.placements.iter();
        for (i, (duration, narrated)) in layout.iter().enumerate() {
            let id = SceneId::new(format!("scene{}", i + 1));
            if *narrated {
                let placement = placed.next().unwrap();
                prop_assert_eq!(&placement.scene_id, &id);
                prop_assert_eq!(placement.range.start_us, expected_start);
                prop_assert_eq!(placement.range.duration_us, *duration);
                expected_start += duration;
            } else {
                prop_assert!(report.skipped.contains(&id));
                prop_assert!(report.placement(&id).is_none());
            }
        }
        prop_assert_eq!(report.timeline.total_duration_us, expected_start);

        let subtitle_starts: Vec<u64> = report
            .timeline
            .track(SUBTITLE_TRACK)
            .unwrap()
            .segments
            .iter()
            .map(|s| s.target.start_us)
            .collect();
        let scene_starts: Vec<u64> = report.placements.iter().map(|p| p.range.start_us).collect();
        prop_assert_eq!(subtitle_starts, scene_starts);
    }
}
