//! End-to-end draft generation: resolve → select → register → assemble →
//! write.

use std::path::PathBuf;

use storyreel_assembly::{
    AssetResolver, FsProbe, ImagePicker, ImageSelectionPolicy, MaterialRegistry, MediaProbe,
    TimelineAssembler,
};
use storyreel_common::clock::{secs_to_us, HostClock};
use storyreel_common::config::AppConfig;
use storyreel_common::error::{StoryreelError, StoryreelResult};
use storyreel_project_model::bundle::Provenance;
use storyreel_project_model::material::{Dimensions, MaterialKind};
use storyreel_project_model::scene::SceneId;
use storyreel_project_model::timeline::Canvas;

use crate::writer::{DraftBundleWriter, WriteMode};

/// One generation run.
#[derive(Debug, Clone)]
pub struct DraftJob {
    pub scene_dir: PathBuf,
    /// Parent of the bundle directory; `config.drafts_dir` when unset.
    pub output_dir: Option<PathBuf>,
    /// Bundle directory name; the scene directory's name when unset.
    pub bundle_name: Option<String>,
    pub policy: ImageSelectionPolicy,
    pub write_mode: WriteMode,
    pub config: AppConfig,
}

impl DraftJob {
    pub fn new(scene_dir: impl Into<PathBuf>, config: AppConfig) -> Self {
        Self {
            scene_dir: scene_dir.into(),
            output_dir: None,
            bundle_name: None,
            policy: ImageSelectionPolicy::Random { seed: None },
            write_mode: WriteMode::Auto,
            config,
        }
    }

    fn resolved_bundle_name(&self) -> StoryreelResult<String> {
        if let Some(name) = &self.bundle_name {
            return Ok(name.clone());
        }
        self.scene_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                StoryreelError::invalid_argument(format!(
                    "cannot derive a bundle name from {}",
                    self.scene_dir.display()
                ))
            })
    }
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct DraftReport {
    pub bundle_path: PathBuf,
    pub draft_id: String,
    pub provenance: Provenance,
    pub processed: usize,
    pub skipped: Vec<SceneId>,
    pub duration_us: u64,
}

/// Run `job` with filesystem probing.
pub fn generate_draft(
    job: &DraftJob,
    picker: Option<&mut dyn ImagePicker>,
) -> StoryreelResult<DraftReport> {
    generate_draft_with_probe(job, picker, Box::new(FsProbe))
}

/// Run `job` with a caller-supplied probe.
///
/// Nothing is written unless at least one scene is placed.
pub fn generate_draft_with_probe(
    job: &DraftJob,
    picker: Option<&mut dyn ImagePicker>,
    probe: Box<dyn MediaProbe>,
) -> StoryreelResult<DraftReport> {
    let config = &job.config;
    let bundle_name = job.resolved_bundle_name()?;
    let output_dir = job
        .output_dir
        .clone()
        .unwrap_or_else(|| config.drafts_dir.clone());
    let clock = HostClock::now();

    tracing::info!(
        scene_dir = %job.scene_dir.display(),
        output_dir = %output_dir.display(),
        bundle = %bundle_name,
        "Generating draft"
    );

    let scenes = AssetResolver::new(config.scan.clone()).resolve(
        &job.scene_dir,
        &job.policy,
        picker,
    )?;

    let canvas = Canvas {
        width: config.canvas.width,
        height: config.canvas.height,
    };
    let mut registry = MaterialRegistry::new(probe, clock)
        .with_fallback_duration_us(secs_to_us(config.assembly.fallback_duration_secs))
        .with_fallback_dimensions(Dimensions {
            width: canvas.width,
            height: canvas.height,
        });
    for scene in &scenes {
        for candidate in &scene.candidates {
            registry.register(candidate, MaterialKind::Image);
        }
        if let Some(narration) = &scene.narration {
            registry.register(&narration.audio_path, MaterialKind::Audio);
        }
    }

    let report = TimelineAssembler::new(config.assembly.clone()).build(
        &scenes,
        canvas,
        &mut registry,
    )?;
    if report.processed() == 0 {
        return Err(StoryreelError::NoUsableScenes {
            dir: job.scene_dir.clone(),
        });
    }

    let bundle = DraftBundleWriter::new(config.editor.clone())
        .with_template(config.template_dir.clone())
        .with_mode(job.write_mode)
        .with_clock(clock)
        .write(&report.timeline, &registry, &output_dir, &bundle_name)?;

    tracing::info!(
        bundle = %bundle.identity.path.display(),
        processed = report.processed(),
        skipped = report.skipped.len(),
        "Draft generated"
    );

    Ok(DraftReport {
        bundle_path: bundle.identity.path,
        draft_id: bundle.identity.id,
        provenance: bundle.provenance,
        processed: report.processed(),
        skipped: report.skipped,
        duration_us: report.timeline.total_duration_us,
    })
}
