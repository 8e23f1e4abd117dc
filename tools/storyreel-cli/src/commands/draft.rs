//! Build a draft bundle from a scene directory.

use std::path::PathBuf;

use storyreel_assembly::{ImagePicker, ImageSelectionPolicy};
use storyreel_common::clock::us_to_secs;
use storyreel_common::config::AppConfig;
use storyreel_draft_writer::{generate_draft, DraftJob, WriteMode};
use storyreel_project_model::bundle::Provenance;

use crate::picker::TerminalPicker;

pub struct DraftArgs {
    pub scene_dir: PathBuf,
    pub output: Option<PathBuf>,
    pub name: Option<String>,
    pub template: Option<PathBuf>,
    pub mode: String,
    pub select: String,
    pub seed: Option<u64>,
}

pub fn run(mut config: AppConfig, args: DraftArgs) -> anyhow::Result<()> {
    let write_mode = match args.mode.as_str() {
        "auto" => WriteMode::Auto,
        "template" => WriteMode::Template,
        "synthesize" => WriteMode::Synthesize,
        other => {
            return Err(anyhow::anyhow!(
                "Unknown write mode: {other}. Use: auto, template, synthesize"
            ));
        }
    };
    let policy = match args.select.as_str() {
        "random" => ImageSelectionPolicy::Random { seed: args.seed },
        "first" => ImageSelectionPolicy::First,
        "interactive" => ImageSelectionPolicy::Interactive,
        other => {
            return Err(anyhow::anyhow!(
                "Unknown selection: {other}. Use: random, first, interactive"
            ));
        }
    };

    if args.template.is_some() {
        config.template_dir = args.template;
    }

    println!("Building draft from: {}", args.scene_dir.display());

    let mut job = DraftJob::new(args.scene_dir, config);
    job.output_dir = args.output;
    job.bundle_name = args.name;
    job.policy = policy;
    job.write_mode = write_mode;

    let mut terminal = TerminalPicker::stdio();
    let picker: Option<&mut dyn ImagePicker> = match job.policy {
        ImageSelectionPolicy::Interactive => Some(&mut terminal),
        _ => None,
    };

    let report = generate_draft(&job, picker)?;

    println!("  Bundle: {}", report.bundle_path.display());
    println!("  Draft ID: {}", report.draft_id);
    match &report.provenance {
        Provenance::TemplatePatch { template } => {
            println!("  Source: template {}", template.display());
        }
        Provenance::Synthesized { fell_back: true } => {
            println!("  Source: synthesized (template missing)");
        }
        Provenance::Synthesized { fell_back: false } => println!("  Source: synthesized"),
    }
    println!("  Duration: {:.2}s", us_to_secs(report.duration_us));
    println!(
        "  Scenes: {} processed, {} skipped",
        report.processed,
        report.skipped.len()
    );
    for scene in &report.skipped {
        println!("    - skipped {scene}");
    }

    Ok(())
}
