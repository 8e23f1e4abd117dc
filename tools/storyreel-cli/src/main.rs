//! Storyreel CLI: turn scene directories into editor draft bundles.
//!
//! Usage:
//!   storyreel draft <SCENE_DIR>       Build a draft bundle
//!   storyreel scan <SCENE_DIR>        List scenes, candidates, and narration
//!   storyreel subtitles <FILE.srt>    Merge subtitle cues
//!   storyreel validate <BUNDLE>       Validate a written bundle

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use storyreel_common::config::AppConfig;

mod commands;
mod picker;

#[derive(Parser)]
#[command(
    name = "storyreel",
    about = "Assemble narrated scene directories into editor drafts",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the standard location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a draft bundle from a scene directory
    Draft {
        /// Directory holding scene images, narration audio, and subtitles
        scene_dir: PathBuf,

        /// Directory the bundle is written into
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Bundle name (defaults to the scene directory name)
        #[arg(short, long)]
        name: Option<String>,

        /// Template bundle to patch
        #[arg(long)]
        template: Option<PathBuf>,

        /// Write mode: auto|template|synthesize
        #[arg(long, default_value = "auto")]
        mode: String,

        /// Image selection: random|first|interactive
        #[arg(long, default_value = "random")]
        select: String,

        /// Seed for random selection
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List scenes found in a scene directory
    Scan {
        /// Directory holding scene images, narration audio, and subtitles
        scene_dir: PathBuf,
    },

    /// Merge the cues of a subtitle file
    Subtitles {
        /// Subtitle file
        path: PathBuf,

        /// Word budget per merged cue
        #[arg(long, default_value = "10")]
        merge: i64,

        /// Output file (defaults to rewriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a draft bundle
    Validate {
        /// Path to the bundle directory
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    storyreel_common::logging::init_logging(&logging);

    let result = match cli.command {
        Commands::Draft {
            scene_dir,
            output,
            name,
            template,
            mode,
            select,
            seed,
        } => commands::draft::run(
            config,
            commands::draft::DraftArgs {
                scene_dir,
                output,
                name,
                template,
                mode,
                select,
                seed,
            },
        ),
        Commands::Scan { scene_dir } => commands::scan::run(&config, scene_dir),
        Commands::Subtitles {
            path,
            merge,
            output,
        } => commands::subtitles::run(path, merge, output),
        Commands::Validate { path } => commands::validate::run(path),
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Command failed");
    }
    result
}
