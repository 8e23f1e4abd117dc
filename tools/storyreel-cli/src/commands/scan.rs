//! List what a scene directory contains.

use std::path::PathBuf;

use storyreel_assembly::AssetResolver;
use storyreel_common::config::AppConfig;

pub fn run(config: &AppConfig, scene_dir: PathBuf) -> anyhow::Result<()> {
    let resolver = AssetResolver::new(config.scan.clone());
    let candidates = resolver.scan(&scene_dir);
    let pairs = resolver.pair_audio_subtitle(&scene_dir);

    println!("Scene directory: {}", scene_dir.display());
    if candidates.is_empty() {
        println!("  No scenes found.");
        return Ok(());
    }

    for (scene, images) in &candidates {
        println!("  {scene}: {} candidate(s)", images.len());
        for image in images {
            println!("    {}", image.display());
        }
        match pairs.get(scene) {
            Some(pair) => println!(
                "    narration: {} + {}",
                pair.audio_path.display(),
                pair.subtitle_path.display()
            ),
            None => println!("    narration: missing (scene will be skipped)"),
        }
    }

    let narrated = candidates.keys().filter(|s| pairs.contains_key(*s)).count();
    println!(
        "\n{} scene(s), {} with narration.",
        candidates.len(),
        narrated
    );
    Ok(())
}
