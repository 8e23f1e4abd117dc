//! Validate a draft bundle.

use std::path::PathBuf;

use storyreel_common::clock::us_to_secs;
use storyreel_project_model::BundleSummary;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating bundle at: {}", path.display());

    let summary =
        BundleSummary::load(&path).map_err(|e| anyhow::anyhow!("Failed to load bundle: {e}"))?;

    println!("  Name: {}", summary.draft_name.as_deref().unwrap_or("-"));
    println!("  Draft ID: {}", summary.draft_id.as_deref().unwrap_or("-"));
    println!("  Duration: {:.2}s", us_to_secs(summary.duration_us));
    println!(
        "  Tracks: {} ({} segments)",
        summary.track_count, summary.segment_count
    );
    println!(
        "  Materials: {} referenced, {} linked",
        summary.material_paths.len(),
        summary.linked_material_ids.len()
    );

    let errors = summary.validate_sources();
    if errors.is_empty() {
        println!("  Sources: All present");
        println!("\nBundle is valid.");
    } else {
        println!("\nValidation issues:");
        for error in &errors {
            println!("  - {error}");
        }
        println!(
            "\n{} issue(s) found. The editor may show missing media.",
            errors.len()
        );
    }

    Ok(())
}
