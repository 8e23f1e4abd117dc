//! Merge the cues of a subtitle file.

use std::path::PathBuf;

use storyreel_subtitles::{load_subtitle_file, save_subtitle_file, SubtitleCueBuilder};

pub fn run(path: PathBuf, merge: i64, output: Option<PathBuf>) -> anyhow::Result<()> {
    let cues = load_subtitle_file(&path)?;
    let before = cues.len();

    let mut builder = SubtitleCueBuilder::from_cues(cues);
    builder.merge_cues(merge)?;

    let output = output.unwrap_or(path);
    save_subtitle_file(&output, builder.cues())?;

    println!(
        "Merged {before} cue(s) into {} -> {}",
        builder.len(),
        output.display()
    );
    Ok(())
}
