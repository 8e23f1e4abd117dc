//! SRT compose and parse.
//!
//! Blocks are `index`, `HH:MM:SS,mmm --> HH:MM:SS,mmm`, one or more text
//! lines, and a blank separator. Timestamps carry millisecond precision, so
//! microsecond cue times are truncated to the millisecond on compose.

use std::path::Path;

use storyreel_common::error::{StoryreelError, StoryreelResult};
use storyreel_project_model::scene::Cue;

const ARROW: &str = "-->";

/// Generate SRT content from cues. Blocks are numbered by position.
pub fn compose_srt(cues: &[Cue]) -> String {
    let mut output = String::new();

    for (i, cue) in cues.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} {ARROW} {}\n",
            format_srt_time(cue.start_us),
            format_srt_time(cue.end_us),
        ));
        output.push_str(&legal_text(&cue.text));
        output.push_str("\n\n");
    }

    output
}

/// A blank line inside cue text would end the block early, so drop them.
fn legal_text(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse SRT content into cues, preserving file order and indices.
///
/// Tolerates a UTF-8 BOM, CRLF line endings, runs of blank lines between
/// blocks, and blocks without text.
pub fn parse_srt(content: &str) -> StoryreelResult<Vec<Cue>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let lines: Vec<&str> = content.lines().collect();
    let mut cues = Vec::new();
    let mut i = 0;

    loop {
        while i < lines.len() && lines[i].trim().is_empty() {
            i += 1;
        }
        if i >= lines.len() {
            break;
        }

        let index = lines[i]
            .trim()
            .parse::<usize>()
            .map_err(|_| StoryreelError::subtitle_parse(i + 1, "expected cue index"))?;
        i += 1;

        let timing = lines
            .get(i)
            .ok_or_else(|| StoryreelError::subtitle_parse(i + 1, "missing timing line"))?;
        let (start_us, end_us) = parse_timing_line(timing)
            .ok_or_else(|| StoryreelError::subtitle_parse(i + 1, "malformed timing line"))?;
        if end_us < start_us {
            return Err(StoryreelError::subtitle_parse(
                i + 1,
                "cue ends before it starts",
            ));
        }
        i += 1;

        let mut text_lines = Vec::new();
        while i < lines.len() && !lines[i].trim().is_empty() {
            text_lines.push(lines[i]);
            i += 1;
        }

        cues.push(Cue::new(index, start_us, end_us, text_lines.join("\n")));
    }

    Ok(cues)
}

/// Parse `start --> end`, ignoring any trailing position hints.
fn parse_timing_line(line: &str) -> Option<(u64, u64)> {
    let (start, rest) = line.split_once(ARROW)?;
    let end = rest.split_whitespace().next()?;
    Some((parse_srt_time(start.trim())?, parse_srt_time(end)?))
}

/// Format microseconds as SRT timestamp: HH:MM:SS,mmm
pub fn format_srt_time(us: u64) -> String {
    let total_ms = us / 1000;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Parse an SRT timestamp (`HH:MM:SS,mmm`, `.` accepted for `,`) to microseconds.
pub fn parse_srt_time(raw: &str) -> Option<u64> {
    let mut parts = raw.split(':');
    let hours: u64 = parts.next()?.trim().parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let rest = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let (seconds, millis) = rest.split_once([',', '.'])?;
    let seconds: u64 = seconds.parse().ok()?;
    if minutes >= 60 || seconds >= 60 || millis.len() != 3 {
        return None;
    }
    let millis: u64 = millis.parse().ok()?;
    Some(((hours * 3600 + minutes * 60 + seconds) * 1000 + millis) * 1000)
}

/// Read and parse a subtitle file.
pub fn load_subtitle_file(path: &Path) -> StoryreelResult<Vec<Cue>> {
    if !path.exists() {
        return Err(StoryreelError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    parse_srt(&content)
}

/// Save cues as an SRT file.
pub fn save_subtitle_file(path: &Path, cues: &[Cue]) -> StoryreelResult<()> {
    std::fs::write(path, compose_srt(cues))
        .map_err(|e| StoryreelError::write_failure(path, e))?;
    tracing::debug!(path = %path.display(), cues = cues.len(), "Wrote subtitle file");
    Ok(())
}
