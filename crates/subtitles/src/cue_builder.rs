//! Cue building from speech-synthesis word boundaries.
//!
//! The synthesis backend emits one boundary event per spoken word with an
//! offset and duration in 100 ns ticks. Each word becomes a cue; adjacent
//! cues are then merged so a subtitle shows a readable phrase instead of a
//! single word.

use serde::{Deserialize, Serialize};

use storyreel_common::clock::ticks_to_us;
use storyreel_common::error::{StoryreelError, StoryreelResult};
use storyreel_project_model::scene::Cue;

use crate::srt::compose_srt;

/// Kind of boundary reported by the synthesis backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    Word,
    Punctuation,
    Sentence,
}

impl BoundaryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryKind::Word => "word",
            BoundaryKind::Punctuation => "punctuation",
            BoundaryKind::Sentence => "sentence",
        }
    }
}

/// A timing event from the synthesis backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryEvent {
    pub kind: BoundaryKind,
    pub text: String,
    /// Offset from the start of the audio, in 100 ns ticks.
    pub offset_ticks: u64,
    /// Duration in 100 ns ticks.
    pub duration_ticks: u64,
}

impl BoundaryEvent {
    /// Word boundary event.
    pub fn word(text: impl Into<String>, offset_ticks: u64, duration_ticks: u64) -> Self {
        Self {
            kind: BoundaryKind::Word,
            text: text.into(),
            offset_ticks,
            duration_ticks,
        }
    }
}

/// Accumulates cues from boundary events and merges them under a budget.
#[derive(Debug, Clone, Default)]
pub struct SubtitleCueBuilder {
    cues: Vec<Cue>,
}

impl SubtitleCueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from already-timed cues, e.g. a parsed subtitle file.
    pub fn from_cues(cues: Vec<Cue>) -> Self {
        Self { cues }
    }

    /// Append one cue for a word boundary event.
    pub fn feed(&mut self, event: &BoundaryEvent) -> StoryreelResult<()> {
        if event.kind != BoundaryKind::Word {
            return Err(StoryreelError::InvalidEventKind {
                kind: event.kind.as_str().to_string(),
            });
        }

        let start_us = ticks_to_us(event.offset_ticks);
        let end_us = ticks_to_us(event.offset_ticks.saturating_add(event.duration_ticks));
        self.cues
            .push(Cue::new(self.cues.len() + 1, start_us, end_us, event.text.clone()));
        Ok(())
    }

    /// Merge adjacent cues while their combined unit count stays within
    /// `max_units`. A cue that would push the running count over the budget
    /// starts the next merged cue.
    pub fn merge_cues(&mut self, max_units: i64) -> StoryreelResult<()> {
        if max_units <= 0 {
            return Err(StoryreelError::invalid_argument(format!(
                "merge budget must be positive, got {max_units}"
            )));
        }
        if self.cues.is_empty() {
            return Ok(());
        }

        let budget = usize::try_from(max_units).unwrap_or(usize::MAX);
        let source_count = self.cues.len();
        let mut merged: Vec<Cue> = Vec::with_capacity(source_count);
        let mut current: Option<Cue> = None;
        let mut units = 0usize;

        for cue in self.cues.drain(..) {
            let cue_units = count_units(&cue.text);
            current = match current.take() {
                Some(mut acc) if units + cue_units <= budget => {
                    acc.end_us = acc.end_us.max(cue.end_us);
                    join_text(&mut acc.text, &cue.text);
                    units += cue_units;
                    Some(acc)
                }
                Some(acc) => {
                    merged.push(acc);
                    units = cue_units;
                    Some(cue)
                }
                None => {
                    units = cue_units;
                    Some(cue)
                }
            };
        }
        merged.extend(current);

        for (i, cue) in merged.iter_mut().enumerate() {
            cue.index = i + 1;
        }

        tracing::debug!(
            source = source_count,
            merged = merged.len(),
            max_units,
            "Merged subtitle cues"
        );
        self.cues = merged;
        Ok(())
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn into_cues(self) -> Vec<Cue> {
        self.cues
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// The cues as SRT text.
    pub fn get_subtitle_text(&self) -> String {
        compose_srt(&self.cues)
    }
}

/// Append `next` to `text`, keeping a space between two Latin words.
fn join_text(text: &mut String, next: &str) {
    let needs_space = match (text.chars().last(), next.chars().next()) {
        (Some(a), Some(b)) => is_latin_alnum(a) && is_latin_alnum(b),
        _ => false,
    };
    if needs_space {
        text.push(' ');
    }
    text.push_str(next);
}

fn is_latin_alnum(c: char) -> bool {
    c.is_alphanumeric() && !is_cjk(c)
}

/// Whether `c` is a CJK ideograph, kana or Hangul syllable.
pub fn is_cjk(c: char) -> bool {
    matches!(
        c as u32,
        0x3040..=0x30FF        // Hiragana, Katakana
        | 0x3400..=0x4DBF      // CJK Extension A
        | 0x4E00..=0x9FFF      // CJK Unified Ideographs
        | 0x1100..=0x11FF      // Hangul Jamo
        | 0xAC00..=0xD7AF      // Hangul Syllables
        | 0xF900..=0xFAFF      // CJK Compatibility Ideographs
        | 0x20000..=0x2FA1F    // Extensions B onwards
    )
}

/// Count display units: one per CJK character, one per whitespace-delimited
/// run of other characters that contains a letter or digit. Punctuation on
/// its own counts nothing.
pub fn count_units(text: &str) -> usize {
    let mut units = 0;
    let mut run_has_alnum = false;

    for c in text.chars() {
        if is_cjk(c) {
            units += usize::from(run_has_alnum) + 1;
            run_has_alnum = false;
        } else if c.is_whitespace() {
            units += usize::from(run_has_alnum);
            run_has_alnum = false;
        } else if c.is_alphanumeric() {
            run_has_alnum = true;
        }
    }

    units + usize::from(run_has_alnum)
}
