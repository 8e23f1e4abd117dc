//! Scene and subtitle cue types.
//!
//! A scene is one narrated unit: a narration clip, the subtitle cues timed
//! against it, and one or more candidate images.

use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Identifier of a scene, taken from the filename prefix (`<scene>_<n>.jpeg`).
///
/// Scene ids order by the number embedded in them (`scene2` < `scene10`),
/// falling back to lexical order for ties and ids without digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(String);

impl SceneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value of all ASCII digits in the id read as one number.
    pub fn numeric_key(&self) -> Option<u64> {
        let digits: String = self.0.chars().filter(char::is_ascii_digit).collect();
        digits.parse().ok()
    }
}

impl Ord for SceneId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric_key(), other.numeric_key()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for SceneId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SceneId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A timed span of subtitle text, in microseconds relative to its narration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cue {
    /// 1-based position in its cue list.
    pub index: usize,
    pub start_us: u64,
    pub end_us: u64,
    pub text: String,
}

impl Cue {
    pub fn new(index: usize, start_us: u64, end_us: u64, text: impl Into<String>) -> Self {
        Self {
            index,
            start_us,
            end_us: end_us.max(start_us),
            text: text.into(),
        }
    }

    pub fn duration_us(&self) -> u64 {
        self.end_us.saturating_sub(self.start_us)
    }
}

/// Narration audio paired with its subtitle file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrationPair {
    pub audio_path: PathBuf,
    pub subtitle_path: PathBuf,
}

/// Narration of a scene with its parsed cues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narration {
    pub audio_path: PathBuf,
    pub subtitle_path: PathBuf,
    /// Cues ordered by start.
    pub cues: Vec<Cue>,
}

/// All assets of one scene, built fresh for each generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneAsset {
    pub scene_id: SceneId,

    /// Candidate images in candidate-index order.
    pub candidates: Vec<PathBuf>,

    /// The image chosen for the timeline.
    pub selected_image: PathBuf,

    /// `None` when the scene lacks its audio/subtitle pair; such scenes are
    /// skipped by the assembler.
    pub narration: Option<Narration>,
}

impl SceneAsset {
    /// Whether the scene contributes segments to the timeline.
    pub fn is_placeable(&self) -> bool {
        self.narration.is_some()
    }
}
