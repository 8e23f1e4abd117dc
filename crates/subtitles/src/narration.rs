//! Narration driver.
//!
//! Runs a speech-synthesis backend for one scene's narration text and writes
//! the subtitle file next to the produced audio, so the scene directory ends
//! up with the `<scene>.<audio>` / `<scene>.srt` pair the resolver expects.

use std::path::{Path, PathBuf};

use storyreel_common::error::StoryreelResult;
use storyreel_project_model::scene::NarrationPair;

use crate::cue_builder::{BoundaryEvent, BoundaryKind, SubtitleCueBuilder};
use crate::srt::save_subtitle_file;

/// Boundary events produced while synthesizing, consumed lazily.
pub type BoundaryStream<'a> = Box<dyn Iterator<Item = BoundaryEvent> + 'a>;

/// Text-to-speech backend.
pub trait SpeechSynthesis {
    /// Synthesize `text` with `voice` into `audio_path`, returning the
    /// boundary events for the produced audio.
    fn synthesize(&self, text: &str, voice: &str, audio_path: &Path)
        -> StoryreelResult<BoundaryStream<'_>>;
}

/// One narration to synthesize.
#[derive(Debug, Clone)]
pub struct NarrationRequest {
    pub text: String,
    pub voice: String,
    pub audio_path: PathBuf,
    /// Word budget per merged cue; 0 keeps one cue per word.
    pub merge_words: usize,
}

/// Path of the subtitle file that pairs with `audio_path`.
pub fn subtitle_path_for(audio_path: &Path) -> PathBuf {
    audio_path.with_extension("srt")
}

/// Synthesize the narration and write its subtitle file.
pub fn narrate(
    synth: &dyn SpeechSynthesis,
    request: &NarrationRequest,
) -> StoryreelResult<NarrationPair> {
    let events = synth.synthesize(&request.text, &request.voice, &request.audio_path)?;

    let mut builder = SubtitleCueBuilder::new();
    for event in events {
        if event.kind != BoundaryKind::Word {
            tracing::debug!(kind = event.kind.as_str(), text = %event.text, "Skipping boundary event");
            continue;
        }
        builder.feed(&event)?;
    }

    if request.merge_words > 0 {
        builder.merge_cues(i64::try_from(request.merge_words).unwrap_or(i64::MAX))?;
    }

    let subtitle_path = subtitle_path_for(&request.audio_path);
    save_subtitle_file(&subtitle_path, builder.cues())?;

    tracing::info!(
        audio = %request.audio_path.display(),
        subtitle = %subtitle_path.display(),
        cues = builder.len(),
        "Narration generated"
    );

    Ok(NarrationPair {
        audio_path: request.audio_path.clone(),
        subtitle_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srt::load_subtitle_file;

    /// Writes an empty audio file and replays canned events.
    struct ScriptedSynth {
        events: Vec<BoundaryEvent>,
    }

    impl SpeechSynthesis for ScriptedSynth {
        fn synthesize(
            &self,
            _text: &str,
            _voice: &str,
            audio_path: &Path,
        ) -> StoryreelResult<BoundaryStream<'_>> {
            std::fs::write(audio_path, b"")?;
            Ok(Box::new(self.events.iter().cloned()))
        }
    }

    fn request(dir: &Path, merge_words: usize) -> NarrationRequest {
        NarrationRequest {
            text: "hello brave new world".into(),
            voice: "zh-CN-YunzeNeural".into(),
            audio_path: dir.join("scene1.mp3"),
            merge_words,
        }
    }

    fn synth() -> ScriptedSynth {
        ScriptedSynth {
            events: vec![
                BoundaryEvent::word("hello", 0, 3_000_000),
                BoundaryEvent::word("brave", 3_000_000, 3_000_000),
                BoundaryEvent {
                    kind: BoundaryKind::Punctuation,
                    text: ",".into(),
                    offset_ticks: 6_000_000,
                    duration_ticks: 0,
                },
                BoundaryEvent::word("new", 6_000_000, 2_000_000),
                BoundaryEvent::word("world", 8_000_000, 4_000_000),
            ],
        }
    }

    #[test]
    fn test_narrate_writes_merged_srt_beside_audio() {
        let dir = tempfile::tempdir().unwrap();
        let pair = narrate(&synth(), &request(dir.path(), 2)).unwrap();

        assert_eq!(pair.subtitle_path, dir.path().join("scene1.srt"));
        assert!(pair.audio_path.exists());

        let cues = load_subtitle_file(&pair.subtitle_path).unwrap();
        let texts: Vec<&str> = cues.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["hello brave", "new world"]);
        assert_eq!(cues[1].start_us, 600_000);
        assert_eq!(cues[1].end_us, 1_200_000);
    }

    #[test]
    fn test_zero_budget_keeps_word_cues() {
        let dir = tempfile::tempdir().unwrap();
        let pair = narrate(&synth(), &request(dir.path(), 0)).unwrap();
        let cues = load_subtitle_file(&pair.subtitle_path).unwrap();
        assert_eq!(cues.len(), 4);
    }
}
