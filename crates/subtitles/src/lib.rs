//! Storyreel Subtitles
//!
//! Subtitle cue handling for narrated scenes:
//! - **Cue Building:** Word-boundary events from speech synthesis become cues
//! - **Cue Merging:** Adjacent cues merge under a word/character budget
//! - **SRT:** Compose and parse the subtitle exchange format
//! - **Narration:** Drive a speech-synthesis backend and write the SRT beside its audio

pub mod cue_builder;
pub mod narration;
pub mod srt;

pub use cue_builder::*;
pub use narration::*;
pub use srt::*;
