//! Multi-track timeline types.
//!
//! The shapes here mirror what the target editor stores: typed tracks with a
//! stacking order, each holding time-ordered segments that reference
//! materials by id and carry a per-kind style payload.

use serde::{Deserialize, Serialize};

/// A span on the timeline, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_us: u64,
    pub duration_us: u64,
}

impl TimeRange {
    pub fn new(start_us: u64, duration_us: u64) -> Self {
        Self {
            start_us,
            duration_us,
        }
    }

    /// Exclusive end.
    pub fn end_us(&self) -> u64 {
        self.start_us + self.duration_us
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start_us < other.end_us() && other.start_us < self.end_us()
    }
}

/// Track type as the editor names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
    Text,
    Effect,
}

impl TrackKind {
    /// Render index offset of the kind; effect tracks sit above text.
    pub fn base_render_index(&self) -> u32 {
        match self {
            TrackKind::Video | TrackKind::Audio => 0,
            TrackKind::Text => 14_000,
            TrackKind::Effect => 15_000,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Video => "video",
            TrackKind::Audio => "audio",
            TrackKind::Text => "text",
            TrackKind::Effect => "effect",
        }
    }
}

/// Output canvas in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

/// Placement of a visual segment on the canvas.
///
/// `transform_*` are normalized offsets from the center; `-1.0` on the y axis
/// is the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipTransform {
    pub scale: f64,
    pub alpha: f64,
    pub transform_x: f64,
    pub transform_y: f64,
}

impl Default for ClipTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            alpha: 1.0,
            transform_x: 0.0,
            transform_y: 0.0,
        }
    }
}

/// When an animation plays within its segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationPhase {
    Intro,
    Outro,
}

/// An animation attached to a video segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub name: String,
    pub animation_id: String,
    pub resource_id: String,
    pub phase: AnimationPhase,
    pub duration_us: u64,
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// Numeric code used by the editor.
    pub fn code(&self) -> u8 {
        match self {
            TextAlign::Left => 0,
            TextAlign::Center => 1,
            TextAlign::Right => 2,
        }
    }
}

/// Outline drawn around text glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextBorder {
    pub color: [f64; 3],
    pub alpha: f64,
    /// Width on the editor's 0-100 scale.
    pub width: f64,
}

/// Typography and placement of a text segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub size: f64,
    pub color: [f64; 3],
    pub alpha: f64,
    pub align: TextAlign,
    pub auto_wrapping: bool,
    pub max_line_width: f64,
    pub border: Option<TextBorder>,
    pub clip: ClipTransform,
}

/// Adjustable effect parameter, value on the 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectParam {
    pub name: String,
    pub value: f64,
}

/// A scene effect applied to everything beneath its track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectStyle {
    pub name: String,
    pub effect_id: String,
    pub resource_id: String,
    pub params: Vec<EffectParam>,
}

/// Per-kind style payload of a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SegmentStyle {
    Video {
        clip: ClipTransform,
        animations: Vec<Animation>,
    },
    Audio {
        /// Linear gain multiplier.
        volume: f64,
    },
    Text {
        text: String,
        style: TextStyle,
    },
    Effect(EffectStyle),
}

impl SegmentStyle {
    /// Track kind this payload belongs on.
    pub fn track_kind(&self) -> TrackKind {
        match self {
            SegmentStyle::Video { .. } => TrackKind::Video,
            SegmentStyle::Audio { .. } => TrackKind::Audio,
            SegmentStyle::Text { .. } => TrackKind::Text,
            SegmentStyle::Effect(_) => TrackKind::Effect,
        }
    }
}

/// A placed, timed reference to a material on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,

    /// Referenced material; text and effect segments own their payload.
    pub material_id: Option<String>,

    /// Span on the timeline.
    pub target: TimeRange,

    /// Span within the source media, for trimmed media.
    pub source: Option<TimeRange>,

    pub style: SegmentStyle,
}

impl Segment {
    pub fn track_kind(&self) -> TrackKind {
        self.style.track_kind()
    }
}

/// An ordered, typed lane of segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub kind: TrackKind,

    /// Stacking position among all tracks (0 = lowest).
    pub z_order: u32,

    /// Editor flag; text tracks holding subtitles use 1.
    pub flag: u32,

    pub segments: Vec<Segment>,
}

impl Track {
    pub fn new(name: impl Into<String>, kind: TrackKind, z_order: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            z_order,
            flag: 0,
            segments: vec![],
        }
    }

    pub fn with_flag(mut self, flag: u32) -> Self {
        self.flag = flag;
        self
    }

    pub fn render_index(&self) -> u32 {
        self.kind.base_render_index() + self.z_order
    }

    /// End of the last segment, or 0 for an empty track.
    pub fn end_us(&self) -> u64 {
        self.segments.last().map_or(0, |s| s.target.end_us())
    }

    /// Append a segment, keeping segments time-ordered and non-overlapping.
    pub fn push(&mut self, segment: Segment) -> Result<(), TimelineError> {
        if segment.track_kind() != self.kind {
            return Err(TimelineError::KindMismatch {
                track: self.name.clone(),
                expected: self.kind,
                found: segment.track_kind(),
            });
        }
        let previous_end_us = self.end_us();
        if segment.target.start_us < previous_end_us {
            return Err(TimelineError::Overlap {
                track: self.name.clone(),
                start_us: segment.target.start_us,
                previous_end_us,
            });
        }
        self.segments.push(segment);
        Ok(())
    }
}

/// Ordered tracks plus canvas and total duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub canvas: Canvas,
    pub tracks: Vec<Track>,

    /// End of the last primary (video/audio) segment.
    pub total_duration_us: u64,
}

impl Timeline {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            tracks: vec![],
            total_duration_us: 0,
        }
    }

    pub fn add_track(&mut self, track: Track) -> Result<(), TimelineError> {
        if self.track(&track.name).is_some() {
            return Err(TimelineError::DuplicateTrack { name: track.name });
        }
        self.tracks.push(track);
        Ok(())
    }

    pub fn track(&self, name: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.name == name)
    }

    pub fn track_mut(&mut self, name: &str) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.name == name)
    }

    /// Append a segment to the named track and extend the total duration when
    /// the segment is primary.
    pub fn push_segment(&mut self, track_name: &str, segment: Segment) -> Result<(), TimelineError> {
        let primary = matches!(segment.track_kind(), TrackKind::Video | TrackKind::Audio);
        let end_us = segment.target.end_us();
        let track = self
            .track_mut(track_name)
            .ok_or_else(|| TimelineError::UnknownTrack {
                name: track_name.to_string(),
            })?;
        track.push(segment)?;
        if primary {
            self.total_duration_us = self.total_duration_us.max(end_us);
        }
        Ok(())
    }

    /// Tracks in stacking order, lowest first.
    pub fn tracks_by_render_order(&self) -> Vec<&Track> {
        let mut tracks: Vec<&Track> = self.tracks.iter().collect();
        tracks.sort_by_key(|t| (t.render_index(), t.z_order));
        tracks
    }

    /// All segments on tracks of the given kind.
    pub fn segments_of(&self, kind: TrackKind) -> impl Iterator<Item = &Segment> {
        self.tracks
            .iter()
            .filter(move |t| t.kind == kind)
            .flat_map(|t| t.segments.iter())
    }
}

/// Errors raised while building a timeline.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("unknown track: {name}")]
    UnknownTrack { name: String },

    #[error("duplicate track: {name}")]
    DuplicateTrack { name: String },

    #[error("track {track} holds {expected:?} segments, got {found:?}")]
    KindMismatch {
        track: String,
        expected: TrackKind,
        found: TrackKind,
    },

    #[error("segment at {start_us}us overlaps track {track} ending at {previous_end_us}us")]
    Overlap {
        track: String,
        start_us: u64,
        previous_end_us: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio(id: &str, start_us: u64, duration_us: u64) -> Segment {
        Segment {
            id: id.to_string(),
            material_id: Some("m".to_string()),
            target: TimeRange::new(start_us, duration_us),
            source: Some(TimeRange::new(0, duration_us)),
            style: SegmentStyle::Audio { volume: 1.0 },
        }
    }

    fn canvas() -> Canvas {
        Canvas {
            width: 1080,
            height: 1920,
        }
    }

    #[test]
    fn test_track_accepts_back_to_back_segments() {
        let mut track = Track::new("main_audio", TrackKind::Audio, 0);
        track.push(audio("a", 0, 2_000_000)).unwrap();
        track.push(audio("b", 2_000_000, 3_500_000)).unwrap();
        assert_eq!(track.end_us(), 5_500_000);
    }

    #[test]
    fn test_track_rejects_overlap() {
        let mut track = Track::new("main_audio", TrackKind::Audio, 0);
        track.push(audio("a", 0, 2_000_000)).unwrap();
        let err = track.push(audio("b", 1_999_999, 10)).unwrap_err();
        assert!(matches!(err, TimelineError::Overlap { previous_end_us: 2_000_000, .. }));
    }

    #[test]
    fn test_track_rejects_wrong_kind() {
        let mut track = Track::new("main_video", TrackKind::Video, 1);
        assert!(matches!(
            track.push(audio("a", 0, 1)),
            Err(TimelineError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_total_duration_tracks_primary_segments_only() {
        let mut timeline = Timeline::new(canvas());
        timeline
            .add_track(Track::new("main_audio", TrackKind::Audio, 0))
            .unwrap();
        timeline
            .add_track(Track::new("captions", TrackKind::Text, 3))
            .unwrap();
        timeline
            .push_segment("main_audio", audio("a", 0, 4_000_000))
            .unwrap();
        timeline
            .push_segment(
                "captions",
                Segment {
                    id: "t".to_string(),
                    material_id: None,
                    target: TimeRange::new(0, 9_000_000),
                    source: None,
                    style: SegmentStyle::Text {
                        text: "hi".to_string(),
                        style: TextStyle {
                            size: 14.0,
                            color: [1.0, 1.0, 0.0],
                            alpha: 1.0,
                            align: TextAlign::Center,
                            auto_wrapping: true,
                            max_line_width: 0.95,
                            border: None,
                            clip: ClipTransform::default(),
                        },
                    },
                },
            )
            .unwrap();
        assert_eq!(timeline.total_duration_us, 4_000_000);
    }

    #[test]
    fn test_duplicate_and_unknown_tracks() {
        let mut timeline = Timeline::new(canvas());
        timeline
            .add_track(Track::new("main_audio", TrackKind::Audio, 0))
            .unwrap();
        assert!(timeline
            .add_track(Track::new("main_audio", TrackKind::Audio, 1))
            .is_err());
        assert!(matches!(
            timeline.push_segment("nope", audio("a", 0, 1)),
            Err(TimelineError::UnknownTrack { .. })
        ));
    }

    #[test]
    fn test_effect_track_renders_above_text() {
        let text = Track::new("subtitles", TrackKind::Text, 3).with_flag(1);
        let effect = Track::new("effect", TrackKind::Effect, 4);
        assert!(effect.render_index() > text.render_index());
        assert_eq!(text.flag, 1);
    }
}
