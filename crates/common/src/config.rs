//! Application configuration.
//!
//! Configuration is an immutable value: it is loaded once, then the slice a
//! component needs is handed to it at construction.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where draft bundles are written.
    pub drafts_dir: PathBuf,

    /// Optional draft template directory to patch instead of synthesizing.
    pub template_dir: Option<PathBuf>,

    /// Output canvas.
    pub canvas: CanvasConfig,

    /// Scene directory naming conventions.
    pub scan: ScanConfig,

    /// Timeline layout constants and styles.
    pub assembly: AssemblyConfig,

    /// Subtitle generation settings.
    pub subtitles: SubtitleConfig,

    /// Remote generation and task-store settings.
    pub generation: GenerationConfig,

    /// Values stamped into the editor documents.
    pub editor: EditorConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
}

/// Filename conventions of a scene directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Separator between scene id and candidate index (`<scene>_<index>.jpeg`).
    pub separator: char,

    /// Image candidate extensions (lowercase, no dot).
    pub image_extensions: Vec<String>,

    /// Narration audio extensions (lowercase, no dot).
    pub audio_extensions: Vec<String>,

    /// Subtitle file extension (lowercase, no dot).
    pub subtitle_extension: String,
}

/// Timeline layout constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Initial uniform scale of every scene image.
    pub video_scale: f64,

    /// Narration gain multiplier (3.16 ≈ +10 dB).
    pub audio_gain: f64,

    /// Duration used when an audio file cannot be probed.
    pub fallback_duration_secs: f64,

    /// Exit animation attached to every video segment.
    pub exit_animation: AnimationConfig,

    /// Persistent caption spanning the whole timeline.
    pub overlay: OverlayConfig,

    /// Subtitle cue style.
    pub subtitle: SubtitleStyleConfig,

    /// Full-length scene effect.
    pub effect: EffectConfig,
}

/// Exit animation attached to video segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    pub name: String,
    pub animation_id: String,
    pub resource_id: String,
}

/// Persistent bottom caption.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub text: String,
    pub size: f64,
    /// Text opacity [0.0, 1.0].
    pub alpha: f64,
    /// RGB in [0.0, 1.0].
    pub color: [f64; 3],
    /// Vertical position, -1.0 is the bottom edge.
    pub transform_y: f64,
    pub max_line_width: f64,
}

/// Subtitle text style.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleStyleConfig {
    pub size: f64,
    pub color: [f64; 3],
    pub border_color: [f64; 3],
    pub border_alpha: f64,
    pub border_width: f64,
    pub transform_y: f64,
    pub max_line_width: f64,
}

/// Scene effect applied over the whole timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    pub name: String,
    pub effect_id: String,
    pub resource_id: String,
    /// Adjustable parameter names, paired with `params`.
    pub param_names: Vec<String>,
    /// Parameter values on the editor's 0-100 scale.
    pub params: Vec<f64>,
}

/// Subtitle generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleConfig {
    /// Word budget per merged cue (0 disables merging).
    pub merge_words: usize,

    /// Default narration voice.
    pub voice: String,
}

/// Remote generation and task retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    pub ratio: String,
    /// Seconds between status polls.
    pub poll_interval_secs: f64,
    /// Maximum number of status polls before giving up.
    pub max_polls: u32,
    /// Days a task record stays visible in the task store.
    pub retention_days: i64,
}

/// Editor identification written into the bundle documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub app_id: u32,
    pub app_source: String,
    pub app_version: String,
    pub os: String,
    pub new_version: String,
    pub version: u32,
    pub fps: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "storyreel=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            drafts_dir: dirs_default_drafts(),
            template_dir: None,
            canvas: CanvasConfig::default(),
            scan: ScanConfig::default(),
            assembly: AssemblyConfig::default(),
            subtitles: SubtitleConfig::default(),
            generation: GenerationConfig::default(),
            editor: EditorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            separator: '_',
            image_extensions: vec![
                "jpeg".to_string(),
                "jpg".to_string(),
                "png".to_string(),
                "webp".to_string(),
            ],
            audio_extensions: vec!["mp3".to_string(), "wav".to_string(), "m4a".to_string()],
            subtitle_extension: "srt".to_string(),
        }
    }
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            video_scale: 1.10,
            audio_gain: 3.16,
            fallback_duration_secs: 10.0,
            exit_animation: AnimationConfig::default(),
            overlay: OverlayConfig::default(),
            subtitle: SubtitleStyleConfig::default(),
            effect: EffectConfig::default(),
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            name: "Zoom In".to_string(),
            animation_id: "624705".to_string(),
            resource_id: "6740867832570974733".to_string(),
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            text: "Images are AI-generated or sourced online\nFor general reference only"
                .to_string(),
            size: 9.0,
            alpha: 0.7,
            color: [1.0, 1.0, 1.0],
            transform_y: -0.90,
            max_line_width: 0.95,
        }
    }
}

impl Default for SubtitleStyleConfig {
    fn default() -> Self {
        Self {
            size: 14.0,
            color: [1.0, 1.0, 0.0],
            border_color: [0.0, 0.0, 0.0],
            border_alpha: 1.0,
            border_width: 60.0,
            transform_y: -0.6,
            max_line_width: 0.95,
        }
    }
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            name: "Snowflake".to_string(),
            effect_id: "1167839".to_string(),
            resource_id: "7012231698440098318".to_string(),
            param_names: vec![
                "effects_adjust_speed".to_string(),
                "effects_adjust_background_animation".to_string(),
            ],
            params: vec![33.0, 10.0],
        }
    }
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            merge_words: 10,
            voice: "zh-CN-YunzeNeural".to_string(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "3.1".to_string(),
            ratio: "9:16".to_string(),
            poll_interval_secs: 2.0,
            max_polls: 30,
            retention_days: 7,
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            app_id: 3704,
            app_source: "lv".to_string(),
            app_version: "5.9.0".to_string(),
            os: "mac".to_string(),
            new_version: "110.0.0".to_string(),
            version: 360000,
            fps: 30.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, config_path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("storyreel").join("config.json")
}

/// Default drafts directory.
fn dirs_default_drafts() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("storyreel").join("drafts")
}
