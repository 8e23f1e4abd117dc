//! Material references: registered, deduplicated on-disk assets.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of on-disk asset a material points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    Image,
    Audio,
}

/// Pixel dimensions of an image material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// A registered asset. Owned by the material registry; segments refer to it
/// by `id` only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRef {
    /// 128-bit random id, unique per distinct path within one run.
    pub id: String,

    pub kind: MaterialKind,

    /// Absolute or caller-relative path as registered.
    pub path: PathBuf,

    /// File name shown in the editor's media pool.
    pub display_name: String,

    /// Audio duration in microseconds.
    pub duration_us: Option<u64>,

    /// Image dimensions.
    pub dimensions: Option<Dimensions>,

    /// File birth time (or modification time where birth time is unknown).
    pub created_at: DateTime<Utc>,

    /// When the material entered the registry.
    pub imported_at: DateTime<Utc>,
}

impl MaterialRef {
    pub fn is_audio(&self) -> bool {
        self.kind == MaterialKind::Audio
    }

    /// Path rendered the way the editor stores it.
    pub fn path_string(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// Display name of a path: its file name, or the whole path when it has none.
pub fn display_name_of(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Sort materials the way the editor lists them: by display name, then path.
pub fn sort_for_listing(materials: &mut [MaterialRef]) {
    materials.sort_by(|a, b| {
        a.display_name
            .cmp(&b.display_name)
            .then_with(|| a.path.cmp(&b.path))
    });
}
