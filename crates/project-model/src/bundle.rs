//! Draft bundle types.
//!
//! A bundle is the on-disk project package the external editor opens. It is
//! a directory holding three JSON documents: the content document (tracks,
//! segments, materials), the metadata document (identity and media pool),
//! and the cross-reference document (bundle id linked to material ids).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::material::MaterialRef;
use crate::timeline::Timeline;

/// Content document file name.
pub const CONTENT_DOCUMENT: &str = "draft_content.json";

/// Metadata document file name.
pub const META_DOCUMENT: &str = "draft_meta_info.json";

/// Cross-reference document file name.
pub const VIRTUAL_STORE_DOCUMENT: &str = "draft_virtual_store.json";

/// The three documents every bundle must contain.
pub const REQUIRED_DOCUMENTS: [&str; 3] = [CONTENT_DOCUMENT, META_DOCUMENT, VIRTUAL_STORE_DOCUMENT];

/// Identity of a written bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleIdentity {
    /// 128-bit random id, fresh per write.
    pub id: String,
    pub name: String,
    /// Bundle directory.
    pub path: PathBuf,
}

/// How a bundle came to be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Provenance {
    /// Copied from a template directory and patched.
    TemplatePatch { template: PathBuf },
    /// Built from scratch; `fell_back` is set when a template was configured
    /// but absent at write time.
    Synthesized { fell_back: bool },
}

impl Provenance {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Provenance::Synthesized { fell_back: true })
    }
}

/// Everything serialized into one bundle.
#[derive(Debug, Clone)]
pub struct DraftBundle {
    pub identity: BundleIdentity,
    pub timeline: Timeline,

    /// Material snapshot in editor listing order.
    pub materials: Vec<MaterialRef>,

    pub provenance: Provenance,
}

/// Summary of a bundle found on disk.
#[derive(Debug, Clone, Default)]
pub struct BundleSummary {
    pub root: PathBuf,
    pub draft_id: Option<String>,
    pub draft_name: Option<String>,
    pub duration_us: u64,
    pub track_count: usize,
    pub segment_count: usize,
    pub material_paths: Vec<String>,
    pub linked_material_ids: Vec<String>,
}

impl BundleSummary {
    /// Load and parse the three documents of a bundle directory.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, BundleError> {
        let root = root.as_ref().to_path_buf();

        let content = read_document(&root, CONTENT_DOCUMENT)?;
        let meta = read_document(&root, META_DOCUMENT)?;
        let store = read_document(&root, VIRTUAL_STORE_DOCUMENT)?;

        let tracks = content
            .get("tracks")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| BundleError::ValidationError {
                message: format!("{CONTENT_DOCUMENT} has no tracks array"),
            })?;

        let segment_count = tracks
            .iter()
            .filter_map(|t| t.get("segments").and_then(serde_json::Value::as_array))
            .map(Vec::len)
            .sum();

        let material_paths = content
            .pointer("/materials/videos")
            .into_iter()
            .chain(content.pointer("/materials/audios"))
            .filter_map(serde_json::Value::as_array)
            .flatten()
            .filter_map(|m| m.get("path").and_then(serde_json::Value::as_str))
            .map(str::to_string)
            .collect();

        let linked_material_ids = store
            .pointer("/draft_virtual_store")
            .and_then(serde_json::Value::as_array)
            .into_iter()
            .flatten()
            .filter(|group| group.get("type").and_then(serde_json::Value::as_u64) == Some(1))
            .filter_map(|group| group.get("value").and_then(serde_json::Value::as_array))
            .flatten()
            .filter(|link| {
                link.get("parent_id")
                    .and_then(serde_json::Value::as_str)
                    .is_some_and(|p| !p.is_empty())
            })
            .filter_map(|link| link.get("child_id").and_then(serde_json::Value::as_str))
            .map(str::to_string)
            .collect();

        Ok(Self {
            root,
            draft_id: meta
                .get("draft_id")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string),
            draft_name: meta
                .get("draft_name")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string),
            duration_us: content
                .get("duration")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0),
            track_count: tracks.len(),
            segment_count,
            material_paths,
            linked_material_ids,
        })
    }

    /// Report material files referenced by the bundle that no longer exist.
    pub fn validate_sources(&self) -> Vec<String> {
        self.material_paths
            .iter()
            .filter(|p| !Path::new(p).exists())
            .map(|p| format!("Material source missing: {p}"))
            .collect()
    }
}

fn read_document(root: &Path, name: &str) -> Result<serde_json::Value, BundleError> {
    let path = root.join(name);
    let raw = std::fs::read_to_string(&path).map_err(|e| BundleError::IoError {
        path: path.clone(),
        source: e,
    })?;
    serde_json::from_str(&raw).map_err(|e| BundleError::ParseError { path, source: e })
}

/// Errors that can occur when reading bundles.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid bundle: {message}")]
    ValidationError { message: String },
}
