//! Draft bundle writer.
//!
//! Writing is destructive: an existing directory at the bundle path is
//! removed first. There is no rollback, so a failure part way through can
//! leave a partial bundle behind. Concurrent writes to one path must be
//! serialized by the caller.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use walkdir::WalkDir;

use storyreel_assembly::registry::MaterialRegistry;
use storyreel_common::clock::HostClock;
use storyreel_common::config::EditorConfig;
use storyreel_common::error::{StoryreelError, StoryreelResult};
use storyreel_project_model::bundle::{
    BundleIdentity, DraftBundle, Provenance, CONTENT_DOCUMENT, META_DOCUMENT,
    VIRTUAL_STORE_DOCUMENT,
};
use storyreel_project_model::timeline::Timeline;

use crate::content::build_content;
use crate::meta::{patch_meta, synthesize_meta};
use crate::virtual_store::build_virtual_store;

/// How the bundle directory is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Patch the template when it exists, otherwise synthesize and report
    /// the fallback through [`Provenance::Synthesized`].
    #[default]
    Auto,
    /// Patch the template; a missing template is an error.
    Template,
    /// Always build from scratch.
    Synthesize,
}

/// Serializes a timeline and its materials into a draft bundle.
#[derive(Debug, Clone)]
pub struct DraftBundleWriter {
    editor: EditorConfig,
    template: Option<PathBuf>,
    mode: WriteMode,
    clock: Option<HostClock>,
}

impl DraftBundleWriter {
    pub fn new(editor: EditorConfig) -> Self {
        Self {
            editor,
            template: None,
            mode: WriteMode::Auto,
            clock: None,
        }
    }

    pub fn with_template(mut self, template: Option<PathBuf>) -> Self {
        self.template = template;
        self
    }

    pub fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Pin the clock used for bundle timestamps; the host clock at write
    /// time is used otherwise.
    pub fn with_clock(mut self, clock: HostClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Write `<output_dir>/<bundle_name>` and return what was written.
    pub fn write(
        &self,
        timeline: &Timeline,
        registry: &MaterialRegistry,
        output_dir: &Path,
        bundle_name: &str,
    ) -> StoryreelResult<DraftBundle> {
        validate_bundle_name(bundle_name)?;
        let clock = self.clock.unwrap_or_else(HostClock::now);
        let provenance = self.resolve_provenance()?;
        let bundle_path = output_dir.join(bundle_name);

        let bundle = DraftBundle {
            identity: BundleIdentity {
                id: uuid::Uuid::new_v4().to_string().to_uppercase(),
                name: bundle_name.to_string(),
                path: bundle_path.clone(),
            },
            timeline: timeline.clone(),
            materials: registry.snapshot(),
            provenance,
        };

        if bundle_path.exists() {
            tracing::info!(path = %bundle_path.display(), "Replacing existing bundle");
            std::fs::remove_dir_all(&bundle_path)
                .map_err(|e| StoryreelError::write_failure(&bundle_path, e))?;
        }

        let meta = match &bundle.provenance {
            Provenance::TemplatePatch { template } => {
                copy_template(template, &bundle_path)?;
                self.template_meta(&bundle, &clock)
            }
            Provenance::Synthesized { .. } => {
                std::fs::create_dir_all(&bundle_path)
                    .map_err(|e| StoryreelError::write_failure(&bundle_path, e))?;
                synthesize_meta(&bundle, &clock)
            }
        };

        let content = build_content(&bundle, &self.editor);
        write_document(&bundle_path.join(CONTENT_DOCUMENT), &content, true)?;
        write_document(&bundle_path.join(META_DOCUMENT), &meta, false)?;
        let store = build_virtual_store(&bundle.identity, &bundle.materials, &clock);
        write_document(&bundle_path.join(VIRTUAL_STORE_DOCUMENT), &store, false)?;

        tracing::info!(
            path = %bundle_path.display(),
            draft_id = %bundle.identity.id,
            provenance = ?bundle.provenance,
            materials = bundle.materials.len(),
            "Draft bundle written"
        );
        Ok(bundle)
    }

    fn resolve_provenance(&self) -> StoryreelResult<Provenance> {
        let existing = self.template.as_ref().filter(|t| t.is_dir());
        match (self.mode, existing) {
            (WriteMode::Synthesize, _) => Ok(Provenance::Synthesized { fell_back: false }),
            (_, Some(template)) => Ok(Provenance::TemplatePatch {
                template: template.clone(),
            }),
            (WriteMode::Template, None) => Err(StoryreelError::TemplateMissing {
                path: self.template.clone().unwrap_or_default(),
            }),
            (WriteMode::Auto, None) => {
                let fell_back = match &self.template {
                    Some(path) => {
                        let err = StoryreelError::TemplateMissing { path: path.clone() };
                        tracing::warn!(error = %err, "Falling back to a synthesized bundle");
                        true
                    }
                    None => false,
                };
                Ok(Provenance::Synthesized { fell_back })
            }
        }
    }

    /// The copied template's metadata, patched; a synthesized one when the
    /// template has none or it does not parse.
    fn template_meta(&self, bundle: &DraftBundle, clock: &HostClock) -> Map<String, Value> {
        let path = bundle.identity.path.join(META_DOCUMENT);
        let parsed = std::fs::read_to_string(&path)
            .map_err(StoryreelError::from)
            .and_then(|raw| serde_json::from_str::<Map<String, Value>>(&raw).map_err(Into::into));

        match parsed {
            Ok(mut meta) => {
                patch_meta(&mut meta, bundle, clock);
                meta
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Template metadata unusable, synthesizing");
                synthesize_meta(bundle, clock)
            }
        }
    }
}

fn validate_bundle_name(name: &str) -> StoryreelResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." || name.contains(['/', '\\']) {
        return Err(StoryreelError::invalid_argument(format!(
            "bundle name must be a plain directory name, got {name:?}"
        )));
    }
    Ok(())
}

/// Recursively copy `template` to `dest`.
fn copy_template(template: &Path, dest: &Path) -> StoryreelResult<()> {
    std::fs::create_dir_all(dest).map_err(|e| StoryreelError::write_failure(dest, e))?;

    for entry in WalkDir::new(template).min_depth(1) {
        let entry = entry.map_err(|e| StoryreelError::write_failure(template, e.into()))?;
        let Ok(relative) = entry.path().strip_prefix(template) else {
            continue;
        };
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .map_err(|e| StoryreelError::write_failure(&target, e))?;
        } else {
            std::fs::copy(entry.path(), &target)
                .map_err(|e| StoryreelError::write_failure(&target, e))?;
        }
    }

    tracing::debug!(template = %template.display(), dest = %dest.display(), "Copied template");
    Ok(())
}

fn write_document<T: Serialize>(path: &Path, document: &T, pretty: bool) -> StoryreelResult<()> {
    let raw = if pretty {
        serde_json::to_string_pretty(document)?
    } else {
        serde_json::to_string(document)?
    };
    std::fs::write(path, raw).map_err(|e| StoryreelError::write_failure(path, e))
}
