//! Material registry: one `MaterialRef` per distinct path within a run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use storyreel_common::clock::{secs_to_us, HostClock};
use storyreel_project_model::material::{
    display_name_of, sort_for_listing, Dimensions, MaterialKind, MaterialRef,
};

use crate::probe::MediaProbe;

/// Deduplicates asset references and caches their probed metadata.
///
/// The cache lives as long as the registry; a new run builds a new registry
/// and therefore assigns new ids to the same paths.
pub struct MaterialRegistry {
    probe: Box<dyn MediaProbe>,
    clock: HostClock,
    fallback_duration_us: u64,
    fallback_dimensions: Dimensions,
    by_path: HashMap<PathBuf, usize>,
    materials: Vec<MaterialRef>,
}

impl MaterialRegistry {
    /// Create a registry; `clock` stamps every material's import time.
    pub fn new(probe: Box<dyn MediaProbe>, clock: HostClock) -> Self {
        Self {
            probe,
            clock,
            fallback_duration_us: secs_to_us(10.0),
            fallback_dimensions: Dimensions {
                width: 1080,
                height: 1920,
            },
            by_path: HashMap::new(),
            materials: Vec::new(),
        }
    }

    /// Duration recorded for audio that cannot be probed.
    pub fn with_fallback_duration_us(mut self, duration_us: u64) -> Self {
        self.fallback_duration_us = duration_us;
        self
    }

    /// Dimensions recorded for images that cannot be probed.
    pub fn with_fallback_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.fallback_dimensions = dimensions;
        self
    }

    /// Register `path`, probing it on first sight. Registering the same path
    /// again returns the existing material unchanged.
    pub fn register(&mut self, path: &Path, kind: MaterialKind) -> MaterialRef {
        if let Some(&slot) = self.by_path.get(path) {
            let existing = &self.materials[slot];
            if existing.kind != kind {
                tracing::warn!(
                    path = %path.display(),
                    registered = ?existing.kind,
                    requested = ?kind,
                    "Path already registered with another kind"
                );
            }
            return existing.clone();
        }

        let created_at = self.probe.created_at(path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Creation time unavailable, using host clock");
            self.clock.datetime()
        });

        let (duration_us, dimensions) = match kind {
            MaterialKind::Audio => {
                let duration = self.probe.audio_duration_us(path).unwrap_or_else(|e| {
                    tracing::warn!(
                        error = %e,
                        fallback_us = self.fallback_duration_us,
                        "Audio duration unavailable, using fallback"
                    );
                    self.fallback_duration_us
                });
                (Some(duration), None)
            }
            MaterialKind::Image => {
                let dims = self.probe.image_dimensions(path).unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Image dimensions unavailable, using canvas size");
                    self.fallback_dimensions
                });
                (None, Some(dims))
            }
        };

        let material = MaterialRef {
            id: uuid::Uuid::new_v4().simple().to_string(),
            kind,
            path: path.to_path_buf(),
            display_name: display_name_of(path),
            duration_us,
            dimensions,
            created_at,
            imported_at: self.clock.datetime(),
        };

        tracing::debug!(
            id = %material.id,
            path = %path.display(),
            kind = ?kind,
            "Registered material"
        );

        self.by_path.insert(path.to_path_buf(), self.materials.len());
        self.materials.push(material.clone());
        material
    }

    pub fn get(&self, id: &str) -> Option<&MaterialRef> {
        self.materials.iter().find(|m| m.id == id)
    }

    pub fn lookup(&self, path: &Path) -> Option<&MaterialRef> {
        self.by_path.get(path).map(|&slot| &self.materials[slot])
    }

    /// Materials in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &MaterialRef> {
        self.materials.iter()
    }

    /// Materials in the editor's listing order (display name, then path).
    pub fn snapshot(&self) -> Vec<MaterialRef> {
        let mut list = self.materials.clone();
        sort_for_listing(&mut list);
        list
    }

    pub fn clock(&self) -> HostClock {
        self.clock
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl std::fmt::Debug for MaterialRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterialRegistry")
            .field("clock", &self.clock)
            .field("materials", &self.materials)
            .finish_non_exhaustive()
    }
}
