//! Scene directory scanning.
//!
//! A scene directory holds, per scene id:
//! - image candidates `<scene>_<index>.<image ext>`
//! - narration audio `<scene>.<audio ext>`
//! - subtitles `<scene>.srt`, sharing the audio's stem

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use storyreel_common::config::ScanConfig;
use storyreel_common::error::{StoryreelError, StoryreelResult};
use storyreel_project_model::scene::{Narration, NarrationPair, SceneAsset, SceneId};
use storyreel_subtitles::load_subtitle_file;

use crate::selection::{select_images, ImagePicker, ImageSelectionPolicy};

/// Image candidates per scene, in scene order.
pub type CandidateMap = BTreeMap<SceneId, Vec<PathBuf>>;

/// Finds scene assets in a directory by naming convention.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    config: ScanConfig,
}

impl AssetResolver {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ScanConfig::default())
    }

    /// Group image candidates by scene id.
    ///
    /// Scenes order by the number in their id; candidates order by their
    /// numeric index, then file name. An absent directory yields no scenes.
    pub fn scan(&self, scene_dir: &Path) -> CandidateMap {
        let mut scenes: BTreeMap<SceneId, Vec<(Option<u64>, PathBuf)>> = BTreeMap::new();

        for (path, stem, ext) in self.list_files(scene_dir) {
            if !has_extension(&self.config.image_extensions, &ext) {
                continue;
            }
            let (scene, index) = match stem.split_once(self.config.separator) {
                Some((scene, index)) => (scene.to_string(), index.parse::<u64>().ok()),
                None => (stem.clone(), None),
            };
            if scene.is_empty() {
                tracing::debug!(path = %path.display(), "Ignoring image without scene id");
                continue;
            }
            scenes
                .entry(SceneId::new(scene))
                .or_default()
                .push((index, path));
        }

        scenes
            .into_iter()
            .map(|(scene, mut candidates)| {
                candidates.sort_by(|(ai, ap), (bi, bp)| {
                    let a = ai.unwrap_or(u64::MAX);
                    let b = bi.unwrap_or(u64::MAX);
                    a.cmp(&b).then_with(|| ap.file_name().cmp(&bp.file_name()))
                });
                (scene, candidates.into_iter().map(|(_, p)| p).collect())
            })
            .collect()
    }

    /// Pair each narration audio file with the subtitle file sharing its stem.
    ///
    /// Audio without a subtitle is logged and left out.
    pub fn pair_audio_subtitle(&self, scene_dir: &Path) -> BTreeMap<SceneId, NarrationPair> {
        let mut pairs: BTreeMap<SceneId, NarrationPair> = BTreeMap::new();
        let mut audio: Vec<(String, usize, PathBuf)> = self
            .list_files(scene_dir)
            .into_iter()
            .filter_map(|(path, stem, ext)| {
                self.config
                    .audio_extensions
                    .iter()
                    .position(|e| e.eq_ignore_ascii_case(&ext))
                    .map(|rank| (stem, rank, path))
            })
            .collect();
        // Preferred extension first when one stem has several audio files.
        audio.sort();

        for (stem, _, audio_path) in audio {
            let scene = SceneId::new(stem.as_str());
            if let Some(existing) = pairs.get(&scene) {
                tracing::warn!(
                    scene = %scene,
                    kept = %existing.audio_path.display(),
                    ignored = %audio_path.display(),
                    "Several narration files for one scene"
                );
                continue;
            }

            let subtitle_path = audio_path.with_extension(&self.config.subtitle_extension);
            if !subtitle_path.is_file() {
                let err = StoryreelError::missing_asset(
                    stem.as_str(),
                    format!("no subtitle file {}", subtitle_path.display()),
                );
                tracing::warn!(error = %err, "Skipping narration");
                continue;
            }

            pairs.insert(
                scene,
                NarrationPair {
                    audio_path,
                    subtitle_path,
                },
            );
        }

        pairs
    }

    /// Resolve the directory into ordered scene assets with one selected image
    /// each. Scenes without a narration pair are kept with `narration: None`
    /// so they can be reported as skipped.
    pub fn resolve(
        &self,
        scene_dir: &Path,
        policy: &ImageSelectionPolicy,
        picker: Option<&mut dyn ImagePicker>,
    ) -> StoryreelResult<Vec<SceneAsset>> {
        let candidates = self.scan(scene_dir);
        if candidates.is_empty() {
            return Err(StoryreelError::NoUsableScenes {
                dir: scene_dir.to_path_buf(),
            });
        }

        let mut pairs = self.pair_audio_subtitle(scene_dir);
        for scene in pairs.keys().filter(|s| !candidates.contains_key(*s)) {
            tracing::warn!(scene = %scene, "Narration without image candidates ignored");
        }

        let selected = select_images(policy, &candidates, picker)?;

        let mut assets = Vec::with_capacity(candidates.len());
        for (scene, images) in candidates {
            let Some(selected_image) = selected.get(&scene).cloned() else {
                continue;
            };
            let narration = pairs.remove(&scene).map(load_narration);
            if narration.is_none() {
                tracing::warn!(scene = %scene, "Scene has no narration pair");
            }
            assets.push(SceneAsset {
                scene_id: scene,
                candidates: images,
                selected_image,
                narration,
            });
        }

        tracing::info!(
            dir = %scene_dir.display(),
            scenes = assets.len(),
            narrated = assets.iter().filter(|a| a.is_placeable()).count(),
            "Resolved scene directory"
        );
        Ok(assets)
    }

    /// Regular files in `dir` as (path, stem, lowercase extension).
    fn list_files(&self, dir: &Path) -> Vec<(PathBuf, String, String)> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "Scene directory not readable");
                return Vec::new();
            }
        };

        let mut files: Vec<(PathBuf, String, String)> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter_map(|path| {
                let stem = path.file_stem()?.to_str()?.to_string();
                let ext = path.extension()?.to_str()?.to_ascii_lowercase();
                Some((path, stem, ext))
            })
            .collect();
        files.sort();
        files
    }
}

fn has_extension(extensions: &[String], ext: &str) -> bool {
    extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

/// Load cues for a pair; an unreadable subtitle file leaves the scene
/// without cues rather than dropping it.
fn load_narration(pair: NarrationPair) -> Narration {
    let mut cues = load_subtitle_file(&pair.subtitle_path).unwrap_or_else(|e| {
        tracing::warn!(
            path = %pair.subtitle_path.display(),
            error = %e,
            "Subtitle file unusable, scene keeps no cues"
        );
        Vec::new()
    });
    cues.sort_by_key(|c| c.start_us);

    Narration {
        audio_path: pair.audio_path,
        subtitle_path: pair.subtitle_path,
        cues,
    }
}
