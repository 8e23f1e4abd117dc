//! Image selection: exactly one image per scene.

use std::collections::BTreeMap;
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use storyreel_common::error::{StoryreelError, StoryreelResult};
use storyreel_project_model::scene::SceneId;

use crate::resolver::CandidateMap;

/// Chosen image per scene.
pub type Selection = BTreeMap<SceneId, PathBuf>;

/// How the image of each scene is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ImageSelectionPolicy {
    /// Always the first candidate.
    First,
    /// Seeded random choice. Without a seed one is drawn and logged.
    Random { seed: Option<u64> },
    /// Ask an [`ImagePicker`].
    Interactive,
}

/// Answer of a human-facing picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    Selected(Selection),
    Cancelled,
}

/// Human-facing image chooser. Blocks until the person answers.
pub trait ImagePicker {
    fn pick(&mut self, candidates: &CandidateMap) -> StoryreelResult<PickOutcome>;
}

/// Choose one image for every scene in `candidates`.
pub fn select_images(
    policy: &ImageSelectionPolicy,
    candidates: &CandidateMap,
    picker: Option<&mut dyn ImagePicker>,
) -> StoryreelResult<Selection> {
    match policy {
        ImageSelectionPolicy::First => Ok(candidates
            .iter()
            .filter_map(|(scene, images)| Some((scene.clone(), images.first()?.clone())))
            .collect()),
        ImageSelectionPolicy::Random { seed } => {
            let seed = seed.unwrap_or_else(|| {
                let drawn = rand::random::<u64>();
                tracing::info!(seed = drawn, "No selection seed configured, drew one");
                drawn
            });
            Ok(select_random(candidates, seed))
        }
        ImageSelectionPolicy::Interactive => {
            let picker = picker.ok_or_else(|| {
                StoryreelError::invalid_argument("interactive selection needs a picker")
            })?;
            match picker.pick(candidates)? {
                PickOutcome::Cancelled => {
                    tracing::warn!("Image selection cancelled");
                    Err(StoryreelError::SelectionCancelled)
                }
                PickOutcome::Selected(selection) => {
                    validate_selection(candidates, &selection)?;
                    Ok(selection)
                }
            }
        }
    }
}

/// Seeded choice per scene. Each scene gets its own generator derived from
/// the seed and its id, so adding a scene leaves the others' choices alone.
pub fn select_random(candidates: &CandidateMap, seed: u64) -> Selection {
    candidates
        .iter()
        .filter(|(_, images)| !images.is_empty())
        .map(|(scene, images)| {
            let mut rng = StdRng::seed_from_u64(seed ^ fnv1a_64(scene.as_str()));
            let chosen = images[rng.gen_range(0..images.len())].clone();
            tracing::debug!(scene = %scene, image = %chosen.display(), "Selected image");
            (scene.clone(), chosen)
        })
        .collect()
}

fn validate_selection(candidates: &CandidateMap, selection: &Selection) -> StoryreelResult<()> {
    for (scene, images) in candidates {
        let chosen = selection.get(scene).ok_or_else(|| {
            StoryreelError::invalid_argument(format!("picker returned no image for scene {scene}"))
        })?;
        if !images.contains(chosen) {
            return Err(StoryreelError::invalid_argument(format!(
                "picker chose {} which is not a candidate of scene {scene}",
                chosen.display()
            )));
        }
    }
    if let Some(extra) = selection.keys().find(|s| !candidates.contains_key(*s)) {
        return Err(StoryreelError::invalid_argument(format!(
            "picker returned unknown scene {extra}"
        )));
    }
    Ok(())
}

fn fnv1a_64(input: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in input.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(scenes: &[(&str, usize)]) -> CandidateMap {
        scenes
            .iter()
            .map(|(scene, count)| {
                let images = (1..=*count)
                    .map(|i| PathBuf::from(format!("/s/{scene}_{i}.jpeg")))
                    .collect();
                (SceneId::from(*scene), images)
            })
            .collect()
    }

    struct FixedPicker(PickOutcome);

    impl ImagePicker for FixedPicker {
        fn pick(&mut self, _candidates: &CandidateMap) -> StoryreelResult<PickOutcome> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_random_is_reproducible() {
        let map = candidates(&[("scene1", 4), ("scene2", 4), ("scene3", 4)]);
        let policy = ImageSelectionPolicy::Random { seed: Some(42) };
        let a = select_images(&policy, &map, None).unwrap();
        let b = select_images(&policy, &map, None).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        for (scene, image) in &a {
            assert!(map[scene].contains(image));
        }
    }

    #[test]
    fn test_random_choice_ignores_other_scenes() {
        let small = candidates(&[("scene1", 5)]);
        let large = candidates(&[("scene1", 5), ("scene9", 3)]);
        let id = SceneId::from("scene1");
        assert_eq!(select_random(&small, 7)[&id], select_random(&large, 7)[&id]);
    }

    #[test]
    fn test_first_policy() {
        let map = candidates(&[("scene1", 3)]);
        let chosen = select_images(&ImageSelectionPolicy::First, &map, None).unwrap();
        assert_eq!(chosen[&SceneId::from("scene1")], PathBuf::from("/s/scene1_1.jpeg"));
    }

    #[test]
    fn test_interactive_cancel() {
        let map = candidates(&[("scene1", 2)]);
        let mut picker = FixedPicker(PickOutcome::Cancelled);
        let err = select_images(&ImageSelectionPolicy::Interactive, &map, Some(&mut picker))
            .unwrap_err();
        assert!(matches!(err, StoryreelError::SelectionCancelled));
    }

    #[test]
    fn test_interactive_requires_complete_valid_mapping() {
        let map = candidates(&[("scene1", 2), ("scene2", 2)]);

        let partial: Selection = [(SceneId::from("scene1"), PathBuf::from("/s/scene1_2.jpeg"))]
            .into_iter()
            .collect();
        let mut picker = FixedPicker(PickOutcome::Selected(partial));
        assert!(matches!(
            select_images(&ImageSelectionPolicy::Interactive, &map, Some(&mut picker)),
            Err(StoryreelError::InvalidArgument { .. })
        ));

        let foreign: Selection = [
            (SceneId::from("scene1"), PathBuf::from("/s/scene1_2.jpeg")),
            (SceneId::from("scene2"), PathBuf::from("/elsewhere.jpeg")),
        ]
        .into_iter()
        .collect();
        let mut picker = FixedPicker(PickOutcome::Selected(foreign));
        assert!(select_images(&ImageSelectionPolicy::Interactive, &map, Some(&mut picker)).is_err());

        let complete: Selection = [
            (SceneId::from("scene1"), PathBuf::from("/s/scene1_2.jpeg")),
            (SceneId::from("scene2"), PathBuf::from("/s/scene2_1.jpeg")),
        ]
        .into_iter()
        .collect();
        let mut picker = FixedPicker(PickOutcome::Selected(complete.clone()));
        assert_eq!(
            select_images(&ImageSelectionPolicy::Interactive, &map, Some(&mut picker)).unwrap(),
            complete
        );
    }

    #[test]
    fn test_interactive_without_picker_is_rejected() {
        let map = candidates(&[("scene1", 1)]);
        assert!(matches!(
            select_images(&ImageSelectionPolicy::Interactive, &map, None),
            Err(StoryreelError::InvalidArgument { .. })
        ));
    }
}
