//! Image generation contract and the blocking poll loop over it.
//!
//! The remote service is only seen through [`ImageGenerationService`]; its
//! wire protocol lives with whoever implements the trait. Poll results are a
//! typed [`GenerationStatus`] instead of loosely shaped payloads.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use storyreel_common::config::GenerationConfig;
use storyreel_common::error::{StoryreelError, StoryreelResult};
use storyreel_project_model::scene::SceneId;

use crate::store::{TaskRecord, TaskState, TaskStore};

/// Opaque id of a submitted generation job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(String);

impl SubmissionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one status poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerationStatus {
    Ready { urls: Vec<String> },
    Pending,
    Failed { reason: String },
}

/// Remote image generator.
pub trait ImageGenerationService {
    fn generate(&self, prompt: &str, model: &str, ratio: &str) -> StoryreelResult<SubmissionId>;
    fn poll(&self, id: &SubmissionId) -> StoryreelResult<GenerationStatus>;
}

/// Poll `id` until it is ready or failed, sleeping between polls.
///
/// Gives up with a generation error after `config.max_polls` pending polls.
pub fn wait_for_images(
    service: &dyn ImageGenerationService,
    id: &SubmissionId,
    config: &GenerationConfig,
) -> StoryreelResult<Vec<String>> {
    let interval = Duration::from_secs_f64(config.poll_interval_secs.max(0.0));

    for attempt in 1..=config.max_polls {
        match service.poll(id)? {
            GenerationStatus::Ready { urls } => {
                tracing::info!(submission = %id, images = urls.len(), "Generation ready");
                return Ok(urls);
            }
            GenerationStatus::Failed { reason } => {
                return Err(StoryreelError::generation(format!(
                    "submission {id} failed: {reason}"
                )));
            }
            GenerationStatus::Pending => {
                tracing::debug!(submission = %id, attempt, "Generation pending");
                if attempt < config.max_polls && !interval.is_zero() {
                    std::thread::sleep(interval);
                }
            }
        }
    }

    Err(StoryreelError::generation(format!(
        "submission {id} still pending after {} polls",
        config.max_polls
    )))
}

/// Submit one prompt per scene, recording each task in `store`.
///
/// Scenes that already have a live submitted or completed record are not
/// resubmitted. Returns the number of new submissions.
pub fn submit_scenes(
    service: &dyn ImageGenerationService,
    store: &mut dyn TaskStore,
    prompts: &BTreeMap<SceneId, String>,
    config: &GenerationConfig,
) -> StoryreelResult<usize> {
    let mut submitted = 0;

    for (scene, prompt) in prompts {
        if let Some(existing) = store.get(scene) {
            if !matches!(existing.state, TaskState::Failed { .. }) {
                tracing::debug!(scene = %scene, submission = %existing.submission_id, "Task already recorded");
                continue;
            }
        }

        let id = service.generate(prompt, &config.model, &config.ratio)?;
        tracing::info!(scene = %scene, submission = %id, model = %config.model, "Submitted generation");
        store.put(TaskRecord::submitted(scene.clone(), id, prompt.clone(), Utc::now()));
        submitted += 1;
    }

    Ok(submitted)
}

/// Wait for every recorded scene task and return image urls by scene.
///
/// A scene whose task fails or times out is logged, recorded as failed and
/// left out of the result; the other scenes still complete.
pub fn collect_scenes(
    service: &dyn ImageGenerationService,
    store: &mut dyn TaskStore,
    scenes: &[SceneId],
    config: &GenerationConfig,
) -> BTreeMap<SceneId, Vec<String>> {
    let mut ready = BTreeMap::new();

    for scene in scenes {
        let Some(mut record) = store.get(scene) else {
            tracing::warn!(scene = %scene, "No generation task recorded");
            continue;
        };

        match record.state.clone() {
            TaskState::Completed { urls } => {
                ready.insert(scene.clone(), urls);
                continue;
            }
            TaskState::Failed { reason } => {
                tracing::warn!(scene = %scene, %reason, "Generation previously failed");
                continue;
            }
            TaskState::Submitted => {}
        }

        match wait_for_images(service, &record.submission_id, config) {
            Ok(urls) => {
                record.state = TaskState::Completed { urls: urls.clone() };
                ready.insert(scene.clone(), urls);
            }
            Err(e) => {
                tracing::warn!(scene = %scene, error = %e, "Generation did not complete");
                record.state = TaskState::Failed {
                    reason: e.to_string(),
                };
            }
        }
        store.put(record);
    }

    ready
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use crate::store::MemoryTaskStore;

    /// Replays scripted poll results per submission.
    #[derive(Default)]
    struct ScriptedService {
        scripts: RefCell<BTreeMap<String, VecDeque<GenerationStatus>>>,
        submitted: RefCell<Vec<String>>,
    }

    impl ScriptedService {
        fn script(&self, id: &str, statuses: Vec<GenerationStatus>) {
            self.scripts
                .borrow_mut()
                .insert(id.to_string(), statuses.into());
        }
    }

    impl ImageGenerationService for ScriptedService {
        fn generate(&self, prompt: &str, _model: &str, _ratio: &str) -> StoryreelResult<SubmissionId> {
            self.submitted.borrow_mut().push(prompt.to_string());
            Ok(SubmissionId::new(format!("job-{prompt}")))
        }

        fn poll(&self, id: &SubmissionId) -> StoryreelResult<GenerationStatus> {
            Ok(self
                .scripts
                .borrow_mut()
                .get_mut(id.as_str())
                .and_then(VecDeque::pop_front)
                .unwrap_or(GenerationStatus::Pending))
        }
    }

    fn fast_config(max_polls: u32) -> GenerationConfig {
        GenerationConfig {
            poll_interval_secs: 0.0,
            max_polls,
            ..GenerationConfig::default()
        }
    }

    #[test]
    fn test_wait_returns_urls_after_pending() {
        let service = ScriptedService::default();
        service.script(
            "job-a",
            vec![
                GenerationStatus::Pending,
                GenerationStatus::Ready {
                    urls: vec!["u1".into(), "u2".into()],
                },
            ],
        );
        let urls = wait_for_images(&service, &SubmissionId::new("job-a"), &fast_config(5)).unwrap();
        assert_eq!(urls, vec!["u1".to_string(), "u2".to_string()]);
    }

    #[test]
    fn test_wait_surfaces_failure_reason() {
        let service = ScriptedService::default();
        service.script(
            "job-a",
            vec![GenerationStatus::Failed {
                reason: "content policy".into(),
            }],
        );
        let err = wait_for_images(&service, &SubmissionId::new("job-a"), &fast_config(5)).unwrap_err();
        assert!(err.to_string().contains("content policy"));
    }

    #[test]
    fn test_wait_gives_up_after_budget() {
        let service = ScriptedService::default();
        let err = wait_for_images(&service, &SubmissionId::new("job-x"), &fast_config(3)).unwrap_err();
        assert!(matches!(err, StoryreelError::Generation { .. }));
    }

    #[test]
    fn test_status_serializes_with_tag() {
        let json = serde_json::to_value(GenerationStatus::Failed {
            reason: "quota".into(),
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "quota");
    }

    #[test]
    fn test_submit_and_collect_by_scene() {
        let service = ScriptedService::default();
        let mut store = MemoryTaskStore::new(7);
        let prompts: BTreeMap<SceneId, String> = [("scene1", "sea"), ("scene2", "sky")]
            .into_iter()
            .map(|(s, p)| (SceneId::from(s), p.to_string()))
            .collect();

        let config = fast_config(2);
        assert_eq!(submit_scenes(&service, &mut store, &prompts, &config).unwrap(), 2);
        // Recorded scenes are not submitted again.
        assert_eq!(submit_scenes(&service, &mut store, &prompts, &config).unwrap(), 0);

        service.script(
            "job-sea",
            vec![GenerationStatus::Ready {
                urls: vec!["sea.jpeg".into()],
            }],
        );
        let scenes: Vec<SceneId> = prompts.keys().cloned().collect();
        let ready = collect_scenes(&service, &mut store, &scenes, &config);

        assert_eq!(ready.len(), 1);
        assert_eq!(ready[&SceneId::from("scene1")], vec!["sea.jpeg".to_string()]);
        assert!(matches!(
            store.get(&SceneId::from("scene2")).unwrap().state,
            TaskState::Failed { .. }
        ));

        // Failed scenes are resubmitted on the next pass.
        assert_eq!(submit_scenes(&service, &mut store, &prompts, &config).unwrap(), 1);
        assert_eq!(service.submitted.borrow().len(), 3);
    }
}
