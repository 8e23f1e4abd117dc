//! Generation task records, keyed by scene.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use storyreel_project_model::scene::SceneId;

use crate::service::SubmissionId;

/// Lifecycle of a generation task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskState {
    Submitted,
    Completed { urls: Vec<String> },
    Failed { reason: String },
}

/// Metadata of one scene's generation task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub scene_id: SceneId,
    pub submission_id: SubmissionId,
    pub prompt: String,
    pub state: TaskState,
    pub created_at: DateTime<Utc>,
}

impl TaskRecord {
    pub fn submitted(
        scene_id: SceneId,
        submission_id: SubmissionId,
        prompt: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            scene_id,
            submission_id,
            prompt: prompt.into(),
            state: TaskState::Submitted,
            created_at,
        }
    }
}

/// Key-value persistence for task records.
pub trait TaskStore {
    fn get(&self, scene: &SceneId) -> Option<TaskRecord>;
    fn put(&mut self, record: TaskRecord);
}

/// In-process task store. Records older than the retention window are
/// invisible to `get` and dropped by [`MemoryTaskStore::purge_expired`].
#[derive(Debug, Clone)]
pub struct MemoryTaskStore {
    records: BTreeMap<SceneId, TaskRecord>,
    retention: Duration,
}

impl MemoryTaskStore {
    pub fn new(retention_days: i64) -> Self {
        Self {
            records: BTreeMap::new(),
            retention: Duration::days(retention_days.max(0)),
        }
    }

    fn is_expired(&self, record: &TaskRecord, now: DateTime<Utc>) -> bool {
        now - record.created_at > self.retention
    }

    /// Look up a record as of `now`.
    pub fn get_at(&self, scene: &SceneId, now: DateTime<Utc>) -> Option<TaskRecord> {
        self.records
            .get(scene)
            .filter(|record| !self.is_expired(record, now))
            .cloned()
    }

    /// Drop expired records; returns how many were removed.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.records.len();
        let retention = self.retention;
        self.records
            .retain(|_, record| now - record.created_at <= retention);
        let removed = before - self.records.len();
        if removed > 0 {
            tracing::debug!(removed, "Purged expired generation tasks");
        }
        removed
    }

    /// Live records in scene order.
    pub fn records(&self) -> impl Iterator<Item = &TaskRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl TaskStore for MemoryTaskStore {
    fn get(&self, scene: &SceneId) -> Option<TaskRecord> {
        self.get_at(scene, Utc::now())
    }

    fn put(&mut self, record: TaskRecord) {
        self.records.insert(record.scene_id.clone(), record);
    }
}
