//! Keyed collection of per-task state.
//!
//! The registry does mechanical merging only. Deciding whether a patch is
//! allowed (terminal guards, substatus vocabulary, staleness) is the
//! reducer's job.

use chrono::{DateTime, Utc};
use pp_protocol::state_models::{TaskProgress, TaskResult, TaskState, TaskStatus, TraceRecord};
use std::collections::BTreeMap;

/// Partial update for one task. `None` fields leave the task untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
    pub status_detail: Option<String>,
    pub progress: Option<TaskProgress>,
    pub result: Option<TaskResult>,
    pub error: Option<String>,
    pub trace: Option<TraceRecord>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// All tasks of a session, keyed by producer-assigned id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, TaskState>,
    next_seq: u64,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `patch` into task `id`, creating a pending task first if the
    /// id has not been seen.
    ///
    /// Returns the updated task.
    pub fn upsert(&mut self, id: &str, patch: TaskPatch, at: DateTime<Utc>) -> &TaskState {
        let next_seq = &mut self.next_seq;
        let task = self.tasks.entry(id.to_string()).or_insert_with(|| {
            let task = TaskState::new(id, *next_seq, at);
            *next_seq += 1;
            task
        });

        if let Some(title) = patch.title {
            task.title = Some(title);
        }
        if let Some(status) = patch.status {
            if status.is_running() && task.started_at.is_none() {
                task.started_at = Some(at);
            }
            if status.is_terminal() && !task.status.is_terminal() {
                task.finished_at = Some(at);
            }
            task.status = status;
        }
        if let Some(detail) = patch.status_detail {
            task.status_detail = Some(detail);
        }
        if let Some(progress) = patch.progress {
            task.progress = Some(match task.progress {
                Some(current) => current.merge(progress),
                None => progress,
            });
        }
        if let Some(result) = patch.result {
            task.result = Some(result);
        }
        if let Some(error) = patch.error {
            task.error = Some(error);
        }
        if let Some(record) = patch.trace {
            task.trace.push(record);
        }

        task.last_update = task.last_update.max(at);
        task
    }

    /// Advance the producer clock of an existing task. Unknown ids are
    /// ignored.
    pub fn record_producer_time(&mut self, id: &str, ts: DateTime<Utc>) {
        if let Some(task) = self.tasks.get_mut(id) {
            task.last_producer_ts = Some(task.last_producer_ts.map_or(ts, |last| last.max(ts)));
        }
    }

    pub fn get(&self, id: &str) -> Option<&TaskState> {
        self.tasks.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    /// Every task, ordered by id.
    pub fn all(&self) -> impl Iterator<Item = &TaskState> {
        self.tasks.values()
    }

    /// Drop a task. Only for explicit resets, never for event processing.
    pub fn remove(&mut self, id: &str) -> Option<TaskState> {
        self.tasks.remove(id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
