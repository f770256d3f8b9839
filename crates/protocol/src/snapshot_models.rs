//! Read-model snapshot types.
//!
//! Rendering and reporting collaborators never touch the reducer's state
//! directly. They receive an immutable [`PipelineSnapshot`] derived from it
//! after each applied event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::session_models::{ExecutionMode, Flavor, QuestionMode};
use crate::state_models::{LogEntry, Metrics, Stage, TaskResult, TaskState, TaskStatus};

/// Derived counts over a session's tasks.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
pub struct TaskCounts {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    /// Completed tasks whose result is marked as extended.
    pub extended: usize,
}

/// One task as presented to consumers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct TaskView {
    /// Display label: title, then result summary, then id.
    pub label: String,

    /// Whether the task is in the session's active set.
    pub is_active: bool,

    /// Wall time between start and finish, when both are known.
    pub duration_ms: Option<i64>,

    pub task: TaskState,
}

/// Immutable view of a session, safe to hand to any number of readers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct PipelineSnapshot {
    #[ts(type = "string")]
    pub session_id: Uuid,
    pub flavor: Flavor,
    pub execution_mode: ExecutionMode,
    pub question_mode: Option<QuestionMode>,
    pub stage: Stage,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub topic: Option<String>,
    pub outline: Vec<String>,
    pub target_task_count: Option<u32>,
    pub final_summary: Option<String>,
    /// Pipeline-level failure message.
    pub failure: Option<String>,

    /// Tasks in display order.
    pub tasks: Vec<TaskView>,
    /// Active task ids, sorted.
    pub active_task_ids: Vec<String>,

    /// The most recent log entries, oldest first.
    pub logs: Vec<LogEntry>,
    /// Entries evicted from the log buffer over the session's life.
    pub evicted_logs: u64,

    pub metrics: Metrics,
    pub counts: TaskCounts,

    pub is_idle: bool,
    pub is_completed: bool,
    pub is_failed: bool,
}

/// A finished or in-flight task from a flat results list.
///
/// Used to rebuild a session from stored results instead of from the live
/// event stream.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct ImportedTask {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub result: Option<TaskResult>,
    #[serde(default)]
    pub error: Option<String>,
}
