//! Pipeline and task state models.
//!
//! This module defines the pieces of state the reducer maintains for a
//! session: the macro-stage, per-task status and progress, trace entries,
//! the log entries and the running metrics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

/// Pipeline-wide macro-phase.
///
/// Not every flavor uses every stage. The order a flavor allows is declared
/// by its flavor descriptor in `pp-core`.
///
/// `Completed` and `Failed` are terminal and absorbing.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, TS)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Session created, nothing observed yet.
    #[default]
    Idle,
    Planning,
    Uploading,
    Parsing,
    Extracting,
    Researching,
    Generating,
    Validating,
    Reporting,
    Completed,
    Failed,
}

impl Stage {
    /// Whether this stage is absorbing.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Completed | Stage::Failed)
    }

    /// Wire name of the stage.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Planning => "planning",
            Stage::Uploading => "uploading",
            Stage::Parsing => "parsing",
            Stage::Extracting => "extracting",
            Stage::Researching => "researching",
            Stage::Generating => "generating",
            Stage::Validating => "validating",
            Stage::Reporting => "reporting",
            Stage::Completed => "completed",
            Stage::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Running phases of a research block.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
pub enum ResearchPhase {
    /// Thinking about what to look up next.
    Iterating,
    /// Waiting on a retrieval or web search tool.
    ToolCalling,
    /// Writing up the block's findings.
    Writing,
}

/// Running phases of a question generation focus.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
pub enum QuestionPhase {
    Analyzing,
    Generating,
    Validating,
}

/// Fine-grained phase of a running task.
///
/// Each flavor has its own vocabulary. Phase names are disjoint across
/// flavors, so the wire form is just the phase name:
///
/// ```json
/// "tool_calling"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(untagged)]
pub enum Substatus {
    Research(ResearchPhase),
    Question(QuestionPhase),
}

impl std::fmt::Display for Substatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Substatus::Research(ResearchPhase::Iterating) => "iterating",
            Substatus::Research(ResearchPhase::ToolCalling) => "tool_calling",
            Substatus::Research(ResearchPhase::Writing) => "writing",
            Substatus::Question(QuestionPhase::Analyzing) => "analyzing",
            Substatus::Question(QuestionPhase::Generating) => "generating",
            Substatus::Question(QuestionPhase::Validating) => "validating",
        };
        f.write_str(name)
    }
}

/// Lifecycle status of one task.
///
/// Serialized with a `state` tag:
///
/// ```json
/// { "state": "running", "substatus": "validating" }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskStatus {
    /// Known but not started.
    #[default]
    Pending,

    /// Executing, optionally in a flavor-specific phase.
    Running {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        substatus: Option<Substatus>,
    },

    /// Finished with a result.
    Done,

    /// Finished with an error.
    Failed,
}

impl TaskStatus {
    /// Running with no known phase.
    pub const RUNNING: TaskStatus = TaskStatus::Running { substatus: None };

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Failed)
    }

    pub fn is_running(self) -> bool {
        matches!(self, TaskStatus::Running { .. })
    }

    pub fn substatus(self) -> Option<Substatus> {
        match self {
            TaskStatus::Running { substatus } => substatus,
            _ => None,
        }
    }
}

/// Iteration counters for a task.
///
/// Research blocks count iterations, question focuses count validation
/// rounds. Both are "round `n` of at most `max_rounds`".
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
pub struct TaskProgress {
    pub round: u32,
    pub max_rounds: u32,
}

impl TaskProgress {
    /// Combine two progress reports so the result does not depend on the
    /// order they were observed in.
    pub fn merge(self, other: TaskProgress) -> TaskProgress {
        TaskProgress {
            round: self.round.max(other.round),
            max_rounds: self.max_rounds.max(other.max_rounds),
        }
    }
}

/// One entry in a task's trace.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceEntry {
    /// Free-form reasoning emitted by the agent.
    Thought { text: String },

    /// A tool invocation and, when available, its output.
    ToolCall {
        tool: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        query: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<String>,
    },
}

/// A trace entry with the time it was recorded.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct TraceRecord {
    pub timestamp: DateTime<Utc>,
    pub entry: TraceEntry,
}

/// Artifact produced by a finished task.
///
/// Opaque apart from `summary`, which labels the task when it has no
/// title, and `extended`, which marks a result enriched beyond the
/// baseline requirement.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, TS)]
pub struct TaskResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default)]
    pub extended: bool,

    /// The artifact itself (a generated question, a research excerpt, ...).
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl TaskResult {
    /// Result carrying only a summary.
    pub fn with_summary(summary: impl Into<String>) -> Self {
        Self {
            summary: Some(summary.into()),
            ..Self::default()
        }
    }
}

/// State of one unit of work: a research block or a question focus.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct TaskState {
    /// Producer-assigned identifier, unique within a session.
    pub id: String,

    /// Order in which the reducer first saw this task.
    pub seq: u64,

    /// Human-readable title (sub-topic or focus), if announced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub status: TaskStatus,

    /// Free-form detail attached to the latest status change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_detail: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<TaskProgress>,

    /// Append-only trace of thoughts and tool calls.
    #[serde(default)]
    pub trace: Vec<TraceRecord>,

    /// Set exactly once, on the transition into `Done`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,

    /// Set exactly once, on the transition into `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// First transition into `Running`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// Transition into `Done` or `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    /// Most recent mutation, stamped by the producer or the reducer clock.
    pub last_update: DateTime<Utc>,

    /// Latest timestamp the producer itself attached to an event for this
    /// task. Status changes older than this are stale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_producer_ts: Option<DateTime<Utc>>,
}

impl TaskState {
    /// A pending task with no history.
    pub fn new(id: impl Into<String>, seq: u64, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            seq,
            title: None,
            status: TaskStatus::Pending,
            status_detail: None,
            progress: None,
            trace: Vec::new(),
            result: None,
            error: None,
            started_at: None,
            finished_at: None,
            last_update: now,
            last_producer_ts: None,
        }
    }

    /// Whether the task carries an extended result.
    pub fn is_extended(&self) -> bool {
        self.result.as_ref().is_some_and(|r| r.extended)
    }
}

/// Severity of a user-visible log entry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One user-visible log line. Immutable once appended.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

/// Token and cost usage attributed to one model.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
pub struct ModelUsage {
    pub calls: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_microdollars: u64,
}

/// Running totals for a session. Every field only ever grows.
///
/// Cost is held in integer microdollars so many small additions do not
/// drift.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, TS)]
pub struct Metrics {
    pub calls: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_microdollars: u64,

    /// Breakdown by model name, for deltas that name one.
    #[serde(default)]
    pub by_model: BTreeMap<String, ModelUsage>,
}

impl Metrics {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    /// Accumulated cost in US dollars, for display.
    pub fn cost_usd(&self) -> f64 {
        self.cost_microdollars as f64 / 1_000_000.0
    }
}
