//! Inbound progress events.
//!
//! A pipeline producer emits a stream of discrete events describing what the
//! backend job is doing. Each event is a flat record discriminated by its
//! `type` field:
//!
//! ```json
//! { "type": "task_progress", "task_id": "block_2", "round": 1, "max_rounds": 3 }
//! ```
//!
//! Events travel inside an [`EventEnvelope`] which may carry the time the
//! producer emitted them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::session_models::ExecutionMode;
use crate::state_models::{LogLevel, Stage, TaskResult, TaskStatus, TraceEntry};

/// Every event a research or question generation pipeline may emit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    // -- Stage events --------------------------------------------------
    /// The run is planning its work (decomposing a topic into blocks,
    /// or a knowledge point into focuses).
    PlanningStarted {
        #[serde(default)]
        topic: Option<String>,
        #[serde(default)]
        outline: Option<Vec<String>>,
        #[serde(default)]
        execution_mode: Option<ExecutionMode>,
    },

    /// A source document is being uploaded (mimic question generation).
    UploadingStarted {
        #[serde(default)]
        file_name: Option<String>,
    },

    /// The uploaded document is being parsed.
    ParsingStarted {},

    /// Reference questions are being extracted from the parsed document.
    ExtractingStarted {
        #[serde(default)]
        count: Option<u32>,
    },

    /// Research blocks are executing.
    ResearchingStarted {
        #[serde(default)]
        topics: Option<Vec<String>>,
    },

    /// Questions are being generated.
    GeneratingStarted {
        #[serde(default)]
        target_count: Option<u32>,
    },

    /// Generated questions are being validated.
    ValidatingStarted {},

    /// The research report is being written.
    ReportingStarted {},

    /// The run finished.
    Completed {
        #[serde(default)]
        summary: Option<String>,
    },

    /// The run as a whole failed.
    Failed { error: String },

    // -- Task lifecycle events -----------------------------------------
    TaskStarted {
        task_id: String,
        #[serde(default)]
        title: Option<String>,
        /// Status to start in. Defaults to running.
        #[serde(default)]
        initial_status: Option<TaskStatus>,
    },

    TaskStatusChanged {
        task_id: String,
        status: TaskStatus,
        #[serde(default)]
        detail: Option<String>,
    },

    TaskProgress {
        task_id: String,
        round: u32,
        max_rounds: u32,
    },

    TaskCompleted { task_id: String, result: TaskResult },

    TaskFailed { task_id: String, error: String },

    // -- Trace events --------------------------------------------------
    ThoughtRecorded { task_id: String, entry: String },

    ToolCalled { task_id: String, trace: ToolTrace },

    // -- Aggregate and log events --------------------------------------
    /// Additive usage delta. Never an absolute value.
    MetricsUpdated { delta: MetricsDelta },

    Log { level: LogLevel, message: String },

    /// An event whose `type` this version does not know.
    ///
    /// Only ever produced by the transport boundary decoder.
    #[serde(skip)]
    Unknown { event_type: String },
}

impl PipelineEvent {
    /// `type` tags this version understands.
    pub const KNOWN_TYPES: &'static [&'static str] = &[
        "planning_started",
        "uploading_started",
        "parsing_started",
        "extracting_started",
        "researching_started",
        "generating_started",
        "validating_started",
        "reporting_started",
        "completed",
        "failed",
        "task_started",
        "task_status_changed",
        "task_progress",
        "task_completed",
        "task_failed",
        "thought_recorded",
        "tool_called",
        "metrics_updated",
        "log",
    ];

    /// The wire `type` of this event.
    pub fn type_name(&self) -> &str {
        match self {
            PipelineEvent::PlanningStarted { .. } => "planning_started",
            PipelineEvent::UploadingStarted { .. } => "uploading_started",
            PipelineEvent::ParsingStarted {} => "parsing_started",
            PipelineEvent::ExtractingStarted { .. } => "extracting_started",
            PipelineEvent::ResearchingStarted { .. } => "researching_started",
            PipelineEvent::GeneratingStarted { .. } => "generating_started",
            PipelineEvent::ValidatingStarted {} => "validating_started",
            PipelineEvent::ReportingStarted {} => "reporting_started",
            PipelineEvent::Completed { .. } => "completed",
            PipelineEvent::Failed { .. } => "failed",
            PipelineEvent::TaskStarted { .. } => "task_started",
            PipelineEvent::TaskStatusChanged { .. } => "task_status_changed",
            PipelineEvent::TaskProgress { .. } => "task_progress",
            PipelineEvent::TaskCompleted { .. } => "task_completed",
            PipelineEvent::TaskFailed { .. } => "task_failed",
            PipelineEvent::ThoughtRecorded { .. } => "thought_recorded",
            PipelineEvent::ToolCalled { .. } => "tool_called",
            PipelineEvent::MetricsUpdated { .. } => "metrics_updated",
            PipelineEvent::Log { .. } => "log",
            PipelineEvent::Unknown { event_type } => event_type,
        }
    }

    /// The macro-stage a stage event announces, if this is one.
    pub fn target_stage(&self) -> Option<Stage> {
        let stage = match self {
            PipelineEvent::PlanningStarted { .. } => Stage::Planning,
            PipelineEvent::UploadingStarted { .. } => Stage::Uploading,
            PipelineEvent::ParsingStarted {} => Stage::Parsing,
            PipelineEvent::ExtractingStarted { .. } => Stage::Extracting,
            PipelineEvent::ResearchingStarted { .. } => Stage::Researching,
            PipelineEvent::GeneratingStarted { .. } => Stage::Generating,
            PipelineEvent::ValidatingStarted {} => Stage::Validating,
            PipelineEvent::ReportingStarted {} => Stage::Reporting,
            PipelineEvent::Completed { .. } => Stage::Completed,
            PipelineEvent::Failed { .. } => Stage::Failed,
            _ => return None,
        };
        Some(stage)
    }

    /// The task this event refers to, if any.
    pub fn task_id(&self) -> Option<&str> {
        match self {
            PipelineEvent::TaskStarted { task_id, .. }
            | PipelineEvent::TaskStatusChanged { task_id, .. }
            | PipelineEvent::TaskProgress { task_id, .. }
            | PipelineEvent::TaskCompleted { task_id, .. }
            | PipelineEvent::TaskFailed { task_id, .. }
            | PipelineEvent::ThoughtRecorded { task_id, .. }
            | PipelineEvent::ToolCalled { task_id, .. } => Some(task_id),
            _ => None,
        }
    }
}

/// A tool invocation reported by a task.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct ToolTrace {
    pub tool: String,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
}

impl From<ToolTrace> for TraceEntry {
    fn from(trace: ToolTrace) -> Self {
        TraceEntry::ToolCall {
            tool: trace.tool,
            query: trace.query,
            output: trace.output,
        }
    }
}

/// Usage added by one or more model calls.
///
/// All fields are deltas. `cost_usd` arrives as a float from producers and
/// is converted to integer microdollars when accumulated.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, TS)]
pub struct MetricsDelta {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub calls: u64,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cost_usd: f64,
}

/// An event plus the time the producer emitted it.
///
/// When `timestamp` is absent the reducer stamps the event with its clock.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct EventEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub event: PipelineEvent,
}

impl EventEnvelope {
    /// Wrap an event with no producer timestamp.
    pub fn new(event: PipelineEvent) -> Self {
        Self {
            timestamp: None,
            event,
        }
    }

    /// Wrap an event emitted at `timestamp`.
    pub fn at(timestamp: DateTime<Utc>, event: PipelineEvent) -> Self {
        Self {
            timestamp: Some(timestamp),
            event,
        }
    }
}

impl From<PipelineEvent> for EventEnvelope {
    fn from(event: PipelineEvent) -> Self {
        Self::new(event)
    }
}
