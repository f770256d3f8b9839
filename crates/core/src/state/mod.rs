//! Canonical state of one pipeline session.
//!
//! This module provides:
//! - [`PipelineState`], the root aggregate the reducer folds events into
//! - The task registry, log buffer and metrics aggregator it is built from
//! - [`Session`], the owner that applies events and publishes snapshots

pub mod log_buffer;
pub mod metrics;
pub mod registry;
pub mod session;

pub use log_buffer::LogBuffer;
pub use registry::{TaskPatch, TaskRegistry};
pub use session::Session;

use chrono::{DateTime, Utc};
use pp_protocol::session_models::{ExecutionMode, Flavor, QuestionMode, SessionConfig};
use pp_protocol::state_models::{Metrics, Stage};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::config::models::ReducerSettings;

/// Root aggregate for one session.
///
/// Created idle from a [`SessionConfig`] and mutated only by the reducer.
/// Consumers read [`PipelineSnapshot`](pp_protocol::PipelineSnapshot)s
/// projected from it, never the state itself.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineState {
    pub session_id: Uuid,
    pub flavor: Flavor,
    pub execution_mode: ExecutionMode,
    pub question_mode: Option<QuestionMode>,

    pub stage: Stage,
    /// Set by the first stage or task event, then never changed.
    pub started_at: Option<DateTime<Utc>>,
    /// When a terminal stage was entered.
    pub finished_at: Option<DateTime<Utc>>,

    pub topic: Option<String>,
    pub outline: Vec<String>,
    /// Task titles announced when execution started.
    pub announced_tasks: Vec<String>,
    pub target_task_count: Option<u32>,
    pub source_file: Option<String>,
    pub final_summary: Option<String>,
    pub failure: Option<String>,

    pub tasks: TaskRegistry,
    /// Ids of running tasks. Always a subset of `tasks`.
    pub active_task_ids: BTreeSet<String>,

    pub logs: LogBuffer,
    pub metrics: Metrics,
}

impl PipelineState {
    /// A fresh idle session.
    pub fn new(config: &SessionConfig, settings: &ReducerSettings) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            flavor: config.flavor,
            execution_mode: config.execution_mode,
            question_mode: match config.flavor {
                Flavor::QuestionGeneration => config.question_mode,
                Flavor::Research => None,
            },
            stage: Stage::Idle,
            started_at: None,
            finished_at: None,
            topic: config.topic.clone(),
            outline: Vec::new(),
            announced_tasks: Vec::new(),
            target_task_count: config.target_task_count,
            source_file: None,
            final_summary: None,
            failure: None,
            tasks: TaskRegistry::new(),
            active_task_ids: BTreeSet::new(),
            logs: LogBuffer::with_capacity(settings.log_capacity),
            metrics: Metrics::default(),
        }
    }

    /// Rebuild the active set from task statuses.
    ///
    /// Keeps `active_task_ids` a subset of the registry and free of
    /// finished tasks whatever the preceding mutation did.
    pub fn reconcile_active(&mut self) {
        let tasks = &self.tasks;
        self.active_task_ids
            .retain(|id| tasks.get(id).is_some_and(|t| t.status.is_running()));
        for task in self.tasks.all() {
            if task.status.is_running() {
                self.active_task_ids.insert(task.id.clone());
            }
        }
    }

    /// Whether every invariant on the active set holds.
    pub fn active_set_is_consistent(&self) -> bool {
        self.active_task_ids.iter().all(|id| {
            self.tasks
                .get(id)
                .is_some_and(|t| !t.status.is_terminal())
        })
    }
}
