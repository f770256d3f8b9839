//! Event-application core.
//!
//! [`reduce`] folds one event into a [`PipelineState`]. It is total: every
//! structurally valid event is either applied or absorbed as a log entry,
//! and nothing here returns an error. Side effects beyond the state itself
//! (snapshot publication, persistence) belong to the caller, see
//! [`Session`](crate::state::Session).

pub mod boundary;
pub mod flavor;
pub mod import;
pub mod stage;

use chrono::{DateTime, Utc};
use pp_protocol::event_models::{EventEnvelope, PipelineEvent};
use pp_protocol::state_models::{
    LogEntry, LogLevel, Stage, TaskProgress, TaskResult, TaskStatus, TraceEntry, TraceRecord,
};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::engine::stage::{StageMachine, Transition};
use crate::state::metrics::accumulate;
use crate::state::{PipelineState, TaskPatch};

/// Apply one event and return the next state.
pub fn apply(mut state: PipelineState, envelope: &EventEnvelope, clock: &dyn Clock) -> PipelineState {
    reduce(&mut state, envelope, clock);
    state
}

/// Apply one event in place.
///
/// Events without a producer timestamp are stamped with `clock`.
pub fn reduce(state: &mut PipelineState, envelope: &EventEnvelope, clock: &dyn Clock) {
    let at = envelope.timestamp.unwrap_or_else(|| clock.now());
    let event = &envelope.event;

    if let Some(target) = event.target_stage() {
        apply_stage(state, event, target, at);
    } else {
        match event {
            PipelineEvent::TaskStarted {
                task_id,
                title,
                initial_status,
            } => {
                let status = initial_status.unwrap_or(TaskStatus::RUNNING);
                change_status(state, task_id, status, None, title.clone(), None, at);
            }
            PipelineEvent::TaskStatusChanged {
                task_id,
                status,
                detail,
            } => {
                change_status(
                    state,
                    task_id,
                    *status,
                    detail.clone(),
                    None,
                    envelope.timestamp,
                    at,
                );
            }
            PipelineEvent::TaskProgress {
                task_id,
                round,
                max_rounds,
            } => {
                let progress = TaskProgress {
                    round: *round,
                    max_rounds: *max_rounds,
                };
                state.tasks.upsert(
                    task_id,
                    TaskPatch {
                        progress: Some(progress),
                        ..TaskPatch::default()
                    },
                    at,
                );
                mark_started(state, at);
            }
            PipelineEvent::TaskCompleted { task_id, result } => {
                complete_task(state, task_id, result.clone(), None, at);
            }
            PipelineEvent::TaskFailed { task_id, error } => {
                fail_task(state, task_id, error.clone(), None, at);
            }
            PipelineEvent::ThoughtRecorded { task_id, entry } => {
                let entry = TraceEntry::Thought {
                    text: entry.clone(),
                };
                append_trace(state, event.type_name(), task_id, entry, at);
            }
            PipelineEvent::ToolCalled { task_id, trace } => {
                append_trace(state, event.type_name(), task_id, trace.clone().into(), at);
            }
            PipelineEvent::MetricsUpdated { delta } => {
                if let Some(warning) = accumulate(&mut state.metrics, delta) {
                    note(state, at, LogLevel::Warning, warning);
                }
            }
            PipelineEvent::Log { level, message } => {
                state.logs.push(LogEntry {
                    timestamp: at,
                    level: *level,
                    message: message.clone(),
                });
            }
            PipelineEvent::Unknown { event_type } => {
                note(
                    state,
                    at,
                    LogLevel::Warning,
                    format!("Ignored unknown event type '{event_type}'"),
                );
            }
            // Stage events are routed above.
            _ => {}
        }

        if let (Some(ts), Some(task_id)) = (envelope.timestamp, event.task_id()) {
            state.tasks.record_producer_time(task_id, ts);
        }
    }

    state.reconcile_active();
}

fn mark_started(state: &mut PipelineState, at: DateTime<Utc>) {
    state.started_at.get_or_insert(at);
}

/// Record an anomaly or notice in the session log and in the trace output.
fn note(state: &mut PipelineState, at: DateTime<Utc>, level: LogLevel, message: String) {
    match level {
        LogLevel::Warning | LogLevel::Error => {
            warn!(session_id = %state.session_id, "{message}")
        }
        LogLevel::Info | LogLevel::Success => {
            info!(session_id = %state.session_id, "{message}")
        }
    }
    state.logs.push(LogEntry {
        timestamp: at,
        level,
        message,
    });
}

fn apply_stage(state: &mut PipelineState, event: &PipelineEvent, target: Stage, at: DateTime<Utc>) {
    let transition = StageMachine::new(state.flavor).transition(state.stage, target);

    match transition {
        Transition::Advanced { from, to } => {
            debug!(session_id = %state.session_id, %from, %to, "stage advanced");
            state.stage = to;
            if to.is_terminal() {
                state.finished_at = Some(at);
            }
        }
        Transition::Unchanged => {}
        Transition::Regression { current, requested } => {
            note(
                state,
                at,
                LogLevel::Warning,
                format!("Ignored out-of-order stage '{requested}' while already '{current}'"),
            );
        }
        Transition::AfterTerminal { current, requested } => {
            note(
                state,
                at,
                LogLevel::Warning,
                format!("Ignored stage '{requested}' after pipeline {current}"),
            );
        }
        Transition::Foreign { requested } => {
            let flavor = state.flavor;
            note(
                state,
                at,
                LogLevel::Warning,
                format!("Ignored stage '{requested}' which is not part of the {flavor} pipeline"),
            );
        }
    }

    if transition.is_accepted() {
        mark_started(state, at);
        record_stage_payload(state, event, at);
    }
}

fn record_stage_payload(state: &mut PipelineState, event: &PipelineEvent, at: DateTime<Utc>) {
    match event {
        PipelineEvent::PlanningStarted {
            topic,
            outline,
            execution_mode,
        } => {
            if let Some(topic) = topic {
                state.topic = Some(topic.clone());
            }
            if let Some(outline) = outline {
                state.outline = outline.clone();
            }
            if let Some(mode) = execution_mode {
                if *mode != state.execution_mode {
                    let current = state.execution_mode;
                    note(
                        state,
                        at,
                        LogLevel::Warning,
                        format!("Ignored execution mode '{mode}'; session runs in '{current}' mode"),
                    );
                }
            }
        }
        PipelineEvent::UploadingStarted { file_name } => {
            if let Some(name) = file_name {
                state.source_file = Some(name.clone());
            }
        }
        PipelineEvent::ExtractingStarted { count } => {
            if count.is_some() {
                state.target_task_count = *count;
            }
        }
        PipelineEvent::ResearchingStarted { topics } => {
            if let Some(topics) = topics {
                state.announced_tasks = topics.clone();
            }
        }
        PipelineEvent::GeneratingStarted { target_count } => {
            if target_count.is_some() {
                state.target_task_count = *target_count;
            }
        }
        PipelineEvent::Completed { summary } => {
            if summary.is_some() {
                state.final_summary = summary.clone();
            }
        }
        PipelineEvent::Failed { error } => {
            state.failure = Some(error.clone());
        }
        _ => {}
    }
}

/// Move a task to a new status.
///
/// Terminal statuses are routed to [`complete_task`]/[`fail_task`] so a
/// finished task always carries exactly one of result or error.
/// `producer_ts` is the event's own timestamp. It is compared only with
/// earlier producer timestamps, never with clock-stamped updates.
fn change_status(
    state: &mut PipelineState,
    task_id: &str,
    status: TaskStatus,
    detail: Option<String>,
    title: Option<String>,
    producer_ts: Option<DateTime<Utc>>,
    at: DateTime<Utc>,
) {
    match status {
        TaskStatus::Done => {
            let result = TaskResult {
                summary: detail,
                ..TaskResult::default()
            };
            complete_task(state, task_id, result, title, at);
            return;
        }
        TaskStatus::Failed => {
            let error = detail.unwrap_or_else(|| "Task failed".to_string());
            fail_task(state, task_id, error, title, at);
            return;
        }
        TaskStatus::Pending | TaskStatus::Running { .. } => {}
    }

    if let Some(task) = state.tasks.get(task_id) {
        if task.status.is_terminal() {
            let current = task.status;
            note(
                state,
                at,
                LogLevel::Warning,
                format!("Ignored status change for finished task '{task_id}' ({current:?})"),
            );
            return;
        }
        let stale = producer_ts
            .zip(task.last_producer_ts)
            .is_some_and(|(ts, last)| ts < last);
        if stale {
            note(
                state,
                at,
                LogLevel::Warning,
                format!("Ignored stale status change for task '{task_id}'"),
            );
            return;
        }
    }

    let status = vet_substatus(state, task_id, status, at);
    state.tasks.upsert(
        task_id,
        TaskPatch {
            title,
            status: Some(status),
            status_detail: detail,
            ..TaskPatch::default()
        },
        at,
    );
    mark_started(state, at);
}

/// Drop a substatus the session's flavor does not define.
fn vet_substatus(
    state: &mut PipelineState,
    task_id: &str,
    status: TaskStatus,
    at: DateTime<Utc>,
) -> TaskStatus {
    let Some(substatus) = status.substatus() else {
        return status;
    };
    if StageMachine::new(state.flavor).descriptor().accepts(substatus) {
        return status;
    }
    let flavor = state.flavor;
    note(
        state,
        at,
        LogLevel::Warning,
        format!("Dropped substatus '{substatus}' for task '{task_id}': not a {flavor} phase"),
    );
    TaskStatus::RUNNING
}

fn complete_task(
    state: &mut PipelineState,
    task_id: &str,
    result: TaskResult,
    title: Option<String>,
    at: DateTime<Utc>,
) {
    match state.tasks.get(task_id).map(|t| t.status) {
        Some(TaskStatus::Failed) => {
            note(
                state,
                at,
                LogLevel::Warning,
                format!("Ignored completion of task '{task_id}' which already failed"),
            );
            return;
        }
        Some(TaskStatus::Done) => {
            // Duplicate delivery: status stays, the same result is set again.
            state.tasks.upsert(
                task_id,
                TaskPatch {
                    result: Some(result),
                    ..TaskPatch::default()
                },
                at,
            );
            return;
        }
        Some(TaskStatus::Running { .. }) => {}
        Some(TaskStatus::Pending) | None => {
            note(
                state,
                at,
                LogLevel::Info,
                format!("Task '{task_id}' completed without being reported as running"),
            );
        }
    }

    state.tasks.upsert(
        task_id,
        TaskPatch {
            title,
            status: Some(TaskStatus::Done),
            result: Some(result),
            ..TaskPatch::default()
        },
        at,
    );
    state.active_task_ids.remove(task_id);
    mark_started(state, at);
}

fn fail_task(
    state: &mut PipelineState,
    task_id: &str,
    error: String,
    title: Option<String>,
    at: DateTime<Utc>,
) {
    match state.tasks.get(task_id).map(|t| t.status) {
        Some(TaskStatus::Done) => {
            note(
                state,
                at,
                LogLevel::Warning,
                format!("Ignored failure of task '{task_id}' which already completed"),
            );
            return;
        }
        Some(TaskStatus::Failed) => {
            state.tasks.upsert(
                task_id,
                TaskPatch {
                    error: Some(error),
                    ..TaskPatch::default()
                },
                at,
            );
            return;
        }
        Some(TaskStatus::Running { .. }) => {}
        Some(TaskStatus::Pending) | None => {
            note(
                state,
                at,
                LogLevel::Info,
                format!("Task '{task_id}' failed without being reported as running"),
            );
        }
    }

    state.tasks.upsert(
        task_id,
        TaskPatch {
            title,
            status: Some(TaskStatus::Failed),
            error: Some(error),
            ..TaskPatch::default()
        },
        at,
    );
    state.active_task_ids.remove(task_id);
    mark_started(state, at);
}

/// Append to a task's trace. A trace alone is not enough to create a task.
fn append_trace(
    state: &mut PipelineState,
    event_type: &str,
    task_id: &str,
    entry: TraceEntry,
    at: DateTime<Utc>,
) {
    if !state.tasks.contains(task_id) {
        note(
            state,
            at,
            LogLevel::Warning,
            format!("Dropped {event_type} for unknown task '{task_id}'"),
        );
        return;
    }
    state.tasks.upsert(
        task_id,
        TaskPatch {
            trace: Some(TraceRecord {
                timestamp: at,
                entry,
            }),
            ..TaskPatch::default()
        },
        at,
    );
}
