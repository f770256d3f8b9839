//! Read-model projection.
//!
//! Pure derivation of a [`PipelineSnapshot`] from a [`PipelineState`]. The
//! output depends only on the state passed in: same state, same snapshot.

use pp_protocol::snapshot_models::{PipelineSnapshot, TaskCounts, TaskView};
use pp_protocol::state_models::{Stage, TaskState, TaskStatus};
use std::collections::BTreeSet;

use crate::state::PipelineState;

/// Build the snapshot consumers read, exposing the last `log_view` logs.
pub fn project(state: &PipelineState, log_view: usize) -> PipelineSnapshot {
    let tasks = sorted_tasks(state)
        .into_iter()
        .map(|task| TaskView {
            label: task_label(task),
            is_active: state.active_task_ids.contains(&task.id),
            duration_ms: duration_ms(task),
            task: task.clone(),
        })
        .collect();

    PipelineSnapshot {
        session_id: state.session_id,
        flavor: state.flavor,
        execution_mode: state.execution_mode,
        question_mode: state.question_mode,
        stage: state.stage,
        started_at: state.started_at,
        finished_at: state.finished_at,
        topic: state.topic.clone(),
        outline: state.outline.clone(),
        target_task_count: state.target_task_count,
        final_summary: state.final_summary.clone(),
        failure: state.failure.clone(),
        tasks,
        active_task_ids: state.active_task_ids.iter().cloned().collect(),
        logs: state.logs.recent(log_view).cloned().collect(),
        evicted_logs: state.logs.evicted(),
        metrics: state.metrics.clone(),
        counts: count_tasks(state),
        is_idle: state.stage == Stage::Idle,
        is_completed: state.stage == Stage::Completed,
        is_failed: state.stage == Stage::Failed,
    }
}

/// Display priority of a task. Lower sorts first.
fn tier(task: &TaskState, active: &BTreeSet<String>) -> u8 {
    if active.contains(&task.id) {
        return 0;
    }
    match task.status {
        TaskStatus::Running { .. } => 1,
        TaskStatus::Pending if task.progress.is_some() => 1,
        TaskStatus::Pending => 2,
        TaskStatus::Done | TaskStatus::Failed => 3,
    }
}

/// Tasks in display order: active, then in progress, then pending, then
/// finished. Ties keep first-seen order, then id.
pub fn sorted_tasks(state: &PipelineState) -> Vec<&TaskState> {
    let mut tasks: Vec<&TaskState> = state.tasks.all().collect();
    tasks.sort_by(|a, b| {
        tier(a, &state.active_task_ids)
            .cmp(&tier(b, &state.active_task_ids))
            .then(a.seq.cmp(&b.seq))
            .then_with(|| a.id.cmp(&b.id))
    });
    tasks
}

pub fn count_tasks(state: &PipelineState) -> TaskCounts {
    let mut counts = TaskCounts::default();
    for task in state.tasks.all() {
        counts.total += 1;
        match task.status {
            TaskStatus::Pending => counts.pending += 1,
            TaskStatus::Running { .. } => counts.running += 1,
            TaskStatus::Done => {
                counts.completed += 1;
                if task.is_extended() {
                    counts.extended += 1;
                }
            }
            TaskStatus::Failed => counts.failed += 1,
        }
    }
    counts
}

/// Title, falling back to the result summary and then the id.
pub fn task_label(task: &TaskState) -> String {
    task.title
        .as_deref()
        .or_else(|| task.result.as_ref().and_then(|r| r.summary.as_deref()))
        .unwrap_or(&task.id)
        .to_string()
}

fn duration_ms(task: &TaskState) -> Option<i64> {
    match (task.started_at, task.finished_at) {
        (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
        _ => None,
    }
}
