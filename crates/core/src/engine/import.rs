//! Rebuilding a session from stored task results.
//!
//! A finished run can be re-displayed from its flat results list without the
//! original event stream. [`import_tasks`] turns that list into the task
//! events a live run would have produced, so the reducer stays the only
//! writer of state.

use pp_protocol::event_models::{EventEnvelope, PipelineEvent};
use pp_protocol::snapshot_models::ImportedTask;
use pp_protocol::state_models::TaskStatus;

/// Synthesize task events for `tasks`, preserving list order.
pub fn import_tasks(tasks: &[ImportedTask]) -> Vec<EventEnvelope> {
    let mut events = Vec::with_capacity(tasks.len() * 2);

    for task in tasks {
        let initial_status = match task.status {
            TaskStatus::Pending => TaskStatus::Pending,
            TaskStatus::Running { .. } | TaskStatus::Done | TaskStatus::Failed => {
                TaskStatus::RUNNING
            }
        };
        events.push(EventEnvelope::new(PipelineEvent::TaskStarted {
            task_id: task.id.clone(),
            title: task.title.clone(),
            initial_status: Some(initial_status),
        }));

        match task.status {
            TaskStatus::Done => {
                events.push(EventEnvelope::new(PipelineEvent::TaskCompleted {
                    task_id: task.id.clone(),
                    result: task.result.clone().unwrap_or_default(),
                }));
            }
            TaskStatus::Failed => {
                let error = task
                    .error
                    .clone()
                    .unwrap_or_else(|| "Task failed".to_string());
                events.push(EventEnvelope::new(PipelineEvent::TaskFailed {
                    task_id: task.id.clone(),
                    error,
                }));
            }
            TaskStatus::Running { substatus: Some(_) } => {
                events.push(EventEnvelope::new(PipelineEvent::TaskStatusChanged {
                    task_id: task.id.clone(),
                    status: task.status,
                    detail: None,
                }));
            }
            TaskStatus::Running { substatus: None } | TaskStatus::Pending => {}
        }
    }

    events
}
