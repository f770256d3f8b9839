//! Fixtures for building sessions and event sequences.

use chrono::{DateTime, Duration, Utc};
use pp_core::clock::ManualClock;
use pp_core::config::models::ReducerSettings;
use pp_core::engine::reduce;
use pp_core::state::PipelineState;
use pp_protocol::event_models::{EventEnvelope, MetricsDelta, PipelineEvent};
use pp_protocol::session_models::{ExecutionMode, Flavor, SessionConfig};
use pp_protocol::state_models::{LogLevel, TaskResult};
use tempfile::TempDir;

/// Fixed start of every test clock.
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_767_225_600, 0).unwrap_or_default()
}

/// `epoch()` plus `secs` seconds.
#[allow(dead_code)]
pub fn at(secs: i64) -> DateTime<Utc> {
    epoch() + Duration::seconds(secs)
}

pub fn clock() -> ManualClock {
    ManualClock::new(epoch())
}

#[allow(dead_code)]
pub fn new_state(flavor: Flavor, mode: ExecutionMode) -> PipelineState {
    PipelineState::new(&SessionConfig::new(flavor, mode), &ReducerSettings::default())
}

#[allow(dead_code)]
pub fn new_state_with_capacity(flavor: Flavor, log_capacity: usize) -> PipelineState {
    let settings = ReducerSettings {
        log_capacity,
        ..ReducerSettings::default()
    };
    PipelineState::new(&SessionConfig::new(flavor, ExecutionMode::Series), &settings)
}

#[allow(dead_code)]
/// Fold `events` into `state` with a clock that ticks one second per event.
pub fn replay(state: &mut PipelineState, events: &[PipelineEvent]) {
    let clock = clock();
    for event in events {
        reduce(state, &EventEnvelope::new(event.clone()), &clock);
        clock.advance(Duration::seconds(1));
    }
}

pub fn planning() -> PipelineEvent {
    PipelineEvent::PlanningStarted {
        topic: None,
        outline: None,
        execution_mode: None,
    }
}

pub fn task_started(id: &str) -> PipelineEvent {
    PipelineEvent::TaskStarted {
        task_id: id.to_string(),
        title: None,
        initial_status: None,
    }
}

#[allow(dead_code)]
pub fn task_progress(id: &str, round: u32, max_rounds: u32) -> PipelineEvent {
    PipelineEvent::TaskProgress {
        task_id: id.to_string(),
        round,
        max_rounds,
    }
}

pub fn task_completed(id: &str, summary: &str) -> PipelineEvent {
    PipelineEvent::TaskCompleted {
        task_id: id.to_string(),
        result: TaskResult::with_summary(summary),
    }
}

#[allow(dead_code)]
pub fn task_failed(id: &str, error: &str) -> PipelineEvent {
    PipelineEvent::TaskFailed {
        task_id: id.to_string(),
        error: error.to_string(),
    }
}

#[allow(dead_code)]
pub fn log(message: &str) -> PipelineEvent {
    PipelineEvent::Log {
        level: LogLevel::Info,
        message: message.to_string(),
    }
}

#[allow(dead_code)]
pub fn usage(model: &str, input: u64, output: u64, cost_usd: f64) -> PipelineEvent {
    PipelineEvent::MetricsUpdated {
        delta: MetricsDelta {
            model: Some(model.to_string()),
            calls: 1,
            input_tokens: input,
            output_tokens: output,
            cost_usd,
        },
    }
}

/// A temporary project with a `.pipeline-progress/` directory holding one
/// parallel research preset named `deep-research`.
///
/// Returns a TempDir that must be kept alive for the test duration.
#[allow(dead_code)]
pub fn create_test_project() -> std::io::Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;
    let pp_dir = temp_dir.path().join(".pipeline-progress");

    std::fs::create_dir_all(pp_dir.join("sessions"))?;
    std::fs::write(
        pp_dir.join("config.toml"),
        "[reducer]\nlog-capacity = 20\nlog-view = 5\n",
    )?;
    std::fs::write(
        pp_dir.join("sessions/deep-research.yaml"),
        r#"flavor: research
execution-mode: parallel
topic: "Retrieval augmented generation"
target-task-count: 3
"#,
    )?;

    Ok(temp_dir)
}
