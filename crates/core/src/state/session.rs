//! Session ownership and snapshot publication.
//!
//! A [`Session`] is the thin wrapper around the pure reducer. It owns the
//! one [`PipelineState`] of a run, applies events to it, and after each
//! applied event publishes a fresh [`PipelineSnapshot`] on a watch channel.
//! Subscribers only ever see whole snapshots, never a half-applied event.

use pp_protocol::event_models::EventEnvelope;
use pp_protocol::session_models::SessionConfig;
use pp_protocol::snapshot_models::{ImportedTask, PipelineSnapshot};
use pp_protocol::state_models::TaskState;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::WatchStream;

use crate::clock::{Clock, SystemClock};
use crate::config::models::ReducerSettings;
use crate::engine::boundary::{decode_event, BoundaryResult};
use crate::engine::import::import_tasks;
use crate::engine::reduce;
use crate::projection::project;
use crate::state::PipelineState;

/// Owner of one pipeline session.
pub struct Session {
    config: SessionConfig,
    settings: ReducerSettings,
    clock: Arc<dyn Clock>,
    state: PipelineState,
    snapshots: watch::Sender<Arc<PipelineSnapshot>>,
}

impl Session {
    /// Start an idle session stamped by the wall clock.
    pub fn new(config: SessionConfig, settings: ReducerSettings) -> Self {
        Self::with_clock(config, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: SessionConfig,
        settings: ReducerSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let state = PipelineState::new(&config, &settings);
        let (snapshots, _) = watch::channel(Arc::new(project(&state, settings.log_view)));

        tracing::debug!(
            session_id = %state.session_id,
            flavor = %config.flavor,
            mode = %config.execution_mode,
            "session created"
        );

        Self {
            config,
            settings,
            clock,
            state,
            snapshots,
        }
    }

    /// Apply one event and publish the resulting snapshot.
    pub fn dispatch(&mut self, envelope: &EventEnvelope) -> Arc<PipelineSnapshot> {
        reduce(&mut self.state, envelope, self.clock.as_ref());
        self.publish()
    }

    /// Decode one raw JSON record and apply it.
    ///
    /// Malformed records are rejected without touching the state.
    pub fn dispatch_json(&mut self, raw: &str) -> BoundaryResult<Arc<PipelineSnapshot>> {
        let envelope = decode_event(raw)?;
        Ok(self.dispatch(&envelope))
    }

    /// Rebuild tasks from a flat results list, publishing once at the end.
    pub fn import(&mut self, tasks: &[ImportedTask]) -> Arc<PipelineSnapshot> {
        for envelope in import_tasks(tasks) {
            reduce(&mut self.state, &envelope, self.clock.as_ref());
        }
        tracing::debug!(
            session_id = %self.state.session_id,
            tasks = tasks.len(),
            "imported task results"
        );
        self.publish()
    }

    /// Apply events from `feed` until every sender is dropped.
    ///
    /// Returns the number of events applied.
    pub async fn consume(&mut self, mut feed: mpsc::Receiver<EventEnvelope>) -> usize {
        let mut applied = 0;
        while let Some(envelope) = feed.recv().await {
            self.dispatch(&envelope);
            applied += 1;
        }
        tracing::debug!(session_id = %self.state.session_id, applied, "event feed closed");
        applied
    }

    /// A receiver that always holds the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<PipelineSnapshot>> {
        self.snapshots.subscribe()
    }

    /// Snapshots as a stream, starting with the current one.
    pub fn snapshot_stream(&self) -> WatchStream<Arc<PipelineSnapshot>> {
        WatchStream::new(self.subscribe())
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Arc<PipelineSnapshot> {
        self.snapshots.borrow().clone()
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Discard the current run and start a fresh idle session.
    ///
    /// Passing a config switches the bootstrap; `None` reuses the current
    /// one. Existing subscribers keep receiving snapshots.
    pub fn reset(&mut self, config: Option<SessionConfig>) -> Arc<PipelineSnapshot> {
        if let Some(config) = config {
            self.config = config;
        }
        let previous = self.state.session_id;
        self.state = PipelineState::new(&self.config, &self.settings);
        tracing::info!(
            previous = %previous,
            session_id = %self.state.session_id,
            "session reset"
        );
        self.publish()
    }

    /// Drop one task from the session.
    pub fn forget_task(&mut self, task_id: &str) -> Option<TaskState> {
        let removed = self.state.tasks.remove(task_id)?;
        self.state.reconcile_active();
        self.publish();
        Some(removed)
    }

    fn publish(&self) -> Arc<PipelineSnapshot> {
        let snapshot = Arc::new(project(&self.state, self.settings.log_view));
        self.snapshots.send_replace(Arc::clone(&snapshot));
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{DateTime, Utc};
    use pp_protocol::event_models::PipelineEvent;
    use pp_protocol::session_models::{ExecutionMode, Flavor};
    use pp_protocol::state_models::{Stage, TaskResult, TaskStatus};
    use tokio_stream::StreamExt;

    fn session() -> Session {
        let clock = ManualClock::new(DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap());
        Session::with_clock(
            SessionConfig::new(Flavor::Research, ExecutionMode::Series),
            ReducerSettings::default(),
            Arc::new(clock),
        )
    }

    fn started(id: &str) -> EventEnvelope {
        PipelineEvent::TaskStarted {
            task_id: id.to_string(),
            title: None,
            initial_status: None,
        }
        .into()
    }

    #[test]
    fn test_dispatch_publishes_snapshot() {
        let mut session = session();
        let rx = session.subscribe();
        assert!(rx.borrow().is_idle);

        session.dispatch(&started("block_1"));

        assert_eq!(rx.borrow().active_task_ids, vec!["block_1".to_string()]);
        assert_eq!(session.snapshot().counts.running, 1);
    }

    #[test]
    fn test_dispatch_json_rejects_malformed_without_publishing() {
        let mut session = session();
        let before = session.snapshot();

        assert!(session.dispatch_json("{\"task_id\": \"x\"}").is_err());
        assert!(Arc::ptr_eq(&before, &session.snapshot()));

        let snapshot = session
            .dispatch_json(r#"{"type":"planning_started","topic":"LLM agents"}"#)
            .unwrap();
        assert_eq!(snapshot.stage, Stage::Planning);
        assert_eq!(snapshot.topic.as_deref(), Some("LLM agents"));
    }

    #[test]
    fn test_import_applies_batch() {
        let mut session = session();
        let snapshot = session.import(&[
            ImportedTask {
                id: "block_1".to_string(),
                title: Some("Background".to_string()),
                status: TaskStatus::Done,
                result: Some(TaskResult::with_summary("done")),
                error: None,
            },
            ImportedTask {
                id: "block_2".to_string(),
                title: None,
                status: TaskStatus::Failed,
                result: None,
                error: Some("timeout".to_string()),
            },
        ]);

        assert_eq!(snapshot.counts.completed, 1);
        assert_eq!(snapshot.counts.failed, 1);
        assert!(snapshot.active_task_ids.is_empty());
    }

    #[test]
    fn test_reset_replaces_state_wholesale() {
        let mut session = session();
        session.dispatch(&started("block_1"));
        let old_id = session.state().session_id;

        let snapshot = session.reset(Some(SessionConfig::new(
            Flavor::QuestionGeneration,
            ExecutionMode::Parallel,
        )));

        assert_ne!(snapshot.session_id, old_id);
        assert!(snapshot.tasks.is_empty());
        assert_eq!(snapshot.flavor, Flavor::QuestionGeneration);
        assert_eq!(session.config().execution_mode, ExecutionMode::Parallel);
    }

    #[test]
    fn test_forget_task() {
        let mut session = session();
        session.dispatch(&started("block_1"));

        assert!(session.forget_task("block_1").is_some());
        assert!(session.forget_task("block_1").is_none());
        assert!(session.snapshot().active_task_ids.is_empty());
        assert!(session.state().active_set_is_consistent());
    }

    #[tokio::test]
    async fn test_consume_until_feed_closes() {
        let mut session = session();
        let (tx, rx) = mpsc::channel(8);

        tokio::spawn(async move {
            for id in ["a", "b", "c"] {
                tx.send(started(id)).await.unwrap();
            }
        });

        let applied = session.consume(rx).await;
        assert_eq!(applied, 3);
        assert_eq!(session.snapshot().counts.total, 3);
    }

    #[tokio::test]
    async fn test_snapshot_stream_yields_current_snapshot() {
        let mut session = session();
        session.dispatch(&started("a"));

        let mut stream = session.snapshot_stream();
        let first = stream.next().await.unwrap();
        assert_eq!(first.counts.total, 1);
    }
}
