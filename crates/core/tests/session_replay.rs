//! Integration tests for the session wrapper.
//!
//! These tests drive a [`Session`] the way a host application would: load
//! configuration from disk, feed raw JSON records and channel events, and
//! read snapshots from subscribers.

mod common;

use common::*;
use pp_core::config::loader::load_config;
use pp_core::state::Session;
use pp_protocol::event_models::EventEnvelope;
use pp_protocol::session_models::{ExecutionMode, Flavor, SessionConfig};
use pp_protocol::state_models::{Stage, TaskStatus};
use std::sync::Arc;
use tokio::sync::mpsc;

const RESEARCH_RUN: &str = r#"{"type":"planning_started","topic":"RAG","outline":["Retrievers","Rerankers"]}
{"type":"researching_started","topics":["Retrievers","Rerankers"]}
{"type":"task_started","task_id":"block_1","title":"Retrievers"}
{"type":"task_started","task_id":"block_2","title":"Rerankers"}
{"type":"task_status_changed","task_id":"block_1","status":{"state":"running","substatus":"tool_calling"},"detail":"web_search"}
{"type":"tool_called","task_id":"block_1","trace":{"tool":"web_search","query":"dense retrievers"}}
{"type":"task_progress","task_id":"block_2","round":1,"max_rounds":3}
{"type":"metrics_updated","delta":{"model":"gpt-4o","calls":2,"input_tokens":900,"output_tokens":150,"cost_usd":0.004}}
{"type":"task_completed","task_id":"block_1","result":{"summary":"Dense beats sparse","extended":true}}
{"type":"citation_added","url":"https://example.org"}
{"type":"task_failed","task_id":"block_2","error":"timeout"}
{"type":"reporting_started"}
{"type":"completed","summary":"Report ready"}"#;

fn session_with_test_clock(config: SessionConfig) -> Session {
    Session::with_clock(config, Default::default(), Arc::new(clock()))
}

#[tokio::test]
async fn test_replay_from_preset() {
    let project = create_test_project().expect("Failed to create test project");
    let config = load_config(project.path())
        .await
        .expect("Failed to load config");
    let preset = config
        .session("deep-research")
        .cloned()
        .expect("preset should exist");

    let mut session = Session::with_clock(preset, config.global.reducer, Arc::new(clock()));
    let mut rx = session.subscribe();

    for line in RESEARCH_RUN.lines() {
        session
            .dispatch_json(line)
            .unwrap_or_else(|e| panic!("line should decode: {e}"));
    }

    assert!(rx.has_changed().unwrap_or(false));
    let snapshot = rx.borrow_and_update().clone();

    assert_eq!(snapshot.stage, Stage::Completed);
    assert!(snapshot.is_completed);
    assert_eq!(snapshot.execution_mode, ExecutionMode::Parallel);
    assert_eq!(snapshot.topic.as_deref(), Some("RAG"));
    assert_eq!(snapshot.outline.len(), 2);
    assert_eq!(snapshot.final_summary.as_deref(), Some("Report ready"));
    assert_eq!(snapshot.counts.completed, 1);
    assert_eq!(snapshot.counts.extended, 1);
    assert_eq!(snapshot.counts.failed, 1);
    assert!(snapshot.active_task_ids.is_empty());
    assert_eq!(snapshot.metrics.cost_microdollars, 4_000);

    // Log view of 5 from the preset's config.toml.
    assert!(snapshot.logs.len() <= 5);
    assert!(snapshot
        .logs
        .iter()
        .any(|entry| entry.message.contains("citation_added")));

    let block_1 = &snapshot.tasks[0];
    assert_eq!(block_1.label, "Retrievers");
    assert_eq!(block_1.task.trace.len(), 1);
}

#[tokio::test]
async fn test_malformed_line_is_rejected_and_run_continues() {
    let mut session =
        session_with_test_clock(SessionConfig::new(Flavor::Research, ExecutionMode::Series));

    assert!(session.dispatch_json(r#"{"type":"task_progress"}"#).is_err());
    assert!(session.dispatch_json("][").is_err());
    session
        .dispatch_json(r#"{"type":"task_started","task_id":"a"}"#)
        .expect("valid record");

    let snapshot = session.snapshot();
    assert_eq!(snapshot.counts.running, 1);
    assert!(snapshot.logs.is_empty());
}

#[tokio::test]
async fn test_subscribers_see_every_published_snapshot() {
    let mut session = session_with_test_clock(SessionConfig::new(
        Flavor::QuestionGeneration,
        ExecutionMode::Parallel,
    ));
    let (tx, rx) = mpsc::channel::<EventEnvelope>(16);
    let mut watcher = session.subscribe();

    let reader = tokio::spawn(async move {
        let mut last_total = 0;
        while watcher.changed().await.is_ok() {
            let snapshot = watcher.borrow_and_update().clone();
            assert!(snapshot.counts.total >= last_total);
            last_total = snapshot.counts.total;
            if snapshot.is_completed {
                break;
            }
        }
        last_total
    });

    let producer = tokio::spawn(async move {
        let events = vec![
            planning(),
            task_started("focus_1"),
            task_started("focus_2"),
            task_completed("focus_1", "Q1"),
            task_completed("focus_2", "Q2"),
            pp_protocol::event_models::PipelineEvent::Completed { summary: None },
        ];
        for event in events {
            tx.send(event.into()).await.expect("session is consuming");
        }
    });

    let applied = session.consume(rx).await;
    producer.await.expect("producer task");
    let seen = reader.await.expect("reader task");

    assert_eq!(applied, 6);
    assert_eq!(seen, 2);
    assert!(session.snapshot().is_completed);
}

#[test]
fn test_reset_keeps_subscribers() {
    let mut session =
        session_with_test_clock(SessionConfig::new(Flavor::Research, ExecutionMode::Series));
    let rx = session.subscribe();

    session.dispatch(&task_started("a").into());
    session.reset(None);

    let snapshot = rx.borrow().clone();
    assert!(snapshot.is_idle);
    assert!(snapshot.tasks.is_empty());
    assert_eq!(snapshot.session_id, session.state().session_id);
}

#[test]
fn test_import_matches_live_results() {
    let mut live =
        session_with_test_clock(SessionConfig::new(Flavor::Research, ExecutionMode::Series));
    live.dispatch(&task_started("block_1").into());
    live.dispatch(&task_completed("block_1", "Findings").into());

    let imported_tasks: Vec<_> = live
        .state()
        .tasks
        .all()
        .map(|task| pp_protocol::snapshot_models::ImportedTask {
            id: task.id.clone(),
            title: task.title.clone(),
            status: task.status,
            result: task.result.clone(),
            error: task.error.clone(),
        })
        .collect();

    let mut rebuilt =
        session_with_test_clock(SessionConfig::new(Flavor::Research, ExecutionMode::Series));
    let snapshot = rebuilt.import(&imported_tasks);

    assert_eq!(snapshot.counts, live.snapshot().counts);
    assert_eq!(snapshot.tasks[0].label, "Findings");
    assert_eq!(snapshot.tasks[0].task.status, TaskStatus::Done);
}
