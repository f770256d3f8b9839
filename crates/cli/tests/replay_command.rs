//! End-to-end tests for the `pipeline-progress` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const EVENTS: &str = r#"{"type":"planning_started","topic":"Probability"}
{"type":"generating_started","target_count":2}
{"type":"task_started","task_id":"focus_1","title":"Bayes rule"}
{"type":"task_completed","task_id":"focus_1","result":{"summary":"Q1","extended":false}}
not json at all
{"type":"task_started","task_id":"focus_2"}
{"type":"completed"}
"#;

fn project_with_events(events: &str) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(dir.path().join("events.jsonl"), events).expect("Failed to write events");
    dir
}

fn bin() -> Command {
    let mut cmd = Command::cargo_bin("pipeline-progress").expect("binary should build");
    cmd.env("NO_COLOR", "1").env("RUST_LOG", "off");
    cmd
}

#[test]
fn test_replay_prints_json_snapshot() {
    let dir = project_with_events(EVENTS);

    let output = bin()
        .current_dir(dir.path())
        .args([
            "replay",
            "events.jsonl",
            "--flavor",
            "question-generation",
            "--mode",
            "parallel",
            "--json",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("line 5"))
        .get_output()
        .stdout
        .clone();

    let snapshot: serde_json::Value =
        serde_json::from_slice(&output).expect("stdout should be JSON");
    assert_eq!(snapshot["stage"], "completed");
    assert_eq!(snapshot["flavor"], "question-generation");
    assert_eq!(snapshot["counts"]["completed"], 1);
    assert_eq!(snapshot["counts"]["running"], 1);
    assert_eq!(snapshot["active_task_ids"][0], "focus_2");
}

#[test]
fn test_replay_uses_preset_from_root() {
    let dir = project_with_events(EVENTS);
    let sessions = dir.path().join(".pipeline-progress/sessions");
    fs::create_dir_all(&sessions).expect("Failed to create sessions dir");
    fs::write(
        sessions.join("exam.yaml"),
        "flavor: question-generation\nquestion-mode: custom\n",
    )
    .expect("Failed to write preset");

    bin()
        .args(["replay"])
        .arg(dir.path().join("events.jsonl"))
        .arg("--root")
        .arg(dir.path())
        .args(["--preset", "exam"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stage: completed"))
        .stdout(predicate::str::contains("Bayes rule"));
}

#[test]
fn test_replay_unknown_preset_fails() {
    let dir = project_with_events(EVENTS);

    bin()
        .current_dir(dir.path())
        .args(["replay", "events.jsonl", "--preset", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing"));
}

#[test]
fn test_check_reports_rejected_lines() {
    let dir = project_with_events(EVENTS);

    bin()
        .current_dir(dir.path())
        .args(["check", "events.jsonl"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("6 valid, 0 unknown, 1 rejected"));
}

#[test]
fn test_check_accepts_unknown_types() {
    let dir = project_with_events(
        "{\"type\":\"parsing_started\"}\n{\"type\":\"citation_added\"}\n",
    );

    bin()
        .current_dir(dir.path())
        .args(["check", "events.jsonl"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 valid, 1 unknown, 0 rejected"))
        .stderr(predicate::str::contains("citation_added"));
}
