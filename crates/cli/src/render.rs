//! Plain-terminal summary of a snapshot.

use colored::{ColoredString, Colorize};
use pp_protocol::snapshot_models::{PipelineSnapshot, TaskView};
use pp_protocol::state_models::{LogLevel, Stage, TaskStatus};
use std::fmt::Write;

fn stage_label(stage: Stage) -> ColoredString {
    match stage {
        Stage::Completed => stage.as_str().green().bold(),
        Stage::Failed => stage.as_str().red().bold(),
        Stage::Idle => stage.as_str().dimmed(),
        _ => stage.as_str().cyan().bold(),
    }
}

fn status_label(task: &TaskView) -> ColoredString {
    match task.task.status {
        TaskStatus::Pending => "pending".dimmed(),
        TaskStatus::Running { substatus: Some(sub) } => format!("running:{sub}").yellow(),
        TaskStatus::Running { substatus: None } => "running".yellow(),
        TaskStatus::Done => "done".green(),
        TaskStatus::Failed => "failed".red(),
    }
}

fn level_label(level: LogLevel) -> ColoredString {
    match level {
        LogLevel::Info => "info".normal(),
        LogLevel::Success => "ok".green(),
        LogLevel::Warning => "warn".yellow(),
        LogLevel::Error => "error".red(),
    }
}

/// Multi-line summary: stage, counts, tasks, metrics, recent logs.
pub fn summary(snapshot: &PipelineSnapshot) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} {} ({}, {})",
        "Stage:".bold(),
        stage_label(snapshot.stage),
        snapshot.flavor,
        snapshot.execution_mode
    );
    if let Some(topic) = &snapshot.topic {
        let _ = writeln!(out, "{} {topic}", "Topic:".bold());
    }
    if let Some(error) = &snapshot.failure {
        let _ = writeln!(out, "{} {}", "Failure:".bold(), error.red());
    }
    if let Some(summary) = &snapshot.final_summary {
        let _ = writeln!(out, "{} {summary}", "Summary:".bold());
    }

    let c = snapshot.counts;
    let _ = writeln!(
        out,
        "{} {} total, {} running, {} done, {} failed, {} pending",
        "Tasks:".bold(),
        c.total,
        c.running,
        c.completed,
        c.failed,
        c.pending
    );
    for view in &snapshot.tasks {
        let marker = if view.is_active { "*" } else { " " };
        let mut line = format!("  {marker} {:<28} {}", view.label, status_label(view));
        if let Some(progress) = view.task.progress {
            let _ = write!(line, " [{}/{}]", progress.round, progress.max_rounds);
        }
        if let Some(ms) = view.duration_ms {
            let _ = write!(line, " {:.1}s", ms as f64 / 1000.0);
        }
        if let Some(error) = &view.task.error {
            let _ = write!(line, " {}", error.red());
        }
        let _ = writeln!(out, "{line}");
    }

    let m = &snapshot.metrics;
    let _ = writeln!(
        out,
        "{} {} calls, {} tokens ({} in / {} out), ${:.4}",
        "Usage:".bold(),
        m.calls,
        m.total_tokens(),
        m.input_tokens,
        m.output_tokens,
        m.cost_usd()
    );
    for (model, usage) in &m.by_model {
        let _ = writeln!(
            out,
            "    {model}: {} calls, {} tokens",
            usage.calls,
            usage.input_tokens + usage.output_tokens
        );
    }

    if !snapshot.logs.is_empty() {
        let _ = writeln!(out, "{}", "Recent logs:".bold());
        if snapshot.evicted_logs > 0 {
            let _ = writeln!(out, "    ({} older entries dropped)", snapshot.evicted_logs);
        }
        for entry in &snapshot.logs {
            let _ = writeln!(
                out,
                "  {} {} {}",
                entry.timestamp.format("%H:%M:%S"),
                level_label(entry.level),
                entry.message
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pp_core::config::models::ReducerSettings;
    use pp_core::state::Session;
    use pp_protocol::session_models::{ExecutionMode, Flavor, SessionConfig};

    #[test]
    fn test_summary_lists_tasks_and_usage() {
        colored::control::set_override(false);

        let mut session = Session::new(
            SessionConfig::new(Flavor::Research, ExecutionMode::Parallel),
            ReducerSettings::default(),
        );
        for line in [
            r#"{"type":"planning_started","topic":"Vector databases"}"#,
            r#"{"type":"task_started","task_id":"block_1","title":"Indexes"}"#,
            r#"{"type":"task_progress","task_id":"block_1","round":2,"max_rounds":4}"#,
            r#"{"type":"task_failed","task_id":"block_2","error":"timeout"}"#,
            r#"{"type":"metrics_updated","delta":{"model":"gpt-4o","calls":1,"input_tokens":10,"output_tokens":5,"cost_usd":0.5}}"#,
        ] {
            session.dispatch_json(line).unwrap();
        }

        let text = summary(&session.snapshot());

        assert!(text.contains("Stage: planning (research, parallel)"));
        assert!(text.contains("Topic: Vector databases"));
        assert!(text.contains("2 total, 1 running, 0 done, 1 failed, 0 pending"));
        assert!(text.contains("* Indexes"));
        assert!(text.contains("[2/4]"));
        assert!(text.contains("timeout"));
        assert!(text.contains("1 calls, 15 tokens (10 in / 5 out), $0.5000"));
        assert!(text.contains("gpt-4o: 1 calls, 15 tokens"));
    }
}
