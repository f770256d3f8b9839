//! Subcommand handlers.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use pp_core::config::loader::load_config;
use pp_core::config::models::AppConfig;
use pp_core::engine::boundary::decode_event;
use pp_core::state::Session;
use pp_protocol::event_models::PipelineEvent;
use pp_protocol::session_models::{Flavor, SessionConfig};
use std::path::Path;

use crate::args::{CheckArgs, ReplayArgs};
use crate::render;

/// Non-empty lines of an event file with their 1-based line numbers.
async fn read_lines(path: &Path) -> Result<Vec<(usize, String)>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read event file {}", path.display()))?;

    Ok(content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| (i + 1, line.to_string()))
        .collect())
}

fn report_rejected(line_no: usize, reason: &dyn std::fmt::Display) {
    eprintln!("{} line {line_no}: {reason}", "rejected".red().bold());
}

/// Resolve the session bootstrap from the preset and command-line overrides.
fn session_config(args: &ReplayArgs, presets: &AppConfig) -> Result<SessionConfig> {
    let mut config = match &args.preset {
        Some(name) => presets
            .session(name)
            .cloned()
            .with_context(|| format!("no session preset named '{name}'"))?,
        None => SessionConfig::new(Flavor::Research, Default::default()),
    };

    if let Some(flavor) = args.flavor {
        config.flavor = flavor.into();
    }
    if let Some(mode) = args.mode {
        config.execution_mode = mode.into();
    }
    if let Some(topic) = &args.topic {
        config.topic = Some(topic.clone());
    }

    Ok(config)
}

pub async fn replay(args: ReplayArgs) -> Result<()> {
    let app_config = load_config(&args.root)
        .await
        .with_context(|| format!("failed to load configuration under {}", args.root.display()))?;
    let config = session_config(&args, &app_config)?;
    let mut session = Session::new(config, app_config.global.reducer);

    let lines = read_lines(&args.events).await?;
    let mut rejected = 0usize;
    for (line_no, line) in &lines {
        if let Err(e) = session.dispatch_json(line) {
            report_rejected(*line_no, &e);
            rejected += 1;
        }
    }

    tracing::info!(
        events = lines.len() - rejected,
        rejected,
        "replay finished"
    );

    let snapshot = session.snapshot();
    if args.json {
        let json = serde_json::to_string_pretty(snapshot.as_ref())
            .context("failed to serialize snapshot")?;
        println!("{json}");
    } else {
        print!("{}", render::summary(&snapshot));
    }

    Ok(())
}

pub async fn check(args: CheckArgs) -> Result<()> {
    let lines = read_lines(&args.events).await?;

    let mut rejected = 0usize;
    let mut unknown = 0usize;
    for (line_no, line) in &lines {
        match decode_event(line) {
            Ok(envelope) => {
                if let PipelineEvent::Unknown { event_type } = &envelope.event {
                    eprintln!(
                        "{} line {line_no}: unknown event type '{event_type}'",
                        "warning".yellow().bold()
                    );
                    unknown += 1;
                }
            }
            Err(e) => {
                report_rejected(*line_no, &e);
                rejected += 1;
            }
        }
    }

    let valid = lines.len() - rejected;
    println!(
        "{} valid, {} unknown, {} rejected",
        valid.to_string().green(),
        unknown.to_string().yellow(),
        rejected.to_string().red()
    );

    if rejected > 0 {
        bail!("{rejected} of {} lines could not be decoded", lines.len());
    }
    Ok(())
}
