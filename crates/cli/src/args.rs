use clap::{Args, Parser, Subcommand, ValueEnum};
use pp_protocol::session_models::{ExecutionMode, Flavor};
use std::path::PathBuf;

/// Replay and inspect pipeline progress event streams.
#[derive(Parser, Debug)]
#[command(name = "pipeline-progress", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fold a JSON-lines event file into a session and print the result.
    Replay(ReplayArgs),

    /// Validate every line of a JSON-lines event file.
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Event file, one JSON record per line.
    pub events: PathBuf,

    /// Project root holding the `.pipeline-progress/` directory.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Session preset from `.pipeline-progress/sessions/`.
    #[arg(long)]
    pub preset: Option<String>,

    #[arg(long, value_enum)]
    pub flavor: Option<FlavorArg>,

    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    #[arg(long)]
    pub topic: Option<String>,

    /// Print the final snapshot as JSON instead of a summary.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Event file, one JSON record per line.
    pub events: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlavorArg {
    Research,
    QuestionGeneration,
}

impl From<FlavorArg> for Flavor {
    fn from(arg: FlavorArg) -> Self {
        match arg {
            FlavorArg::Research => Flavor::Research,
            FlavorArg::QuestionGeneration => Flavor::QuestionGeneration,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Series,
    Parallel,
}

impl From<ModeArg> for ExecutionMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Series => ExecutionMode::Series,
            ModeArg::Parallel => ExecutionMode::Parallel,
        }
    }
}
