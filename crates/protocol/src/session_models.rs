//! Session bootstrap models.
//!
//! A session is one run of a backend pipeline from `idle` to a terminal
//! stage. These types describe the statically known parameters consumed
//! once when the session starts.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The pipeline variant producing events.
///
/// The flavor decides which stages exist, their order, and which running
/// substatuses a task may report.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "kebab-case")]
pub enum Flavor {
    /// Series/parallel research over a set of sub-topic blocks.
    Research,

    /// Custom or mimic question generation over a set of focuses.
    QuestionGeneration,
}

impl std::fmt::Display for Flavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Flavor::Research => f.write_str("research"),
            Flavor::QuestionGeneration => f.write_str("question-generation"),
        }
    }
}

/// How the backend schedules tasks within a session.
///
/// Fixed for the life of a session.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One task at a time.
    #[default]
    Series,

    /// Several tasks may be running at once.
    Parallel,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Series => f.write_str("series"),
            ExecutionMode::Parallel => f.write_str("parallel"),
        }
    }
}

/// Sub-mode of the question generation flavor.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
pub enum QuestionMode {
    /// Questions generated from a knowledge point the user entered.
    Custom,

    /// Questions generated to mimic an uploaded exam paper.
    Mimic,
}

/// Bootstrap configuration for a new session.
///
/// Can be written by hand as a preset in
/// `.pipeline-progress/sessions/*.yaml`:
///
/// ```yaml
/// name: deep-research
/// flavor: research
/// execution-mode: parallel
/// topic: "Attention mechanisms"
/// target-task-count: 5
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct SessionConfig {
    /// Preset name, used to select a session from the config directory.
    #[serde(default)]
    pub name: Option<String>,

    /// Pipeline flavor for this session.
    pub flavor: Flavor,

    /// Scheduling mode. Defaults to series.
    #[serde(default)]
    pub execution_mode: ExecutionMode,

    /// Topic or knowledge point the run is about, if known up front.
    #[serde(default)]
    pub topic: Option<String>,

    /// Number of tasks the run is expected to produce, if known up front.
    #[serde(default)]
    pub target_task_count: Option<u32>,

    /// Question generation sub-mode. Ignored for research sessions.
    #[serde(default)]
    pub question_mode: Option<QuestionMode>,
}

impl SessionConfig {
    /// Minimal bootstrap for the given flavor and mode.
    pub fn new(flavor: Flavor, execution_mode: ExecutionMode) -> Self {
        Self {
            name: None,
            flavor,
            execution_mode,
            topic: None,
            target_task_count: None,
            question_mode: None,
        }
    }
}
