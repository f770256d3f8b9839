//! Configuration models that aggregate all settings.
//!
//! This module provides the unified `AppConfig` structure that combines
//! reducer settings and session presets into a single configuration object.

use pp_protocol::session_models::SessionConfig;
use serde::{Deserialize, Serialize};

/// Default number of log entries a session retains.
pub const DEFAULT_LOG_CAPACITY: usize = 500;

/// Default number of log entries exposed in a snapshot.
pub const DEFAULT_LOG_VIEW: usize = 50;

/// Tunables for the reducer and its projection.
///
/// ```toml
/// # .pipeline-progress/config.toml
/// [reducer]
/// log-capacity = 500
/// log-view = 50
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct ReducerSettings {
    /// Entries kept in the log ring before the oldest is evicted.
    pub log_capacity: usize,

    /// Entries exposed to the default view.
    pub log_view: usize,
}

impl Default for ReducerSettings {
    fn default() -> Self {
        Self {
            log_capacity: DEFAULT_LOG_CAPACITY,
            log_view: DEFAULT_LOG_VIEW,
        }
    }
}

/// Contents of `config.toml`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalConfig {
    #[serde(default)]
    pub reducer: ReducerSettings,
}

/// Unified application configuration loaded from `.pipeline-progress/`.
///
/// This structure aggregates all configuration sources:
/// - `config.toml`: Reducer settings
/// - `sessions/*.yaml`: Session bootstrap presets
///
/// # Example
///
/// ```rust,no_run
/// use pp_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Loaded {} session presets", config.sessions.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Global settings from `config.toml`.
    pub global: GlobalConfig,

    /// All session presets loaded from `sessions/*.yaml`.
    pub sessions: Vec<SessionConfig>,
}

impl AppConfig {
    /// Find a session preset by name.
    pub fn session(&self, name: &str) -> Option<&SessionConfig> {
        self.sessions
            .iter()
            .find(|s| s.name.as_deref() == Some(name))
    }
}
