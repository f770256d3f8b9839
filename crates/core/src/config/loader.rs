//! Configuration file loader for `.pipeline-progress/` directory structure.
//!
//! This module provides functionality to load and parse all configuration files
//! from the `.pipeline-progress/` directory, including:
//! - `config.toml`: Reducer settings
//! - `sessions/*.yaml`: Session bootstrap presets

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::{AppConfig, GlobalConfig};
use pp_protocol::session_models::SessionConfig;
use std::path::Path;
use walkdir::WalkDir;

/// Name of the configuration directory under the project root.
pub const CONFIG_DIR: &str = ".pipeline-progress";

/// Loads all configuration from the `.pipeline-progress/` directory.
///
/// # Arguments
///
/// * `root` - Root directory containing the `.pipeline-progress/` folder
///
/// # Returns
///
/// An `AppConfig` containing all loaded configuration. If directories or files
/// are missing (but the root exists), returns an empty/default configuration
/// rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - Files exist but cannot be read
/// - Files have invalid syntax (TOML or YAML)
/// - Reducer settings are out of range
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let pp_dir = root.join(CONFIG_DIR);

    if !pp_dir.exists() {
        tracing::debug!(path = %pp_dir.display(), "no config directory, using defaults");
        return Ok(AppConfig::default());
    }

    let global = load_global_config(&pp_dir)?;
    let sessions = load_sessions(&pp_dir)?;

    tracing::info!(
        path = %pp_dir.display(),
        sessions = sessions.len(),
        "loaded configuration"
    );

    Ok(AppConfig { global, sessions })
}

/// Loads reducer settings from `config.toml`.
fn load_global_config(pp_dir: &Path) -> ConfigResult<GlobalConfig> {
    let config_path = pp_dir.join("config.toml");

    if !config_path.exists() {
        return Ok(GlobalConfig::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    let config: GlobalConfig =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path.clone(),
            source,
        })?;

    let settings = config.reducer;
    if settings.log_capacity == 0 {
        return Err(ConfigError::InvalidConfig {
            path: config_path,
            reason: "log-capacity must be at least 1".to_string(),
        });
    }
    if settings.log_view > settings.log_capacity {
        return Err(ConfigError::InvalidConfig {
            path: config_path,
            reason: format!(
                "log-view ({}) cannot exceed log-capacity ({})",
                settings.log_view, settings.log_capacity
            ),
        });
    }

    Ok(config)
}

/// Loads all session presets from `sessions/*.yaml`.
fn load_sessions(pp_dir: &Path) -> ConfigResult<Vec<SessionConfig>> {
    let sessions_dir = pp_dir.join("sessions");

    if !sessions_dir.exists() {
        return Ok(Vec::new());
    }

    let mut sessions = Vec::new();

    for entry in WalkDir::new(&sessions_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ConfigError::DirectoryWalk {
            path: sessions_dir.clone(),
            source,
        })?;

        let path = entry.path();

        let ext = path.extension().and_then(|s| s.to_str());
        if ext != Some("yaml") && ext != Some("yml") {
            continue;
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let mut session: SessionConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlParse {
                path: path.to_path_buf(),
                source,
            })?;

        // Presets without a name are addressed by their file stem.
        if session.name.is_none() {
            session.name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string);
        }

        sessions.push(session);
    }

    Ok(sessions)
}
