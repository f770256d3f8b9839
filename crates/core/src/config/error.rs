//! Errors raised while reading `.pipeline-progress/`.
//!
//! Covers the `config.toml` reducer settings and the `sessions/*.yaml`
//! presets. Every variant names the offending path.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// `config.toml` or a preset exists but could not be read.
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Malformed reducer settings in `config.toml`.
    #[error("Invalid reducer settings in {path}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Malformed session preset.
    #[error("Invalid session preset {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to list session presets under {path}: {source}")]
    DirectoryWalk {
        path: PathBuf,
        source: walkdir::Error,
    },

    /// Settings parsed but break a limit, such as a log view larger than
    /// the log capacity.
    #[error("Invalid configuration in {path}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
