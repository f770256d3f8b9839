//! Configuration loading and management.
//!
//! This module loads reducer settings and session presets from the
//! `.pipeline-progress/` directory.

pub mod error;
pub mod loader;
pub mod models;
