//! # pp-core
//!
//! Progress state reducer for pipeline-progress.
//!
//! This crate provides:
//! - Configuration loading from the `.pipeline-progress/` directory
//! - Per-flavor stage tables and the stage machine built on them
//! - The event reducer and the transport boundary decoder in front of it
//! - Read-model projection into immutable snapshots
//! - A session wrapper that owns state and publishes snapshots
//!
//! ## Modules
//!
//! - [`clock`]: Time sources for stamping events
//! - [`config`]: Configuration loading and management
//! - [`engine`]: Event application, stage machine, decoding and import
//! - [`projection`]: Read-model derivation
//! - [`state`]: Canonical session state and its owner

pub mod clock;
pub mod config;
pub mod engine;
pub mod projection;
pub mod state;
