//! # pp-protocol
//!
//! Shared data models for pipeline-progress.
//!
//! This crate defines every structure that crosses a boundary of the
//! progress reducer:
//! - Events emitted by a research or question generation pipeline
//! - Per-task and pipeline-wide state
//! - Session bootstrap configuration
//! - The read-model snapshot handed to rendering collaborators
//!
//! ## Modules
//!
//! - [`event_models`]: Inbound events and their payloads
//! - [`state_models`]: Stages, task status and per-task state
//! - [`session_models`]: Pipeline flavor, execution mode and session bootstrap
//! - [`snapshot_models`]: Outbound read-model snapshot
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde, serde_json, ts-rs, chrono and uuid
//! - TypeScript generation: Wire types derive `TS` for client compatibility
//! - Independent compilation: No dependencies on other pipeline-progress crates

pub mod event_models;
pub mod session_models;
pub mod snapshot_models;
pub mod state_models;

// Re-export all public types for convenience
pub use event_models::*;
pub use session_models::*;
pub use snapshot_models::*;
pub use state_models::*;
