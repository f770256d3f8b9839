//! Common test utilities shared by the integration tests.
//!
//! This module provides:
//! - Event and session fixtures
//! - Invariant assertions over reducer state

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
