//! Diagnostic logging for the binary.
//!
//! Human-readable output on stderr, filtered by `RUST_LOG` (default:
//! `info`). Stdout is reserved for command output so `--json` stays
//! machine-readable.

use tracing_subscriber::EnvFilter;

pub fn init_cli() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
