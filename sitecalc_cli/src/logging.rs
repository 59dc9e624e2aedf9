//! Logging setup for the CLI.
//!
//! The filter comes from `RUST_LOG` and defaults to `info`, e.g.
//! `RUST_LOG=sitecalc_core=debug` to trace the dispatcher.

use tracing_subscriber::{fmt, EnvFilter};

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
