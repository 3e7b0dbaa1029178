//! Tracing initialization.
//!
//! Logs go to stderr so stdout stays reserved for command output. `RUST_LOG`
//! overrides the `-v` count when set.

use crate::process::Verbosity;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Filter directive for a `-v` count.
pub fn level_for(verbosity: Verbosity) -> &'static str {
    match verbosity {
        0 => "nbenv=warn",
        1 => "nbenv=info",
        2 => "nbenv=debug",
        _ => "nbenv=trace",
    }
}

/// Initialize tracing. Call once at process startup.
pub fn init_tracing(verbosity: Verbosity) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .try_init();
}
