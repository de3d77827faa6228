//! Log subscriber setup for the command-line driver.
//!
//! Events go to stderr so exported data on stdout stays clean. `RUST_LOG`
//! wins over the `-v` count when set.

use tracing_subscriber::EnvFilter;

use crate::error::{CliError, Result};

/// Default filter for a given `-v` count.
#[must_use]
pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

pub fn init(verbose: u8, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|error| CliError::invalid(format!("cannot install log subscriber: {error}")))
}
