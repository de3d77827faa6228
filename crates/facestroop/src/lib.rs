#![forbid(unsafe_code)]

//! Command-line driver for face-rating Stroop sessions.
//!
//! Wraps `facestroop-core` with config loading, log setup and a simulated
//! participant, so a session can be generated and exported without a
//! presentation window.

pub mod cli;
pub mod error;
pub mod inspect;
pub mod logging;
pub mod simulate;
pub mod util;

pub use cli::{Cli, Commands, run, run_from_env};
pub use error::{CliError, Result};
