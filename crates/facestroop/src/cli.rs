use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::inspect::{
    CatalogArgs, CheckConfigArgs, DefaultConfigArgs, run_catalog, run_check_config,
    run_default_config,
};
use crate::logging;
use crate::simulate::{SimulateArgs, run_simulate};

#[derive(Debug, Parser)]
#[command(
    name = "facestroop",
    about = "Generate, simulate and export face-rating Stroop sessions",
    version
)]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit log events as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a full session with a simulated participant and export the trials.
    Simulate(SimulateArgs),

    /// List the stimulus catalog with correct keys.
    Catalog(CatalogArgs),

    /// Validate an experiment config file.
    #[command(name = "check-config")]
    CheckConfig(CheckConfigArgs),

    /// Print the built-in experiment config as TOML.
    #[command(name = "default-config")]
    DefaultConfig(DefaultConfigArgs),
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_json)?;
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Simulate(args) => run_simulate(args),
        Commands::Catalog(args) => run_catalog(args),
        Commands::CheckConfig(args) => run_check_config(args),
        Commands::DefaultConfig(args) => run_default_config(args),
    }
}
