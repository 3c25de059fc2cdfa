//! steprun - fixtures and given/when/then scenarios for Rust test suites
//!
//! Runs the bundled demonstration suites and the feature files found in the
//! configured features directory.

use clap::Parser;
use std::path::PathBuf;
use steprun::common::logging;
use steprun::engine::ExitStatus;
use steprun::{cli, commands};
use commands::Commands;

#[derive(Parser)]
#[command(name = "steprun", about = "Fixture and scenario test runner")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (default: ./steprun.toml, then the user config)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Run { verbose: true, .. });
    logging::init_cli(verbose);
    logging::quiet_panics();

    let status = match cli::dispatch(cli.command, cli.config.as_deref()) {
        Ok(status) => status,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitStatus::UsageError
        }
    };

    std::process::exit(status.code());
}
