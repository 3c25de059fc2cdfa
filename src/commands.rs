//! CLI command definitions
//!
//! Defines the clap commands for the steprun CLI.

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Collect and run every test and scenario
    Run {
        #[command(flatten)]
        select: SelectArgs,

        /// Stop after the first failing item
        #[arg(long, short = 'x')]
        exit_first: bool,

        /// Print the report as JSON instead of terminal output
        #[arg(long)]
        json: bool,

        /// Show every outcome detail and item durations
        #[arg(long, short)]
        verbose: bool,
    },

    /// List the node ids a run would execute
    Collect {
        #[command(flatten)]
        select: SelectArgs,

        /// Print the node ids as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// List registered step definitions
    Steps,
}

/// Where items come from and which of them to keep
#[derive(Args, Debug, Clone, Default)]
pub struct SelectArgs {
    /// Directory with *.feature files (overrides the config file)
    #[arg(long)]
    pub features: Option<PathBuf>,

    /// Only items whose node id contains EXPR ("not EXPR" inverts)
    #[arg(short = 'k', value_name = "EXPR")]
    pub keyword: Option<String>,

    /// Only items carrying MARK ("not MARK" inverts); repeatable
    #[arg(short = 'm', value_name = "MARK")]
    pub marks: Vec<String>,
}
