//! CLI argument definitions using clap
//!
//! Commands:
//! - repository-driver serve --config <path> [--in-memory]
//! - repository-driver check-config --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Repository driver - provisions and promotes per-build artifact repositories
#[derive(Parser, Debug)]
#[command(name = "repository-driver")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./repository-driver.json")]
        config: PathBuf,

        /// Use an in-process repository manager instead of the configured one
        #[arg(long)]
        in_memory: bool,
    },

    /// Validate a configuration file and exit
    CheckConfig {
        /// Path to configuration file
        #[arg(long, default_value = "./repository-driver.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
