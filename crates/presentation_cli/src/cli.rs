//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Weather Watch
#[derive(Debug, Parser)]
#[command(name = "weatherwatch")]
#[command(author, version, about = "Polls city weather and raises sustained-heat alerts", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ./config.toml if present)
    #[arg(short, long, global = true, env = "WEATHERWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the polling pipeline until interrupted
    ///
    /// Stops on Ctrl+C or SIGTERM. SIGHUP reloads alert thresholds and the
    /// city list from the configuration sources.
    Run,

    /// Fetch one city's current weather and print it as JSON
    ///
    /// Example: weatherwatch fetch Chennai
    Fetch {
        /// City name, e.g. "Delhi"
        city: String,
    },

    /// Print the effective configuration with secrets removed
    CheckConfig,
}
