//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// balloonring - coordination server for a ring of balloon screens
#[derive(Debug, Parser)]
#[command(
    name = "br",
    about = "Coordinates balloons drifting across a ring of connected screens",
    version,
    after_help = "Logs are written to <data-local-dir>/balloonring/logs/balloonring.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run the coordination server in the foreground (default)
    Serve {
        /// Address to listen on, overriding the config file
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Print the effective configuration as YAML
    Config,
}

impl Default for Command {
    fn default() -> Self {
        Self::Serve { bind: None }
    }
}

/// Where the binary writes its log file
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("balloonring")
        .join("logs")
        .join("balloonring.log");
    debug!(?path, "get_log_path: returning path");
    path
}
