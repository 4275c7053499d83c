//! br - balloonring coordination server
//!
//! CLI entry point for running the server and inspecting its configuration.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info};

use balloonring::cli::{Cli, Command, get_log_path};
use balloonring::config::Config;
use balloonring::net::Acceptor;
use balloonring::server::CoordinationServer;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_thread_names(true)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command.unwrap_or_default() {
        Command::Serve { bind } => cmd_serve(config, bind),
        Command::Config => cmd_config(&config),
    }
}

fn cmd_serve(config: Config, bind: Option<String>) -> Result<()> {
    let bind = bind.unwrap_or_else(|| config.listen.bind.clone());
    debug!(%bind, "cmd_serve: called");

    let server = CoordinationServer::with_config(config.server).context("Failed to create coordination server")?;
    let handle = server.handle();

    // Bind before starting anything so a busy port fails fast
    let acceptor = Acceptor::bind(&bind)?;
    let local = acceptor.local_addr()?;

    let dispatch = server.spawn()?;
    acceptor.spawn(handle)?;

    println!("balloonring listening on {}", local);
    println!("Logs: {}", get_log_path().display());
    info!(%local, "balloonring serving");

    dispatch
        .join()
        .map_err(|_| eyre::eyre!("Dispatch thread panicked"))?;
    info!("balloonring stopped");
    Ok(())
}

fn cmd_config(config: &Config) -> Result<()> {
    debug!("cmd_config: called");
    let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
    print!("{}", yaml);
    Ok(())
}
