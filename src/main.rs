use clap::Parser;
use eyre::{Context, Result};
use log::{info, warn};

mod cli;
mod commands;
mod config;
mod emitter;
mod generator;
mod interval;
mod verify;

use cli::{Cli, Commands};
use config::{Config, LogLevel};

fn setup_logging(log_level: LogLevel, verbose: bool, quiet: bool) -> Result<()> {
    // stdout carries the generated records, so diagnostics go to stderr
    let mut builder = env_logger::Builder::new();

    // RUST_LOG env var takes precedence, otherwise use flags and config log_level
    let from_env = std::env::var("RUST_LOG").is_ok();
    if from_env {
        builder.parse_default_env();
    } else if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    } else if quiet {
        builder.filter_level(log::LevelFilter::Error);
    } else {
        builder.filter_level(log_level.to_level_filter());
    }

    builder
        .target(env_logger::Target::Stderr)
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to initialize logger: {}", e))?;

    info!(
        "Log level: {} (from {})",
        log_level.as_filter(),
        if from_env { "RUST_LOG env" } else { "config" }
    );
    Ok(())
}

fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        None => commands::run::run(&Default::default(), &config),
        Some(Commands::Run(args)) => commands::run::run(&args, &config),
        Some(Commands::Verify { input, format }) => {
            commands::verify::run(input.as_deref(), cli::OutputFormat::resolve(format))
        }
        Some(Commands::Config { action }) => commands::config::run(action, &config),
        Some(Commands::Completions { shell }) => commands::completions::run(shell),
    }
}

fn main() -> Result<()> {
    // Parse CLI arguments first
    let cli = Cli::parse();

    // Config decides the log level, so it loads before the logger exists;
    // its warnings are collected and replayed once logging is up
    let (config, load_warnings) = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging with log level from config (or RUST_LOG env var)
    setup_logging(config.log_level, cli.verbose, cli.quiet).context("Failed to setup logging")?;
    for warning in &load_warnings {
        warn!("{}", warning);
    }

    info!("Starting synthlog with config from: {:?}", cli.config);

    run(cli, config).context("Command failed")?;

    Ok(())
}
