// ABOUTME: CLI entry point for the managed database console
// ABOUTME: Sets up logging and configuration, then dispatches the chosen command

use anyhow::Result;
use atonix_dbctl::cli::Cli;
use atonix_dbctl::commands;
use atonix_dbctl::config::ConsoleConfig;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();

    let config = ConsoleConfig::load(cli.config.as_deref())?
        .with_overrides(cli.api_url.clone(), cli.token.clone());
    tracing::debug!(api = %config.api_base_url, "Configuration loaded");

    commands::run(cli, config).await
}
