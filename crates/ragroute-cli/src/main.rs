//! Ragroute CLI
//!
//! Ask questions across topical document collections.

use anyhow::Result;
use clap::Parser;
use ragroute_core::error::exit_codes;
use ragroute_core::{Config, RagRouteError};

mod app;
mod commands;
mod output;

use app::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<RagRouteError>()
            .map(RagRouteError::exit_code)
            .unwrap_or(exit_codes::GENERAL_ERROR);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Ask(args) => commands::ask::run(args, &config, cli.format).await,
        Commands::Route(args) => commands::route::run(args, &config, cli.format).await,
        Commands::Ingest(args) => commands::ingest::run(args, &config, cli.format).await,
        Commands::Collections => commands::collections::run(cli.format).await,
        Commands::Config => commands::config::run(&config, cli.format).await,
    }
}
