//! `fanout` binary: parses arguments, sets up tracing and runs one command.

mod cli;
mod commands;
mod pipeline;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use cli::{Cli, Commands, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    // FANOUT_* variables may come from .env
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "fanout starting");
    let result = match &cli.command {
        Commands::Run(args) => commands::run_pipeline(args).await,
        Commands::Validate(args) => commands::run_validate(args),
        Commands::Info(args) => commands::run_info(args),
    };
    if let Err(ref e) = result {
        tracing::error!(error = %e, "fanout failed");
    }
    result
}

fn init_logging(cli: &Cli) -> Result<()> {
    // --quiet wins over RUST_LOG
    let filter = match cli.quiet {
        true => EnvFilter::new(cli.log_level()),
        false => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
    };

    // stderr only, so `run --json` output on stdout stays parseable
    let layer = fmt::layer().with_writer(std::io::stderr);
    let layer = match cli.log_format {
        LogFormat::Json => layer.json().with_current_span(true).boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .context("tracing subscriber already installed")
}
