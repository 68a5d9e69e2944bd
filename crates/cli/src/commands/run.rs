//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::FanoutConfig;
use tracing::{error, info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig, RunReport};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut config, args);
    // Overrides can break what the file validated
    config_loader::ConfigLoader::validate(&config).context("Invalid command-line override")?;

    info!(
        source = %config.source.path,
        queue_capacity = config.queue.capacity,
        workers = config.dispatch.effective_workers(),
        sinks = config.sinks.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        config,
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
    });

    let shutdown_signal = setup_shutdown_signal();

    info!("Starting pipeline...");

    tokio::select! {
        result = pipeline.run() => {
            let report = result.context("Pipeline execution failed")?;
            print_report(&report, args.json)?;
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping pipeline...");
        }
    }

    info!("Fanout finished");
    Ok(())
}

fn apply_overrides(config: &mut FanoutConfig, args: &RunArgs) {
    if let Some(ref source) = args.source {
        info!(source = %source.display(), "Overriding source path from CLI");
        config.source.path = source.display().to_string();
    }
    if let Some(capacity) = args.queue_capacity {
        info!(capacity, "Overriding queue capacity from CLI");
        config.queue.capacity = capacity;
    }
    if let Some(workers) = args.workers {
        info!(workers, "Overriding worker count from CLI");
        config.dispatch.workers = workers;
    }
    if let Some(drain_timeout_ms) = args.drain_timeout_ms {
        info!(drain_timeout_ms, "Overriding drain timeout from CLI");
        config.dispatch.drain_timeout_ms = drain_timeout_ms;
    }
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        let json = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
        println!("{}", json);
    } else {
        println!("\n{}\n", report);
    }
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
///
/// A handler that cannot be installed never fires.
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &FanoutConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Source: {}", config.source.path);
    println!("Queue capacity: {}", config.queue.capacity);
    println!(
        "Workers: {} (drain timeout {} ms)",
        config.dispatch.effective_workers(),
        config.dispatch.drain_timeout_ms
    );
    println!("\nSinks ({}):", config.sinks.len());
    for (name, settings) in &config.sinks {
        println!("  - {} ({} attempts/s)", name, settings.rate_limit);
    }
    println!();
}
