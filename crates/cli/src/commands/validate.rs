//! `validate` command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use contracts::FanoutConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    source: String,
    queue_capacity: usize,
    workers: usize,
    drain_timeout_ms: u64,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(&args.config);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(path: &Path) -> ValidationResult {
    let config_path = path.display().to_string();

    if !path.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", path.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(path) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    source: config.source.path.clone(),
                    queue_capacity: config.queue.capacity,
                    workers: config.dispatch.effective_workers(),
                    drain_timeout_ms: config.dispatch.drain_timeout_ms,
                    sink_count: config.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &FanoutConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !Path::new(&config.source.path).exists() {
        warnings.push(format!(
            "source.path '{}' does not exist - run will ingest nothing",
            config.source.path
        ));
    }

    if config.dispatch.drain_timeout_ms == 0 {
        warnings.push(
            "dispatch.drain_timeout_ms is 0 - in-flight deliveries will be abandoned".to_string(),
        );
    }

    for (name, settings) in &config.sinks {
        if let Some(burst) = settings.burst {
            if burst > settings.rate_limit {
                warnings.push(format!(
                    "sinks.{}: burst {} exceeds rate_limit {} - first second may exceed the rate",
                    name, burst, settings.rate_limit
                ));
            }
        }
        if settings.failure_rate == Some(1.0) {
            warnings.push(format!(
                "sinks.{}: failure_rate is 1.0 - every record will be dead-lettered",
                name
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Source: {}", summary.source);
            println!("  Queue capacity: {}", summary.queue_capacity);
            println!("  Workers: {}", summary.workers);
            println!("  Drain timeout: {} ms", summary.drain_timeout_ms);
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
