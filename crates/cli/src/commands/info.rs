//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{DeliverySink, FanoutConfig};
use dispatcher::Sink;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    source: String,
    queue_capacity: usize,
    workers: usize,
    drain_timeout_ms: u64,
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    encoding: String,
    rate_limit: u32,
    burst: u32,
    latency_ms: u64,
    failure_rate: f64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&config)?;
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

/// Resolve each sink the way the dispatcher will build it
fn build_config_info(config: &FanoutConfig) -> Result<ConfigInfo> {
    let sinks = config
        .sinks
        .iter()
        .map(|(name, settings)| {
            let sink = Sink::from_settings(name, settings)
                .with_context(|| format!("Failed to build sink '{}'", name))?;
            let link = sink.link();
            Ok(SinkInfo {
                name: name.clone(),
                encoding: sink.encoding().to_string(),
                rate_limit: sink.rate_limit(),
                burst: settings.burst.unwrap_or(1),
                latency_ms: link.latency.as_millis() as u64,
                failure_rate: link.failure_rate,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ConfigInfo {
        source: config.source.path.clone(),
        queue_capacity: config.queue.capacity,
        workers: config.dispatch.effective_workers(),
        drain_timeout_ms: config.dispatch.drain_timeout_ms,
        sinks,
    })
}

fn print_config_info(info: &ConfigInfo) {
    println!("=== Fanout Configuration ===\n");

    println!("Pipeline");
    println!("   ├─ Source: {}", info.source);
    println!("   ├─ Queue capacity: {}", info.queue_capacity);
    println!("   ├─ Workers: {}", info.workers);
    println!("   └─ Drain timeout: {} ms", info.drain_timeout_ms);

    println!("\nSinks ({})", info.sinks.len());
    for (i, sink) in info.sinks.iter().enumerate() {
        let is_last = i == info.sinks.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        println!(
            "   {} {} [{}] {}/s (burst {}), {} ms, {:.0}% failures",
            prefix,
            sink.name,
            sink.encoding,
            sink.rate_limit,
            sink.burst,
            sink.latency_ms,
            sink.failure_rate * 100.0
        );
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};

    #[test]
    fn test_info_applies_defaults_and_overrides() {
        let config = ConfigLoader::load_from_str(
            r#"
            [source]
            path = "in.txt"

            [sinks.rest]
            rate_limit = 20

            [sinks.mq]
            rate_limit = 5
            latency_ms = 1
            failure_rate = 0.5
            "#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let info = build_config_info(&config).unwrap();
        assert_eq!(info.sinks.len(), 2);

        // BTreeMap order: mq before rest
        let mq = &info.sinks[0];
        assert_eq!(mq.name, "mq");
        assert_eq!(mq.encoding, "xml");
        assert_eq!(mq.latency_ms, 1);
        assert_eq!(mq.failure_rate, 0.5);

        let rest = &info.sinks[1];
        assert_eq!(rest.encoding, "json");
        assert_eq!(rest.rate_limit, 20);
        assert_eq!(rest.latency_ms, 20);
        assert_eq!(rest.failure_rate, 0.10);
    }
}
