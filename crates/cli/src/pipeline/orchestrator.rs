//! Pipeline orchestrator - wires ingestion, dispatch queue and dispatcher.

use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{dispatch_queue, FanoutConfig};
use ingestion::FileSource;
use tracing::{info, warn};

use super::RunReport;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Loaded and validated configuration, CLI overrides applied
    pub config: FanoutConfig,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    ///
    /// Returns once the source is exhausted and the dispatcher has drained.
    pub async fn run(self) -> Result<RunReport> {
        let start_time = Instant::now();
        let config = &self.config.config;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let (tx, rx) =
            dispatch_queue(config.queue.capacity).context("Failed to create dispatch queue")?;

        let dispatcher =
            dispatcher::create_dispatcher(config, rx).context("Failed to create dispatcher")?;
        let metrics = dispatcher.metrics();
        let dead_letters = dispatcher.dead_letters();

        info!(
            sinks = dispatcher.sink_count(),
            workers = dispatcher.config().workers,
            queue_capacity = config.queue.capacity,
            "Dispatcher started"
        );
        let dispatcher_handle = dispatcher.spawn();

        info!(path = %config.source.path, "Starting ingestion");
        let ingestion_handle = FileSource::new(&config.source.path).spawn(tx);

        let ingestion = ingestion_handle.await.context("Ingestion task failed")?;
        if let Some(ref error) = ingestion.error {
            warn!(error = %error, records = ingestion.records, "Ingestion stopped early");
        }

        let summary = dispatcher_handle
            .await
            .context("Dispatcher task failed")?;

        let report = RunReport {
            duration: start_time.elapsed(),
            records_ingested: ingestion.records,
            ingestion_error: ingestion.error,
            summary,
            metrics: metrics.snapshot(),
            dead_letters: dead_letters.count(),
        };

        info!(
            duration_secs = report.duration.as_secs_f64(),
            attempts = report.metrics.total_attempts,
            throughput = format!("{:.2}", report.throughput()),
            "Pipeline shutdown complete"
        );

        Ok(report)
    }
}
