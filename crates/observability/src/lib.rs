//! # Observability
//!
//! Prometheus export and `metrics` facade helpers for the fan-out pipeline.
//!
//! Tracing is initialised by the binary; this crate only installs the
//! Prometheus recorder and names the counters.
//!
//! ```ignore
//! observability::init_metrics_only(9000)?;
//! observability::record_delivery_attempt("rest", true);
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;

pub use crate::metrics::{
    record_dead_letter, record_delivery_attempt, record_queue_depth, record_record_ingested,
    record_tasks_abandoned,
};

/// Install the Prometheus recorder and HTTP listener on `0.0.0.0:port`.
///
/// Without it every `record_*` call is a no-op.
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}
