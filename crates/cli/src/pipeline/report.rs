//! Final report of a pipeline run.

use std::fmt;
use std::time::Duration;

use dispatcher::{DispatchSummary, MetricsSnapshot};
use serde::{Serialize, Serializer};

/// Everything printed once ingestion and drain are done
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Wall-clock time from wiring to drain completion
    #[serde(rename = "duration_secs", serialize_with = "as_secs_f64")]
    pub duration: Duration,

    /// Records the source managed to enqueue
    pub records_ingested: u64,

    /// Ingestion failure, if the source stopped early
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingestion_error: Option<String>,

    pub summary: DispatchSummary,

    pub metrics: MetricsSnapshot,

    /// Dead-letter entries at report time
    pub dead_letters: usize,
}

fn as_secs_f64<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

impl RunReport {
    /// Attempts per second, measured by the metrics aggregator
    pub fn throughput(&self) -> f64 {
        self.metrics.throughput
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Fan-out Report ===")?;
        writeln!(f, "Duration:         {:.2}s", self.duration.as_secs_f64())?;
        writeln!(f, "Records ingested: {}", self.records_ingested)?;
        if let Some(ref error) = self.ingestion_error {
            writeln!(f, "Ingestion error:  {}", error)?;
        }
        writeln!(f, "Total attempts:   {}", self.metrics.total_attempts)?;
        writeln!(f, "Throughput:       {:.2} attempts/s", self.throughput())?;

        writeln!(f, "\nPer destination:")?;
        for (destination, stats) in &self.metrics.destinations {
            writeln!(
                f,
                "  {:<8} success={:<8} failure={}",
                destination.as_str(),
                stats.success,
                stats.failure
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Dead letters:     {}", self.dead_letters)?;
        write!(f, "Abandoned tasks:  {}", self.summary.tasks_abandoned)?;
        if self.summary.tasks_panicked > 0 {
            write!(f, "\nPanicked tasks:   {}", self.summary.tasks_panicked)?;
        }
        Ok(())
    }
}
