//! Simulated network / storage link

use std::time::Duration;

use rand::Rng;
use serde::Serialize;

/// Latency and failure profile of a simulated destination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulatedLink {
    /// Time spent in-flight per attempt
    pub latency: Duration,
    /// Probability in `[0, 1]` that an attempt fails
    pub failure_rate: f64,
}

impl SimulatedLink {
    pub const fn new(latency_ms: u64, failure_rate: f64) -> Self {
        Self {
            latency: Duration::from_millis(latency_ms),
            failure_rate,
        }
    }

    /// Link that never fails and never waits
    pub const fn instant() -> Self {
        Self::new(0, 0.0)
    }

    /// Replace fields that are set in the overrides.
    pub fn with_overrides(self, latency_ms: Option<u64>, failure_rate: Option<f64>) -> Self {
        Self {
            latency: latency_ms.map(Duration::from_millis).unwrap_or(self.latency),
            failure_rate: failure_rate.unwrap_or(self.failure_rate),
        }
    }

    /// Wait out the latency, then roll the outcome.
    pub async fn transmit(&self) -> bool {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.roll()
    }

    /// A non-finite rate counts as a dead link.
    fn roll(&self) -> bool {
        let p = if self.failure_rate.is_finite() {
            self.failure_rate.clamp(0.0, 1.0)
        } else {
            1.0
        };
        !rand::rng().random_bool(p)
    }
}
