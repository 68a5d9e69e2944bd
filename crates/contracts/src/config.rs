//! FanoutConfig - Config Loader output
//!
//! Source location, dispatch queue bound, worker pool tuning and one entry
//! per destination.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use validator::Validate;

/// Complete runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanoutConfig {
    /// Where records are ingested from
    pub source: SourceConfig,

    /// Dispatch queue settings
    #[serde(default)]
    pub queue: QueueConfig,

    /// Worker pool / drain settings
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Destination name -> settings
    pub sinks: BTreeMap<String, SinkSettings>,
}

/// Ingestion source
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SourceConfig {
    /// Path of a line-oriented text file
    #[validate(length(min = 1, message = "source path cannot be empty"))]
    pub path: String,
}

/// Dispatch queue settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QueueConfig {
    /// Back-pressure threshold
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1, message = "capacity must be >= 1"))]
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
        }
    }
}

fn default_queue_capacity() -> usize {
    100
}

/// Worker pool and shutdown settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Worker count; 0 = available parallelism
    #[serde(default)]
    pub workers: usize,

    /// Grace period for in-flight deliveries after end of stream
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            drain_timeout_ms: default_drain_timeout_ms(),
        }
    }
}

fn default_drain_timeout_ms() -> u64 {
    5_000
}

impl DispatchConfig {
    /// Resolved worker count (never zero)
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        }
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

/// Per-destination settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkSettings {
    /// Accepted attempts per second
    #[serde(alias = "rateLimit")]
    #[validate(range(min = 1, message = "rate_limit must be >= 1"))]
    pub rate_limit: u32,

    /// Token bucket capacity (defaults to 1, i.e. no burst)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "burst must be >= 1"))]
    pub burst: Option<u32>,

    /// Simulated latency override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,

    /// Simulated failure probability override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 1.0, message = "failure_rate must be within [0, 1]"))]
    pub failure_rate: Option<f64>,
}

impl SinkSettings {
    pub fn with_rate_limit(rate_limit: u32) -> Self {
        Self {
            rate_limit,
            burst: None,
            latency_ms: None,
            failure_rate: None,
        }
    }
}
