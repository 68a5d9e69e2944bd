//! Delivery metrics shared by every delivery task
//!
//! Counters are plain atomics. Per-destination counters are created on first
//! use behind a read-mostly lock; after creation every update is lock-free.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use contracts::DestinationId;
use serde::Serialize;

/// Success / failure counters of one destination
#[derive(Debug, Default)]
pub struct DestinationCounters {
    success: AtomicU64,
    failure: AtomicU64,
}

impl DestinationCounters {
    pub fn success(&self) -> u64 {
        self.success.load(Ordering::Relaxed)
    }

    pub fn failure(&self) -> u64 {
        self.failure.load(Ordering::Relaxed)
    }
}

/// Process-wide attempt counters
#[derive(Debug)]
pub struct MetricsAggregator {
    total: AtomicU64,
    destinations: RwLock<HashMap<DestinationId, Arc<DestinationCounters>>>,
    started: Instant,
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsAggregator {
    /// Start the throughput clock now.
    pub fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
            destinations: RwLock::new(HashMap::new()),
            started: Instant::now(),
        }
    }

    /// Count one attempt against `destination`.
    pub fn record_attempt(&self, destination: &DestinationId, success: bool) {
        let counters = self.counters(destination);
        if success {
            counters.success.fetch_add(1, Ordering::Relaxed);
        } else {
            counters.failure.fetch_add(1, Ordering::Relaxed);
        }
        self.total.fetch_add(1, Ordering::Relaxed);

        observability::record_delivery_attempt(destination, success);
    }

    pub fn total_attempts(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn success(&self, destination: &str) -> u64 {
        self.lookup(destination).map_or(0, |c| c.success())
    }

    pub fn failure(&self, destination: &str) -> u64 {
        self.lookup(destination).map_or(0, |c| c.failure())
    }

    /// Attempts per second since creation; 0.0 when no time has elapsed.
    pub fn throughput(&self) -> f64 {
        throughput(self.total_attempts(), self.started.elapsed())
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let elapsed = self.started.elapsed();
        let destinations = self
            .destinations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, c)| {
                (
                    id.clone(),
                    DestinationStats {
                        success: c.success(),
                        failure: c.failure(),
                    },
                )
            })
            .collect();
        let total_attempts = self.total_attempts();

        MetricsSnapshot {
            total_attempts,
            elapsed_secs: elapsed.as_secs_f64(),
            throughput: throughput(total_attempts, elapsed),
            destinations,
        }
    }

    fn lookup(&self, destination: &str) -> Option<Arc<DestinationCounters>> {
        self.destinations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(destination)
            .cloned()
    }

    fn counters(&self, destination: &DestinationId) -> Arc<DestinationCounters> {
        if let Some(counters) = self.lookup(destination) {
            return counters;
        }
        // Racing first users both end up with the entry that won
        let mut map = self
            .destinations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(destination.clone()).or_default())
    }
}

fn throughput(total: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        total as f64 / secs
    } else {
        0.0
    }
}

/// Point-in-time counters of one destination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DestinationStats {
    pub success: u64,
    pub failure: u64,
}

impl DestinationStats {
    pub fn attempts(&self) -> u64 {
        self.success + self.failure
    }
}

/// Snapshot of all counters (for reporting)
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub total_attempts: u64,
    pub elapsed_secs: f64,
    /// Attempts per second
    pub throughput: f64,
    /// Ordered by destination name
    pub destinations: BTreeMap<DestinationId, DestinationStats>,
}

impl MetricsSnapshot {
    pub fn destination(&self, name: &str) -> DestinationStats {
        self.destinations.get(name).copied().unwrap_or_default()
    }

    /// Sum of per-destination attempts; equals `total_attempts` once quiescent
    pub fn destination_attempts(&self) -> u64 {
        self.destinations.values().map(DestinationStats::attempts).sum()
    }
}
