//! Counter and gauge names for the fan-out pipeline.

use metrics::{counter, gauge};

/// One delivery attempt against a destination
pub fn record_delivery_attempt(sink: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "fanout_delivery_attempts_total",
        "sink" => sink.to_string(),
        "status" => status
    )
    .increment(1);
}

/// A (record, destination) pair exhausted its retries
pub fn record_dead_letter(sink: &str) {
    counter!("fanout_dead_letters_total", "sink" => sink.to_string()).increment(1);
}

/// A record was taken off the dispatch queue
pub fn record_record_ingested() {
    counter!("fanout_records_ingested_total").increment(1);
}

/// Delivery tasks left running past the drain timeout
pub fn record_tasks_abandoned(count: u64) {
    if count > 0 {
        counter!("fanout_tasks_abandoned_total").increment(count);
    }
}

/// Items currently waiting in the dispatch queue
pub fn record_queue_depth(depth: usize) {
    gauge!("fanout_queue_depth").set(depth as f64);
}
