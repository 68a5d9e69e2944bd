//! Retry controller: delivery of one record to one destination
//!
//! Attempts are sequential, immediate (no backoff) and bounded by
//! [`MAX_ATTEMPTS`]. Only the sink's rate limiter paces them. Every attempt
//! is counted; exhaustion dead-letters the record.

use std::sync::Arc;

use contracts::{DeliverySink, Record};
use tracing::{debug, warn};

use crate::dead_letter::DeadLetterCollector;
use crate::metrics::MetricsAggregator;

/// Attempts per (record, destination) pair
pub const MAX_ATTEMPTS: u32 = 3;

/// Outcome of delivering one record to one destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub attempts: u32,
    pub delivered: bool,
}

#[derive(Debug, Clone)]
pub struct RetryController {
    metrics: Arc<MetricsAggregator>,
    dead_letters: Arc<DeadLetterCollector>,
}

impl RetryController {
    pub fn new(metrics: Arc<MetricsAggregator>, dead_letters: Arc<DeadLetterCollector>) -> Self {
        Self {
            metrics,
            dead_letters,
        }
    }

    /// Deliver `record` to `sink`, retrying up to [`MAX_ATTEMPTS`] times.
    ///
    /// Never fails: exhaustion is recorded in the dead-letter collector.
    pub async fn deliver<S>(&self, sink: &S, record: &Record) -> DeliveryReport
    where
        S: DeliverySink + Sync,
    {
        let destination = sink.destination();
        // Encoded once; every retry sends the same bytes
        let payload = sink.encoding().encode(record.payload());

        for attempt in 1..=MAX_ATTEMPTS {
            let ok = sink.attempt(&payload).await;
            self.metrics.record_attempt(destination, ok);

            if ok {
                return DeliveryReport {
                    attempts: attempt,
                    delivered: true,
                };
            }
            debug!(sink = %destination, seq = record.seq, attempt, "delivery attempt failed");
        }

        warn!(
            sink = %destination,
            seq = record.seq,
            attempts = MAX_ATTEMPTS,
            "Retries exhausted, record dead-lettered"
        );
        self.dead_letters.append(record.clone());
        observability::record_dead_letter(destination);

        DeliveryReport {
            attempts: MAX_ATTEMPTS,
            delivered: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DestinationId, EncodedPayload, Encoding};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Succeeds on the N-th call (0 = never)
    struct FlakySink {
        id: DestinationId,
        succeed_on: u32,
        calls: AtomicU32,
        seen: Mutex<Vec<EncodedPayload>>,
    }

    impl FlakySink {
        fn new(succeed_on: u32) -> Self {
            Self {
                id: DestinationId::new("flaky"),
                succeed_on,
                calls: AtomicU32::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl DeliverySink for FlakySink {
        fn destination(&self) -> &DestinationId {
            &self.id
        }

        fn encoding(&self) -> Encoding {
            Encoding::Xml
        }

        async fn attempt(&self, payload: &EncodedPayload) -> bool {
            self.seen.lock().unwrap().push(payload.clone());
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.succeed_on != 0 && call >= self.succeed_on
        }
    }

    fn controller() -> (RetryController, Arc<MetricsAggregator>, Arc<DeadLetterCollector>) {
        let metrics = Arc::new(MetricsAggregator::new());
        let dlq = Arc::new(DeadLetterCollector::new());
        (
            RetryController::new(Arc::clone(&metrics), Arc::clone(&dlq)),
            metrics,
            dlq,
        )
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let (retry, metrics, dlq) = controller();
        let sink = FlakySink::new(1);
        let report = retry.deliver(&sink, &Record::new(0, "a")).await;

        assert_eq!(report, DeliveryReport { attempts: 1, delivered: true });
        assert_eq!(metrics.success("flaky"), 1);
        assert_eq!(metrics.failure("flaky"), 0);
        assert_eq!(dlq.count(), 0);
    }

    #[tokio::test]
    async fn test_fail_twice_then_succeed() {
        let (retry, metrics, dlq) = controller();
        let sink = FlakySink::new(3);
        let report = retry.deliver(&sink, &Record::new(0, "a")).await;

        assert_eq!(report, DeliveryReport { attempts: 3, delivered: true });
        assert_eq!(metrics.failure("flaky"), 2);
        assert_eq!(metrics.success("flaky"), 1);
        assert_eq!(metrics.total_attempts(), 3);
        assert_eq!(dlq.count(), 0);
    }

    #[tokio::test]
    async fn test_exhaustion_dead_letters_once() {
        let (retry, metrics, dlq) = controller();
        let sink = FlakySink::new(0);
        let record = Record::new(9, "doomed");
        let report = retry.deliver(&sink, &record).await;

        assert_eq!(report, DeliveryReport { attempts: 3, delivered: false });
        assert_eq!(metrics.failure("flaky"), 3);
        assert_eq!(metrics.total_attempts(), 3);
        assert_eq!(dlq.entries(), vec![record]);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_reuse_encoded_payload() {
        let (retry, _, _) = controller();
        let sink = FlakySink::new(0);
        retry.deliver(&sink, &Record::new(0, "<x>")).await;

        let seen = sink.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|p| p == &seen[0]));
        assert_eq!(&seen[0].body[..], b"<record><data>&lt;x&gt;</data></record>");
    }
}
