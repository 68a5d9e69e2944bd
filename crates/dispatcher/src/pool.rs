//! WorkerPool - bounded set of delivery workers fed by a job channel
//!
//! Submission never waits: the job channel is unbounded so the dispatcher
//! loop is only ever suspended by the dispatch queue. Draining closes the
//! channel, lets workers finish queued jobs and waits up to a grace period.
//! Workers still running after that are detached, not cancelled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_channel::{unbounded, Receiver, Sender};
use contracts::{DeliverySink, Record};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::retry::RetryController;

/// One (record, destination) delivery unit
#[derive(Debug)]
pub struct DeliveryJob {
    pub record: Record,
    pub sink_index: usize,
}

/// Counters observed when the drain finished or timed out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainOutcome {
    pub submitted: u64,
    pub completed: u64,
    pub panicked: u64,
    /// Submitted but not completed when the grace period ran out
    pub abandoned: u64,
    pub timed_out: bool,
}

#[derive(Debug, Default)]
struct PoolCounters {
    completed: AtomicU64,
    panicked: AtomicU64,
}

/// Handle to the running workers
pub struct WorkerPool {
    tx: Sender<DeliveryJob>,
    workers: Vec<JoinHandle<()>>,
    counters: Arc<PoolCounters>,
    submitted: u64,
}

impl WorkerPool {
    /// Spawn `size` workers delivering to `sinks`. `size` is raised to 1.
    pub fn spawn<S>(size: usize, sinks: Arc<[S]>, retry: RetryController) -> Self
    where
        S: DeliverySink + Send + Sync + 'static,
    {
        let (tx, rx) = unbounded();
        let counters = Arc::new(PoolCounters::default());

        let workers = (0..size.max(1))
            .map(|worker_id| {
                let rx = rx.clone();
                let sinks = Arc::clone(&sinks);
                let retry = retry.clone();
                let counters = Arc::clone(&counters);
                tokio::spawn(async move {
                    worker_loop(worker_id, rx, sinks, retry, counters).await;
                })
            })
            .collect();

        Self {
            tx,
            workers,
            counters,
            submitted: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queue a job. Returns false only if every worker has exited.
    pub fn submit(&mut self, job: DeliveryJob) -> bool {
        match self.tx.try_send(job) {
            Ok(()) => {
                self.submitted += 1;
                true
            }
            Err(e) => {
                error!(seq = e.into_inner().record.seq, "Worker pool closed, job dropped");
                false
            }
        }
    }

    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    /// Stop accepting jobs and wait up to `grace` for outstanding ones.
    #[instrument(name = "worker_pool_drain", skip(self), fields(submitted = self.submitted))]
    pub async fn drain(self, grace: Duration) -> DrainOutcome {
        // Receivers still get every queued job after close
        self.tx.close();

        let workers = self.workers;
        let join_all = async move {
            for worker in workers {
                if let Err(e) = worker.await {
                    error!(error = ?e, "Worker task failed");
                }
            }
        };
        // Dropping the remaining JoinHandles detaches those workers
        let timed_out = tokio::time::timeout(grace, join_all).await.is_err();

        let completed = self.counters.completed.load(Ordering::Acquire);
        let outcome = DrainOutcome {
            submitted: self.submitted,
            completed,
            panicked: self.counters.panicked.load(Ordering::Acquire),
            abandoned: self.submitted.saturating_sub(completed),
            timed_out,
        };

        if timed_out {
            warn!(
                grace_ms = grace.as_millis() as u64,
                abandoned = outcome.abandoned,
                "Drain timed out, in-flight deliveries abandoned"
            );
        } else {
            debug!(completed, "Worker pool drained");
        }
        outcome
    }
}

async fn worker_loop<S>(
    worker_id: usize,
    rx: Receiver<DeliveryJob>,
    sinks: Arc<[S]>,
    retry: RetryController,
    counters: Arc<PoolCounters>,
) where
    S: DeliverySink + Send + Sync + 'static,
{
    debug!(worker_id, "Delivery worker started");

    while let Ok(job) = rx.recv().await {
        let seq = job.record.seq;
        let sinks = Arc::clone(&sinks);
        let retry = retry.clone();

        // A panicking sink takes down only its own task
        let delivery = tokio::spawn(async move {
            if let Some(sink) = sinks.get(job.sink_index) {
                retry.deliver(sink, &job.record).await;
            }
        });
        if let Err(e) = delivery.await {
            counters.panicked.fetch_add(1, Ordering::Relaxed);
            error!(worker_id, seq, error = %e, "Delivery task panicked");
        }
        counters.completed.fetch_add(1, Ordering::Release);
    }

    debug!(worker_id, "Delivery worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dead_letter::DeadLetterCollector;
    use crate::metrics::MetricsAggregator;
    use contracts::{DestinationId, EncodedPayload, Encoding};

    struct SleepySink {
        id: DestinationId,
        delay: Duration,
        panic: bool,
    }

    impl DeliverySink for SleepySink {
        fn destination(&self) -> &DestinationId {
            &self.id
        }

        fn encoding(&self) -> Encoding {
            Encoding::Json
        }

        async fn attempt(&self, _payload: &EncodedPayload) -> bool {
            tokio::time::sleep(self.delay).await;
            if self.panic {
                panic!("sink exploded");
            }
            true
        }
    }

    fn pool_with(sink: SleepySink, size: usize) -> (WorkerPool, Arc<MetricsAggregator>) {
        let metrics = Arc::new(MetricsAggregator::new());
        let retry = RetryController::new(Arc::clone(&metrics), Arc::new(DeadLetterCollector::new()));
        let sinks: Arc<[SleepySink]> = Arc::from(vec![sink]);
        (WorkerPool::spawn(size, sinks, retry), metrics)
    }

    fn job(seq: u64) -> DeliveryJob {
        DeliveryJob {
            record: Record::new(seq, "x"),
            sink_index: 0,
        }
    }

    #[tokio::test]
    async fn test_drain_completes_all_jobs() {
        let (mut pool, metrics) = pool_with(
            SleepySink {
                id: "s".into(),
                delay: Duration::from_millis(1),
                panic: false,
            },
            4,
        );
        assert_eq!(pool.size(), 4);
        for seq in 0..20 {
            assert!(pool.submit(job(seq)));
        }

        let outcome = pool.drain(Duration::from_secs(5)).await;
        assert_eq!(outcome.submitted, 20);
        assert_eq!(outcome.completed, 20);
        assert_eq!(outcome.abandoned, 0);
        assert!(!outcome.timed_out);
        assert_eq!(metrics.success("s"), 20);
    }

    #[tokio::test]
    async fn test_drain_timeout_reports_abandoned() {
        let (mut pool, _) = pool_with(
            SleepySink {
                id: "slow".into(),
                delay: Duration::from_secs(30),
                panic: false,
            },
            2,
        );
        for seq in 0..5 {
            pool.submit(job(seq));
        }

        let outcome = pool.drain(Duration::from_millis(50)).await;
        assert!(outcome.timed_out);
        assert_eq!(outcome.submitted, 5);
        assert_eq!(outcome.completed, 0);
        assert_eq!(outcome.abandoned, 5);
    }

    #[tokio::test]
    async fn test_panicking_sink_is_contained() {
        let (mut pool, _) = pool_with(
            SleepySink {
                id: "boom".into(),
                delay: Duration::ZERO,
                panic: true,
            },
            1,
        );
        for seq in 0..3 {
            pool.submit(job(seq));
        }

        let outcome = pool.drain(Duration::from_secs(5)).await;
        assert_eq!(outcome.completed, 3);
        assert_eq!(outcome.panicked, 3);
        assert_eq!(outcome.abandoned, 0);
    }
}
