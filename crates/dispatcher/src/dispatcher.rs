//! Dispatcher - main loop for fan-out to sinks

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use contracts::{DeliverySink, DispatchConfig, FanoutConfig, RecordReceiver, StreamItem};

use crate::dead_letter::DeadLetterCollector;
use crate::error::DispatcherError;
use crate::metrics::MetricsAggregator;
use crate::pool::{DeliveryJob, WorkerPool};
use crate::retry::RetryController;
use crate::sinks::Sink;

/// Dispatcher configuration
#[derive(Debug, Clone, Copy)]
pub struct DispatcherConfig {
    /// Delivery worker count
    pub workers: usize,
    /// Grace period for outstanding deliveries once the stream ends
    pub drain_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::from(&DispatchConfig::default())
    }
}

impl From<&DispatchConfig> for DispatcherConfig {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            workers: config.effective_workers(),
            drain_timeout: config.drain_timeout(),
        }
    }
}

/// How the input stream terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamEnd {
    /// Producer sent the end-of-stream item
    Signalled,
    /// Every producer went away without signalling
    QueueClosed,
}

/// Result of one dispatcher run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub records_dispatched: u64,
    pub tasks_submitted: u64,
    pub tasks_completed: u64,
    pub tasks_panicked: u64,
    pub tasks_abandoned: u64,
    pub drain_timed_out: bool,
    pub end: StreamEnd,
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder<S> {
    config: DispatcherConfig,
    input: RecordReceiver,
    sinks: Vec<S>,
}

impl<S> DispatcherBuilder<S>
where
    S: DeliverySink + Send + Sync + 'static,
{
    /// Create a new DispatcherBuilder
    pub fn new(input: RecordReceiver) -> Self {
        Self {
            config: DispatcherConfig::default(),
            input,
            sinks: Vec::new(),
        }
    }

    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn sink(mut self, sink: S) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn sinks(mut self, sinks: impl IntoIterator<Item = S>) -> Self {
        self.sinks.extend(sinks);
        self
    }

    /// Validate the wiring and build the dispatcher
    #[instrument(
        name = "dispatcher_builder_build",
        skip(self),
        fields(sink_count = self.sinks.len(), workers = self.config.workers)
    )]
    pub fn build(self) -> Result<Dispatcher<S>, DispatcherError> {
        if self.config.workers == 0 {
            return Err(DispatcherError::InvalidWorkerCount);
        }
        if self.sinks.is_empty() {
            return Err(DispatcherError::NoSinks);
        }

        let mut seen = HashSet::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            if !seen.insert(sink.destination().clone()) {
                return Err(DispatcherError::duplicate_sink(sink.destination().as_str()));
            }
        }

        Ok(Dispatcher {
            config: self.config,
            input: self.input,
            sinks: Arc::from(self.sinks),
            metrics: Arc::new(MetricsAggregator::new()),
            dead_letters: Arc::new(DeadLetterCollector::new()),
        })
    }
}

/// The main Dispatcher that fans out records to sinks
pub struct Dispatcher<S> {
    config: DispatcherConfig,
    input: RecordReceiver,
    sinks: Arc<[S]>,
    metrics: Arc<MetricsAggregator>,
    dead_letters: Arc<DeadLetterCollector>,
}

impl<S> Dispatcher<S>
where
    S: DeliverySink + Send + Sync + 'static,
{
    /// Shared metrics; stays readable after `run` consumes the dispatcher
    pub fn metrics(&self) -> Arc<MetricsAggregator> {
        Arc::clone(&self.metrics)
    }

    pub fn dead_letters(&self) -> Arc<DeadLetterCollector> {
        Arc::clone(&self.dead_letters)
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub fn config(&self) -> DispatcherConfig {
        self.config
    }

    /// Run the dispatcher main loop
    ///
    /// Consumes records until the end-of-stream item (or queue closure),
    /// submitting one delivery job per sink for each record, then drains the
    /// worker pool within the configured grace period.
    #[instrument(
        name = "dispatcher_run",
        skip(self),
        fields(sinks = self.sinks.len(), workers = self.config.workers)
    )]
    pub async fn run(self) -> DispatchSummary {
        info!("Dispatcher started");

        let retry = RetryController::new(Arc::clone(&self.metrics), Arc::clone(&self.dead_letters));
        let mut pool = WorkerPool::spawn(self.config.workers, Arc::clone(&self.sinks), retry);
        let mut records_dispatched: u64 = 0;

        let end = loop {
            match self.input.take().await {
                Some(StreamItem::Data(record)) => {
                    records_dispatched += 1;
                    observability::record_record_ingested();
                    observability::record_queue_depth(self.input.len());

                    for sink_index in 0..self.sinks.len() {
                        pool.submit(DeliveryJob {
                            record: record.clone(),
                            sink_index,
                        });
                    }

                    if records_dispatched.is_multiple_of(100) {
                        debug!(records = records_dispatched, "Dispatcher progress");
                    }
                }
                Some(StreamItem::End) => break StreamEnd::Signalled,
                None => {
                    warn!("Dispatch queue closed without end-of-stream");
                    break StreamEnd::QueueClosed;
                }
            }
        };

        // Late producers get QueueClosed instead of blocking forever
        self.input.close();
        info!(
            records = records_dispatched,
            submitted = pool.submitted(),
            "Dispatcher input finished, draining"
        );

        let outcome = pool.drain(self.config.drain_timeout).await;
        if outcome.abandoned > 0 {
            warn!(abandoned = outcome.abandoned, "Delivery tasks abandoned at shutdown");
            observability::record_tasks_abandoned(outcome.abandoned);
        }

        info!("Dispatcher shutdown complete");

        DispatchSummary {
            records_dispatched,
            tasks_submitted: outcome.submitted,
            tasks_completed: outcome.completed,
            tasks_panicked: outcome.panicked,
            tasks_abandoned: outcome.abandoned,
            drain_timed_out: outcome.timed_out,
            end,
        }
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(self) -> JoinHandle<DispatchSummary> {
        tokio::spawn(self.run())
    }
}

/// Convenience function to create a dispatcher from a loaded config
#[instrument(name = "dispatcher_create", skip(config, input), fields(sinks = config.sinks.len()))]
pub fn create_dispatcher(
    config: &FanoutConfig,
    input: RecordReceiver,
) -> Result<Dispatcher<Sink>, DispatcherError> {
    let sinks = Sink::from_config(config)?;
    DispatcherBuilder::new(input)
        .config(DispatcherConfig::from(&config.dispatch))
        .sinks(sinks)
        .build()
}
