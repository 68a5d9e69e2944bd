//! # Dispatcher
//!
//! Fan-out dispatch core.
//!
//! - Consumes records from the dispatch queue
//! - Submits one delivery job per record and sink to a worker pool
//! - Retries, rate limits and dead-letters per destination
//! - Drains outstanding work with a bounded grace period

pub mod dead_letter;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod pool;
pub mod rate_limiter;
pub mod retry;
pub mod sinks;

pub use contracts::{DeliverySink, Record, StreamItem};
pub use dead_letter::DeadLetterCollector;
pub use dispatcher::{
    create_dispatcher, DispatchSummary, Dispatcher, DispatcherBuilder, DispatcherConfig, StreamEnd,
};
pub use error::DispatcherError;
pub use metrics::{DestinationStats, MetricsAggregator, MetricsSnapshot};
pub use pool::{DeliveryJob, DrainOutcome, WorkerPool};
pub use rate_limiter::RateLimiter;
pub use retry::{DeliveryReport, RetryController, MAX_ATTEMPTS};
pub use sinks::{DbSink, GrpcSink, MqSink, RestSink, SimulatedLink, Sink};
