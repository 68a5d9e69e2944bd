//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Wiring between config, sinks and encodings
//! - Source -> dispatch queue -> dispatcher runs with stub sinks
//! - Counter consistency and rate limiting under concurrent load

#[cfg(test)]
mod support {
    use std::sync::atomic::{AtomicU64, Ordering};

    use contracts::{DeliverySink, DestinationId, EncodedPayload, Encoding};

    /// Outcome policy of a [`StubSink`]
    pub enum Behaviour {
        AlwaysSucceed,
        AlwaysFail,
        /// Fails on every attempt whose global index is a multiple of `n`
        FailEvery(u64),
    }

    pub struct StubSink {
        id: DestinationId,
        behaviour: Behaviour,
        attempts: AtomicU64,
    }

    impl StubSink {
        pub fn new(name: &str, behaviour: Behaviour) -> Self {
            Self {
                id: name.into(),
                behaviour,
                attempts: AtomicU64::new(0),
            }
        }
    }

    impl DeliverySink for StubSink {
        fn destination(&self) -> &DestinationId {
            &self.id
        }

        fn encoding(&self) -> Encoding {
            Encoding::Json
        }

        async fn attempt(&self, _payload: &EncodedPayload) -> bool {
            let n = self.attempts.fetch_add(1, Ordering::Relaxed);
            tokio::task::yield_now().await;
            match self.behaviour {
                Behaviour::AlwaysSucceed => true,
                Behaviour::AlwaysFail => false,
                Behaviour::FailEvery(k) => n % k != 0,
            }
        }
    }
}

#[cfg(test)]
mod contract_tests {
    use contracts::{DeliverySink, Encoding, SinkSettings, KNOWN_DESTINATIONS};
    use dispatcher::Sink;

    #[test]
    fn test_every_known_destination_has_a_sink_and_encoding() {
        for name in KNOWN_DESTINATIONS {
            let sink = Sink::from_settings(name, &SinkSettings::with_rate_limit(10)).unwrap();
            assert_eq!(sink.destination().as_str(), name);
            assert_eq!(sink.encoding(), Encoding::for_destination(name).unwrap());
        }
    }

    #[test]
    fn test_unknown_destination_rejected_at_load() {
        let result = config_loader::ConfigLoader::load_from_str(
            r#"
            [source]
            path = "in.txt"

            [sinks.ftp]
            rate_limit = 5
            "#,
            config_loader::ConfigFormat::Toml,
        );
        assert!(result.is_err());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::time::Duration;

    use contracts::dispatch_queue;
    use dispatcher::{create_dispatcher, DispatcherBuilder, DispatcherConfig, StreamEnd, MAX_ATTEMPTS};
    use ingestion::{FileSource, VecSource};

    use crate::support::{Behaviour, StubSink};

    fn dispatcher_config(workers: usize) -> DispatcherConfig {
        DispatcherConfig {
            workers,
            drain_timeout: Duration::from_secs(10),
        }
    }

    /// VecSource -> queue -> dispatcher with one always-succeeding and one
    /// always-failing destination
    #[tokio::test]
    async fn test_e2e_success_and_failure_destinations() {
        let (tx, rx) = dispatch_queue(4).unwrap();
        let dispatcher = DispatcherBuilder::new(rx)
            .config(dispatcher_config(4))
            .sink(StubSink::new("always-success", Behaviour::AlwaysSucceed))
            .sink(StubSink::new("always-fail", Behaviour::AlwaysFail))
            .build()
            .unwrap();
        let metrics = dispatcher.metrics();
        let dead_letters = dispatcher.dead_letters();

        let dispatcher_handle = dispatcher.spawn();
        let ingestion = VecSource::new(["a", "b"]).spawn(tx).await.unwrap();
        let summary = dispatcher_handle.await.unwrap();

        assert_eq!(ingestion.records, 2);
        assert_eq!(summary.end, StreamEnd::Signalled);
        assert_eq!(summary.tasks_abandoned, 0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.destination("always-success").success, 2);
        assert_eq!(snapshot.destination("always-success").failure, 0);
        assert_eq!(snapshot.destination("always-fail").success, 0);
        assert_eq!(snapshot.destination("always-fail").failure, 6);
        assert_eq!(snapshot.total_attempts, 8);
        assert_eq!(dead_letters.count(), 2);
    }

    /// Counters stay exact with many concurrent workers and mixed outcomes
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_counters_consistent_under_load() {
        const RECORDS: u64 = 500;

        let (tx, rx) = dispatch_queue(16).unwrap();
        let dispatcher = DispatcherBuilder::new(rx)
            .config(dispatcher_config(8))
            .sink(StubSink::new("ok", Behaviour::AlwaysSucceed))
            .sink(StubSink::new("flaky", Behaviour::FailEvery(2)))
            .sink(StubSink::new("down", Behaviour::AlwaysFail))
            .build()
            .unwrap();
        let metrics = dispatcher.metrics();
        let dead_letters = dispatcher.dead_letters();

        let dispatcher_handle = dispatcher.spawn();
        let lines: Vec<String> = (0..RECORDS).map(|i| format!("record-{i}")).collect();
        VecSource::new(lines).spawn(tx).await.unwrap();
        let summary = dispatcher_handle.await.unwrap();

        assert_eq!(summary.records_dispatched, RECORDS);
        assert_eq!(summary.tasks_submitted, RECORDS * 3);
        assert_eq!(summary.tasks_completed, RECORDS * 3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_attempts, snapshot.destination_attempts());

        let ok = snapshot.destination("ok");
        assert_eq!(ok.success, RECORDS);
        assert_eq!(ok.failure, 0);

        let down = snapshot.destination("down");
        assert_eq!(down.success, 0);
        assert_eq!(down.failure, RECORDS * u64::from(MAX_ATTEMPTS));

        // Every flaky pair is either delivered or dead-lettered, never both
        let flaky = snapshot.destination("flaky");
        let flaky_dead = dead_letters.count() as u64 - RECORDS;
        assert_eq!(flaky.success + flaky_dead, RECORDS);
        assert!(flaky.failure >= flaky_dead * u64::from(MAX_ATTEMPTS));
        assert!(flaky.failure <= flaky.success * 2 + flaky_dead * u64::from(MAX_ATTEMPTS));
    }

    /// Config file -> FileSource -> simulated sinks
    #[tokio::test]
    async fn test_e2e_from_config_and_file() {
        let mut input = tempfile::NamedTempFile::new().unwrap();
        writeln!(input, "alpha\n\ngamma & <delta>").unwrap();

        let config_toml = format!(
            r#"
            [source]
            path = "{}"

            [queue]
            capacity = 1

            [dispatch]
            workers = 2

            [sinks.rest]
            rateLimit = 500
            latency_ms = 0
            failure_rate = 0.0

            [sinks.mq]
            rate_limit = 500
            latency_ms = 0
            failure_rate = 0.0

            [sinks.db]
            rate_limit = 500
            latency_ms = 0
            failure_rate = 0.0
            "#,
            input.path().display()
        );
        let config = config_loader::ConfigLoader::load_from_str(
            &config_toml,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        let (tx, rx) = dispatch_queue(config.queue.capacity).unwrap();
        let dispatcher = create_dispatcher(&config, rx).unwrap();
        let metrics = dispatcher.metrics();
        let dead_letters = dispatcher.dead_letters();

        let dispatcher_handle = dispatcher.spawn();
        let ingestion = FileSource::new(&config.source.path).spawn(tx).await.unwrap();
        let summary = dispatcher_handle.await.unwrap();

        assert!(ingestion.is_ok());
        assert_eq!(ingestion.records, 3);
        assert_eq!(summary.records_dispatched, 3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_attempts, 9);
        let names: Vec<_> = snapshot.destinations.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["db", "mq", "rest"]);
        for stats in snapshot.destinations.values() {
            assert_eq!(stats.success, 3);
        }
        assert!(dead_letters.is_empty());
    }

    /// A link built with a NaN failure rate fails every attempt instead of
    /// killing the delivery task
    #[tokio::test]
    async fn test_nan_link_exhausts_retries() {
        use dispatcher::{RestSink, SimulatedLink, Sink};

        let (tx, rx) = dispatch_queue(2).unwrap();
        let sink = Sink::Rest(RestSink::with_link(1_000, 10, SimulatedLink::new(0, f64::NAN)));
        let dispatcher = DispatcherBuilder::new(rx)
            .config(dispatcher_config(2))
            .sink(sink)
            .build()
            .unwrap();
        let metrics = dispatcher.metrics();
        let dead_letters = dispatcher.dead_letters();

        let handle = dispatcher.spawn();
        VecSource::new(["a", "b"]).spawn(tx).await.unwrap();
        let summary = handle.await.unwrap();

        assert_eq!(summary.tasks_completed, 2);
        assert_eq!(metrics.failure("rest"), 2 * u64::from(MAX_ATTEMPTS));
        assert_eq!(dead_letters.count(), 2);
    }

    /// A source that fails to open still lets the dispatcher finish
    #[tokio::test]
    async fn test_ingestion_failure_terminates_dispatcher() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = dispatch_queue(2).unwrap();
        let dispatcher = DispatcherBuilder::new(rx)
            .config(dispatcher_config(1))
            .sink(StubSink::new("s", Behaviour::AlwaysSucceed))
            .build()
            .unwrap();

        let handle = dispatcher.spawn();
        let ingestion = FileSource::new(dir.path().join("nope.txt"))
            .spawn(tx)
            .await
            .unwrap();
        let summary = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("dispatcher did not terminate")
            .unwrap();

        assert!(ingestion.error.is_some());
        assert_eq!(summary.end, StreamEnd::Signalled);
        assert_eq!(summary.records_dispatched, 0);
    }
}

#[cfg(test)]
mod rate_limit_tests {
    use std::time::Duration;

    use contracts::dispatch_queue;
    use dispatcher::{DispatcherBuilder, DispatcherConfig, RestSink, SimulatedLink, Sink};
    use ingestion::VecSource;
    use tokio::time::Instant;

    /// Observed attempt rate through the whole pipeline stays at the
    /// configured limit even with more workers than tokens
    #[tokio::test(start_paused = true)]
    async fn test_dispatch_respects_destination_rate() {
        const RATE: u32 = 20;
        const RECORDS: usize = 41;

        let (tx, rx) = dispatch_queue(8).unwrap();
        let sink = Sink::Rest(RestSink::with_link(RATE, 1, SimulatedLink::instant()));
        let dispatcher = DispatcherBuilder::new(rx)
            .config(DispatcherConfig {
                workers: 8,
                drain_timeout: Duration::from_secs(60),
            })
            .sink(sink)
            .build()
            .unwrap();
        let metrics = dispatcher.metrics();

        let start = Instant::now();
        let handle = dispatcher.spawn();
        VecSource::new(vec!["x"; RECORDS]).spawn(tx).await.unwrap();
        let summary = handle.await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(summary.tasks_abandoned, 0);
        assert_eq!(metrics.success("rest"), RECORDS as u64);

        // First token is free, each further one costs 1/RATE seconds
        let floor = Duration::from_millis(((RECORDS as u64 - 1) * 1000) / u64::from(RATE));
        assert!(elapsed >= floor - Duration::from_millis(10), "too fast: {elapsed:?}");
        assert!(elapsed <= floor + Duration::from_millis(200), "too slow: {elapsed:?}");
    }
}
