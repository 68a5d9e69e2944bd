//! DbSink - database upsert (Avro rows)

use super::macros::define_simulated_sink;

define_simulated_sink!(
    DbSink,
    "db",
    SimulatedLink::new(25, 0.08),
    Encoding::Avro,
    "db_sink_attempt"
);
