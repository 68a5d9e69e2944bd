//! RestSink - request/response style HTTP destination (JSON bodies)

use super::macros::define_simulated_sink;

define_simulated_sink!(
    RestSink,
    "rest",
    SimulatedLink::new(20, 0.10),
    Encoding::Json,
    "rest_sink_attempt"
);
