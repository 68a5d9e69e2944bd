//! MqSink - message queue publisher (XML messages)

use super::macros::define_simulated_sink;

define_simulated_sink!(
    MqSink,
    "mq",
    SimulatedLink::new(10, 0.05),
    Encoding::Xml,
    "mq_sink_attempt"
);
