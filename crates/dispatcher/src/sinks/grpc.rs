//! GrpcSink - streaming RPC destination (protobuf frames)

use super::macros::define_simulated_sink;

define_simulated_sink!(
    GrpcSink,
    "grpc",
    SimulatedLink::new(15, 0.10),
    Encoding::Protobuf,
    "grpc_sink_attempt"
);
