//! Sink implementations
//!
//! Four simulated destinations behind [`DeliverySink`], plus the [`Sink`]
//! enum the dispatcher runs with in production. New destinations are added
//! by extending the enum.

mod db;
mod grpc;
mod link;
mod macros;
mod mq;
mod rest;

pub use self::db::DbSink;
pub use self::grpc::GrpcSink;
pub use self::link::SimulatedLink;
pub use self::mq::MqSink;
pub use self::rest::RestSink;

use contracts::{
    ContractError, DeliverySink, DestinationId, EncodedPayload, Encoding, FanoutConfig,
    SinkSettings,
};
use tracing::{debug, instrument};

/// Tagged union of the supported destinations
pub enum Sink {
    Rest(RestSink),
    Grpc(GrpcSink),
    Mq(MqSink),
    Db(DbSink),
}

impl Sink {
    /// Build the destination named `name`.
    ///
    /// # Errors
    /// [`ContractError::UnknownDestination`] when `name` has no variant.
    #[instrument(name = "sink_from_settings", skip(settings), fields(rate_limit = settings.rate_limit))]
    pub fn from_settings(name: &str, settings: &SinkSettings) -> Result<Self, ContractError> {
        let burst = settings.burst.unwrap_or(1);
        let tune = |default: SimulatedLink| {
            default.with_overrides(settings.latency_ms, settings.failure_rate)
        };

        let sink = match name {
            RestSink::NAME => Self::Rest(RestSink::with_link(
                settings.rate_limit,
                burst,
                tune(RestSink::DEFAULT_LINK),
            )),
            GrpcSink::NAME => Self::Grpc(GrpcSink::with_link(
                settings.rate_limit,
                burst,
                tune(GrpcSink::DEFAULT_LINK),
            )),
            MqSink::NAME => Self::Mq(MqSink::with_link(
                settings.rate_limit,
                burst,
                tune(MqSink::DEFAULT_LINK),
            )),
            DbSink::NAME => Self::Db(DbSink::with_link(
                settings.rate_limit,
                burst,
                tune(DbSink::DEFAULT_LINK),
            )),
            other => return Err(ContractError::unknown_destination(other)),
        };

        debug!(sink = %name, link = ?sink.link(), "sink created");
        Ok(sink)
    }

    /// Build every configured destination, in name order.
    pub fn from_config(config: &FanoutConfig) -> Result<Vec<Self>, ContractError> {
        config
            .sinks
            .iter()
            .map(|(name, settings)| Self::from_settings(name, settings))
            .collect()
    }

    pub fn link(&self) -> SimulatedLink {
        match self {
            Self::Rest(s) => s.link(),
            Self::Grpc(s) => s.link(),
            Self::Mq(s) => s.link(),
            Self::Db(s) => s.link(),
        }
    }

    pub fn rate_limit(&self) -> u32 {
        match self {
            Self::Rest(s) => s.limiter().rate(),
            Self::Grpc(s) => s.limiter().rate(),
            Self::Mq(s) => s.limiter().rate(),
            Self::Db(s) => s.limiter().rate(),
        }
    }
}

impl DeliverySink for Sink {
    fn destination(&self) -> &DestinationId {
        match self {
            Self::Rest(s) => s.destination(),
            Self::Grpc(s) => s.destination(),
            Self::Mq(s) => s.destination(),
            Self::Db(s) => s.destination(),
        }
    }

    fn encoding(&self) -> Encoding {
        match self {
            Self::Rest(s) => s.encoding(),
            Self::Grpc(s) => s.encoding(),
            Self::Mq(s) => s.encoding(),
            Self::Db(s) => s.encoding(),
        }
    }

    async fn attempt(&self, payload: &EncodedPayload) -> bool {
        match self {
            Self::Rest(s) => s.attempt(payload).await,
            Self::Grpc(s) => s.attempt(payload).await,
            Self::Mq(s) => s.attempt(payload).await,
            Self::Db(s) => s.attempt(payload).await,
        }
    }
}
