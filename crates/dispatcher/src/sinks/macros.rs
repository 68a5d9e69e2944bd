//! Simulated sink macro
//!
//! Every simulated destination has the same shape: an identity, a token
//! bucket and a link profile. Only the name, default profile, encoding and
//! span name differ.

/// Define a simulated destination.
///
/// # Usage
/// ```ignore
/// define_simulated_sink!(
///     RestSink,                    // type name
///     "rest",                      // destination identity
///     SimulatedLink::new(20, 0.10),// default latency / failure profile
///     Encoding::Json,              // wire encoding
///     "rest_sink_attempt"          // tracing span name
/// );
/// ```
macro_rules! define_simulated_sink {
    (
        $sink_name:ident,
        $destination:literal,
        $default_link:expr,
        $encoding:expr,
        $span:tt
    ) => {
        use contracts::{DeliverySink, DestinationId, EncodedPayload, Encoding};
        use tracing::{instrument, trace};

        use crate::rate_limiter::RateLimiter;
        use crate::sinks::SimulatedLink;

        pub struct $sink_name {
            id: DestinationId,
            limiter: RateLimiter,
            link: SimulatedLink,
        }

        impl $sink_name {
            /// Destination identity
            pub const NAME: &'static str = $destination;

            /// Default latency / failure profile
            pub const DEFAULT_LINK: SimulatedLink = $default_link;

            /// Sink with the default profile and no burst
            pub fn new(rate_limit: u32) -> Self {
                Self::with_link(rate_limit, 1, Self::DEFAULT_LINK)
            }

            pub fn with_link(rate_limit: u32, burst: u32, link: SimulatedLink) -> Self {
                Self {
                    id: DestinationId::new(Self::NAME),
                    limiter: RateLimiter::with_burst(rate_limit, burst),
                    link,
                }
            }

            pub fn link(&self) -> SimulatedLink {
                self.link
            }

            pub fn limiter(&self) -> &RateLimiter {
                &self.limiter
            }
        }

        impl DeliverySink for $sink_name {
            fn destination(&self) -> &DestinationId {
                &self.id
            }

            fn encoding(&self) -> Encoding {
                $encoding
            }

            #[instrument(
                name = $span,
                level = "trace",
                skip(self, payload),
                fields(sink = %self.id, bytes = payload.len())
            )]
            async fn attempt(&self, payload: &EncodedPayload) -> bool {
                self.limiter.acquire().await;
                let ok = self.link.transmit().await;
                trace!(ok, "attempt finished");
                ok
            }
        }
    };
}

pub(crate) use define_simulated_sink;
