//! DeliverySink trait - dispatcher output interface
//!
//! One implementation per destination. `attempt` is expected to acquire a
//! rate-limit token before doing any I/O, so retries are throttled the same
//! way first attempts are.

use crate::{DestinationId, EncodedPayload, Encoding};

/// Delivery capability of a single destination.
#[trait_variant::make(DeliverySink: Send)]
pub trait LocalDeliverySink {
    /// Destination identity (rate limiting / metrics key)
    fn destination(&self) -> &DestinationId;

    /// Wire encoding this destination expects
    fn encoding(&self) -> Encoding;

    /// Perform one delivery attempt.
    ///
    /// Suspends the calling task until the outcome is known. Returns `true`
    /// on success. Failures are expected and must not panic.
    async fn attempt(&self, payload: &EncodedPayload) -> bool;
}
