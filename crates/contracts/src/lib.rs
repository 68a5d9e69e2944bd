//! # Contracts
//!
//! Interface contracts shared by every crate in the workspace: the record
//! model, the dispatch queue, the delivery capability trait, payload
//! encodings and the configuration blueprint.
//!
//! Business crates depend on this crate only; reverse dependencies are
//! prohibited.

mod config;
mod destination;
mod encoding;
mod error;
mod queue;
mod record;
mod sink;

pub use config::*;
pub use destination::DestinationId;
pub use encoding::*;
pub use error::*;
pub use queue::{dispatch_queue, RecordReceiver, RecordSender};
pub use record::{Record, StreamItem};
pub use sink::{DeliverySink, LocalDeliverySink};
