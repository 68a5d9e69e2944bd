//! # Ingestion
//!
//! Record sources feeding the dispatch queue.
//!
//! Responsibilities:
//! - Turn an input stream into sequenced `Record`s
//! - Respect queue back-pressure (`put` waits while full)
//! - Always terminate the stream with end-of-stream, even on failure
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::dispatch_queue;
//! use ingestion::FileSource;
//!
//! let (tx, rx) = dispatch_queue(100)?;
//! let ingestion = FileSource::new("data.txt").spawn(tx);
//! // hand `rx` to the dispatcher
//! let report = ingestion.await?;
//! ```

mod error;
mod file;
mod memory;
mod report;

pub use error::{IngestionError, Result};
pub use file::FileSource;
pub use memory::VecSource;
pub use report::IngestionReport;
