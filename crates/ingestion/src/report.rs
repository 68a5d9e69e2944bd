//! Outcome of one ingestion run and the shared completion path

use contracts::RecordSender;
use tracing::{debug, error, info};

use crate::error::IngestionError;

/// What a source managed to enqueue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionReport {
    /// Records successfully put on the queue
    pub records: u64,
    /// Failure that ended ingestion early, if any
    pub error: Option<String>,
}

impl IngestionReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Log the outcome, signal end of stream and build the report.
///
/// The end-of-stream item is sent on every path so the dispatcher always
/// terminates. A closed queue is a cooperative stop, not a failure.
pub(crate) async fn complete(
    source: &str,
    sender: &RecordSender,
    records: u64,
    result: crate::Result<()>,
) -> IngestionReport {
    let error = match result {
        Ok(()) => {
            info!(source, records, "Ingestion finished");
            None
        }
        Err(IngestionError::QueueClosed) => {
            info!(source, records, "Dispatch queue closed, ingestion stopped");
            None
        }
        Err(e) => {
            error!(source, records, error = %e, "Ingestion failed");
            Some(e.to_string())
        }
    };

    if sender.finish().await.is_err() {
        debug!(source, "Queue already closed, end-of-stream not sent");
    }

    IngestionReport { records, error }
}
