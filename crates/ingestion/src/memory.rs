//! VecSource - in-memory lines, mostly for tests and demos

use contracts::{Record, RecordSender};
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::error::IngestionError;
use crate::report::{complete, IngestionReport};

#[derive(Debug, Clone, Default)]
pub struct VecSource {
    lines: Vec<String>,
}

impl VecSource {
    pub fn new<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Put every line on the queue in order, then send end-of-stream.
    #[instrument(name = "vec_source_ingest", skip(self, sender), fields(lines = self.lines.len()))]
    pub async fn ingest(self, sender: &RecordSender) -> IngestionReport {
        let mut records = 0;
        let mut result = Ok(());
        for line in self.lines {
            if sender.put(Record::new(records, line)).await.is_err() {
                result = Err(IngestionError::QueueClosed);
                break;
            }
            records += 1;
        }
        complete("memory", sender, records, result).await
    }

    pub fn spawn(self, sender: RecordSender) -> JoinHandle<IngestionReport> {
        tokio::spawn(async move { self.ingest(&sender).await })
    }
}
