//! FileSource - one record per line of a UTF-8 text file

use std::path::{Path, PathBuf};

use contracts::{Record, RecordSender};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use crate::error::IngestionError;
use crate::report::{complete, IngestionReport};

/// Line-oriented file source.
///
/// Every line becomes a record, empty lines included. Sequence numbers start
/// at zero and follow file order.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole file into `sender`, then send end-of-stream.
    #[instrument(name = "file_source_ingest", skip(self, sender), fields(path = %self.path.display()))]
    pub async fn ingest(&self, sender: &RecordSender) -> IngestionReport {
        let mut records = 0;
        let result = self.read_into(sender, &mut records).await;
        complete("file", sender, records, result).await
    }

    /// Run [`ingest`](Self::ingest) as its own task
    pub fn spawn(self, sender: RecordSender) -> JoinHandle<IngestionReport> {
        tokio::spawn(async move { self.ingest(&sender).await })
    }

    async fn read_into(&self, sender: &RecordSender, records: &mut u64) -> crate::Result<()> {
        let file = File::open(&self.path)
            .await
            .map_err(|source| IngestionError::Open {
                path: self.path.clone(),
                source,
            })?;
        let mut lines = BufReader::new(file).lines();

        loop {
            let line = lines
                .next_line()
                .await
                .map_err(|source| IngestionError::Read {
                    path: self.path.clone(),
                    line: *records + 1,
                    source,
                })?;
            let Some(line) = line else {
                break;
            };

            sender
                .put(Record::new(*records, line))
                .await
                .map_err(|_| IngestionError::QueueClosed)?;
            *records += 1;
        }

        debug!(records = *records, "Reached end of file");
        Ok(())
    }
}
