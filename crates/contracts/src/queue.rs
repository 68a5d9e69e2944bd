//! Dispatch queue - bounded FIFO between ingestion and the dispatcher
//!
//! `put` suspends while the queue is full, `take` suspends while it is empty.
//! This is the only back-pressure the producer sees.

use async_channel::{bounded, Receiver, Sender};

use crate::{ContractError, Record, StreamItem};

/// Create a bounded dispatch queue.
///
/// # Errors
/// Returns a validation error when `capacity` is zero.
pub fn dispatch_queue(capacity: usize) -> Result<(RecordSender, RecordReceiver), ContractError> {
    if capacity == 0 {
        return Err(ContractError::config_validation(
            "queue.capacity",
            "capacity must be >= 1",
        ));
    }
    let (tx, rx) = bounded(capacity);
    Ok((RecordSender { tx }, RecordReceiver { rx }))
}

/// Producer half of the dispatch queue.
#[derive(Debug, Clone)]
pub struct RecordSender {
    tx: Sender<StreamItem>,
}

impl RecordSender {
    /// Enqueue a record, waiting while the queue is full.
    ///
    /// # Errors
    /// [`ContractError::QueueClosed`] if the consumer is gone.
    pub async fn put(&self, record: Record) -> Result<(), ContractError> {
        self.tx
            .send(StreamItem::Data(record))
            .await
            .map_err(|_| ContractError::QueueClosed)
    }

    /// Signal end of stream. Subject to the same back-pressure as `put`.
    pub async fn finish(&self) -> Result<(), ContractError> {
        self.tx
            .send(StreamItem::End)
            .await
            .map_err(|_| ContractError::QueueClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half of the dispatch queue.
#[derive(Debug)]
pub struct RecordReceiver {
    rx: Receiver<StreamItem>,
}

impl RecordReceiver {
    /// Dequeue the next item, waiting while the queue is empty.
    ///
    /// Returns `None` once every sender has been dropped and the queue is
    /// drained.
    pub async fn take(&self) -> Option<StreamItem> {
        self.rx.recv().await.ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.rx.capacity()
    }

    /// Stop accepting items; pending `put`s fail with `QueueClosed`.
    pub fn close(&self) -> bool {
        self.rx.close()
    }
}
