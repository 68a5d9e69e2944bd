//! Record - one unit of ingested data
//!
//! Records flow through the dispatch queue wrapped in [`StreamItem`], which
//! carries the end-of-stream signal out of band so no payload value has to be
//! reserved for it.

use std::fmt;
use std::sync::Arc;

/// Immutable ingested record.
///
/// Cloning is O(1); every delivery task of a fan-out shares the same payload.
#[derive(Clone, PartialEq, Eq)]
pub struct Record {
    /// Arrival order assigned by the producer
    pub seq: u64,
    /// Raw payload (one source line)
    pub payload: Arc<str>,
}

impl Record {
    pub fn new(seq: u64, payload: impl Into<Arc<str>>) -> Self {
        Self {
            seq,
            payload: payload.into(),
        }
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("seq", &self.seq)
            .field("len", &self.payload.len())
            .finish()
    }
}

/// Item carried by the dispatch queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem {
    /// A record to fan out
    Data(Record),
    /// Producer finished; never dispatched to any destination
    End,
}

impl StreamItem {
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_payload() {
        let record = Record::new(7, "payload");
        let copy = record.clone();
        assert!(Arc::ptr_eq(&record.payload, &copy.payload));
        assert_eq!(copy.seq, 7);
    }

    #[test]
    fn test_end_is_distinct_from_any_payload() {
        // "EOF" is ordinary data, not a terminator
        let item = StreamItem::Data(Record::new(0, "EOF"));
        assert!(!item.is_end());
        assert!(StreamItem::End.is_end());
    }
}
