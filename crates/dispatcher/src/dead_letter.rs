//! Dead-letter collector
//!
//! Append-only, in-memory. One entry per (record, destination) pair that
//! exhausted its retries; entries do not say which destination failed.

use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::Record;

#[derive(Debug, Default)]
pub struct DeadLetterCollector {
    entries: Mutex<Vec<Record>>,
}

impl DeadLetterCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, record: Record) {
        self.lock().push(record);
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the current entries, in append order
    pub fn entries(&self) -> Vec<Record> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Record>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
