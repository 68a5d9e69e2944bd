//! Dispatcher error types

use thiserror::Error;

/// Wiring errors raised before any record is dispatched
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    #[error("dispatcher requires at least one sink")]
    NoSinks,

    /// Two sinks share a destination id
    #[error("duplicate sink destination '{name}'")]
    DuplicateSink { name: String },

    #[error("worker count must be >= 1")]
    InvalidWorkerCount,

    /// Contract-level failure (config, encoding lookup)
    #[error("contract error: {0}")]
    Contract(#[from] contracts::ContractError),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn duplicate_sink(name: impl Into<String>) -> Self {
        Self::DuplicateSink { name: name.into() }
    }
}
