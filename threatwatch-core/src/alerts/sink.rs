use std::sync::{Mutex, PoisonError};
use thiserror::Error;

use super::AlertLogEntry;

/// Errors reported by an alert log sink
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// Sink cannot take entries right now (closed, full, offline)
    #[error("Sink unavailable: {0}")]
    Unavailable(String),

    /// Sink refused this entry
    #[error("Entry rejected: {0}")]
    Rejected(String),
}

/// Best-effort write-through target for alert state changes.
///
/// `append` is called while the unit's lock is held, so it must not block:
/// hand the entry off (channel, buffer) and do any slow I/O elsewhere.
pub trait AlertSink: Send + Sync {
    /// Sink name for log messages
    fn name(&self) -> &str;

    fn append(&self, entry: &AlertLogEntry) -> Result<(), SinkError>;
}

/// In-memory sink that keeps every entry it receives
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<AlertLogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AlertLogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AlertSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn append(&self, entry: &AlertLogEntry) -> Result<(), SinkError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.clone());
        Ok(())
    }
}
