//! Persistent alert log.
//!
//! The engine hands every alert state change to a [`ChannelSink`], which only
//! does a non-blocking `try_send`. The [`AlertLogWriter`] subsystem drains the
//! channel and appends each entry to a JSON-lines file.
//!
//! ```text
//!  AlertLifecycle ──append()──▶ ChannelSink ──mpsc──▶ AlertLogWriter ──▶ alerts.jsonl
//!   (in-memory, locked)          (try_send)            (timeout + retry)
//! ```
//!
//! Writes are bounded by a timeout and retried with exponential backoff. An
//! entry that still can't be written is logged and dropped; the in-memory log
//! stays authoritative.

use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;
use threatwatch_core::{AlertLogEntry, AlertSink, SinkError};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_graceful_shutdown::SubsystemHandle;

/// Entries buffered between the engine and the writer
pub const CHANNEL_CAPACITY: usize = 256;

/// Upper bound for a single append
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Attempts per entry before it is dropped
pub const MAX_ATTEMPTS: u32 = 3;

// =============================================================================
// Channel Sink
// =============================================================================

/// [`AlertSink`] feeding an [`AlertLogWriter`]
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<AlertLogEntry>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<AlertLogEntry>) -> Self {
        ChannelSink { tx }
    }
}

impl AlertSink for ChannelSink {
    fn name(&self) -> &str {
        "alert-log"
    }

    fn append(&self, entry: &AlertLogEntry) -> Result<(), SinkError> {
        self.tx.try_send(entry.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                SinkError::Unavailable("alert log channel full".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => {
                SinkError::Unavailable("alert log writer stopped".to_string())
            }
        })
    }
}

/// Create a connected sink / receiver pair
pub fn channel(capacity: usize) -> (ChannelSink, mpsc::Receiver<AlertLogEntry>) {
    let (tx, rx) = mpsc::channel(capacity);
    (ChannelSink::new(tx), rx)
}

// =============================================================================
// Retry Policy
// =============================================================================

/// Delay before retry number `attempt` (0-based): 1s, 2s, 4s ... max 30s
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let max = Duration::from_secs(30);
    base.saturating_mul(1u32 << attempt.min(5)).min(max)
}

// =============================================================================
// Alert Log Writer
// =============================================================================

/// Subsystem appending alert log entries to a file
pub struct AlertLogWriter {
    path: PathBuf,
    rx: mpsc::Receiver<AlertLogEntry>,
    write_timeout: Duration,
    backoff_base: Duration,
    max_attempts: u32,
}

impl AlertLogWriter {
    pub fn new(path: PathBuf, rx: mpsc::Receiver<AlertLogEntry>) -> Self {
        AlertLogWriter {
            path,
            rx,
            write_timeout: WRITE_TIMEOUT,
            backoff_base: Duration::from_secs(1),
            max_attempts: MAX_ATTEMPTS,
        }
    }

    /// Override the timeout and backoff base
    pub fn with_timing(mut self, write_timeout: Duration, backoff_base: Duration) -> Self {
        self.write_timeout = write_timeout;
        self.backoff_base = backoff_base;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn run(
        mut self,
        subsys: SubsystemHandle,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }
        info!("AlertLogWriter: Writing to {}", self.path.display());

        loop {
            tokio::select! {
                _ = subsys.on_shutdown_requested() => {
                    // Flush whatever was queued before shutdown
                    while let Ok(entry) = self.rx.try_recv() {
                        self.persist(&entry).await;
                    }
                    info!("AlertLogWriter: Shutdown requested");
                    break;
                }
                entry = self.rx.recv() => {
                    match entry {
                        Some(entry) => {
                            self.persist(&entry).await;
                        }
                        None => {
                            debug!("AlertLogWriter: All senders dropped");
                            break;
                        }
                    }
                }
            }
        }

        info!("AlertLogWriter: Finished");
        Ok(())
    }

    /// Write one entry with timeout and retry. Returns false if it was dropped.
    pub async fn persist(&self, entry: &AlertLogEntry) -> bool {
        let line = match entry.to_json_line() {
            Ok(line) => line,
            Err(e) => {
                error!("AlertLogWriter: Cannot serialize entry {}: {}", entry.seq, e);
                return false;
            }
        };

        for attempt in 0..self.max_attempts {
            match tokio::time::timeout(self.write_timeout, append_line(&self.path, &line)).await {
                Ok(Ok(())) => {
                    debug!("AlertLogWriter: Wrote entry {}", entry.seq);
                    return true;
                }
                Ok(Err(e)) => {
                    warn!(
                        "AlertLogWriter: Write of entry {} failed (attempt {}/{}): {}",
                        entry.seq,
                        attempt + 1,
                        self.max_attempts,
                        e
                    );
                }
                Err(_) => {
                    warn!(
                        "AlertLogWriter: Write of entry {} timed out (attempt {}/{})",
                        entry.seq,
                        attempt + 1,
                        self.max_attempts
                    );
                }
            }
            if attempt + 1 < self.max_attempts {
                tokio::time::sleep(backoff_delay(self.backoff_base, attempt)).await;
            }
        }

        error!(
            "AlertLogWriter: Dropping entry {} for alert {} after {} attempts",
            entry.seq, entry.alert.id, self.max_attempts
        );
        false
    }
}

async fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.write_all(b"\n").await?;
    file.flush().await
}
