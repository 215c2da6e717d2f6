//! Error types for the detection engine

use thiserror::Error;

use crate::alerts::{Role, UnitId};

/// Errors surfaced by engine operations.
///
/// Every kind is recoverable at the caller: report it and carry on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Track is malformed (non-finite coordinates, duplicate or unordered indices)
    #[error("Invalid track: {0}")]
    InvalidTrack(String),

    /// Acknowledge was called with no active alert for the unit
    #[error("No active alert for {0}")]
    NotFound(UnitId),

    /// Step was requested after playback finished
    #[error("Playback finished: step {index} requested on a track of {len} points")]
    OutOfRange { index: usize, len: usize },

    /// Proximity threshold must be finite and strictly positive
    #[error("Invalid proximity threshold: {0} m (must be finite and > 0)")]
    InvalidThreshold(f64),

    /// Role is not allowed to act on this unit's alerts
    #[error("{role} may not act on alerts for {unit}")]
    Forbidden { role: Role, unit: UnitId },
}
