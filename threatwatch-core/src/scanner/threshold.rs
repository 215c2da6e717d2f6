use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Default engagement radius in meters
pub const DEFAULT_PROXIMITY_THRESHOLD: f64 = 4500.0;

/// Engagement radius in meters. Always finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ProximityThreshold(f64);

impl ProximityThreshold {
    pub fn new(meters: f64) -> Result<Self, EngineError> {
        if meters.is_finite() && meters > 0.0 {
            Ok(ProximityThreshold(meters))
        } else {
            Err(EngineError::InvalidThreshold(meters))
        }
    }

    pub fn meters(&self) -> f64 {
        self.0
    }

    /// Inclusive boundary: a contact exactly at the threshold is in range
    pub fn contains(&self, distance: f64) -> bool {
        distance <= self.0
    }
}

impl Default for ProximityThreshold {
    fn default() -> Self {
        ProximityThreshold(DEFAULT_PROXIMITY_THRESHOLD)
    }
}

impl TryFrom<f64> for ProximityThreshold {
    type Error = EngineError;

    fn try_from(meters: f64) -> Result<Self, Self::Error> {
        ProximityThreshold::new(meters)
    }
}

impl From<ProximityThreshold> for f64 {
    fn from(threshold: ProximityThreshold) -> Self {
        threshold.0
    }
}

impl std::fmt::Display for ProximityThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} m", self.0)
    }
}
