use serde::{Deserialize, Serialize};

use super::UnitId;

/// Monotonic alert identifier, unique within one [`super::AlertLifecycle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(pub u64);

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Alert state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertState {
    /// Delivered, awaiting acknowledgment
    Sent,
    /// Acknowledged by the unit
    Acknowledged,
    /// Time-to-live elapsed before acknowledgment
    Expired,
}

impl AlertState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AlertState::Sent)
    }
}

impl std::fmt::Display for AlertState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertState::Sent => write!(f, "SENT"),
            AlertState::Acknowledged => write!(f, "ACKNOWLEDGED"),
            AlertState::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// A threat notice addressed to one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: AlertId,
    pub unit: UnitId,
    pub message: String,
    /// Milliseconds since the Unix epoch of the (latest) dispatch
    pub created_at: u64,
    pub state: AlertState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<u64>,
}

impl Alert {
    /// Milliseconds elapsed since dispatch, saturating at zero
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_at)
    }
}

/// What happened to an alert in a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertEvent {
    /// New alert created
    Sent,
    /// Active alert replaced by a newer dispatch (same id)
    Superseded,
    Acknowledged,
    Expired,
}

impl std::fmt::Display for AlertEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertEvent::Sent => write!(f, "sent"),
            AlertEvent::Superseded => write!(f, "superseded"),
            AlertEvent::Acknowledged => write!(f, "acknowledged"),
            AlertEvent::Expired => write!(f, "expired"),
        }
    }
}

/// Immutable audit record: the alert as it was right after `event`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertLogEntry {
    /// Global append order across all units
    pub seq: u64,
    /// Milliseconds since the Unix epoch when the change happened
    pub at: u64,
    pub event: AlertEvent,
    pub alert: Alert,
}

impl AlertLogEntry {
    /// Single-line JSON, as written to persistent logs
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Condition shown on a unit terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitCondition {
    Normal,
    Alert,
}

/// Snapshot of a unit's alert situation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitStatus {
    pub unit: UnitId,
    pub condition: UnitCondition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<Alert>,
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.active {
            Some(alert) => write!(
                f,
                "{}: HIGH ALERT {} \"{}\" - ACTION REQUIRED",
                self.unit.display_name(),
                alert.id,
                alert.message
            ),
            None => write!(
                f,
                "{}: NO THREAT - MAINTAIN POSITION",
                self.unit.display_name()
            ),
        }
    }
}
