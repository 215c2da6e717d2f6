use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Addressable alert recipient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitId {
    Ground,
    Aircraft,
}

impl UnitId {
    /// Every addressable unit
    pub const ALL: [UnitId; 2] = [UnitId::Ground, UnitId::Aircraft];

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitId::Ground => "ground",
            UnitId::Aircraft => "aircraft",
        }
    }

    /// Terminal title, e.g. "GROUND UNIT"
    pub fn display_name(&self) -> &'static str {
        match self {
            UnitId::Ground => "GROUND UNIT",
            UnitId::Aircraft => "AIRCRAFT",
        }
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown unit '{0}' (expected 'ground' or 'aircraft')")]
pub struct ParseUnitError(pub String);

impl FromStr for UnitId {
    type Err = ParseUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ground" | "ground_unit" | "ground-unit" => Ok(UnitId::Ground),
            "aircraft" => Ok(UnitId::Aircraft),
            other => Err(ParseUnitError(other.to_string())),
        }
    }
}

/// Caller identity, supplied by the session layer.
///
/// The command center observes and dispatches; it is never an alert target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    CommandCenter,
    Unit(UnitId),
}

impl Role {
    /// Only the command center sends notices
    pub fn can_dispatch(&self) -> bool {
        matches!(self, Role::CommandCenter)
    }

    /// Units acknowledge their own alerts and nobody else's
    pub fn can_acknowledge(&self, unit: UnitId) -> bool {
        match self {
            Role::CommandCenter => false,
            Role::Unit(own) => *own == unit,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::CommandCenter => "COMMAND CENTER",
            Role::Unit(unit) => unit.display_name(),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_parse() {
        assert_eq!("ground".parse::<UnitId>(), Ok(UnitId::Ground));
        assert_eq!("ground_unit".parse::<UnitId>(), Ok(UnitId::Ground));
        assert_eq!(" Aircraft ".parse::<UnitId>(), Ok(UnitId::Aircraft));
        assert_eq!(
            "command_center".parse::<UnitId>(),
            Err(ParseUnitError("command_center".to_string()))
        );
    }

    #[test]
    fn test_role_permissions() {
        let cc = Role::CommandCenter;
        assert!(cc.can_dispatch());
        assert!(!cc.can_acknowledge(UnitId::Ground));

        let ground = Role::Unit(UnitId::Ground);
        assert!(!ground.can_dispatch());
        assert!(ground.can_acknowledge(UnitId::Ground));
        assert!(!ground.can_acknowledge(UnitId::Aircraft));
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Role::CommandCenter.to_string(), "COMMAND CENTER");
        assert_eq!(Role::Unit(UnitId::Ground).to_string(), "GROUND UNIT");
        assert_eq!(UnitId::Aircraft.to_string(), "aircraft");
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&UnitId::Ground).unwrap(), "\"ground\"");
        assert_eq!(
            serde_json::to_string(&Role::CommandCenter).unwrap(),
            "\"commandCenter\""
        );
        assert_eq!(
            serde_json::to_string(&Role::Unit(UnitId::Aircraft)).unwrap(),
            "{\"unit\":\"aircraft\"}"
        );
    }
}
