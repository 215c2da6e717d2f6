use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::{
    Alert, AlertEvent, AlertId, AlertLogEntry, AlertSink, AlertState, Role, UnitCondition,
    UnitId, UnitStatus,
};
use crate::error::EngineError;

/// Per-unit state: the active alert (if any) and its audit history
#[derive(Debug, Default)]
struct UnitSlot {
    active: Option<Alert>,
    history: Vec<AlertLogEntry>,
}

/// One lock per unit
#[derive(Debug, Default)]
struct Slots {
    ground: Mutex<UnitSlot>,
    aircraft: Mutex<UnitSlot>,
}

impl Slots {
    fn get(&self, unit: UnitId) -> &Mutex<UnitSlot> {
        match unit {
            UnitId::Ground => &self.ground,
            UnitId::Aircraft => &self.aircraft,
        }
    }
}

/// Owns every alert record and the append-only alert log.
///
/// All operations take the current time in milliseconds since the Unix epoch;
/// the engine never reads a clock itself.
pub struct AlertLifecycle {
    slots: Slots,
    /// Next alert id (ids start at 1)
    next_id: AtomicU64,
    /// Next log sequence number, shared by all units
    next_seq: AtomicU64,
    /// Time-to-live for unacknowledged alerts; `None` = never expire
    ttl_ms: Option<u64>,
    sink: Option<Arc<dyn AlertSink>>,
}

impl AlertLifecycle {
    /// Create an empty lifecycle. A zero TTL means no expiry.
    pub fn new(ttl: Option<Duration>) -> Self {
        let ttl_ms = ttl
            .map(|d| d.as_millis().min(u64::MAX as u128) as u64)
            .filter(|&ms| ms > 0);
        AlertLifecycle {
            slots: Slots::default(),
            next_id: AtomicU64::new(1),
            next_seq: AtomicU64::new(0),
            ttl_ms,
            sink: None,
        }
    }

    /// Write every state change through to `sink` (best effort)
    pub fn with_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_ms.map(Duration::from_millis)
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Send a notice to `unit`.
    ///
    /// If the unit already has a `SENT` alert it is superseded in place: same
    /// id, new message and timestamp. Either way a log entry is appended.
    pub fn dispatch(&self, unit: UnitId, message: impl Into<String>, now_ms: u64) -> Alert {
        let message = message.into();
        let mut slot = self.lock(unit);
        self.expire_if_stale(&mut slot, now_ms);

        let (event, alert) = match slot.active.as_mut() {
            Some(active) => {
                active.message = message;
                active.created_at = now_ms;
                (AlertEvent::Superseded, active.clone())
            }
            None => {
                let alert = Alert {
                    id: AlertId(self.next_id.fetch_add(1, Ordering::Relaxed)),
                    unit,
                    message,
                    created_at: now_ms,
                    state: AlertState::Sent,
                    acknowledged_at: None,
                };
                slot.active = Some(alert.clone());
                (AlertEvent::Sent, alert)
            }
        };

        info!(
            "Alert {} {} to {}: {}",
            alert.id,
            event,
            unit.display_name(),
            alert.message
        );
        self.record(&mut slot, event, &alert, now_ms);
        alert
    }

    /// Dispatch on behalf of `role`; only the command center may send.
    pub fn dispatch_as(
        &self,
        role: Role,
        unit: UnitId,
        message: impl Into<String>,
        now_ms: u64,
    ) -> Result<Alert, EngineError> {
        if !role.can_dispatch() {
            return Err(EngineError::Forbidden { role, unit });
        }
        Ok(self.dispatch(unit, message, now_ms))
    }

    /// Acknowledge the unit's active alert.
    ///
    /// Fails with [`EngineError::NotFound`] when nothing is pending, leaving
    /// the state as it was.
    pub fn acknowledge(&self, unit: UnitId, now_ms: u64) -> Result<Alert, EngineError> {
        let mut slot = self.lock(unit);
        self.expire_if_stale(&mut slot, now_ms);

        let Some(mut alert) = slot.active.take() else {
            debug!("Acknowledge for {} with no active alert", unit);
            return Err(EngineError::NotFound(unit));
        };
        alert.state = AlertState::Acknowledged;
        alert.acknowledged_at = Some(now_ms);

        info!("Alert {} acknowledged by {}", alert.id, unit.display_name());
        self.record(&mut slot, AlertEvent::Acknowledged, &alert, now_ms);
        Ok(alert)
    }

    /// Acknowledge on behalf of `role`; a unit may only clear its own alert.
    pub fn acknowledge_as(
        &self,
        role: Role,
        unit: UnitId,
        now_ms: u64,
    ) -> Result<Alert, EngineError> {
        if !role.can_acknowledge(unit) {
            return Err(EngineError::Forbidden { role, unit });
        }
        self.acknowledge(unit, now_ms)
    }

    /// Current `SENT` alert for the unit, if any.
    pub fn query(&self, unit: UnitId, now_ms: u64) -> Option<Alert> {
        let mut slot = self.lock(unit);
        self.expire_if_stale(&mut slot, now_ms);
        slot.active.clone()
    }

    /// What the unit's terminal should display
    pub fn status(&self, unit: UnitId, now_ms: u64) -> UnitStatus {
        let active = self.query(unit, now_ms);
        UnitStatus {
            unit,
            condition: if active.is_some() {
                UnitCondition::Alert
            } else {
                UnitCondition::Normal
            },
            active,
        }
    }

    /// Audit history, oldest first. `None` returns every unit's entries
    /// merged in global append order.
    pub fn log(&self, unit: Option<UnitId>) -> Vec<AlertLogEntry> {
        match unit {
            Some(unit) => self.lock(unit).history.clone(),
            None => {
                let mut all: Vec<AlertLogEntry> = UnitId::ALL
                    .iter()
                    .flat_map(|&unit| self.lock(unit).history.clone())
                    .collect();
                all.sort_by_key(|entry| entry.seq);
                all
            }
        }
    }

    /// Apply the TTL to every unit now; returns the alerts that expired.
    pub fn expire_stale(&self, now_ms: u64) -> Vec<Alert> {
        UnitId::ALL
            .iter()
            .filter_map(|&unit| {
                let mut slot = self.lock(unit);
                self.expire_if_stale(&mut slot, now_ms)
            })
            .collect()
    }

    /// Drop every active alert without logging. History is kept.
    pub fn clear(&self) {
        for unit in UnitId::ALL {
            if let Some(alert) = self.lock(unit).active.take() {
                info!("Alert {} for {} cleared", alert.id, unit.display_name());
            }
        }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn lock(&self, unit: UnitId) -> MutexGuard<'_, UnitSlot> {
        // Every critical section leaves the slot consistent, so a poisoned
        // lock still holds valid data.
        self.slots
            .get(unit)
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn expire_if_stale(&self, slot: &mut UnitSlot, now_ms: u64) -> Option<Alert> {
        let ttl_ms = self.ttl_ms?;
        let stale = slot
            .active
            .as_ref()
            .map_or(false, |alert| alert.age_ms(now_ms) > ttl_ms);
        if !stale {
            return None;
        }

        let mut alert = slot.active.take()?;
        alert.state = AlertState::Expired;
        info!(
            "Alert {} for {} expired unacknowledged",
            alert.id,
            alert.unit.display_name()
        );
        self.record(slot, AlertEvent::Expired, &alert, now_ms);
        Some(alert)
    }

    fn record(&self, slot: &mut UnitSlot, event: AlertEvent, alert: &Alert, now_ms: u64) {
        let entry = AlertLogEntry {
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            at: now_ms,
            event,
            alert: alert.clone(),
        };
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.append(&entry) {
                warn!(
                    "Alert sink '{}' dropped entry {} for alert {}: {}",
                    sink.name(),
                    entry.seq,
                    alert.id,
                    e
                );
            }
        }
        slot.history.push(entry);
    }
}

impl Default for AlertLifecycle {
    fn default() -> Self {
        Self::new(None)
    }
}

impl std::fmt::Debug for AlertLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertLifecycle")
            .field("ttl_ms", &self.ttl_ms)
            .field("sink", &self.sink.as_ref().map(|s| s.name().to_string()))
            .finish_non_exhaustive()
    }
}
