//! Unit terminal monitor.
//!
//! One subsystem per unit. Polls the shared [`AlertLifecycle`] on a fixed
//! cadence and reports what that unit's terminal would show.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use threatwatch_core::{AlertLifecycle, UnitCondition, UnitId, UnitStatus};
use tokio::time::{interval, MissedTickBehavior};
use tokio_graceful_shutdown::SubsystemHandle;

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Human-readable UTC timestamp for an epoch-millisecond value
pub fn format_timestamp(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| format!("{} ms", ms))
}

/// Terminal line for a unit status, with the alert's dispatch time
pub fn render_status(status: &UnitStatus) -> String {
    match &status.active {
        Some(alert) => format!("{} @ {}", status, format_timestamp(alert.created_at)),
        None => status.to_string(),
    }
}

pub struct UnitMonitor {
    unit: UnitId,
    alerts: Arc<AlertLifecycle>,
    refresh: Duration,
    /// Last condition reported, to log changes at info and repeats at debug
    last: Option<UnitCondition>,
}

impl UnitMonitor {
    pub fn new(unit: UnitId, alerts: Arc<AlertLifecycle>, refresh: Duration) -> Self {
        UnitMonitor {
            unit,
            alerts,
            refresh,
            last: None,
        }
    }

    /// Take one status reading and report it
    pub fn poll(&mut self, now_ms: u64) -> UnitStatus {
        let status = self.alerts.status(self.unit, now_ms);
        let line = render_status(&status);

        if self.last != Some(status.condition) {
            match status.condition {
                UnitCondition::Alert => warn!("{}", line),
                UnitCondition::Normal => info!("{}", line),
            }
        } else {
            debug!("{}", line);
        }
        self.last = Some(status.condition);
        status
    }

    pub async fn run(
        mut self,
        subsys: SubsystemHandle,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!(
            "UnitMonitor: Watching {} every {:?}",
            self.unit.display_name(),
            self.refresh
        );

        let mut timer = interval(self.refresh);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = subsys.on_shutdown_requested() => {
                    debug!("UnitMonitor: {} shutting down", self.unit);
                    break;
                }
                _ = timer.tick() => {
                    self.poll(now_ms());
                }
            }
        }
        Ok(())
    }
}
