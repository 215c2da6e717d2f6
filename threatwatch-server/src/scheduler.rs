//! Playback scheduler.
//!
//! Owns the [`PlaybackDriver`] and calls `step()` on a fixed frame cadence.
//! Every frame is published on a broadcast channel for whatever renders it.
//! On a CLEAR -> IN_RANGE transition the configured units are alerted once;
//! staying in range never re-alerts. When the track is exhausted the
//! scheduler asks the whole process to shut down.
//!
//! Operator commands (pause, resume, reset) arrive on an mpsc channel and are
//! applied at the start of the next beat.

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use threatwatch_core::{AlertLifecycle, Frame, PlaybackDriver, UnitId, ViewState};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tokio_graceful_shutdown::SubsystemHandle;

use crate::monitor::now_ms;

/// Frames buffered for slow subscribers before they start lagging
pub const FRAME_CHANNEL_CAPACITY: usize = 64;

/// Commands queued per beat before the sender has to back off
pub const COMMAND_CHANNEL_CAPACITY: usize = 16;

/// Operator control of the playback driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Pause,
    Resume,
    /// Rewind to the first point, STOPPED; alerts are left alone
    Reset,
}

impl std::fmt::Display for PlaybackCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackCommand::Pause => write!(f, "pause"),
            PlaybackCommand::Resume => write!(f, "resume"),
            PlaybackCommand::Reset => write!(f, "reset"),
        }
    }
}

/// Message sent to auto-alerted units
pub fn alert_message(frame: &Frame) -> String {
    format!("AIRCRAFT IN RANGE ({:.2} m)", frame.distance)
}

pub struct PlaybackScheduler {
    driver: PlaybackDriver,
    alerts: Arc<AlertLifecycle>,
    auto_alert: Vec<UnitId>,
    frame_delay: Duration,
    view: ViewState,
    tx_frames: broadcast::Sender<Frame>,
    tx_commands: mpsc::Sender<PlaybackCommand>,
    rx_commands: mpsc::Receiver<PlaybackCommand>,
}

impl PlaybackScheduler {
    pub fn new(driver: PlaybackDriver, alerts: Arc<AlertLifecycle>, frame_delay: Duration) -> Self {
        let (tx_frames, _) = broadcast::channel(FRAME_CHANNEL_CAPACITY);
        let (tx_commands, rx_commands) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let view = ViewState::fit(driver.observer(), driver.track());
        PlaybackScheduler {
            driver,
            alerts,
            auto_alert: Vec::new(),
            frame_delay,
            view,
            tx_frames,
            tx_commands,
            rx_commands,
        }
    }

    /// Units to alert whenever the contact enters range
    pub fn with_auto_alert(mut self, units: Vec<UnitId>) -> Self {
        self.auto_alert = units;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.tx_frames.subscribe()
    }

    pub fn driver(&self) -> &PlaybackDriver {
        &self.driver
    }

    /// Handle for sending operator commands to this scheduler
    pub fn commands(&self) -> mpsc::Sender<PlaybackCommand> {
        self.tx_commands.clone()
    }

    pub fn apply(&mut self, command: PlaybackCommand) {
        info!("Playback command: {}", command);
        match command {
            PlaybackCommand::Pause => self.driver.pause(),
            PlaybackCommand::Resume => self.driver.start(),
            PlaybackCommand::Reset => self.driver.reset(),
        }
    }

    /// Map camera, following the most recent frame
    pub fn view(&self) -> ViewState {
        self.view
    }

    /// One scheduler beat: apply queued commands, sweep expired alerts, then
    /// step if running.
    pub fn tick(&mut self, now_ms: u64) -> Option<Frame> {
        while let Ok(command) = self.rx_commands.try_recv() {
            self.apply(command);
        }

        for alert in self.alerts.expire_stale(now_ms) {
            debug!("Swept expired alert {} for {}", alert.id, alert.unit);
        }

        if !self.driver.is_running() {
            return None;
        }

        let frame = match self.driver.step() {
            Ok(Some(frame)) => frame,
            Ok(None) => return None,
            Err(e) => {
                warn!("Playback step failed: {}", e);
                return None;
            }
        };

        self.view = self.view.centered_on(frame.point.position);

        if frame.entered_range() {
            info!("Contact entered range: {}", frame);
            let message = alert_message(&frame);
            for &unit in &self.auto_alert {
                self.alerts.dispatch(unit, message.clone(), now_ms);
            }
        }

        if self.tx_frames.send(frame).is_err() {
            debug!("No frame subscribers");
        }
        Some(frame)
    }

    pub async fn run(
        mut self,
        subsys: SubsystemHandle,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let (_, total) = self.driver.progress();
        info!(
            "PlaybackScheduler: {} frames every {:?}, view centre ({:.4}, {:.4}) zoom {}",
            total, self.frame_delay, self.view.latitude, self.view.longitude, self.view.zoom
        );

        self.driver.start();
        let mut timer = interval(self.frame_delay);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = subsys.on_shutdown_requested() => {
                    info!("PlaybackScheduler: Shutdown requested");
                    break;
                }
                _ = timer.tick() => {
                    self.tick(now_ms());
                    if self.driver.is_finished() {
                        info!("PlaybackScheduler: Playback finished");
                        subsys.request_shutdown();
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use threatwatch_core::{AlertEvent, GeoPoint3D, ProximityThreshold, RangeState, Track};

    fn scheduler(elevations: &[f64], auto_alert: Vec<UnitId>) -> PlaybackScheduler {
        let mut driver = PlaybackDriver::new(
            GeoPoint3D::new(28.6, 77.2, 0.0),
            ProximityThreshold::default(),
        );
        driver
            .load(Track::from_positions(
                elevations.iter().map(|&e| GeoPoint3D::new(28.6, 77.2, e)),
            ))
            .unwrap();
        PlaybackScheduler::new(
            driver,
            Arc::new(AlertLifecycle::default()),
            Duration::from_millis(1),
        )
        .with_auto_alert(auto_alert)
    }

    #[test]
    fn test_tick_does_nothing_until_started() {
        let mut sched = scheduler(&[6000.0], vec![]);
        assert!(sched.tick(0).is_none());
        assert_eq!(sched.driver().progress(), (0, 1));
    }

    #[test]
    fn test_auto_alert_is_edge_triggered() {
        let mut sched = scheduler(
            &[6000.0, 4000.0, 3000.0, 2000.0, 5000.0, 4400.0],
            vec![UnitId::Ground, UnitId::Aircraft],
        );
        let alerts = sched.alerts.clone();
        sched.driver.start();

        let mut t = 0;
        while !sched.driver().is_finished() {
            t += 100;
            sched.tick(t);
        }

        // Two entries into range, each alerting both units once
        let ground = alerts.log(Some(UnitId::Ground));
        let events: Vec<_> = ground.iter().map(|e| e.event).collect();
        assert_eq!(events, vec![AlertEvent::Sent, AlertEvent::Superseded]);
        assert_eq!(ground[0].alert.message, "AIRCRAFT IN RANGE (4000.00 m)");
        assert_eq!(ground[1].alert.message, "AIRCRAFT IN RANGE (4400.00 m)");
        assert_eq!(alerts.log(Some(UnitId::Aircraft)).len(), 2);
    }

    #[test]
    fn test_frames_are_broadcast() {
        let mut sched = scheduler(&[6000.0, 4000.0], vec![]);
        let mut rx = sched.subscribe();
        sched.driver.start();

        sched.tick(0);
        sched.tick(1);

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first.state, RangeState::Clear);
        assert_eq!(second.state, RangeState::InRange);
        assert!(sched.driver().is_finished());
        assert!(sched.tick(2).is_none());
    }

    #[test]
    fn test_view_follows_contact() {
        let mut sched = scheduler(&[6000.0], vec![]);
        sched.driver.start();
        sched.tick(0);
        assert_eq!(sched.view().latitude, 28.6);
        assert_eq!(sched.view().longitude, 77.2);
    }

    #[tokio::test]
    async fn test_run_shuts_down_when_finished() {
        use tokio_graceful_shutdown::{SubsystemBuilder, Toplevel};

        let sched = scheduler(&[6000.0, 4000.0, 5000.0], vec![UnitId::Ground]);
        let alerts = sched.alerts.clone();
        let mut rx = sched.subscribe();

        Toplevel::new(move |s| async move {
            s.start(SubsystemBuilder::new("Playback", |a| sched.run(a)));
        })
        .handle_shutdown_requests(Duration::from_secs(5))
        .await
        .unwrap();

        let mut frames = 0;
        while rx.try_recv().is_ok() {
            frames += 1;
        }
        assert_eq!(frames, 3);
        assert!(alerts.query(UnitId::Ground, now_ms()).is_some());
    }

    #[test]
    fn test_commands_pause_resume_reset() {
        let mut sched = scheduler(&[6000.0, 5000.0, 4000.0], vec![]);
        let commands = sched.commands();
        sched.driver.start();
        assert!(sched.tick(0).is_some());

        commands.try_send(PlaybackCommand::Pause).unwrap();
        assert!(sched.tick(1).is_none());
        assert!(sched.tick(2).is_none());
        assert_eq!(sched.driver().progress(), (1, 3));

        commands.try_send(PlaybackCommand::Resume).unwrap();
        assert_eq!(sched.tick(3).unwrap().frame, 1);

        commands.try_send(PlaybackCommand::Reset).unwrap();
        assert!(sched.tick(4).is_none());
        assert_eq!(sched.driver().progress(), (0, 3));

        commands.try_send(PlaybackCommand::Resume).unwrap();
        assert_eq!(sched.tick(5).unwrap().frame, 0);
    }
}
