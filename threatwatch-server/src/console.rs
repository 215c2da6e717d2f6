//! Operator console.
//!
//! Line commands read from stdin, covering what the command-center and unit
//! terminals do by hand:
//!
//! | Command | Effect |
//! |---------|--------|
//! | `alert <unit> [message]` | command center dispatches to a unit |
//! | `ack <unit>` | the unit acknowledges its own alert |
//! | `status` | print both unit terminals |
//! | `clear` | drop every active alert (log kept) |
//! | `pause`, `resume`, `reset` | playback control |
//! | `quit` | stop the process |
//!
//! Stdin is read on a plain thread and forwarded over a channel, so a pending
//! read never holds up runtime shutdown.

use log::{debug, info, warn};
use std::io::BufRead;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use threatwatch_core::alerts::ParseUnitError;
use threatwatch_core::{AlertLifecycle, EngineError, Role, UnitId};
use tokio::sync::mpsc;
use tokio_graceful_shutdown::SubsystemHandle;

use crate::monitor::{now_ms, render_status};
use crate::scheduler::PlaybackCommand;

/// Message used by `alert <unit>` without text
pub const DEFAULT_ALERT_MESSAGE: &str = "THREAT DETECTED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Alert { unit: UnitId, message: String },
    Acknowledge(UnitId),
    Status,
    Clear,
    Playback(PlaybackCommand),
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command '{0}' (try alert, ack, status, clear, pause, resume, reset, quit)")]
    Unknown(String),

    #[error("'{0}' needs a unit (ground or aircraft)")]
    MissingUnit(&'static str),

    #[error(transparent)]
    Unit(#[from] ParseUnitError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Playback scheduler is not accepting commands")]
    PlaybackUnavailable,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "alert" => {
                let (unit, message) = unit_arg(rest, "alert")?;
                let message = if message.is_empty() {
                    DEFAULT_ALERT_MESSAGE.to_string()
                } else {
                    message.to_string()
                };
                Ok(Command::Alert { unit, message })
            }
            "ack" | "acknowledge" => Ok(Command::Acknowledge(unit_arg(rest, "ack")?.0)),
            "status" => Ok(Command::Status),
            "clear" => Ok(Command::Clear),
            "pause" => Ok(Command::Playback(PlaybackCommand::Pause)),
            "resume" | "start" => Ok(Command::Playback(PlaybackCommand::Resume)),
            "reset" => Ok(Command::Playback(PlaybackCommand::Reset)),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Leading unit argument and whatever follows it
fn unit_arg<'a>(rest: &'a str, command: &'static str) -> Result<(UnitId, &'a str), CommandError> {
    let (unit, tail) = match rest.split_once(char::is_whitespace) {
        Some((unit, tail)) => (unit, tail.trim()),
        None => (rest, ""),
    };
    if unit.is_empty() {
        return Err(CommandError::MissingUnit(command));
    }
    Ok((unit.parse()?, tail))
}

/// Forward stdin lines to a channel from a detached thread
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Console: stdin read failed: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

pub struct Console {
    alerts: Arc<AlertLifecycle>,
    tx_playback: mpsc::Sender<PlaybackCommand>,
}

impl Console {
    pub fn new(alerts: Arc<AlertLifecycle>, tx_playback: mpsc::Sender<PlaybackCommand>) -> Self {
        Console {
            alerts,
            tx_playback,
        }
    }

    /// Carry out one command. Returns the line to show the operator.
    pub fn execute(&self, command: Command, now_ms: u64) -> Result<String, CommandError> {
        match command {
            Command::Alert { unit, message } => {
                let alert = self
                    .alerts
                    .dispatch_as(Role::CommandCenter, unit, message, now_ms)?;
                Ok(format!(
                    "ALERT SENT TO {} ({})",
                    unit.display_name(),
                    alert.id
                ))
            }
            Command::Acknowledge(unit) => {
                let alert = self.alerts.acknowledge_as(Role::Unit(unit), unit, now_ms)?;
                Ok(format!(
                    "{} ACKNOWLEDGED ALERT {}",
                    unit.display_name(),
                    alert.id
                ))
            }
            Command::Status => Ok(UnitId::ALL
                .iter()
                .map(|&unit| render_status(&self.alerts.status(unit, now_ms)))
                .collect::<Vec<_>>()
                .join("\n")),
            Command::Clear => {
                self.alerts.clear();
                Ok("ALL ALERTS CLEARED".to_string())
            }
            Command::Playback(command) => {
                self.tx_playback
                    .try_send(command)
                    .map_err(|_| CommandError::PlaybackUnavailable)?;
                Ok(format!("PLAYBACK {}", command.to_string().to_uppercase()))
            }
            Command::Quit => Ok("SHUTTING DOWN".to_string()),
        }
    }

    pub async fn run(
        self,
        mut rx_lines: mpsc::Receiver<String>,
        subsys: SubsystemHandle,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!("Console: Ready for commands");

        loop {
            tokio::select! {
                _ = subsys.on_shutdown_requested() => {
                    debug!("Console: Shutdown requested");
                    break;
                }
                line = rx_lines.recv() => {
                    let Some(line) = line else {
                        debug!("Console: Input closed");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    let command = match line.parse::<Command>() {
                        Ok(command) => command,
                        Err(e) => {
                            warn!("Console: {}", e);
                            continue;
                        }
                    };
                    let quit = command == Command::Quit;
                    match self.execute(command, now_ms()) {
                        Ok(reply) => info!("{}", reply),
                        Err(e) => warn!("Console: {}", e),
                    }
                    if quit {
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
    use std::time::Duration;
    use crate::scheduler::PlaybackScheduler;
    use threatwatch_core::{
        AlertEvent, GeoPoint3D, PlaybackDriver, ProximityThreshold, Track, UnitCondition,
    };
    use tokio_graceful_shutdown::{SubsystemBuilder, Toplevel};

    fn console() -> (Console, Arc<AlertLifecycle>, mpsc::Receiver<PlaybackCommand>) {
        let alerts = Arc::new(AlertLifecycle::default());
        let (tx, rx) = mpsc::channel(4);
        (Console::new(alerts.clone(), tx), alerts, rx)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "alert ground Take cover now".parse::<Command>(),
            Ok(Command::Alert {
                unit: UnitId::Ground,
                message: "Take cover now".to_string()
            })
        );
        assert_eq!(
            "ALERT aircraft".parse::<Command>(),
            Ok(Command::Alert {
                unit: UnitId::Aircraft,
                message: DEFAULT_ALERT_MESSAGE.to_string()
            })
        );
        assert_eq!(
            "  ack ground_unit ".parse::<Command>(),
            Ok(Command::Acknowledge(UnitId::Ground))
        );
        assert_eq!(
            "pause".parse::<Command>(),
            Ok(Command::Playback(PlaybackCommand::Pause))
        );
        assert_eq!("quit".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!(
            "ack".parse::<Command>(),
            Err(CommandError::MissingUnit("ack"))
        );
        assert!(matches!(
            "ack hq".parse::<Command>(),
            Err(CommandError::Unit(_))
        ));
        assert!(matches!(
            "launch".parse::<Command>(),
            Err(CommandError::Unknown(_))
        ));
    }

    #[test]
    fn test_alert_then_acknowledge_clears_status() {
        let (console, alerts, _rx) = console();
        let cmd = |line: &str| line.parse::<Command>().unwrap();

        console.execute(cmd("alert aircraft Break left"), 1_000).unwrap();
        assert_eq!(
            alerts.status(UnitId::Aircraft, 1_500).condition,
            UnitCondition::Alert
        );

        console.execute(cmd("ack aircraft"), 2_000).unwrap();
        assert_eq!(
            alerts.status(UnitId::Aircraft, 2_500).condition,
            UnitCondition::Normal
        );

        // Nothing left to acknowledge
        assert_eq!(
            console.execute(cmd("ack aircraft"), 3_000),
            Err(CommandError::Engine(EngineError::NotFound(UnitId::Aircraft)))
        );
    }

    #[test]
    fn test_status_lists_both_units() {
        let (console, _alerts, _rx) = console();
        let reply = console.execute(Command::Status, 0).unwrap();
        assert_eq!(
            reply,
            "GROUND UNIT: NO THREAT - MAINTAIN POSITION\nAIRCRAFT: NO THREAT - MAINTAIN POSITION"
        );
    }

    #[test]
    fn test_playback_commands_are_forwarded() {
        let (console, _alerts, mut rx) = console();
        console
            .execute(Command::Playback(PlaybackCommand::Pause), 0)
            .unwrap();
        assert_eq!(rx.try_recv(), Ok(PlaybackCommand::Pause));

        drop(rx);
        assert_eq!(
            console.execute(Command::Playback(PlaybackCommand::Reset), 0),
            Err(CommandError::PlaybackUnavailable)
        );
    }

    #[tokio::test]
    async fn test_run_drives_alerts_and_playback() {
        let mut driver = PlaybackDriver::new(
            GeoPoint3D::new(28.6, 77.2, 0.0),
            ProximityThreshold::default(),
        );
        driver
            .load(Track::from_positions(
                [6000.0, 5000.0, 4000.0].map(|e| GeoPoint3D::new(28.6, 77.2, e)),
            ))
            .unwrap();
        let alerts = Arc::new(AlertLifecycle::default());
        let mut sched = PlaybackScheduler::new(driver, alerts.clone(), Duration::from_millis(1));
        sched.apply(PlaybackCommand::Resume);
        assert!(sched.tick(0).is_some());

        let console = Console::new(alerts.clone(), sched.commands());
        let (tx_lines, rx_lines) = mpsc::channel(8);
        for line in [
            "alert ground Inbound",
            "bogus",
            "",
            "ack aircraft",
            "ack ground",
            "pause",
            "quit",
        ] {
            tx_lines.send(line.to_string()).await.unwrap();
        }

        Toplevel::new(move |s| async move {
            s.start(SubsystemBuilder::new("Console", |a| console.run(rx_lines, a)));
        })
        .handle_shutdown_requests(Duration::from_secs(5))
        .await
        .unwrap();

        let events: Vec<_> = alerts
            .log(Some(UnitId::Ground))
            .iter()
            .map(|e| e.event)
            .collect();
        assert_eq!(events, vec![AlertEvent::Sent, AlertEvent::Acknowledged]);
        assert_eq!(
            alerts.status(UnitId::Ground, now_ms()).condition,
            UnitCondition::Normal
        );

        // Paused before the next beat: no more frames
        assert!(sched.tick(1).is_none());
        assert!(sched.tick(2).is_none());
        assert_eq!(sched.driver().progress(), (1, 3));
        drop(tx_lines);
    }
}
