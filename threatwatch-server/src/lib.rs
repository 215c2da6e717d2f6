//! # Threatwatch Server
//!
//! Command-center process around [`threatwatch_core`].
//!
//! This crate:
//! - Loads a flight track from CSV
//! - Plays it back against a fixed ground observer at a fixed frame rate
//! - Alerts units when the contact enters engagement range
//! - Shows what each unit terminal would display
//! - Appends every alert state change to a JSON-lines log
//! - Takes operator commands (alert, ack, pause, ...) on stdin
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  threatwatch-server                     │
//! │  ┌───────────────┐  ┌─────────────┐  ┌───────────────┐  │
//! │  │ Console       │  │ UnitMonitor │  │ AlertLog      │  │
//! │  │ (stdin)       │  │ (per unit)  │  │ Writer        │  │
//! │  └──┬─────────┬──┘  └──────┬──────┘  └───────▲───────┘  │
//! │     │ mpsc    │ ack/alert  │ status()        │ mpsc     │
//! │     ▼         │            │                 │          │
//! │  ┌──────────┐ │            │                 │          │
//! │  │ Playback │ │            │                 │          │
//! │  │ Scheduler│ │            │                 │          │
//! │  └────┬─────┘ │            │                 │          │
//! │       ▼       ▼            ▼                 │          │
//! │  ┌─────────────────────────────────────────────────────┐│
//! │  │        Arc<AlertLifecycle> + ChannelSink            ││
//! │  └─────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! All subsystems run under `tokio-graceful-shutdown`; Ctrl-C or the end of
//! the track stops them all.
//!
//! ## Example: Starting the Server
//!
//! ```rust,no_run
//! use clap::Parser;
//! use threatwatch_server::{Cli, Session};
//! use tokio_graceful_shutdown::Toplevel;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let args = Cli::parse_from(["threatwatch", "--track", "flight.csv"]);
//!     let session = Session::new(args).unwrap();
//!
//!     Toplevel::new(|s| async move {
//!         session.start(&s).unwrap();
//!     })
//!     .catch_signals()
//!     .handle_shutdown_requests(Duration::from_secs(5))
//!     .await
//!     .unwrap();
//! }
//! ```
//!
//! ## Command-Line Interface
//!
//! See [`Cli`] for all available options. Key options:
//!
//! - `-t, --track` - CSV flight path (required)
//! - `--observer-lat`, `--observer-lon`, `--observer-elevation` - ground position
//! - `--threshold` - engagement radius in meters (default: 4500)
//! - `--auto-alert` - unit to alert on range entry (repeatable)
//! - `--no-console` - ignore stdin
//! - `-v` - Increase verbosity (use multiple times)

use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use threatwatch_core::{
    AlertLifecycle, AlertLogEntry, EngineError, GeoPoint3D, PlaybackDriver, Track, UnitId,
    ViewState,
};
use tokio::sync::mpsc;
use tokio_graceful_shutdown::{SubsystemBuilder, SubsystemHandle};

pub mod alert_log;
pub mod config;
pub mod console;
pub mod monitor;
pub mod scheduler;
pub mod track_source;

use alert_log::{AlertLogWriter, CHANNEL_CAPACITY};
use config::{ConfigError, EngineConfig};
use console::Console;
use monitor::UnitMonitor;
use scheduler::PlaybackScheduler;
use track_source::TrackSourceError;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Clone, Debug)]
#[command(version, about = "Proximity detection and alert lifecycle engine")]
pub struct Cli {
    #[clap(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>,

    /// CSV flight track with latitude_wgs84(deg), longitude_wgs84(deg) and
    /// elevation_wgs84(m) columns
    #[arg(short, long)]
    pub track: PathBuf,

    /// Observer (ground unit) latitude in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub observer_lat: f64,

    /// Observer (ground unit) longitude in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub observer_lon: f64,

    /// Observer elevation in meters
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub observer_elevation: f64,

    /// Engagement radius in meters [default: 4500]
    #[arg(long, allow_negative_numbers = true)]
    pub threshold: Option<f64>,

    /// Seconds before an unacknowledged alert expires, 0 = never [default: 0]
    #[arg(long)]
    pub alert_ttl: Option<u64>,

    /// Delay between playback frames in milliseconds [default: 100]
    #[arg(long)]
    pub frame_delay_ms: Option<u64>,

    /// Unit terminal refresh interval in seconds [default: 30]
    #[arg(long)]
    pub refresh_secs: Option<u64>,

    /// Alert this unit (ground or aircraft) whenever the contact enters range
    #[arg(long = "auto-alert", value_name = "UNIT")]
    pub auto_alert: Vec<UnitId>,

    /// Alert log file (JSON lines) [default: <data dir>/alerts.jsonl]
    #[arg(long, conflicts_with = "no_alert_log")]
    pub alert_log: Option<PathBuf>,

    /// Don't persist alert state changes
    #[arg(long, default_value_t = false)]
    pub no_alert_log: bool,

    /// Don't read operator commands from stdin
    #[arg(long, default_value_t = false)]
    pub no_console: bool,

    /// JSON config file; CLI flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn observer(&self) -> GeoPoint3D {
        GeoPoint3D::new(self.observer_lat, self.observer_lon, self.observer_elevation)
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Cannot load track: {0}")]
    TrackSource(#[from] TrackSourceError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Observer position {0} is not finite")]
    InvalidObserver(GeoPoint3D),
}

/// Everything resolved at startup, ready to run
pub struct Session {
    pub args: Cli,
    pub config: EngineConfig,
    observer: GeoPoint3D,
    track: Arc<Track>,
    alerts: Arc<AlertLifecycle>,
    alert_log: Option<(PathBuf, mpsc::Receiver<AlertLogEntry>)>,
}

impl Session {
    /// Resolve configuration, load the track and build the alert lifecycle
    pub fn new(args: Cli) -> Result<Self, SessionError> {
        let config = EngineConfig::from_cli(&args)?;

        let observer = args.observer();
        if !observer.is_finite() {
            return Err(SessionError::InvalidObserver(observer));
        }

        let track = Arc::new(track_source::load_track(&args.track)?);

        let mut alerts = AlertLifecycle::new(config.alert_ttl());
        let alert_log = match config::alert_log_path(&args)? {
            Some(path) => {
                let (sink, rx) = alert_log::channel(CHANNEL_CAPACITY);
                alerts = alerts.with_sink(Arc::new(sink));
                Some((path, rx))
            }
            None => None,
        };

        let view = ViewState::fit(observer, &track);
        info!(
            "Observer {} | threshold {} | {} track points | view ({:.4}, {:.4}) zoom {}",
            observer,
            config.threshold()?,
            track.len(),
            view.latitude,
            view.longitude,
            view.zoom
        );

        Ok(Session {
            args,
            config,
            observer,
            track,
            alerts: Arc::new(alerts),
            alert_log,
        })
    }

    /// Shared alert state, for callers that outlive the session
    pub fn alerts(&self) -> Arc<AlertLifecycle> {
        self.alerts.clone()
    }

    pub fn track(&self) -> &Arc<Track> {
        &self.track
    }

    pub fn observer(&self) -> GeoPoint3D {
        self.observer
    }

    /// Start the playback, monitor, console and log writer subsystems
    pub fn start(self, subsystem: &SubsystemHandle) -> Result<(), SessionError> {
        let mut driver = PlaybackDriver::new(self.observer, self.config.threshold()?);
        driver.load(self.track.clone())?;

        if let Some((path, rx)) = self.alert_log {
            let writer = AlertLogWriter::new(path, rx);
            subsystem.start(SubsystemBuilder::new("AlertLog", |s| writer.run(s)));
        }

        for unit in UnitId::ALL {
            let monitor =
                UnitMonitor::new(unit, self.alerts.clone(), self.config.refresh_interval());
            let name = match unit {
                UnitId::Ground => "GroundMonitor",
                UnitId::Aircraft => "AircraftMonitor",
            };
            subsystem.start(SubsystemBuilder::new(name, |s| monitor.run(s)));
        }

        let scheduler =
            PlaybackScheduler::new(driver, self.alerts.clone(), self.config.frame_delay())
                .with_auto_alert(self.args.auto_alert);

        if !self.args.no_console {
            let console = Console::new(self.alerts, scheduler.commands());
            let lines = console::spawn_stdin_reader();
            subsystem.start(SubsystemBuilder::new("Console", |s| console.run(lines, s)));
        }

        subsystem.start(SubsystemBuilder::new("Playback", |s| scheduler.run(s)));

        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Session {{ track: {} points, observer: {} }}",
            self.track.len(),
            self.observer
        )
    }
}
