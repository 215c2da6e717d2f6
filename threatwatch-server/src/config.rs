//! Process-wide engine configuration.
//!
//! Values are resolved once at startup, in order:
//! built-in defaults, then the optional `--config` JSON file, then CLI flags.
//! Nothing changes them afterwards.
//!
//! Default alert log path: `~/.local/share/threatwatch/alerts.jsonl`

use directories::ProjectDirs;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use threatwatch_core::{EngineError, ProximityThreshold};

use crate::Cli;

/// File name of the alert log inside the data directory
pub const ALERT_LOG_FILE: &str = "alerts.jsonl";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Threshold(#[from] EngineError),

    #[error("No home directory found to store the alert log; use --alert-log")]
    NoDataDir,
}

/// Platform directories for this application
pub fn get_project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "threatwatch", "threatwatch")
}

/// Engine settings fixed at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Engagement radius in meters
    pub proximity_threshold_meters: f64,
    /// Unacknowledged alerts expire after this many seconds (0 = never)
    pub alert_ttl_seconds: u64,
    /// Delay between playback frames
    pub frame_delay_ms: u64,
    /// How often unit terminals refresh their status
    pub refresh_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            proximity_threshold_meters: threatwatch_core::scanner::DEFAULT_PROXIMITY_THRESHOLD,
            alert_ttl_seconds: 0,
            frame_delay_ms: 100,
            refresh_secs: 30,
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file; missing fields keep their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config: EngineConfig =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Parse {
                path: path.to_owned(),
                source,
            })?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Resolve defaults, config file and CLI overrides into a validated config
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(threshold) = cli.threshold {
            config.proximity_threshold_meters = threshold;
        }
        if let Some(ttl) = cli.alert_ttl {
            config.alert_ttl_seconds = ttl;
        }
        if let Some(delay) = cli.frame_delay_ms {
            config.frame_delay_ms = delay;
        }
        if let Some(refresh) = cli.refresh_secs {
            config.refresh_secs = refresh;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.threshold()?;
        if self.frame_delay_ms == 0 {
            return Err(ConfigError::Invalid(
                "frameDelayMs must be greater than 0".to_string(),
            ));
        }
        if self.refresh_secs == 0 {
            return Err(ConfigError::Invalid(
                "refreshSecs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn threshold(&self) -> Result<ProximityThreshold, ConfigError> {
        Ok(ProximityThreshold::new(self.proximity_threshold_meters)?)
    }

    /// `None` when alerts never expire
    pub fn alert_ttl(&self) -> Option<Duration> {
        (self.alert_ttl_seconds > 0).then(|| Duration::from_secs(self.alert_ttl_seconds))
    }

    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.frame_delay_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }
}

/// Where to write the alert log, or `None` when disabled
pub fn alert_log_path(cli: &Cli) -> Result<Option<PathBuf>, ConfigError> {
    if cli.no_alert_log {
        return Ok(None);
    }
    if let Some(path) = &cli.alert_log {
        return Ok(Some(path.clone()));
    }
    let project_dirs = get_project_dirs().ok_or(ConfigError::NoDataDir)?;
    let mut path = project_dirs.data_dir().to_owned();
    path.push(ALERT_LOG_FILE);
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["threatwatch", "--track", "path.csv"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_cli(&cli(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.proximity_threshold_meters, 4500.0);
        assert_eq!(config.alert_ttl(), None);
        assert_eq!(config.frame_delay(), Duration::from_millis(100));
        assert_eq!(config.refresh_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_cli_overrides() {
        let config = EngineConfig::from_cli(&cli(&[
            "--threshold",
            "3000",
            "--alert-ttl",
            "60",
            "--frame-delay-ms",
            "20",
        ]))
        .unwrap();
        assert_eq!(config.proximity_threshold_meters, 3000.0);
        assert_eq!(config.alert_ttl(), Some(Duration::from_secs(60)));
        assert_eq!(config.frame_delay_ms, 20);
    }

    #[test]
    fn test_config_file_then_cli() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"proximityThresholdMeters": 2500.0, "refreshSecs": 5}}"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = EngineConfig::from_cli(&cli(&["--config", &path])).unwrap();
        assert_eq!(config.proximity_threshold_meters, 2500.0);
        assert_eq!(config.refresh_secs, 5);
        // Absent fields keep defaults
        assert_eq!(config.frame_delay_ms, 100);

        let config =
            EngineConfig::from_cli(&cli(&["--config", &path, "--threshold", "1000"])).unwrap();
        assert_eq!(config.proximity_threshold_meters, 1000.0);
    }

    #[test]
    fn test_bad_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            EngineConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            EngineConfig::load(Path::new("/nonexistent/threatwatch.json")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_validation() {
        let bad_threshold = EngineConfig {
            proximity_threshold_meters: 0.0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            bad_threshold.validate(),
            Err(ConfigError::Threshold(EngineError::InvalidThreshold(_)))
        ));

        let bad_delay = EngineConfig {
            frame_delay_ms: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(bad_delay.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_alert_log_path() {
        assert_eq!(alert_log_path(&cli(&["--no-alert-log"])).unwrap(), None);
        assert_eq!(
            alert_log_path(&cli(&["--alert-log", "/tmp/alerts.jsonl"])).unwrap(),
            Some(PathBuf::from("/tmp/alerts.jsonl"))
        );
    }
}
