//! # Threatwatch Core
//!
//! Platform-independent proximity detection and alert lifecycle engine.
//!
//! This crate contains the pure measurement and bookkeeping logic with
//! **zero I/O dependencies**: no async runtime, no files, no sockets. The
//! clock is always passed in by the caller as milliseconds, which keeps every
//! operation deterministic and testable without wall-clock timing.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  threatwatch-core (no tokio, no I/O)                         │
//! │  ├── geometry/  (3-D geodesic separation)                    │
//! │  ├── track      (ordered flight path, validation)            │
//! │  ├── scanner/   (range classification, edge transitions)     │
//! │  ├── alerts/    (per-unit alert state machine, audit log)    │
//! │  ├── playback   (deterministic step driver)                  │
//! │  └── view       (map centre / zoom fitting)                  │
//! └──────────────────────────────────────────────────────────────┘
//!                              ▲
//!               ┌──────────────┴──────────────┐
//!               │  threatwatch-server         │
//!               │  (CSV source, scheduler,    │
//!               │   unit monitors, log file)  │
//!               └─────────────────────────────┘
//! ```
//!
//! ## Key Modules
//!
//! - [`geometry`] - [`GeoPoint3D`] and [`distance_3d`]
//! - [`scanner`] - [`classify`] and [`transitions`] over a [`Track`]
//! - [`alerts`] - [`AlertLifecycle`] with send / acknowledge / expire
//! - [`playback`] - [`PlaybackDriver`] stepping a track frame by frame
//!
//! ## Example: Scanning a Track
//!
//! ```rust
//! use threatwatch_core::{transitions, GeoPoint3D, ProximityThreshold, Track};
//!
//! let observer = GeoPoint3D::new(0.0, 0.0, 0.0);
//! let track = Track::from_positions([
//!     GeoPoint3D::new(0.0, 0.0, 6000.0),
//!     GeoPoint3D::new(0.0, 0.0, 4000.0),
//!     GeoPoint3D::new(0.0, 0.0, 5000.0),
//! ]);
//! let threshold = ProximityThreshold::new(4500.0).unwrap();
//!
//! let events: Vec<_> = transitions(observer, &track, threshold).collect();
//! assert_eq!(events.len(), 2);
//! assert!(events[0].is_entering());
//! ```
//!
//! ## Example: Alert Lifecycle
//!
//! ```rust
//! use threatwatch_core::{AlertLifecycle, UnitId};
//!
//! let alerts = AlertLifecycle::new(None);
//! alerts.dispatch(UnitId::Ground, "Aircraft inbound", 1_000);
//! assert!(alerts.query(UnitId::Ground, 2_000).is_some());
//!
//! alerts.acknowledge(UnitId::Ground, 3_000).unwrap();
//! assert!(alerts.query(UnitId::Ground, 4_000).is_none());
//! ```

pub mod alerts;
pub mod error;
pub mod geometry;
pub mod playback;
pub mod scanner;
pub mod track;
pub mod view;

// Re-export commonly used types
pub use alerts::{
    Alert, AlertEvent, AlertId, AlertLifecycle, AlertLogEntry, AlertSink, AlertState,
    MemorySink, Role, SinkError, UnitCondition, UnitId, UnitStatus,
};
pub use error::EngineError;
pub use geometry::{distance_3d, surface_distance, GeoPoint3D};
pub use playback::{Frame, PlaybackDriver, PlaybackState};
pub use scanner::{
    classify, sample_point, transitions, ProximityThreshold, RangeState, RangeTracker,
    RangeTransition, Sample,
};
pub use track::{Track, TrackPoint};
pub use view::ViewState;
