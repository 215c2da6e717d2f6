//! Deterministic playback driver.
//!
//! Steps through a [`Track`] one point at a time, measuring and classifying
//! each point against a fixed observer. The driver owns no timer: an external
//! scheduler calls [`PlaybackDriver::step`] at whatever cadence it likes, so
//! the same track always produces the same frames.
//!
//! # State machine
//!
//! ```text
//!            start()            pause()
//!  STOPPED ───────────▶ RUNNING ───────▶ PAUSED
//!     ▲                  │   ▲              │
//!     │                  │   └──────────────┘
//!     │ reset()/load()   │       start()
//!     │                  ▼
//!     └─────────────── FINISHED   (last point stepped)
//! ```
//!
//! # Usage
//!
//! ```rust
//! use threatwatch_core::{GeoPoint3D, PlaybackDriver, ProximityThreshold, Track};
//!
//! let mut driver = PlaybackDriver::new(GeoPoint3D::default(), ProximityThreshold::default());
//! driver
//!     .load(Track::from_positions([GeoPoint3D::new(0.0, 0.0, 6000.0)]))
//!     .unwrap();
//! driver.start();
//!
//! let frame = driver.step().unwrap().unwrap();
//! assert_eq!(frame.to_string(), "FRAME 1/1 | distance 6000.00 m | CLEAR");
//! assert!(driver.is_finished());
//! ```

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::EngineError;
use crate::geometry::GeoPoint3D;
use crate::scanner::{sample_point, ProximityThreshold, RangeState, RangeTracker, RangeTransition};
use crate::track::{Track, TrackPoint};

// =============================================================================
// Playback State
// =============================================================================

/// Run state of a [`PlaybackDriver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Loaded or reset, positioned at the first point
    Stopped,
    /// Scheduler should keep stepping
    Running,
    /// Scheduler should hold position
    Paused,
    /// Every point has been stepped
    Finished,
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState::Stopped
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Stopped => write!(f, "STOPPED"),
            PlaybackState::Running => write!(f, "RUNNING"),
            PlaybackState::Paused => write!(f, "PAUSED"),
            PlaybackState::Finished => write!(f, "FINISHED"),
        }
    }
}

// =============================================================================
// Frame
// =============================================================================

/// Output of one playback step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// 0-based position of this frame within the track
    pub frame: usize,
    /// Number of points in the track
    pub total: usize,
    pub point: TrackPoint,
    /// 3-D distance from the observer in meters
    pub distance: f64,
    pub state: RangeState,
    /// Set when this frame changed the range state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<RangeTransition>,
}

impl Frame {
    /// True when this frame crossed into the threshold
    pub fn entered_range(&self) -> bool {
        self.transition.map_or(false, |t| t.is_entering())
    }

    /// True for the frame that exhausted the track
    pub fn is_last(&self) -> bool {
        self.frame + 1 == self.total
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FRAME {}/{} | distance {:.2} m | {}",
            self.frame + 1,
            self.total,
            self.distance,
            self.state.label()
        )
    }
}

// =============================================================================
// Playback Driver
// =============================================================================

/// Steps a track frame by frame.
///
/// Owned by a single session; not meant for concurrent mutation.
#[derive(Debug, Clone)]
pub struct PlaybackDriver {
    track: Arc<Track>,
    observer: GeoPoint3D,
    threshold: ProximityThreshold,
    /// Slot of the next point to step
    index: usize,
    state: PlaybackState,
    tracker: RangeTracker,
}

impl PlaybackDriver {
    /// Create a driver with an empty track
    pub fn new(observer: GeoPoint3D, threshold: ProximityThreshold) -> Self {
        PlaybackDriver {
            track: Arc::new(Track::default()),
            observer,
            threshold,
            index: 0,
            state: PlaybackState::Stopped,
            tracker: RangeTracker::new(),
        }
    }

    /// Replace the track and rewind. Fails with [`EngineError::InvalidTrack`]
    /// leaving the previous track in place.
    pub fn load(&mut self, track: impl Into<Arc<Track>>) -> Result<(), EngineError> {
        let track = track.into();
        track.validate()?;
        info!("Loaded track with {} points", track.len());
        self.track = track;
        self.rewind();
        Ok(())
    }

    /// STOPPED/PAUSED -> RUNNING; no-op otherwise
    pub fn start(&mut self) {
        match self.state {
            PlaybackState::Stopped | PlaybackState::Paused => {
                self.set_state(PlaybackState::Running);
            }
            PlaybackState::Running | PlaybackState::Finished => {}
        }
    }

    /// RUNNING -> PAUSED; no-op otherwise
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Running {
            self.set_state(PlaybackState::Paused);
        }
    }

    /// Back to the first point of the current track, STOPPED, with no range
    /// history. Calling it twice is the same as calling it once.
    pub fn reset(&mut self) {
        self.rewind();
    }

    /// Produce the next frame.
    ///
    /// The call that steps the last point moves the driver to FINISHED. An
    /// empty track finishes on the first call with `Ok(None)`. Any call once
    /// FINISHED fails with [`EngineError::OutOfRange`] without advancing.
    ///
    /// Stepping is allowed while STOPPED or PAUSED for manual single-stepping;
    /// the run state only tells a scheduler whether to keep calling.
    pub fn step(&mut self) -> Result<Option<Frame>, EngineError> {
        let total = self.track.len();
        if self.state == PlaybackState::Finished {
            return Err(EngineError::OutOfRange {
                index: self.index,
                len: total,
            });
        }

        let Some(point) = self.track.get(self.index).copied() else {
            self.set_state(PlaybackState::Finished);
            return Ok(None);
        };

        let sample = sample_point(self.observer, &point, self.threshold);
        let transition = self.tracker.observe(&sample);
        let frame = Frame {
            frame: self.index,
            total,
            point,
            distance: sample.distance,
            state: sample.state,
            transition,
        };

        debug!("{}", frame);
        if let Some(transition) = &transition {
            info!("Range transition {}", transition);
        }

        self.index += 1;
        if self.index >= total {
            self.set_state(PlaybackState::Finished);
        }
        Ok(Some(frame))
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// `(next index, track length)`
    pub fn progress(&self) -> (usize, usize) {
        (self.index, self.track.len())
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PlaybackState::Running
    }

    pub fn is_finished(&self) -> bool {
        self.state == PlaybackState::Finished
    }

    /// Range state of the last stepped point (`Clear` before the first step)
    pub fn range_state(&self) -> RangeState {
        self.tracker.state()
    }

    pub fn track(&self) -> &Arc<Track> {
        &self.track
    }

    pub fn observer(&self) -> GeoPoint3D {
        self.observer
    }

    pub fn threshold(&self) -> ProximityThreshold {
        self.threshold
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn rewind(&mut self) {
        self.index = 0;
        self.tracker.reset();
        self.set_state(PlaybackState::Stopped);
    }

    fn set_state(&mut self, new_state: PlaybackState) {
        if self.state != new_state {
            debug!("Playback state: {} -> {}", self.state, new_state);
            self.state = new_state;
        }
    }
}
