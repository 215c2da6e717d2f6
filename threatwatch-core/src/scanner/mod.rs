//! Threat Range Scanning
//!
//! Classifies every point of a track against a proximity threshold and
//! derives edge-triggered range transitions from the classified stream.
//!
//! Transitions fire only when the state changes between consecutive samples.
//! The first sample is compared against an implicit `Clear` predecessor, so a
//! track that starts inside the threshold yields an entering transition at
//! index 0. A contact that stays in range produces exactly one event, not one
//! per frame.
//!
//! # Example
//!
//! ```rust
//! use threatwatch_core::scanner::{classify, ProximityThreshold, RangeState};
//! use threatwatch_core::{GeoPoint3D, Track};
//!
//! let observer = GeoPoint3D::new(0.0, 0.0, 0.0);
//! let track = Track::from_positions([
//!     GeoPoint3D::new(0.0, 0.0, 6000.0),
//!     GeoPoint3D::new(0.0, 0.0, 4500.0),
//! ]);
//! let threshold = ProximityThreshold::new(4500.0).unwrap();
//!
//! let states: Vec<_> = classify(observer, &track, threshold).map(|s| s.state).collect();
//! assert_eq!(states, vec![RangeState::Clear, RangeState::InRange]);
//! ```

mod range;
mod threshold;

pub use range::*;
pub use threshold::{ProximityThreshold, DEFAULT_PROXIMITY_THRESHOLD};
