use serde::{Deserialize, Serialize};

use super::ProximityThreshold;
use crate::geometry::{distance_3d, GeoPoint3D};
use crate::track::{Track, TrackPoint};

/// Proximity classification of a single sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeState {
    /// Contact is beyond the threshold
    Clear,
    /// Contact is at or within the threshold
    InRange,
}

impl Default for RangeState {
    fn default() -> Self {
        RangeState::Clear
    }
}

impl RangeState {
    pub fn from_distance(distance: f64, threshold: ProximityThreshold) -> Self {
        if threshold.contains(distance) {
            RangeState::InRange
        } else {
            RangeState::Clear
        }
    }

    pub fn is_in_range(&self) -> bool {
        matches!(self, RangeState::InRange)
    }

    /// Operator-facing status label
    pub fn label(&self) -> &'static str {
        match self {
            RangeState::Clear => "CLEAR",
            RangeState::InRange => "ENGAGEMENT RANGE",
        }
    }
}

impl std::fmt::Display for RangeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RangeState::Clear => write!(f, "clear"),
            RangeState::InRange => write!(f, "in range"),
        }
    }
}

/// Distance and classification of one track point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// Sequence index of the track point
    pub index: usize,
    /// 3-D distance from the observer in meters
    pub distance: f64,
    pub state: RangeState,
}

/// A change of classification between consecutive samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeTransition {
    /// Sequence index of the sample that changed state
    pub index: usize,
    pub from: RangeState,
    pub to: RangeState,
    /// Distance of the sample that changed state
    pub distance: f64,
}

impl RangeTransition {
    /// Contact crossed into the threshold
    pub fn is_entering(&self) -> bool {
        self.from == RangeState::Clear && self.to == RangeState::InRange
    }

    /// Contact crossed out of the threshold
    pub fn is_leaving(&self) -> bool {
        self.from == RangeState::InRange && self.to == RangeState::Clear
    }
}

impl std::fmt::Display for RangeTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {} -> {} at {:.2} m",
            self.index, self.from, self.to, self.distance
        )
    }
}

/// Measure and classify a single track point against the observer.
pub fn sample_point(
    observer: GeoPoint3D,
    point: &TrackPoint,
    threshold: ProximityThreshold,
) -> Sample {
    let distance = distance_3d(observer, point.position);
    Sample {
        index: point.index,
        distance,
        state: RangeState::from_distance(distance, threshold),
    }
}

/// Edge detector over a stream of samples.
///
/// Holds only the previous classification, starting from `Clear`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeTracker {
    state: RangeState,
}

impl RangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classification of the last observed sample
    pub fn state(&self) -> RangeState {
        self.state
    }

    /// Feed the next sample; returns a transition if its state differs from
    /// the previous one.
    pub fn observe(&mut self, sample: &Sample) -> Option<RangeTransition> {
        if sample.state == self.state {
            return None;
        }
        let transition = RangeTransition {
            index: sample.index,
            from: self.state,
            to: sample.state,
            distance: sample.distance,
        };
        self.state = sample.state;
        Some(transition)
    }

    /// Forget history; the next sample is compared against `Clear`
    pub fn reset(&mut self) {
        self.state = RangeState::Clear;
    }
}

/// Lazy classification of every track point, in index order.
///
/// A pure function of its inputs: cloning the iterator or calling
/// [`classify`] again replays the identical sequence.
#[derive(Debug, Clone)]
pub struct Classify<'a> {
    observer: GeoPoint3D,
    threshold: ProximityThreshold,
    points: std::slice::Iter<'a, TrackPoint>,
}

impl Iterator for Classify<'_> {
    type Item = Sample;

    fn next(&mut self) -> Option<Self::Item> {
        self.points
            .next()
            .map(|point| sample_point(self.observer, point, self.threshold))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.points.size_hint()
    }
}

impl ExactSizeIterator for Classify<'_> {}

/// Lazy sequence of range transitions over a track
#[derive(Debug, Clone)]
pub struct Transitions<'a> {
    samples: Classify<'a>,
    tracker: RangeTracker,
}

impl Iterator for Transitions<'_> {
    type Item = RangeTransition;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let sample = self.samples.next()?;
            if let Some(transition) = self.tracker.observe(&sample) {
                return Some(transition);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.samples.size_hint().1)
    }
}

/// Classify every point of `track` against `observer`.
pub fn classify(
    observer: GeoPoint3D,
    track: &Track,
    threshold: ProximityThreshold,
) -> Classify<'_> {
    Classify {
        observer,
        threshold,
        points: track.iter(),
    }
}

/// Range transitions of `track` relative to `observer`, starting from an
/// implicit `Clear` state.
pub fn transitions(
    observer: GeoPoint3D,
    track: &Track,
    threshold: ProximityThreshold,
) -> Transitions<'_> {
    Transitions {
        samples: classify(observer, track, threshold),
        tracker: RangeTracker::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observer() -> GeoPoint3D {
        GeoPoint3D::new(34.0837, 74.7973, 0.0)
    }

    /// Points straight above the observer, so distance == elevation
    fn overhead(elevations: &[f64]) -> Track {
        let o = observer();
        Track::from_positions(
            elevations
                .iter()
                .map(|&e| GeoPoint3D::new(o.latitude, o.longitude, e)),
        )
    }

    fn threshold(m: f64) -> ProximityThreshold {
        ProximityThreshold::new(m).unwrap()
    }

    #[test]
    fn test_classification_sequence() {
        let track = overhead(&[6000.0, 4000.0, 3000.0, 5000.0]);
        let states: Vec<_> = classify(observer(), &track, threshold(4500.0))
            .map(|s| s.state)
            .collect();
        assert_eq!(
            states,
            vec![
                RangeState::Clear,
                RangeState::InRange,
                RangeState::InRange,
                RangeState::Clear
            ]
        );
    }

    #[test]
    fn test_transition_sequence() {
        let track = overhead(&[6000.0, 4000.0, 3000.0, 5000.0]);
        let events: Vec<_> = transitions(observer(), &track, threshold(4500.0)).collect();
        assert_eq!(
            events,
            vec![
                RangeTransition {
                    index: 1,
                    from: RangeState::Clear,
                    to: RangeState::InRange,
                    distance: 4000.0,
                },
                RangeTransition {
                    index: 3,
                    from: RangeState::InRange,
                    to: RangeState::Clear,
                    distance: 5000.0,
                },
            ]
        );
        assert!(events[0].is_entering());
        assert!(events[1].is_leaving());
    }

    #[test]
    fn test_empty_track() {
        let track = Track::default();
        assert_eq!(classify(observer(), &track, threshold(4500.0)).count(), 0);
        assert_eq!(transitions(observer(), &track, threshold(4500.0)).count(), 0);
    }

    #[test]
    fn test_single_point_at_threshold_is_in_range() {
        let track = overhead(&[4500.0]);
        let samples: Vec<_> = classify(observer(), &track, threshold(4500.0)).collect();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].state, RangeState::InRange);

        // First sample compares against the implicit Clear predecessor
        let events: Vec<_> = transitions(observer(), &track, threshold(4500.0)).collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].index, 0);
        assert!(events[0].is_entering());
    }

    #[test]
    fn test_starting_clear_yields_no_initial_transition() {
        let track = overhead(&[9000.0, 8000.0]);
        assert_eq!(transitions(observer(), &track, threshold(4500.0)).count(), 0);
    }

    #[test]
    fn test_scan_is_restartable() {
        let track = overhead(&[6000.0, 100.0, 7000.0, 200.0]);
        let first: Vec<_> = transitions(observer(), &track, threshold(4500.0)).collect();
        let second: Vec<_> = transitions(observer(), &track, threshold(4500.0)).collect();
        assert_eq!(first, second);

        // Index 0 is Clear like the implicit start, so no event there
        let edges: Vec<_> = first.iter().map(|t| (t.index, t.from, t.to)).collect();
        assert_eq!(
            edges,
            vec![
                (1, RangeState::Clear, RangeState::InRange),
                (2, RangeState::InRange, RangeState::Clear),
                (3, RangeState::Clear, RangeState::InRange),
            ]
        );

        let scan = classify(observer(), &track, threshold(4500.0));
        let replay = scan.clone();
        assert_eq!(scan.collect::<Vec<_>>(), replay.collect::<Vec<_>>());
    }

    #[test]
    fn test_staying_in_range_is_single_event() {
        let track = overhead(&[100.0, 200.0, 300.0, 400.0, 500.0]);
        let events: Vec<_> = transitions(observer(), &track, threshold(4500.0)).collect();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_tracker_reset() {
        let mut tracker = RangeTracker::new();
        let hot = Sample {
            index: 0,
            distance: 10.0,
            state: RangeState::InRange,
        };
        assert!(tracker.observe(&hot).is_some());
        assert!(tracker.observe(&hot).is_none());
        assert_eq!(tracker.state(), RangeState::InRange);

        tracker.reset();
        assert_eq!(tracker.state(), RangeState::Clear);
        assert!(tracker.observe(&hot).is_some());
    }

    #[test]
    fn test_samples_carry_sequence_index() {
        let p = GeoPoint3D::new(0.0, 0.0, 10.0);
        let track = Track::new(vec![TrackPoint::new(10, p), TrackPoint::new(20, p)]);
        let indices: Vec<_> = classify(GeoPoint3D::default(), &track, threshold(50.0))
            .map(|s| s.index)
            .collect();
        assert_eq!(indices, vec![10, 20]);
    }

    #[test]
    fn test_range_state_serde() {
        assert_eq!(
            serde_json::to_string(&RangeState::InRange).unwrap(),
            "\"in_range\""
        );
        assert_eq!(RangeState::InRange.label(), "ENGAGEMENT RANGE");
    }
}
