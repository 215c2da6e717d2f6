//! Flight Track
//!
//! A track is the ordered, finite sequence of positions a moving entity
//! traverses. Order is the animation order and is significant.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::geometry::GeoPoint3D;

/// A single position in a track, tagged with its 0-based sequence index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPoint {
    /// Position in the uploaded path (0-based)
    pub index: usize,
    /// Geodetic position
    pub position: GeoPoint3D,
}

impl TrackPoint {
    pub const fn new(index: usize, position: GeoPoint3D) -> Self {
        TrackPoint { index, position }
    }
}

/// Ordered sequence of track points
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Track {
    points: Vec<TrackPoint>,
}

impl Track {
    /// Wrap already-indexed points. Use [`Track::validate`] before trusting them.
    pub fn new(points: Vec<TrackPoint>) -> Self {
        Track { points }
    }

    /// Build a track from positions in traversal order, numbering them 0, 1, 2, ...
    pub fn from_positions<I>(positions: I) -> Self
    where
        I: IntoIterator<Item = GeoPoint3D>,
    {
        positions.into_iter().collect()
    }

    /// Check the track invariants: finite coordinates and strictly increasing
    /// sequence indices.
    pub fn validate(&self) -> Result<(), EngineError> {
        let mut previous: Option<usize> = None;
        for (slot, point) in self.points.iter().enumerate() {
            if !point.position.is_finite() {
                return Err(EngineError::InvalidTrack(format!(
                    "point {} (sequence {}) has a non-finite coordinate",
                    slot, point.index
                )));
            }
            if let Some(prev) = previous {
                if point.index <= prev {
                    return Err(EngineError::InvalidTrack(format!(
                        "sequence index {} follows {} at point {}",
                        point.index, prev, slot
                    )));
                }
            }
            previous = Some(point.index);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point at a position in traversal order
    pub fn get(&self, slot: usize) -> Option<&TrackPoint> {
        self.points.get(slot)
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrackPoint> {
        self.points.iter()
    }
}

impl FromIterator<GeoPoint3D> for Track {
    fn from_iter<T: IntoIterator<Item = GeoPoint3D>>(iter: T) -> Self {
        Track {
            points: iter
                .into_iter()
                .enumerate()
                .map(|(index, position)| TrackPoint { index, position })
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Track {
    type Item = &'a TrackPoint;
    type IntoIter = std::slice::Iter<'a, TrackPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_positions_numbers_points() {
        let track = Track::from_positions([
            GeoPoint3D::new(1.0, 2.0, 3.0),
            GeoPoint3D::new(4.0, 5.0, 6.0),
        ]);
        assert_eq!(track.len(), 2);
        assert_eq!(track.get(0).unwrap().index, 0);
        assert_eq!(track.get(1).unwrap().index, 1);
        assert_eq!(track.get(1).unwrap().position.elevation, 6.0);
        assert!(track.validate().is_ok());
    }

    #[test]
    fn test_empty_track_is_valid() {
        let track = Track::default();
        assert!(track.is_empty());
        assert!(track.validate().is_ok());
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let p = GeoPoint3D::new(0.0, 0.0, 0.0);
        let track = Track::new(vec![TrackPoint::new(0, p), TrackPoint::new(0, p)]);
        assert!(matches!(
            track.validate(),
            Err(EngineError::InvalidTrack(_))
        ));
    }

    #[test]
    fn test_unordered_index_rejected() {
        let p = GeoPoint3D::new(0.0, 0.0, 0.0);
        let track = Track::new(vec![TrackPoint::new(3, p), TrackPoint::new(1, p)]);
        assert!(track.validate().is_err());
    }

    #[test]
    fn test_gaps_in_index_are_allowed() {
        let p = GeoPoint3D::new(0.0, 0.0, 0.0);
        let track = Track::new(vec![TrackPoint::new(0, p), TrackPoint::new(5, p)]);
        assert!(track.validate().is_ok());
    }

    #[test]
    fn test_non_finite_coordinate_rejected() {
        let track = Track::from_positions([
            GeoPoint3D::new(0.0, 0.0, 0.0),
            GeoPoint3D::new(f64::NAN, 0.0, 0.0),
        ]);
        match track.validate() {
            Err(EngineError::InvalidTrack(msg)) => assert!(msg.contains("point 1")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_track_serializes_as_array() {
        let track = Track::from_positions([GeoPoint3D::new(1.0, 2.0, 3.0)]);
        let json = serde_json::to_value(&track).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "index": 0,
                "position": {"latitude": 1.0, "longitude": 2.0, "elevation": 3.0}
            }])
        );
    }
}
