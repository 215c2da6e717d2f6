//! Map view fitting
//!
//! Picks a map centre and zoom level that keep the whole track and the
//! observer on screen. Rendering itself happens elsewhere; this only computes
//! the numbers a map widget needs.

use serde::{Deserialize, Serialize};

use crate::geometry::GeoPoint3D;
use crate::track::Track;

/// Camera pitch used for the tactical map, degrees
pub const DEFAULT_PITCH: f64 = 50.0;

/// Zoom used when everything fits inside 0.1 degrees
pub const MAX_ZOOM: u8 = 12;

/// (span in degrees, zoom) pairs, widest first. The first span exceeded wins.
const ZOOM_STEPS: [(f64, u8); 8] = [
    (20.0, 4),
    (10.0, 5),
    (5.0, 6),
    (2.0, 7),
    (1.0, 8),
    (0.5, 9),
    (0.2, 10),
    (0.1, 11),
];

/// Map camera: centre, zoom level and pitch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
    pub pitch: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            latitude: 0.0,
            longitude: 0.0,
            zoom: MAX_ZOOM,
            pitch: DEFAULT_PITCH,
        }
    }
}

impl ViewState {
    /// Centre on the bounding box of the track plus the observer and zoom so
    /// the larger of the two spans fits.
    pub fn fit(observer: GeoPoint3D, track: &Track) -> Self {
        let mut min_lat = observer.latitude;
        let mut max_lat = observer.latitude;
        let mut min_lon = observer.longitude;
        let mut max_lon = observer.longitude;

        for point in track {
            let p = point.position;
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lon = min_lon.min(p.longitude);
            max_lon = max_lon.max(p.longitude);
        }

        let span = (max_lat - min_lat).abs().max((max_lon - min_lon).abs());
        ViewState {
            latitude: (min_lat + max_lat) / 2.0,
            longitude: (min_lon + max_lon) / 2.0,
            zoom: Self::zoom_for_span(span),
            pitch: DEFAULT_PITCH,
        }
    }

    /// Zoom level for a span in degrees
    pub fn zoom_for_span(span_degrees: f64) -> u8 {
        ZOOM_STEPS
            .iter()
            .find(|(span, _)| span_degrees > *span)
            .map_or(MAX_ZOOM, |&(_, zoom)| zoom)
    }

    /// Same zoom and pitch, recentred on `position` (follow mode)
    pub fn centered_on(&self, position: GeoPoint3D) -> Self {
        ViewState {
            latitude: position.latitude,
            longitude: position.longitude,
            ..*self
        }
    }
}
