use serde::{Deserialize, Serialize};

/// A geodetic position: WGS-84 latitude/longitude in degrees, elevation in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint3D {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Elevation in meters
    pub elevation: f64,
}

impl GeoPoint3D {
    pub const fn new(latitude: f64, longitude: f64, elevation: f64) -> Self {
        GeoPoint3D {
            latitude,
            longitude,
            elevation,
        }
    }

    /// True when all three components are finite numbers
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite() && self.elevation.is_finite()
    }
}

impl std::fmt::Display for GeoPoint3D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:.6}, {:.6}, {:.1} m)",
            self.latitude, self.longitude, self.elevation
        )
    }
}
