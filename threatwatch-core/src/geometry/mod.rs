//! 3-D Separation Between Geodetic Points
//!
//! The horizontal component is the geodesic distance on the WGS-84 ellipsoid
//! (Vincenty inverse formula). Nearly antipodal pairs, where Vincenty does not
//! converge, fall back to the haversine great-circle distance on the mean
//! Earth radius. The vertical component is the absolute elevation difference,
//! and the two are combined as `sqrt(horizontal² + vertical²)`.
//!
//! Inputs are not normalized: latitudes outside [-90, 90] and longitudes
//! outside [-180, 180] are fed to the formulas as-is. NaN or infinite inputs
//! are a caller contract violation. Some unequal inputs name the same place on
//! the ground (pole points with different longitudes, longitudes 360° apart)
//! and measure as zero up to floating-point noise (below a nanometer).
//!
//! # Example
//!
//! ```rust
//! use threatwatch_core::geometry::{distance_3d, GeoPoint3D};
//!
//! let base = GeoPoint3D::new(28.6139, 77.2090, 216.0);
//! let contact = GeoPoint3D::new(28.6500, 77.2300, 1500.0);
//!
//! let d = distance_3d(base, contact);
//! assert!(d > 4000.0 && d < 5000.0);
//! ```

mod geodesic;
mod point;

pub use geodesic::{
    distance_3d, haversine_distance, surface_distance, vincenty_distance, MEAN_EARTH_RADIUS,
    WGS84_FLATTENING, WGS84_SEMI_MAJOR_AXIS,
};
pub use point::GeoPoint3D;
