//! CSV flight track loader.
//!
//! Expects a header row with (at least) the three WGS-84 columns below, in any
//! order. Extra columns are ignored. Each data row becomes one track point, in
//! file order.

use log::{debug, info};
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use threatwatch_core::{EngineError, GeoPoint3D, Track};

pub const LATITUDE_COLUMN: &str = "latitude_wgs84(deg)";
pub const LONGITUDE_COLUMN: &str = "longitude_wgs84(deg)";
pub const ELEVATION_COLUMN: &str = "elevation_wgs84(m)";

pub const REQUIRED_COLUMNS: [&str; 3] = [LATITUDE_COLUMN, LONGITUDE_COLUMN, ELEVATION_COLUMN];

#[derive(Error, Debug)]
pub enum TrackSourceError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Lists every required column, with the absent ones in `missing`
    #[error("MISSING COLUMNS: {}", REQUIRED_COLUMNS.join(", "))]
    MissingColumns { missing: Vec<&'static str> },

    /// Row numbers are 1-based and count data rows only
    #[error("Row {row}: invalid {column} value '{value}'")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error(transparent)]
    Track(#[from] EngineError),
}

/// Load a track from a CSV file
pub fn load_track(path: &Path) -> Result<Track, TrackSourceError> {
    let reader = csv::Reader::from_path(path)?;
    let track = read_records(reader)?;
    info!(
        "Loaded {} track points from {}",
        track.len(),
        path.display()
    );
    Ok(track)
}

/// Load a track from any CSV byte source
pub fn read_track<R: Read>(source: R) -> Result<Track, TrackSourceError> {
    read_records(csv::Reader::from_reader(source))
}

fn read_records<R: Read>(mut reader: csv::Reader<R>) -> Result<Track, TrackSourceError> {
    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let missing: Vec<&'static str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|name| column(name).is_none())
        .collect();
    let (Some(lat), Some(lon), Some(elev)) = (
        column(LATITUDE_COLUMN),
        column(LONGITUDE_COLUMN),
        column(ELEVATION_COLUMN),
    ) else {
        return Err(TrackSourceError::MissingColumns { missing });
    };

    let mut positions = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let row = i + 1;
        let cell = |idx: usize, name: &'static str| -> Result<f64, TrackSourceError> {
            let raw = record.get(idx).unwrap_or("").trim();
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| TrackSourceError::InvalidValue {
                    row,
                    column: name,
                    value: raw.to_string(),
                })
        };

        positions.push(GeoPoint3D::new(
            cell(lat, LATITUDE_COLUMN)?,
            cell(lon, LONGITUDE_COLUMN)?,
            cell(elev, ELEVATION_COLUMN)?,
        ));
    }
    debug!("Parsed {} CSV rows", positions.len());

    let track = Track::from_positions(positions);
    track.validate()?;
    Ok(track)
}
