//! Geo-offset calculator.
//!
//! Converts a center coordinate, a grid dimension, and a point spacing into a
//! square matrix of coordinates. Latitude steps use a fixed km-per-degree
//! ratio; longitude steps narrow with the cosine of the center latitude so
//! each column sits roughly `spacing` kilometers from its neighbor.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// Kilometers spanned by one degree of latitude.
pub const KM_PER_DEGREE_LAT: f64 = 110.574;

/// Kilometers spanned by one degree of longitude at the equator.
pub const KM_PER_DEGREE_LNG_AT_EQUATOR: f64 = 111.32;

pub const KM_PER_MILE: f64 = 1.60934;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(rename = "lat", alias = "latitude")]
    pub latitude: f64,
    #[serde(rename = "lng", alias = "longitude")]
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting non-finite or out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`GridError`] when either component is NaN/infinite or outside
    /// the valid degree range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GridError> {
        let coordinate = Self {
            latitude,
            longitude,
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// # Errors
    ///
    /// Returns [`GridError`] when either component is NaN/infinite or outside
    /// the valid degree range.
    pub fn validate(&self) -> Result<(), GridError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(GridError::NonFiniteCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(GridError::LatitudeOutOfRange(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(GridError::LongitudeOutOfRange(self.longitude));
        }
        Ok(())
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Unit a caller supplied its grid spacing in. Grid math always runs in km.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    #[serde(alias = "km")]
    Kilometers,
    #[serde(alias = "mi")]
    Miles,
}

impl DistanceUnit {
    #[must_use]
    pub fn to_km(self, value: f64) -> f64 {
        match self {
            DistanceUnit::Kilometers => value,
            DistanceUnit::Miles => value * KM_PER_MILE,
        }
    }
}

impl std::str::FromStr for DistanceUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "km" | "kilometers" | "kilometres" => Ok(DistanceUnit::Kilometers),
            "mi" | "miles" => Ok(DistanceUnit::Miles),
            other => Err(format!("unknown distance unit '{other}' (expected km or mi)")),
        }
    }
}

/// Kilometers spanned by one degree of longitude at `latitude`.
#[must_use]
pub fn km_per_degree_lng(latitude: f64) -> f64 {
    KM_PER_DEGREE_LNG_AT_EQUATOR * (latitude * PI / 180.0).cos()
}

#[allow(clippy::cast_precision_loss)]
fn steps_from_center(index: usize, half: usize) -> f64 {
    index as f64 - half as f64
}

/// Degree offset `(lat, lng)` of cell `(row, col)` from the grid center.
///
/// The center cell is `(size / 2, size / 2)`; its offset is exactly `(0.0, 0.0)`.
#[must_use]
pub fn offset_degrees(
    center_latitude: f64,
    row: usize,
    col: usize,
    size: usize,
    spacing_km: f64,
) -> (f64, f64) {
    let half = size / 2;
    let lat_offset = steps_from_center(row, half) * spacing_km / KM_PER_DEGREE_LAT;
    let lng_offset = steps_from_center(col, half) * spacing_km / km_per_degree_lng(center_latitude);
    (lat_offset, lng_offset)
}

pub(crate) fn validate_grid_input(
    center: &Coordinate,
    size: usize,
    spacing_km: f64,
) -> Result<(), GridError> {
    center.validate()?;
    if size == 0 {
        return Err(GridError::InvalidGridSize(size));
    }
    if !spacing_km.is_finite() || spacing_km <= 0.0 {
        return Err(GridError::InvalidSpacing(spacing_km));
    }

    // Offsets grow monotonically away from the center, so the two corners bound every cell.
    let last = size - 1;
    for (row, col) in [(0, 0), (last, last)] {
        let (lat_offset, lng_offset) = offset_degrees(center.latitude, row, col, size, spacing_km);
        let corner = Coordinate {
            latitude: center.latitude + lat_offset,
            longitude: center.longitude + lng_offset,
        };
        if corner.validate().is_err() {
            return Err(GridError::GridOutOfBounds {
                size,
                spacing_km,
                corner_latitude: corner.latitude,
                corner_longitude: corner.longitude,
            });
        }
    }
    Ok(())
}

/// Compute the `size` x `size` coordinate matrix around `center`, row-major.
///
/// Row 0 is the southernmost row and column 0 the westernmost column. Even
/// sizes are accepted; the center coordinate then lands on cell
/// `(size / 2, size / 2)`, which is off the geometric middle.
///
/// # Errors
///
/// Returns [`GridError`] for an invalid center, a zero size, a
/// non-positive/non-finite spacing, or a grid whose corners fall outside the
/// valid coordinate range (near the poles or the antimeridian). Longitudes are
/// never wrapped.
pub fn compute_grid(
    center: Coordinate,
    size: usize,
    spacing_km: f64,
) -> Result<Vec<Vec<Coordinate>>, GridError> {
    validate_grid_input(&center, size, spacing_km)?;

    let matrix = (0..size)
        .map(|row| {
            (0..size)
                .map(|col| {
                    let (lat_offset, lng_offset) =
                        offset_degrees(center.latitude, row, col, size, spacing_km);
                    Coordinate {
                        latitude: center.latitude + lat_offset,
                        longitude: center.longitude + lng_offset,
                    }
                })
                .collect()
        })
        .collect();
    Ok(matrix)
}
