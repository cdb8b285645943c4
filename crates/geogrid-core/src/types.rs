//! Entities owned by the data store and the places API. The core only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GridError;
use crate::geo::{Coordinate, DistanceUnit};
use crate::grid::{build_grid_with, GridConfig, GridPoint, RankMatrix};
use crate::palette::Palette;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessInfo {
    pub name: String,
    pub place_id: String,
    #[serde(default)]
    pub address: Option<String>,
    pub location: Coordinate,
}

/// Aggregate ranking metrics. Carried through unchanged once stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GridMetrics {
    /// Average grid ranking.
    pub agr: f64,
    /// Average top-grid ranking.
    pub atgr: f64,
    /// Share of local voice, in percent.
    pub solv: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridResult {
    pub id: Uuid,
    pub business_info: BusinessInfo,
    pub search_term: String,
    pub created_at: DateTime<Utc>,
    pub grid_size: usize,
    pub grid_data: RankMatrix,
    pub metrics: GridMetrics,
    pub google_region: Option<String>,
    pub distance_km: f64,
}

impl GridResult {
    /// The grid this result was scanned on, centered on the business.
    #[must_use]
    pub fn grid_config(&self) -> GridConfig {
        GridConfig {
            center: self.business_info.location,
            size: self.grid_size,
            spacing: self.distance_km,
            unit: DistanceUnit::Kilometers,
        }
    }

    /// Recompute coordinates and attach the stored ranks.
    ///
    /// # Errors
    ///
    /// Returns [`GridError`] if the stored geometry or rank matrix is invalid.
    pub fn assemble(&self, palette: &Palette) -> Result<Vec<GridPoint>, GridError> {
        build_grid_with(palette, &self.grid_config(), Some(self.grid_data.as_slice()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    /// Place ID from the places API.
    pub id: String,
    pub name: String,
    pub ranking: i32,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub location: Option<Coordinate>,
}
