//! Grid assembly: coordinates from the geo-offset calculator plus per-cell rank styling.

use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::geo::{compute_grid, Coordinate, DistanceUnit};
use crate::palette::Palette;
use crate::ranking::{classify_with, RankTier, RankingStyle};

/// Row-major rank matrix as stored with a grid result. `0` means no data.
pub type RankMatrix = Vec<Vec<i32>>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub center: Coordinate,
    /// Cells per side. Odd sizes keep the center cell on the business.
    pub size: usize,
    /// Distance between adjacent points, in `unit`.
    pub spacing: f64,
    #[serde(default)]
    pub unit: DistanceUnit,
}

impl GridConfig {
    #[must_use]
    pub fn spacing_km(&self) -> f64 {
        self.unit.to_km(self.spacing)
    }

    #[must_use]
    pub fn is_centered(&self) -> bool {
        self.size % 2 == 1
    }

    /// # Errors
    ///
    /// Returns [`GridError`] for an invalid center, size, or spacing, or when
    /// the grid's corners leave the valid coordinate range.
    pub fn validate(&self) -> Result<(), GridError> {
        crate::geo::validate_grid_input(&self.center, self.size, self.spacing_km())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub row: usize,
    pub col: usize,
    pub coordinate: Coordinate,
    /// Raw matrix value, `0` included. `None` when the matrix had no entry for this cell.
    pub rank: Option<i32>,
    /// Present only for cells with a positive rank; unstyled cells get no marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<RankingStyle>,
}

impl GridPoint {
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        self.style.is_some()
    }
}

/// Build the flattened, row-major grid with the default palette.
///
/// # Errors
///
/// See [`build_grid_with`].
pub fn build_grid(
    config: &GridConfig,
    ranks: Option<&[Vec<i32>]>,
) -> Result<Vec<GridPoint>, GridError> {
    build_grid_with(&Palette::default(), config, ranks)
}

/// Build the flattened, row-major grid, styling every cell with a positive rank.
///
/// Rows or entries missing from `ranks` are treated as "no data".
///
/// # Errors
///
/// Returns [`GridError`] for invalid geometry, a rank matrix larger than the
/// grid, or a negative rank.
pub fn build_grid_with(
    palette: &Palette,
    config: &GridConfig,
    ranks: Option<&[Vec<i32>]>,
) -> Result<Vec<GridPoint>, GridError> {
    if let Some(ranks) = ranks {
        validate_rank_matrix(config.size, ranks)?;
    }

    let coordinates = compute_grid(config.center, config.size, config.spacing_km())?;

    let points = coordinates
        .into_iter()
        .enumerate()
        .flat_map(|(row, cells)| {
            cells.into_iter().enumerate().map(move |(col, coordinate)| {
                let rank = ranks
                    .and_then(|matrix| matrix.get(row))
                    .and_then(|cells| cells.get(col))
                    .copied();
                let style = rank.and_then(|r| classify_with(palette, r));
                GridPoint {
                    row,
                    col,
                    coordinate,
                    rank,
                    style,
                }
            })
        })
        .collect();
    Ok(points)
}

fn validate_rank_matrix(size: usize, ranks: &[Vec<i32>]) -> Result<(), GridError> {
    if ranks.len() > size {
        return Err(GridError::RankMatrixRows {
            size,
            rows: ranks.len(),
        });
    }
    for (row, cells) in ranks.iter().enumerate() {
        if cells.len() > size {
            return Err(GridError::RankMatrixShape {
                size,
                row,
                len: cells.len(),
            });
        }
        if let Some(col) = cells.iter().position(|&r| r < 0) {
            return Err(GridError::NegativeRank {
                row,
                col,
                rank: cells[col],
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub top: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub lowest: usize,
    pub beyond: usize,
}

/// Cell counts over an assembled grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSummary {
    pub total: usize,
    pub ranked: usize,
    pub no_data: usize,
    pub tiers: TierCounts,
}

impl GridSummary {
    #[must_use]
    pub fn from_points(points: &[GridPoint]) -> Self {
        let mut summary = Self {
            total: points.len(),
            ..Self::default()
        };
        for style in points.iter().filter_map(|p| p.style.as_ref()) {
            summary.ranked += 1;
            let slot = match style.tier {
                RankTier::Top => &mut summary.tiers.top,
                RankTier::High => &mut summary.tiers.high,
                RankTier::Medium => &mut summary.tiers.medium,
                RankTier::Low => &mut summary.tiers.low,
                RankTier::Lowest => &mut summary.tiers.lowest,
                RankTier::Beyond => &mut summary.tiers.beyond,
            };
            *slot += 1;
        }
        summary.no_data = summary.total - summary.ranked;
        summary
    }
}
