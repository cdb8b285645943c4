//! Grid geometry and ranking classification for `GeoGrid` local-search results.
//!
//! Everything here is pure: a center coordinate, a grid dimension, and a point
//! spacing go in; a row-major matrix of coordinates (optionally annotated with
//! rank styles) comes out. The same code feeds on-screen marker placement and
//! CSV export, so both always agree bit-for-bit.

pub mod app_config;
pub mod config;
pub mod distance;
pub mod error;
pub mod export;
pub mod geo;
pub mod grid;
pub mod palette;
pub mod ranking;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use distance::{
    distance_badge, haversine_km, resolve_competitor_distances, sort_competitors_by_distance,
};
pub use error::{ConfigError, GridError};
pub use export::{
    csv_rows_to_grid, grid_to_csv_string, read_grid_csv, write_grid_csv, CsvRow, ParsedGrid,
    CSV_HEADER,
};
pub use geo::{compute_grid, offset_degrees, Coordinate, DistanceUnit};
pub use grid::{build_grid, build_grid_with, GridConfig, GridPoint, GridSummary, RankMatrix};
pub use palette::{load_palette, Palette};
pub use ranking::{classify, classify_with, rank_label, z_index, RankTier, RankingStyle};
pub use types::{BusinessInfo, Competitor, GridMetrics, GridResult};
