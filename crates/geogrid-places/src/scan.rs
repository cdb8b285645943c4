//! Grid scans: one text search per grid cell, recording where the business ranks.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use geogrid_core::{compute_grid, Competitor, Coordinate, GridConfig, GridMetrics, RankMatrix};

use crate::client::PlacesClient;
use crate::error::PlacesError;
use crate::metrics::compute_metrics;
use crate::types::{PlacesPage, TextSearch};

/// Rank recorded when the business is not in the first page of results ("20+").
pub const NOT_FOUND_RANK: i32 = 21;

/// Rank recorded when the search for a cell failed.
pub const NO_DATA_RANK: i32 = 0;

/// Largest search radius the places API accepts, in meters.
const MAX_RADIUS_M: u32 = 50_000;

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub business_place_id: String,
    pub search_term: String,
    pub config: GridConfig,
    pub region: Option<String>,
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub ranks: RankMatrix,
    pub metrics: GridMetrics,
    /// Other businesses from the center cell's results, in result order.
    pub competitors: Vec<Competitor>,
    pub failed_cells: usize,
}

/// Run a search at every grid cell and collect the business's rank per cell.
///
/// Each cell's text search is biased to the cell coordinate with a radius of
/// one grid spacing. The rank is the 1-based position of `business_place_id`
/// in the first page; absent gives [`NOT_FOUND_RANK`]. A cell whose request
/// fails is logged and recorded as [`NO_DATA_RANK`].
///
/// # Errors
///
/// - [`PlacesError::Grid`] if the grid configuration is invalid.
/// - [`PlacesError::QuotaExceeded`] as soon as any cell hits the quota. Cells
///   not yet started are never requested.
pub async fn scan_grid(
    client: &PlacesClient,
    request: &ScanRequest,
) -> Result<ScanOutcome, PlacesError> {
    let config = &request.config;
    let coordinates = compute_grid(config.center, config.size, config.spacing_km())?;
    let radius_m = search_radius_m(config.spacing_km());
    let center = (config.size / 2, config.size / 2);

    let cells: Vec<(usize, usize, Coordinate)> = coordinates
        .iter()
        .enumerate()
        .flat_map(|(row, cols)| {
            cols.iter()
                .enumerate()
                .map(move |(col, coordinate)| (row, col, *coordinate))
        })
        .collect();

    tracing::info!(
        search_term = %request.search_term,
        cells = cells.len(),
        radius_m,
        "starting grid scan"
    );

    let term = request.search_term.as_str();
    let region = request.region.as_deref();
    let mut searches = stream::iter(cells)
        .map(move |(row, col, coordinate)| async move {
            let search = TextSearch {
                query: term.to_owned(),
                location: Some(coordinate),
                radius_m: Some(radius_m),
                region: region.map(ToOwned::to_owned),
                page_token: None,
            };
            (row, col, client.text_search(&search).await)
        })
        .buffer_unordered(request.max_concurrency.max(1));

    let mut ranks = vec![vec![NO_DATA_RANK; config.size]; config.size];
    let mut competitors = Vec::new();
    let mut failed_cells = 0usize;

    // Dropping the stream on quota exhaustion cancels in-flight searches and
    // keeps the remaining cells from being requested at all.
    while let Some((row, col, result)) = searches.next().await {
        match result {
            Ok(page) => {
                ranks[row][col] = rank_in_page(&page, &request.business_place_id);
                if (row, col) == center {
                    competitors =
                        center_competitors(&page, &request.business_place_id, config.center);
                }
            }
            Err(PlacesError::QuotaExceeded(message)) => {
                tracing::warn!(row, col, "places quota exceeded, aborting grid scan");
                return Err(PlacesError::QuotaExceeded(message));
            }
            Err(e) => {
                tracing::warn!(row, col, error = %e, "grid cell search failed");
                failed_cells += 1;
            }
        }
    }

    let metrics = compute_metrics(&ranks);
    tracing::info!(
        failed_cells,
        agr = metrics.agr,
        solv = metrics.solv,
        "grid scan complete"
    );

    Ok(ScanOutcome {
        ranks,
        metrics,
        competitors,
        failed_cells,
    })
}

fn rank_in_page(page: &PlacesPage, business_place_id: &str) -> i32 {
    page.results
        .iter()
        .take(20)
        .position(|place| place.place_id == business_place_id)
        .and_then(|index| i32::try_from(index + 1).ok())
        .unwrap_or(NOT_FOUND_RANK)
}

fn center_competitors(
    page: &PlacesPage,
    business_place_id: &str,
    origin: Coordinate,
) -> Vec<Competitor> {
    let mut seen = HashSet::new();
    page.results
        .iter()
        .take(20)
        .zip(1..)
        .filter(|(place, _)| place.place_id != business_place_id)
        .filter(|(place, _)| seen.insert(place.place_id.as_str()))
        .map(|(place, ranking)| place.to_competitor(ranking, origin))
        .collect()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn search_radius_m(spacing_km: f64) -> u32 {
    let meters = (spacing_km * 1000.0).round();
    if meters >= f64::from(MAX_RADIUS_M) {
        MAX_RADIUS_M
    } else {
        (meters as u32).max(1)
    }
}
