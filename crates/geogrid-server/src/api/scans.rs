use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use geogrid_core::{BusinessInfo, Competitor, DistanceUnit, GridResult};
use geogrid_db::NewGridResult;
use geogrid_places::{scan_grid, ScanRequest};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    map_db_error, map_grid_error, map_places_error, places_client, resolve_grid_config, ApiError,
    ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct ScanBody {
    pub business_info: BusinessInfo,
    pub search_term: String,
    pub size: Option<usize>,
    pub spacing: Option<f64>,
    pub unit: Option<DistanceUnit>,
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ScanResponse {
    pub result: GridResult,
    pub competitors: Vec<Competitor>,
    pub failed_cells: usize,
}

/// Run a grid scan for a business and store the result with its center-cell competitors.
pub(super) async fn run_scan(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ScanBody>,
) -> Result<impl IntoResponse, ApiError> {
    let client = places_client(&state, &req_id.0)?;

    let search_term = body.search_term.trim().to_owned();
    if search_term.is_empty() || body.business_info.place_id.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "search_term and business_info.place_id must not be empty",
        ));
    }
    body.business_info
        .location
        .validate()
        .map_err(|e| map_grid_error(req_id.0.clone(), &e))?;

    let config = resolve_grid_config(
        &req_id.0,
        state.defaults,
        body.business_info.location,
        body.size,
        body.spacing,
        body.unit,
    )?;
    let region = body
        .region
        .map(|r| r.trim().to_lowercase())
        .filter(|r| !r.is_empty());

    let request = ScanRequest {
        business_place_id: body.business_info.place_id.clone(),
        search_term: search_term.clone(),
        config,
        region: region.clone(),
        max_concurrency: state.defaults.scan_max_concurrency,
    };
    let outcome = scan_grid(&client, &request)
        .await
        .map_err(|e| map_places_error(req_id.0.clone(), &e))?;

    let new = NewGridResult {
        business_info: body.business_info,
        search_term,
        grid_size: config.size,
        grid_data: outcome.ranks,
        metrics: outcome.metrics,
        google_region: region,
        distance_km: config.spacing_km(),
    };
    let (stored, _) = geogrid_db::insert_scan_result(&state.pool, &new, &outcome.competitors)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(
        id = %stored.id,
        failed_cells = outcome.failed_cells,
        competitors = outcome.competitors.len(),
        "grid scan stored"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            ScanResponse {
                result: stored,
                competitors: outcome.competitors,
                failed_cells: outcome.failed_cells,
            },
            req_id.0,
        )),
    ))
}
