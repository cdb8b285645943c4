use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use geogrid_core::{
    build_grid_with, BusinessInfo, GridConfig, GridMetrics, GridPoint, GridResult, GridSummary,
    RankMatrix,
};
use geogrid_db::NewGridResult;
use geogrid_places::compute_metrics;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::grids::csv_response;
use super::{
    map_db_error, map_grid_error, normalize_limit, resolve_grid_config, ApiError, ApiResponse,
    AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct GridResultsQuery {
    pub limit: Option<i64>,
    pub search_term: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateGridResultRequest {
    pub business_info: BusinessInfo,
    pub search_term: String,
    pub grid_size: usize,
    pub grid_data: RankMatrix,
    /// Computed from `grid_data` when omitted; stored verbatim otherwise.
    pub metrics: Option<GridMetrics>,
    pub google_region: Option<String>,
    pub distance_km: f64,
}

#[derive(Debug, Serialize)]
pub(super) struct GridPointsResponse {
    pub config: GridConfig,
    pub summary: GridSummary,
    pub points: Vec<GridPoint>,
}

/// Fetch a stored result or answer `not_found`.
pub(super) async fn load_grid_result(
    state: &AppState,
    request_id: &str,
    id: Uuid,
) -> Result<GridResult, ApiError> {
    geogrid_db::get_grid_result(&state.pool, id)
        .await
        .map_err(|e| map_db_error(request_id.to_owned(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                request_id,
                "not_found",
                format!("grid result {id} not found"),
            )
        })
}

/// Assemble a stored result into styled points.
pub(super) fn assemble_points(
    state: &AppState,
    request_id: &str,
    result: &GridResult,
) -> Result<Vec<GridPoint>, ApiError> {
    result.assemble(&state.palette).map_err(|e| {
        tracing::error!(id = %result.id, error = %e, "stored grid result failed to assemble");
        ApiError::new(
            request_id,
            "internal_error",
            "stored grid result is invalid",
        )
    })
}

pub(super) async fn list_grid_results(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<GridResultsQuery>,
) -> Result<Json<ApiResponse<Vec<GridResult>>>, ApiError> {
    let limit = normalize_limit(query.limit);
    let search_term = query
        .search_term
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let results = geogrid_db::list_grid_results(&state.pool, limit, search_term)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(results, req_id.0)))
}

pub(super) async fn create_grid_result(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateGridResultRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let search_term = body.search_term.trim().to_owned();
    if search_term.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "search_term must not be empty",
        ));
    }

    let config = resolve_grid_config(
        &req_id.0,
        state.defaults,
        body.business_info.location,
        Some(body.grid_size),
        Some(body.distance_km),
        None,
    )?;
    build_grid_with(&state.palette, &config, Some(body.grid_data.as_slice()))
        .map_err(|e| map_grid_error(req_id.0.clone(), &e))?;

    let metrics = body
        .metrics
        .unwrap_or_else(|| compute_metrics(&body.grid_data));
    let new = NewGridResult {
        business_info: body.business_info,
        search_term,
        grid_size: body.grid_size,
        grid_data: body.grid_data,
        metrics,
        google_region: body.google_region,
        distance_km: body.distance_km,
    };

    let stored = geogrid_db::insert_grid_result(&state.pool, &new)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    tracing::info!(id = %stored.id, search_term = %stored.search_term, "grid result stored");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(stored, req_id.0)),
    ))
}

pub(super) async fn get_grid_result(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<GridResult>>, ApiError> {
    let result = load_grid_result(&state, &req_id.0, id).await?;
    Ok(Json(ApiResponse::new(result, req_id.0)))
}

pub(super) async fn delete_grid_result(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    geogrid_db::delete_grid_result(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0, &e))?;
    tracing::info!(%id, "grid result deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn get_grid_points(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<GridPointsResponse>>, ApiError> {
    let result = load_grid_result(&state, &req_id.0, id).await?;
    let points = assemble_points(&state, &req_id.0, &result)?;

    Ok(Json(ApiResponse::new(
        GridPointsResponse {
            config: result.grid_config(),
            summary: GridSummary::from_points(&points),
            points,
        },
        req_id.0,
    )))
}

pub(super) async fn export_grid_result(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = load_grid_result(&state, &req_id.0, id).await?;
    let points = assemble_points(&state, &req_id.0, &result)?;
    csv_response(&req_id.0, &points, &format!("grid-{id}.csv"))
}
