//! Stateless grid handlers: marker style lookup, preview and CSV export.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use geogrid_core::{
    build_grid_with, classify_with, grid_to_csv_string, Coordinate, DistanceUnit, GridConfig,
    GridPoint, GridSummary, RankMatrix, RankingStyle,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_grid_error, resolve_grid_config, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct GridRequest {
    pub center: Coordinate,
    pub size: Option<usize>,
    pub spacing: Option<f64>,
    pub unit: Option<DistanceUnit>,
    pub ranks: Option<RankMatrix>,
}

#[derive(Debug, Serialize)]
pub(super) struct GridPreview {
    pub config: GridConfig,
    pub summary: GridSummary,
    pub points: Vec<GridPoint>,
}

pub(super) async fn ranking_style(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(rank): Path<i32>,
) -> Result<Json<ApiResponse<RankingStyle>>, ApiError> {
    let style = classify_with(&state.palette, rank).ok_or_else(|| {
        ApiError::new(
            req_id.0.clone(),
            "not_found",
            format!("no marker for rank {rank}; ranks start at 1"),
        )
    })?;
    Ok(Json(ApiResponse::new(style, req_id.0)))
}

fn assemble(
    state: &AppState,
    request_id: &str,
    body: &GridRequest,
) -> Result<(GridConfig, Vec<GridPoint>), ApiError> {
    let config = resolve_grid_config(
        request_id,
        state.defaults,
        body.center,
        body.size,
        body.spacing,
        body.unit,
    )?;
    let points = build_grid_with(&state.palette, &config, body.ranks.as_deref())
        .map_err(|e| map_grid_error(request_id.to_owned(), &e))?;
    Ok((config, points))
}

pub(super) async fn preview_grid(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<GridRequest>,
) -> Result<Json<ApiResponse<GridPreview>>, ApiError> {
    let (config, points) = assemble(&state, &req_id.0, &body)?;
    let summary = GridSummary::from_points(&points);
    tracing::debug!(
        size = config.size,
        spacing_km = config.spacing_km(),
        ranked = summary.ranked,
        "grid preview assembled"
    );
    Ok(Json(ApiResponse::new(
        GridPreview {
            config,
            summary,
            points,
        },
        req_id.0,
    )))
}

pub(super) async fn export_grid(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<GridRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, points) = assemble(&state, &req_id.0, &body)?;
    csv_response(&req_id.0, &points, "grid.csv")
}

/// Render `points` as a CSV attachment.
pub(super) fn csv_response(
    request_id: &str,
    points: &[GridPoint],
    filename: &str,
) -> Result<impl IntoResponse, ApiError> {
    let csv = grid_to_csv_string(points).map_err(|e| {
        tracing::error!(error = %e, "grid CSV rendering failed");
        ApiError::new(request_id, "internal_error", "failed to render CSV")
    })?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    ))
}
