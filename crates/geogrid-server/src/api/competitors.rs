use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use geogrid_core::{
    compute_grid, distance_badge, resolve_competitor_distances, sort_competitors_by_distance,
    Competitor, Coordinate,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::grid_results::load_grid_result;
use super::{map_db_error, map_grid_error, ApiError, ApiResponse, AppState};

/// Optional cell to measure distances from, as 0-based grid indices.
#[derive(Debug, Deserialize)]
pub(super) struct CompetitorsQuery {
    pub row: Option<usize>,
    pub col: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateCompetitorsRequest {
    pub competitors: Vec<Competitor>,
}

#[derive(Debug, Serialize)]
pub(super) struct CompetitorItem {
    #[serde(flatten)]
    pub competitor: Competitor,
    /// Short distance label, e.g. `850 m` or `2.4 km`.
    pub distance_label: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct CompetitorsWritten {
    pub written: u64,
}

impl From<Competitor> for CompetitorItem {
    fn from(competitor: Competitor) -> Self {
        let distance_label = competitor.distance_km.map(distance_badge);
        Self {
            competitor,
            distance_label,
        }
    }
}

fn validate_competitor(request_id: &str, competitor: &Competitor) -> Result<(), ApiError> {
    if competitor.id.trim().is_empty() || competitor.name.trim().is_empty() {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            "competitor id and name must not be empty",
        ));
    }
    if competitor.ranking < 1 {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            format!(
                "competitor {} has ranking {}; rankings start at 1",
                competitor.id, competitor.ranking
            ),
        ));
    }
    if let Some(location) = competitor.location {
        location
            .validate()
            .map_err(|e| map_grid_error(request_id.to_owned(), &e))?;
    }
    Ok(())
}

pub(super) async fn list_competitors(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Query(query): Query<CompetitorsQuery>,
) -> Result<Json<ApiResponse<Vec<CompetitorItem>>>, ApiError> {
    let result = load_grid_result(&state, &req_id.0, id).await?;
    let mut competitors = geogrid_db::list_competitors(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let origin = match (query.row, query.col) {
        (Some(row), Some(col)) => Some(cell_coordinate(&req_id.0, &result, row, col)?),
        (None, None) => None,
        _ => {
            return Err(ApiError::new(
                req_id.0,
                "validation_error",
                "row and col must be provided together",
            ))
        }
    };

    if let Some(origin) = origin {
        // Stored distances are from the business; re-measure from the selected cell.
        for competitor in &mut competitors {
            competitor.distance_km = None;
        }
        resolve_competitor_distances(origin, &mut competitors);
        sort_competitors_by_distance(&mut competitors);
    }

    let data = competitors.into_iter().map(CompetitorItem::from).collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

fn cell_coordinate(
    request_id: &str,
    result: &geogrid_core::GridResult,
    row: usize,
    col: usize,
) -> Result<Coordinate, ApiError> {
    let config = result.grid_config();
    let grid = compute_grid(config.center, config.size, config.spacing_km())
        .map_err(|e| map_grid_error(request_id.to_owned(), &e))?;
    grid.get(row)
        .and_then(|cells| cells.get(col))
        .copied()
        .ok_or_else(|| {
            ApiError::new(
                request_id,
                "validation_error",
                format!(
                    "cell ({row}, {col}) is outside the {0}x{0} grid",
                    config.size
                ),
            )
        })
}

pub(super) async fn create_competitors(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Json(body): Json<CreateCompetitorsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = load_grid_result(&state, &req_id.0, id).await?;
    let mut competitors = body.competitors;
    let mut seen = HashSet::with_capacity(competitors.len());
    for competitor in &competitors {
        validate_competitor(&req_id.0, competitor)?;
        if !seen.insert(competitor.id.as_str()) {
            return Err(ApiError::new(
                req_id.0,
                "validation_error",
                format!("competitor {} appears more than once", competitor.id),
            ));
        }
    }
    resolve_competitor_distances(result.business_info.location, &mut competitors);

    let written = geogrid_db::insert_competitors(&state.pool, id, &competitors)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    tracing::info!(%id, written, "competitors stored");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(CompetitorsWritten { written }, req_id.0)),
    ))
}
