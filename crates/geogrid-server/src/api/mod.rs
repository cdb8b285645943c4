mod competitors;
mod grid_results;
mod grids;
mod places;
mod scans;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use geogrid_core::{Coordinate, DistanceUnit, GridConfig, GridError, Palette};
use geogrid_places::{PlacesClient, PlacesError};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

/// Largest grid the API will build or scan. A 25x25 scan is 625 places requests.
pub(crate) const MAX_GRID_SIZE: usize = 25;

/// Defaults applied when a request omits grid geometry.
#[derive(Debug, Clone, Copy)]
pub struct GridDefaults {
    pub size: usize,
    pub spacing_km: f64,
    pub scan_max_concurrency: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub places: Option<Arc<PlacesClient>>,
    pub palette: Arc<Palette>,
    pub defaults: GridDefaults,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
    places: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            "service_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_db_error(request_id: String, error: &geogrid_db::DbError) -> ApiError {
    if matches!(error, geogrid_db::DbError::NotFound) {
        return ApiError::new(request_id, "not_found", "record not found");
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_grid_error(request_id: String, error: &GridError) -> ApiError {
    ApiError::new(request_id, "validation_error", error.to_string())
}

pub(super) fn map_places_error(request_id: String, error: &PlacesError) -> ApiError {
    match error {
        PlacesError::NoResults(_) => ApiError::new(request_id, "not_found", error.to_string()),
        PlacesError::Grid(e) => map_grid_error(request_id, e),
        PlacesError::QuotaExceeded(_) => {
            tracing::warn!(error = %error, "places API quota exhausted");
            ApiError::new(
                request_id,
                "service_unavailable",
                "places API quota exceeded",
            )
        }
        PlacesError::InvalidBaseUrl { .. } => {
            tracing::error!(error = %error, "places client misconfigured");
            ApiError::new(request_id, "internal_error", "places client misconfigured")
        }
        PlacesError::Http(_) | PlacesError::ApiError { .. } | PlacesError::Deserialize { .. } => {
            tracing::error!(error = %error, "places API request failed");
            ApiError::new(request_id, "upstream_error", "places API request failed")
        }
    }
}

/// The configured places client, or `service_unavailable` when no API key was set.
pub(super) fn places_client(
    state: &AppState,
    request_id: &str,
) -> Result<Arc<PlacesClient>, ApiError> {
    state.places.clone().ok_or_else(|| {
        ApiError::new(
            request_id,
            "service_unavailable",
            "places API is not configured",
        )
    })
}

/// Resolve optional request geometry against the configured defaults and validate it.
pub(super) fn resolve_grid_config(
    request_id: &str,
    defaults: GridDefaults,
    center: Coordinate,
    size: Option<usize>,
    spacing: Option<f64>,
    unit: Option<DistanceUnit>,
) -> Result<GridConfig, ApiError> {
    // The default spacing is in km, so a unit without a spacing has nothing to apply to.
    let (spacing, unit) = match spacing {
        Some(spacing) => (spacing, unit.unwrap_or_default()),
        None => (defaults.spacing_km, DistanceUnit::Kilometers),
    };
    let config = GridConfig {
        center,
        size: size.unwrap_or(defaults.size),
        spacing,
        unit,
    };

    if config.size > MAX_GRID_SIZE {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            format!(
                "grid size must be at most {MAX_GRID_SIZE}, got {}",
                config.size
            ),
        ));
    }
    config
        .validate()
        .map_err(|e| map_grid_error(request_id.to_owned(), &e))?;
    Ok(config)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/places/nearby", get(places::nearby_search))
        .route("/api/v1/places/search", get(places::text_search))
        .route("/api/v1/places/photo", get(places::photo))
        .route("/api/v1/geocode", get(places::geocode))
        .route("/api/v1/ranking/{rank}", get(grids::ranking_style))
        .route("/api/v1/grids/preview", post(grids::preview_grid))
        .route("/api/v1/grids/export", post(grids::export_grid))
        .route(
            "/api/v1/grid-results",
            get(grid_results::list_grid_results).post(grid_results::create_grid_result),
        )
        .route(
            "/api/v1/grid-results/{id}",
            get(grid_results::get_grid_result).delete(grid_results::delete_grid_result),
        )
        .route(
            "/api/v1/grid-results/{id}/points",
            get(grid_results::get_grid_points),
        )
        .route(
            "/api/v1/grid-results/{id}/export.csv",
            get(grid_results::export_grid_result),
        )
        .route(
            "/api/v1/grid-results/{id}/competitors",
            get(competitors::list_competitors).post(competitors::create_competitors),
        )
        .route("/api/v1/scans", post(scans::run_scan))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);
    let places = if state.places.is_some() {
        "configured"
    } else {
        "unconfigured"
    };

    match geogrid_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                    places,
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                        places,
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
