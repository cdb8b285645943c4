//! Pass-through handlers for the places and geocoding APIs.

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use geogrid_core::Coordinate;
use geogrid_places::{GeocodedAddress, NearbySearch, PlacesPage, TextSearch};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_grid_error, map_places_error, places_client, ApiError, ApiResponse, AppState};

const DEFAULT_RADIUS_M: u32 = 5_000;
const MAX_RADIUS_M: u32 = 50_000;
const DEFAULT_PHOTO_WIDTH: u32 = 400;
const MAX_PHOTO_WIDTH: u32 = 1_600;

#[derive(Debug, Deserialize)]
pub(super) struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius: Option<u32>,
    pub keyword: Option<String>,
    pub region: Option<String>,
    pub page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    pub query: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<u32>,
    pub region: Option<String>,
    pub page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PhotoQuery {
    pub reference: String,
    pub max_width: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GeocodeQuery {
    pub address: String,
}

fn parse_location(request_id: &str, lat: f64, lng: f64) -> Result<Coordinate, ApiError> {
    Coordinate::new(lat, lng).map_err(|e| map_grid_error(request_id.to_owned(), &e))
}

fn validate_radius(request_id: &str, radius: Option<u32>) -> Result<u32, ApiError> {
    match radius.unwrap_or(DEFAULT_RADIUS_M) {
        r @ 1..=MAX_RADIUS_M => Ok(r),
        r => Err(ApiError::new(
            request_id,
            "validation_error",
            format!("radius must be between 1 and {MAX_RADIUS_M} meters, got {r}"),
        )),
    }
}

fn require_non_empty(request_id: &str, field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            format!("{field} must not be empty"),
        ));
    }
    Ok(())
}

pub(super) async fn nearby_search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<ApiResponse<PlacesPage>>, ApiError> {
    let client = places_client(&state, &req_id.0)?;
    let search = NearbySearch {
        location: parse_location(&req_id.0, query.lat, query.lng)?,
        radius_m: validate_radius(&req_id.0, query.radius)?,
        keyword: query.keyword,
        region: query.region,
        page_token: query.page_token,
    };

    let page = client
        .nearby_search(&search)
        .await
        .map_err(|e| map_places_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(page, req_id.0)))
}

pub(super) async fn text_search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<PlacesPage>>, ApiError> {
    let client = places_client(&state, &req_id.0)?;
    require_non_empty(&req_id.0, "query", &query.query)?;

    let location = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => Some(parse_location(&req_id.0, lat, lng)?),
        (None, None) => None,
        _ => {
            return Err(ApiError::new(
                req_id.0,
                "validation_error",
                "lat and lng must be provided together",
            ))
        }
    };
    let radius_m = query
        .radius
        .map(|r| validate_radius(&req_id.0, Some(r)))
        .transpose()?;

    let search = TextSearch {
        query: query.query,
        location,
        radius_m,
        region: query.region,
        page_token: query.page_token,
    };
    let page = client
        .text_search(&search)
        .await
        .map_err(|e| map_places_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(page, req_id.0)))
}

pub(super) async fn photo(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PhotoQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let client = places_client(&state, &req_id.0)?;
    require_non_empty(&req_id.0, "reference", &query.reference)?;
    let max_width = query
        .max_width
        .unwrap_or(DEFAULT_PHOTO_WIDTH)
        .clamp(1, MAX_PHOTO_WIDTH);

    let photo = client
        .photo(&query.reference, max_width)
        .await
        .map_err(|e| map_places_error(req_id.0.clone(), &e))?;

    Ok((
        [
            (header::CONTENT_TYPE, photo.content_type),
            (header::CACHE_CONTROL, "public, max-age=86400".to_owned()),
        ],
        photo.bytes,
    ))
}

pub(super) async fn geocode(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<GeocodeQuery>,
) -> Result<Json<ApiResponse<GeocodedAddress>>, ApiError> {
    let client = places_client(&state, &req_id.0)?;
    require_non_empty(&req_id.0, "address", &query.address)?;

    let geocoded = client
        .geocode(query.address.trim())
        .await
        .map_err(|e| map_places_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(geocoded, req_id.0)))
}
