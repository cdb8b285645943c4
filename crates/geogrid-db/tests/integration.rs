//! Offline unit tests for geogrid-db pool configuration and row mapping.
//! These tests do not require a live database connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use chrono::Utc;
use geogrid_core::{
    AppConfig, BusinessInfo, Competitor, Coordinate, Environment, GridMetrics, GridResult,
};
use geogrid_db::{CompetitorRow, DbError, GridResultRow, PoolConfig};
use sqlx::types::Json;
use uuid::Uuid;

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        places_api_key: None,
        palette_path: None,
        api_keys: Vec::new(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        places_request_timeout_secs: 30,
        places_max_retries: 3,
        places_retry_backoff_base_ms: 1000,
        scan_max_concurrency: 4,
        default_grid_size: 13,
        default_spacing_km: 2.5,
    }
}

fn grid_result_row(grid_size: i32) -> GridResultRow {
    GridResultRow {
        id: Uuid::new_v4(),
        business_info: Json(BusinessInfo {
            name: "Corner Bakery".to_string(),
            place_id: "place-1".to_string(),
            address: None,
            location: Coordinate::new(40.0, -74.0).unwrap(),
        }),
        search_term: "bakery".to_string(),
        created_at: Utc::now(),
        grid_size,
        grid_data: Json(vec![vec![1, 2, 3], vec![0, 21, 4], vec![5, 6, 7]]),
        metrics: Json(GridMetrics {
            agr: 6.125,
            atgr: 4.0,
            solv: 37.5,
        }),
        google_region: Some("us".to_string()),
        distance_km: 2.5,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn grid_result_row_maps_to_domain_value() {
    let row = grid_result_row(3);
    let id = row.id;
    let result = GridResult::try_from(row).expect("row should map");

    assert_eq!(result.id, id);
    assert_eq!(result.grid_size, 3);
    assert_eq!(result.grid_data[1][1], 21);
    assert!((result.metrics.solv - 37.5).abs() < f64::EPSILON);
    assert_eq!(result.google_region.as_deref(), Some("us"));
}

#[test]
fn negative_grid_size_is_an_invalid_row() {
    let err = GridResult::try_from(grid_result_row(-1)).unwrap_err();
    assert!(matches!(err, DbError::InvalidRow(_)), "got {err:?}");
}

#[test]
fn competitor_row_maps_location_only_when_both_parts_present() {
    let row = CompetitorRow {
        id: 1,
        grid_result_id: Uuid::new_v4(),
        place_id: "rival".to_string(),
        name: "Rival Bakery".to_string(),
        ranking: 2,
        distance_km: Some(1.2),
        rating: Some(4.4),
        latitude: Some(40.01),
        longitude: Some(-74.0),
        created_at: Utc::now(),
    };
    let competitor = Competitor::from(row.clone());
    assert_eq!(competitor.id, "rival");
    assert_eq!(competitor.ranking, 2);
    assert_eq!(
        competitor.location,
        Some(Coordinate {
            latitude: 40.01,
            longitude: -74.0
        })
    );

    let partial = CompetitorRow {
        longitude: None,
        ..row
    };
    assert!(Competitor::from(partial).location.is_none());
}
