//! Grid scan tests against a wiremock places API.

use geogrid_core::{Coordinate, DistanceUnit, GridConfig};
use geogrid_places::{scan_grid, PlacesClient, PlacesError, ScanRequest, NOT_FOUND_RANK};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(size: usize) -> ScanRequest {
    ScanRequest {
        business_place_id: "me".to_owned(),
        search_term: "plumber".to_owned(),
        config: GridConfig {
            center: Coordinate::new(40.0, -74.0).unwrap(),
            size,
            spacing: 1.0,
            unit: DistanceUnit::Kilometers,
        },
        region: Some("us".to_owned()),
        max_concurrency: 4,
    }
}

fn results_body(ids: &[&str]) -> serde_json::Value {
    let results: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "place_id": id,
                "name": format!("Business {id}"),
                "geometry": { "location": { "lat": 40.01, "lng": -74.0 } }
            })
        })
        .collect();
    serde_json::json!({ "status": "OK", "results": results })
}

#[tokio::test]
async fn scan_records_position_for_every_cell() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .and(query_param("query", "plumber"))
        .and(query_param("radius", "1000"))
        .and(query_param("region", "us"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results_body(&["a", "me", "b"])))
        .expect(9)
        .mount(&server)
        .await;

    let client = PlacesClient::with_base_url("k", 30, &server.uri()).unwrap();
    let outcome = scan_grid(&client, &request(3)).await.expect("scan should succeed");

    assert_eq!(outcome.ranks, vec![vec![2; 3]; 3]);
    assert_eq!(outcome.failed_cells, 0);
    assert!((outcome.metrics.agr - 2.0).abs() < 1e-9);
    assert!((outcome.metrics.solv - 100.0).abs() < 1e-9);

    let ids: Vec<&str> = outcome.competitors.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(outcome.competitors[1].ranking, 3);
    assert!(outcome.competitors[0].distance_km.is_some());
}

#[tokio::test]
async fn center_cell_is_queried_at_the_business_location() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .and(query_param("location", "40,-74"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results_body(&["me"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results_body(&["x", "y"])))
        .mount(&server)
        .await;

    let client = PlacesClient::with_base_url("k", 30, &server.uri()).unwrap();
    let outcome = scan_grid(&client, &request(3)).await.unwrap();

    assert_eq!(outcome.ranks[1][1], 1);
    assert_eq!(outcome.ranks[0][0], NOT_FOUND_RANK);
    assert!(outcome.competitors.is_empty());
}

#[tokio::test]
async fn failed_cells_are_recorded_as_no_data() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = PlacesClient::with_base_url("k", 30, &server.uri()).unwrap();
    let outcome = scan_grid(&client, &request(3)).await.unwrap();

    assert_eq!(outcome.ranks, vec![vec![0; 3]; 3]);
    assert_eq!(outcome.failed_cells, 9);
    assert!(outcome.metrics.agr.abs() < f64::EPSILON);
}

#[tokio::test]
async fn quota_exhaustion_aborts_the_scan() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "status": "OVER_QUERY_LIMIT" })),
        )
        .mount(&server)
        .await;

    let client = PlacesClient::with_base_url("k", 30, &server.uri()).unwrap();
    let result = scan_grid(&client, &request(3)).await;
    assert!(matches!(result, Err(PlacesError::QuotaExceeded(_))));
}

#[tokio::test]
async fn quota_exhaustion_stops_issuing_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "status": "OVER_QUERY_LIMIT" })),
        )
        .mount(&server)
        .await;

    let client = PlacesClient::with_base_url("k", 30, &server.uri()).unwrap();
    let mut sequential = request(5);
    sequential.max_concurrency = 1;
    let result = scan_grid(&client, &sequential).await;
    assert!(matches!(result, Err(PlacesError::QuotaExceeded(_))));

    let received = server
        .received_requests()
        .await
        .expect("request recording is enabled");
    assert_eq!(received.len(), 1, "scan kept searching after the quota error");
}

#[tokio::test]
async fn invalid_grid_is_rejected_before_any_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results_body(&[])))
        .expect(0)
        .mount(&server)
        .await;

    let client = PlacesClient::with_base_url("k", 30, &server.uri()).unwrap();
    let result = scan_grid(&client, &request(0)).await;
    assert!(matches!(result, Err(PlacesError::Grid(_))));
}
