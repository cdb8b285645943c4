//! Integration tests for `PlacesClient` using wiremock HTTP mocks.

use geogrid_core::Coordinate;
use geogrid_places::{NearbySearch, PlacesClient, PlacesError, TextSearch};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> PlacesClient {
    PlacesClient::with_base_url("test-key", 30, base_url)
        .expect("client construction should not fail")
}

#[tokio::test]
async fn text_search_returns_results_in_order() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "status": "OK",
        "results": [
            {
                "place_id": "p-1",
                "name": "Blue Bottle",
                "rating": 4.6,
                "formatted_address": "1 Market St",
                "geometry": { "location": { "lat": 37.79, "lng": -122.39 } }
            },
            {
                "place_id": "p-2",
                "name": "Sightglass",
                "geometry": { "location": { "lat": 37.77, "lng": -122.41 } }
            }
        ],
        "next_page_token": "next-123"
    });

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .and(query_param("key", "test-key"))
        .and(query_param("query", "coffee"))
        .and(query_param("location", "37.78,-122.4"))
        .and(query_param("radius", "2500"))
        .and(query_param("region", "us"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let search = TextSearch {
        location: Some(Coordinate::new(37.78, -122.4).unwrap()),
        radius_m: Some(2500),
        region: Some("us".to_owned()),
        ..TextSearch::new("coffee")
    };
    let page = client.text_search(&search).await.expect("should parse page");

    assert_eq!(page.results.len(), 2);
    assert_eq!(page.results[0].place_id, "p-1");
    assert_eq!(page.results[0].address(), Some("1 Market St"));
    assert_eq!(page.results[1].name, "Sightglass");
    assert_eq!(page.next_page_token.as_deref(), Some("next-123"));
}

#[tokio::test]
async fn nearby_search_passes_keyword_and_page_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/nearbysearch/json"))
        .and(query_param("location", "40,-74"))
        .and(query_param("radius", "1000"))
        .and(query_param("keyword", "bakery"))
        .and(query_param("pagetoken", "tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "results": [{ "place_id": "b-1", "name": "Levain", "vicinity": "W 74th St" }]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let page = client
        .nearby_search(&NearbySearch {
            location: Coordinate::new(40.0, -74.0).unwrap(),
            radius_m: 1000,
            keyword: Some("bakery".to_owned()),
            region: None,
            page_token: Some("tok".to_owned()),
        })
        .await
        .expect("should parse page");

    assert_eq!(page.results.len(), 1);
    assert_eq!(page.results[0].address(), Some("W 74th St"));
    assert!(page.next_page_token.is_none());
}

#[tokio::test]
async fn zero_results_is_an_empty_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "ZERO_RESULTS", "results": [] })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let page = client
        .text_search(&TextSearch::new("nothing here"))
        .await
        .expect("zero results is not an error");
    assert!(page.results.is_empty());
}

#[tokio::test]
async fn request_denied_returns_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid."
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.text_search(&TextSearch::new("coffee")).await;

    match result {
        Err(PlacesError::ApiError { status, message }) => {
            assert_eq!(status, "REQUEST_DENIED");
            assert!(message.contains("invalid"), "unexpected message: {message}");
        }
        other => panic!("expected ApiError, got: {other:?}"),
    }
}

#[tokio::test]
async fn over_query_limit_returns_quota_exceeded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OVER_QUERY_LIMIT",
            "error_message": "You have exceeded your daily request quota."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri()).with_retry(3, 0);
    let result = client.text_search(&TextSearch::new("coffee")).await;
    assert!(
        matches!(result, Err(PlacesError::QuotaExceeded(_))),
        "expected QuotaExceeded, got: {result:?}"
    );
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = test_client(&server.uri()).with_retry(2, 0);
    let result = client.text_search(&TextSearch::new("coffee")).await;
    assert!(
        matches!(result, Err(PlacesError::Http(_))),
        "expected Http error, got: {result:?}"
    );
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri()).with_retry(3, 0);
    let result = client.text_search(&TextSearch::new("coffee")).await;
    assert!(matches!(result, Err(PlacesError::Http(_))));
}

#[tokio::test]
async fn malformed_body_returns_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.text_search(&TextSearch::new("coffee")).await;
    match result {
        Err(PlacesError::Deserialize { context, .. }) => {
            assert!(!context.contains("test-key"), "context leaks API key: {context}");
        }
        other => panic!("expected Deserialize, got: {other:?}"),
    }
}

#[tokio::test]
async fn geocode_returns_first_match() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode/json"))
        .and(query_param("address", "1600 Amphitheatre Pkwy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "results": [
                {
                    "place_id": "g-1",
                    "formatted_address": "1600 Amphitheatre Pkwy, Mountain View, CA",
                    "geometry": { "location": { "lat": 37.422, "lng": -122.084 } }
                },
                {
                    "geometry": { "location": { "lat": 0.0, "lng": 0.0 } }
                }
            ]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let geocoded = client
        .geocode("1600 Amphitheatre Pkwy")
        .await
        .expect("should geocode");
    assert_eq!(geocoded.location, Coordinate::new(37.422, -122.084).unwrap());
    assert_eq!(geocoded.place_id.as_deref(), Some("g-1"));
}

#[tokio::test]
async fn geocode_zero_results_is_no_results() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "ZERO_RESULTS", "results": [] })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.geocode("nowhere at all").await;
    assert!(
        matches!(result, Err(PlacesError::NoResults(ref a)) if a == "nowhere at all"),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn photo_returns_bytes_and_content_type() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/photo"))
        .and(query_param("photo_reference", "ref-1"))
        .and(query_param("maxwidth", "400"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(vec![0xFF, 0xD8, 0xFF]),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let photo = client.photo("ref-1", 400).await.expect("should fetch photo");
    assert_eq!(photo.content_type, "image/jpeg");
    assert_eq!(photo.bytes, vec![0xFF, 0xD8, 0xFF]);
}
