//! HTTP client for the Google Places and Geocoding web services.
//!
//! Wraps `reqwest` with API key management, retry on transient failures, and
//! typed response deserialization. Every JSON endpoint checks the `"status"`
//! field in the envelope: `OK` and `ZERO_RESULTS` succeed, `OVER_QUERY_LIMIT`
//! becomes [`PlacesError::QuotaExceeded`], anything else [`PlacesError::ApiError`].

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::PlacesError;
use crate::retry::retry_with_backoff;
use crate::types::{
    ApiEnvelope, GeocodeResult, GeocodedAddress, NearbySearch, PlacePhoto, PlaceResult,
    PlacesPage, TextSearch,
};

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/";

const NEARBY_SEARCH_PATH: &str = "place/nearbysearch/json";
const TEXT_SEARCH_PATH: &str = "place/textsearch/json";
const PHOTO_PATH: &str = "place/photo";
const GEOCODE_PATH: &str = "geocode/json";

/// Client for the places and geocoding APIs.
///
/// Use [`PlacesClient::new`] for production or [`PlacesClient::with_base_url`]
/// to point at a mock server in tests. Retries default to none; enable them
/// with [`PlacesClient::with_retry`].
pub struct PlacesClient {
    client: Client,
    api_key: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl PlacesClient {
    /// # Errors
    ///
    /// Returns [`PlacesError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, PlacesError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`PlacesError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, PlacesError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("geogrid/0.1 (local-rank-tracking)")
            .build()?;

        // Endpoint paths are joined onto the base, so it must end in exactly one slash.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| PlacesError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Places within `radius_m` of a point, optionally filtered by keyword.
    ///
    /// # Errors
    ///
    /// - [`PlacesError::QuotaExceeded`] when the API reports `OVER_QUERY_LIMIT`.
    /// - [`PlacesError::ApiError`] for any other non-OK status.
    /// - [`PlacesError::Http`] on network failure or non-2xx HTTP status.
    /// - [`PlacesError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn nearby_search(&self, search: &NearbySearch) -> Result<PlacesPage, PlacesError> {
        let location = search.location.to_string();
        let radius = search.radius_m.to_string();
        let mut params = vec![("location", location.as_str()), ("radius", radius.as_str())];
        if let Some(keyword) = search.keyword.as_deref() {
            params.push(("keyword", keyword));
        }
        if let Some(region) = search.region.as_deref() {
            params.push(("region", region));
        }
        if let Some(token) = search.page_token.as_deref() {
            params.push(("pagetoken", token));
        }

        let url = self.build_url(NEARBY_SEARCH_PATH, &params)?;
        let envelope: ApiEnvelope<PlaceResult> = self.fetch_envelope(&url).await?;
        tracing::debug!(
            location = %search.location,
            results = envelope.results.len(),
            "nearby search complete"
        );
        Ok(PlacesPage {
            results: envelope.results,
            next_page_token: envelope.next_page_token,
        })
    }

    /// Free-text search, optionally biased to a location and region.
    ///
    /// The order of `results` is the API's relevance ranking; grid scans
    /// derive a business's rank from its position in this list.
    ///
    /// # Errors
    ///
    /// Same as [`PlacesClient::nearby_search`].
    pub async fn text_search(&self, search: &TextSearch) -> Result<PlacesPage, PlacesError> {
        let location = search.location.map(|loc| loc.to_string());
        let radius = search.radius_m.map(|r| r.to_string());

        let mut params = vec![("query", search.query.as_str())];
        if let Some(location) = location.as_deref() {
            params.push(("location", location));
        }
        if let Some(radius) = radius.as_deref() {
            params.push(("radius", radius));
        }
        if let Some(region) = search.region.as_deref() {
            params.push(("region", region));
        }
        if let Some(token) = search.page_token.as_deref() {
            params.push(("pagetoken", token));
        }

        let url = self.build_url(TEXT_SEARCH_PATH, &params)?;
        let envelope: ApiEnvelope<PlaceResult> = self.fetch_envelope(&url).await?;
        Ok(PlacesPage {
            results: envelope.results,
            next_page_token: envelope.next_page_token,
        })
    }

    /// Downloads a place photo scaled to at most `max_width` pixels wide.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::Http`] on network failure or non-2xx HTTP status.
    pub async fn photo(
        &self,
        photo_reference: &str,
        max_width: u32,
    ) -> Result<PlacePhoto, PlacesError> {
        let max_width = max_width.to_string();
        let url = self.build_url(
            PHOTO_PATH,
            &[
                ("maxwidth", max_width.as_str()),
                ("photo_reference", photo_reference),
            ],
        )?;

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self.client.get(url).send().await?.error_for_status()?;
                let content_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("application/octet-stream")
                    .to_owned();
                let bytes = response.bytes().await?.to_vec();
                Ok(PlacePhoto {
                    content_type,
                    bytes,
                })
            }
        })
        .await
    }

    /// Resolves an address to its first geocoding match.
    ///
    /// # Errors
    ///
    /// - [`PlacesError::NoResults`] when the API returns `ZERO_RESULTS`.
    /// - Otherwise the same as [`PlacesClient::nearby_search`].
    pub async fn geocode(&self, address: &str) -> Result<GeocodedAddress, PlacesError> {
        let url = self.build_url(GEOCODE_PATH, &[("address", address)])?;
        let envelope: ApiEnvelope<GeocodeResult> = self.fetch_envelope(&url).await?;
        let first = envelope
            .results
            .into_iter()
            .next()
            .ok_or_else(|| PlacesError::NoResults(address.to_owned()))?;
        Ok(GeocodedAddress {
            location: first.geometry.location.into(),
            formatted_address: first.formatted_address,
            place_id: first.place_id,
        })
    }

    /// Joins `path` onto the base URL and appends `key` plus `params` via
    /// [`Url::query_pairs_mut`], so every value is percent-encoded.
    fn build_url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, PlacesError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| PlacesError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("key", &self.api_key);
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    async fn fetch_envelope<T: DeserializeOwned>(
        &self,
        url: &Url,
    ) -> Result<ApiEnvelope<T>, PlacesError> {
        let body = self.request_json(url).await?;
        Self::check_api_status(&body)?;
        serde_json::from_value(body).map_err(|e| PlacesError::Deserialize {
            context: url.path().to_owned(),
            source: e,
        })
    }

    /// Sends a GET request with retry, asserts a 2xx HTTP status, and parses
    /// the response body as JSON.
    async fn request_json(&self, url: &Url) -> Result<serde_json::Value, PlacesError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self.client.get(url.clone()).send().await?;
                let response = response.error_for_status()?;
                let body = response.text().await?;
                // The query string carries the API key; log only the path.
                serde_json::from_str(&body).map_err(|e| PlacesError::Deserialize {
                    context: url.path().to_owned(),
                    source: e,
                })
            }
        })
        .await
    }

    fn check_api_status(body: &serde_json::Value) -> Result<(), PlacesError> {
        let status = body
            .get("status")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("UNKNOWN_ERROR");
        let message = || {
            body.get("error_message")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown error")
                .to_string()
        };
        match status {
            "OK" | "ZERO_RESULTS" => Ok(()),
            "OVER_QUERY_LIMIT" => Err(PlacesError::QuotaExceeded(message())),
            other => Err(PlacesError::ApiError {
                status: other.to_owned(),
                message: message(),
            }),
        }
    }
}
