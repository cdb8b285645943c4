use geogrid_core::GridError;
use thiserror::Error;

/// Errors returned by the places API client.
#[derive(Debug, Error)]
pub enum PlacesError {
    /// Network or TLS failure, or a non-2xx status, from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-OK `status` in its JSON envelope.
    #[error("places API error ({status}): {message}")]
    ApiError { status: String, message: String },

    /// `OVER_QUERY_LIMIT`. Never retried.
    #[error("places API quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Geocoding found nothing for the address.
    #[error("no geocoding results for '{0}'")]
    NoResults(String),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Grid(#[from] GridError),
}
