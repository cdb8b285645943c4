//! Client for the Google Places and Geocoding APIs, plus grid scans built on it.

pub mod client;
pub mod error;
pub mod metrics;
pub(crate) mod retry;
pub mod scan;
pub mod types;

pub use client::PlacesClient;
pub use error::PlacesError;
pub use metrics::compute_metrics;
pub use scan::{scan_grid, ScanOutcome, ScanRequest, NOT_FOUND_RANK, NO_DATA_RANK};
pub use types::{
    GeocodedAddress, Geometry, LatLng, NearbySearch, PlacePhoto, PlacePhotoRef, PlaceResult,
    PlacesPage, TextSearch,
};
