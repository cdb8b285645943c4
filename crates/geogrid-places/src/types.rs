use geogrid_core::{haversine_km, Competitor, Coordinate};
use serde::{Deserialize, Serialize};

/// JSON envelope shared by the search and geocode endpoints.
///
/// `status` is `OK` or `ZERO_RESULTS` on success; anything else is an error
/// with an optional human-readable `error_message`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<LatLng> for Coordinate {
    fn from(value: LatLng) -> Self {
        Coordinate {
            latitude: value.lat,
            longitude: value.lng,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacePhotoRef {
    pub photo_reference: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// One place from a nearby or text search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceResult {
    pub place_id: String,
    pub name: String,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_ratings_total: Option<u32>,
    /// Short address returned by nearby search.
    #[serde(default)]
    pub vicinity: Option<String>,
    /// Full address returned by text search.
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub business_status: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub photos: Vec<PlacePhotoRef>,
}

impl PlaceResult {
    #[must_use]
    pub fn location(&self) -> Option<Coordinate> {
        self.geometry.as_ref().map(|g| g.location.into())
    }

    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.formatted_address
            .as_deref()
            .or(self.vicinity.as_deref())
    }

    /// Convert to a [`Competitor`] at `ranking`, measuring distance from `origin`.
    #[must_use]
    pub fn to_competitor(&self, ranking: i32, origin: Coordinate) -> Competitor {
        let location = self.location();
        Competitor {
            id: self.place_id.clone(),
            name: self.name.clone(),
            ranking,
            distance_km: location.map(|loc| haversine_km(origin, loc)),
            rating: self.rating,
            location,
        }
    }
}

/// One page of search results. `next_page_token` is present when the API
/// has more pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacesPage {
    pub results: Vec<PlaceResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NearbySearch {
    pub location: Coordinate,
    pub radius_m: u32,
    pub keyword: Option<String>,
    pub region: Option<String>,
    pub page_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextSearch {
    pub query: String,
    /// Bias results toward this point.
    pub location: Option<Coordinate>,
    pub radius_m: Option<u32>,
    /// ccTLD region code, e.g. `us` or `de`.
    pub region: Option<String>,
    pub page_token: Option<String>,
}

impl TextSearch {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            location: None,
            radius_m: None,
            region: None,
            page_token: None,
        }
    }
}

/// Raw image bytes from the photo endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacePhoto {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResult {
    pub geometry: Geometry,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub place_id: Option<String>,
}

/// First geocoding match for an address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodedAddress {
    pub location: Coordinate,
    pub formatted_address: Option<String>,
    pub place_id: Option<String>,
}
