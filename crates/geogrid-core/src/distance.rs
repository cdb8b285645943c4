//! Great-circle distance and competitor ordering.

use std::cmp::Ordering;

use crate::geo::Coordinate;
use crate::types::Competitor;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two coordinates in kilometers.
#[must_use]
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lng = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Short human-readable distance: meters under 1 km, one decimal of km above.
#[must_use]
pub fn distance_badge(km: f64) -> String {
    let meters = (km * 1000.0).round();
    if meters < 1000.0 {
        #[allow(clippy::cast_possible_truncation)]
        let meters = meters as i64;
        format!("{meters} m")
    } else {
        format!("{km:.1} km")
    }
}

/// Fill in `distance_km` from `location` for competitors the API left without one.
pub fn resolve_competitor_distances(origin: Coordinate, competitors: &mut [Competitor]) {
    for competitor in competitors.iter_mut() {
        if competitor.distance_km.is_none() {
            competitor.distance_km = competitor
                .location
                .map(|location| haversine_km(origin, location));
        }
    }
}

/// Nearest first. Unknown distances go last; ties fall back to ranking.
pub fn sort_competitors_by_distance(competitors: &mut [Competitor]) {
    competitors.sort_by(|a, b| {
        let by_distance = match (a.distance_km, b.distance_km) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_distance.then(a.ranking.cmp(&b.ranking))
    });
}
