use crate::workflows::intake::domain::Coordinates;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points.
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Points for the first band whose upper bound covers the distance; zero beyond the last.
pub fn proximity_points(distance_km: f64, bands: &[(f64, f64)]) -> f64 {
    bands
        .iter()
        .find(|(max_km, _)| distance_km <= *max_km)
        .map(|(_, points)| *points)
        .unwrap_or(0.0)
}
