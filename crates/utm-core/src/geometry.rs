//! Geometry & coordinate conversions (C1).
//!
//! A locally-flat approximation valid over the configured operational
//! bounding box: distances use the haversine great-circle formula (so they
//! stay accurate at the scale of a delivery flight) while the degrees/meters
//! conversions used by the planner's grid are taken at the box centroid.

use crate::model::{BoundingBox, Point4D};

pub const METERS_PER_DEG_LAT: f64 = 111_320.0;
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of longitude at `lat_deg`.
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    METERS_PER_DEG_LAT * lat_deg.to_radians().cos()
}

/// Great-circle distance between two (lat, lon) pairs, in meters.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Squared horizontal distance in meters, for numerically stable tie-breaks
/// (no sqrt, no trig beyond the cosine baked into `meters_per_deg_lon`).
pub fn horizontal_distance_sq_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64, ref_lat: f64) -> f64 {
    let dy = (lat2 - lat1) * METERS_PER_DEG_LAT;
    let dx = (lon2 - lon1) * meters_per_deg_lon(ref_lat);
    dx * dx + dy * dy
}

/// Horizontal distance between two points, ignoring altitude and time.
pub fn horizontal_distance(a: Point4D, b: Point4D) -> f64 {
    haversine_distance(a.lat, a.lon, b.lat, b.lon)
}

pub fn vertical_distance(a: Point4D, b: Point4D) -> f64 {
    (a.alt_m - b.alt_m).abs()
}

pub fn bbox_contains(bbox: &BoundingBox, lat: f64, lon: f64) -> bool {
    bbox.contains(lat, lon)
}

/// Signed north/east offset in meters from `from` to `to`, used to classify
/// the dominant direction of travel (§4.4, DESIGN.md OQ1).
pub fn north_east_offset_m(from: (f64, f64), to: (f64, f64)) -> (f64, f64) {
    let ref_lat = (from.0 + to.0) / 2.0;
    let north_m = (to.0 - from.0) * METERS_PER_DEG_LAT;
    let east_m = (to.1 - from.1) * meters_per_deg_lon(ref_lat);
    (north_m, east_m)
}

/// Offset a (lat, lon) position by a number of meters north and east,
/// inverting `north_east_offset_m` at the given reference latitude.
pub fn offset_position(lat: f64, lon: f64, north_m: f64, east_m: f64) -> (f64, f64) {
    let new_lat = lat + north_m / METERS_PER_DEG_LAT;
    let new_lon = lon + east_m / meters_per_deg_lon(lat);
    (new_lat, new_lon)
}
