use serde::{Deserialize, Serialize};

/// All distances in this crate are meters. Callers that think in kilometers
/// convert at their own boundary.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
}

pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

pub fn point_distance(a: Point, b: Point) -> f64 {
    haversine_distance(a.lat, a.lng, b.lat, b.lng)
}

/// Distance from a point to a segment, approximated as the minimum of the
/// distances to the segment's start, end and midpoint. Coarse on purpose: a
/// true perpendicular projection would change matching behavior at segment
/// edges, and the matching radii were tuned against this version.
pub fn point_to_segment_distance(p: Point, seg_start: Point, seg_end: Point) -> f64 {
    let midpoint = Point {
        lat: (seg_start.lat + seg_end.lat) / 2.0,
        lng: (seg_start.lng + seg_end.lng) / 2.0,
    };

    point_distance(p, seg_start)
        .min(point_distance(p, seg_end))
        .min(point_distance(p, midpoint))
}
