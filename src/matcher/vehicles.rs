use crate::geo::{point_distance, point_to_segment_distance, Point};
use serde::{Deserialize, Serialize};

/// Vehicles within this distance of the trip's start-end segment match.
const SEGMENT_MATCH_RADIUS_M: f64 = 2_000.0;

/// Vehicles this close to either trip endpoint match even when the segment
/// probes miss them.
const ENDPOINT_MATCH_RADIUS_M: f64 = 1_000.0;

/// Upper bound on returned matches; callers slice further for display.
const MAX_MATCHES: usize = 20;

/// One vehicle from the external live feed snapshot. The core never fetches
/// this itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveVehicle {
    pub vehicle_id: String,
    pub lat: f64,
    pub lng: f64,
    pub speed: f64,
    pub trip_id: Option<String>,
    pub route_label: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchedVehicle {
    #[serde(flatten)]
    pub vehicle: LiveVehicle,
    /// Meters from the trip segment (start/end/midpoint approximation).
    pub distance_from_route: f64,
}

/// Rank live vehicles against a proposed trip segment: keep anything near
/// the segment or near either endpoint, closest first, at most 20.
pub fn match_live_vehicles(
    trip_start: Point,
    trip_end: Point,
    snapshot: &[LiveVehicle],
) -> Vec<MatchedVehicle> {
    let mut matches: Vec<MatchedVehicle> = snapshot
        .iter()
        .filter_map(|vehicle| {
            let position = Point {
                lat: vehicle.lat,
                lng: vehicle.lng,
            };
            let segment_dist = point_to_segment_distance(position, trip_start, trip_end);
            let near_endpoint = point_distance(position, trip_start) < ENDPOINT_MATCH_RADIUS_M
                || point_distance(position, trip_end) < ENDPOINT_MATCH_RADIUS_M;

            if segment_dist < SEGMENT_MATCH_RADIUS_M || near_endpoint {
                Some(MatchedVehicle {
                    vehicle: vehicle.clone(),
                    distance_from_route: segment_dist,
                })
            } else {
                None
            }
        })
        .collect();

    matches.sort_by(|a, b| {
        a.distance_from_route
            .partial_cmp(&b.distance_from_route)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    matches.truncate(MAX_MATCHES);
    matches
}
