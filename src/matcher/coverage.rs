use crate::geo::{point_distance, point_to_segment_distance, Point};
use serde::{Deserialize, Serialize};

/// Both request endpoints must sit within this distance of the ride's
/// segment for coverage to be defined at all.
const COVERAGE_MATCH_RADIUS_M: f64 = 2_000.0;

/// Carpool search admits a candidate ride when coverage exceeds this.
pub const MIN_COVERAGE_FOR_MATCH: f64 = 50.0;

/// Start/end geometry of a ride or a trip request. Ownership of the full
/// ride record stays with the carpool subsystem; this is geometry only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RouteSegment {
    pub start: Point,
    pub end: Point,
}

impl RouteSegment {
    pub fn length_m(&self) -> f64 {
        point_distance(self.start, self.end)
    }
}

/// How much of a trip request overlaps an offered ride, as a length-ratio
/// proxy in [0, 100]. Not true geometric overlap: when both request
/// endpoints sit near the ride's path, the score is simply the request's
/// length relative to the ride's, capped at 100.
pub fn route_coverage(ride: &RouteSegment, request: &RouteSegment) -> f64 {
    let start_dist = point_to_segment_distance(request.start, ride.start, ride.end);
    let end_dist = point_to_segment_distance(request.end, ride.start, ride.end);
    if start_dist > COVERAGE_MATCH_RADIUS_M || end_dist > COVERAGE_MATCH_RADIUS_M {
        return 0.0;
    }

    let ride_len = ride.length_m();
    if ride_len <= 0.0 {
        return 0.0;
    }

    (request.length_m() / ride_len * 100.0).min(100.0)
}

/// Admission rule used by carpool search.
pub fn covers_request(ride: &RouteSegment, request: &RouteSegment) -> bool {
    route_coverage(ride, request) > MIN_COVERAGE_FOR_MATCH
}

/// An active ride or passenger request as the carpool subsystem hands it in,
/// tagged with whatever vehicle identity the rider selected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveRide {
    pub ride_id: String,
    pub user_id: String,
    pub vehicle_id: Option<String>,
    pub trip_id: Option<String>,
    pub route_label: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VehicleIdentity {
    pub vehicle_id: Option<String>,
    pub trip_id: Option<String>,
    pub route_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerSummary {
    pub ride_id: String,
    pub user_id: String,
}

/// Riders sharing a vehicle identity with the query. Identity equality is
/// OR'd across vehicle id, trip id and route label: any one match counts.
/// Route labels are not unique across vehicles, so this can over-match;
/// accepted as a precision limitation.
pub fn find_peers_on_same_vehicle(
    rides: &[ActiveRide],
    identity: &VehicleIdentity,
    exclude_id: Option<&str>,
) -> Vec<PeerSummary> {
    rides
        .iter()
        .filter(|ride| exclude_id.map_or(true, |excluded| ride.ride_id != excluded))
        .filter(|ride| shares_identity(ride, identity))
        .map(|ride| PeerSummary {
            ride_id: ride.ride_id.clone(),
            user_id: ride.user_id.clone(),
        })
        .collect()
}

fn shares_identity(ride: &ActiveRide, identity: &VehicleIdentity) -> bool {
    fn same(a: &Option<String>, b: &Option<String>) -> bool {
        matches!((a, b), (Some(x), Some(y)) if x == y)
    }

    same(&ride.vehicle_id, &identity.vehicle_id)
        || same(&ride.trip_id, &identity.trip_id)
        || same(&ride.route_label, &identity.route_label)
}
