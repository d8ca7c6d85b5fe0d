pub mod coverage;
pub mod vehicles;

pub use coverage::{find_peers_on_same_vehicle, route_coverage, ActiveRide, PeerSummary, RouteSegment, VehicleIdentity};
pub use vehicles::{match_live_vehicles, LiveVehicle, MatchedVehicle};
