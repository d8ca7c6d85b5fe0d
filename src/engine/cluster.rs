use crate::engine::delay::estimate_delay;
use crate::engine::report::{PositionReport, ReporterRole};
use crate::geo::haversine_distance;
use crate::schedule::ScheduleIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Passengers within this distance of a driver ride that driver's bus.
const DRIVER_CLUSTER_RADIUS_M: f64 = 100.0;

/// Passengers within this distance of a cluster seed share a bus.
const PASSENGER_CLUSTER_RADIUS_M: f64 = 50.0;

/// Confidence boost per cluster member that geofence-matched a stop.
const STOP_MATCH_CONFIDENCE_BONUS: f64 = 0.3;

const LATE_THRESHOLD_MIN: f64 = 5.0;
const EARLY_THRESHOLD_MIN: f64 = -2.0;

/// An inferred vehicle synthesized from clustered crowd reports. The whole
/// set is rebuilt from the live reports on every pass; nothing here survives
/// a recompute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualBus {
    pub id: String,
    pub route_id: String,
    pub route_name: String,
    pub lat: f64,
    pub lng: f64,
    pub passenger_count: usize,
    pub confidence: f64,
    pub last_updated: u64,
    pub delay_minutes: f64,
    pub status: String,
    pub is_driver_bus: bool,
}

/// Rebuild the virtual bus set from the current live reports. Pure function
/// of its inputs; callers evict expired reports first.
///
/// Per route: drivers anchor clusters first (claiming nearby passengers),
/// then the remaining passengers are grouped greedily around the first
/// unclaimed one. Grouping is a single pass around each seed, not transitive:
/// two passengers 49 m either side of a seed share a bus even when 80 m
/// apart. Order-dependent by construction, which matches how reports arrive.
pub fn build_virtual_buses(
    reports_by_route: &HashMap<&str, Vec<&PositionReport>>,
    index: &ScheduleIndex,
    now: u64,
) -> Vec<VirtualBus> {
    let mut buses = Vec::new();

    for (route_id, reports) in reports_by_route {
        let mut drivers: Vec<&PositionReport> = Vec::new();
        let mut passengers: Vec<&PositionReport> = Vec::new();
        for &report in reports {
            match report.role {
                ReporterRole::Driver => drivers.push(report),
                ReporterRole::Passenger => passengers.push(report),
            }
        }

        let mut claimed = vec![false; passengers.len()];

        // Driver pass: the driver's own position is the bus.
        for (idx, driver) in drivers.iter().enumerate() {
            let mut rider_count = 0;
            for (p_idx, passenger) in passengers.iter().enumerate() {
                if claimed[p_idx] {
                    continue;
                }
                let dist =
                    haversine_distance(driver.lat, driver.lng, passenger.lat, passenger.lng);
                if dist <= DRIVER_CLUSTER_RADIUS_M {
                    claimed[p_idx] = true;
                    rider_count += 1;
                }
            }

            let estimate = estimate_delay(driver, index);
            buses.push(VirtualBus {
                id: format!("{}-driver-{}-{}", route_id, now, idx),
                route_id: route_id.to_string(),
                route_name: route_display_name(route_id),
                lat: driver.lat,
                lng: driver.lng,
                passenger_count: rider_count,
                confidence: 1.0,
                last_updated: now,
                delay_minutes: estimate.delay_minutes,
                status: status_label(estimate.delay_minutes),
                is_driver_bus: true,
            });
        }

        // Passenger pass over whoever no driver claimed.
        let mut crowd_idx = 0;
        for seed_idx in 0..passengers.len() {
            if claimed[seed_idx] {
                continue;
            }
            claimed[seed_idx] = true;
            let seed = passengers[seed_idx];
            let mut members = vec![seed];

            for other_idx in (seed_idx + 1)..passengers.len() {
                if claimed[other_idx] {
                    continue;
                }
                let other = passengers[other_idx];
                let dist = haversine_distance(seed.lat, seed.lng, other.lat, other.lng);
                if dist <= PASSENGER_CLUSTER_RADIUS_M {
                    claimed[other_idx] = true;
                    members.push(other);
                }
            }

            buses.push(crowd_bus(route_id, &members, index, now, crowd_idx));
            crowd_idx += 1;
        }
    }

    buses
}

fn crowd_bus(
    route_id: &str,
    members: &[&PositionReport],
    index: &ScheduleIndex,
    now: u64,
    crowd_idx: usize,
) -> VirtualBus {
    let count = members.len();
    let lat = members.iter().map(|m| m.lat).sum::<f64>() / count as f64;
    let lng = members.iter().map(|m| m.lng).sum::<f64>() / count as f64;

    // Corroboration: multiple riders beat one, and every member sitting at a
    // scheduled stop strengthens the inference further.
    let mut confidence = if count >= 2 { 1.0 } else { 0.5 };
    let mut matched_delays = Vec::new();
    for member in members {
        let estimate = estimate_delay(member, index);
        if estimate.is_match() {
            confidence = (confidence + STOP_MATCH_CONFIDENCE_BONUS).min(1.0);
            matched_delays.push(estimate.delay_minutes);
        }
    }

    let delay_minutes = if matched_delays.is_empty() {
        0.0
    } else {
        matched_delays.iter().sum::<f64>() / matched_delays.len() as f64
    };

    VirtualBus {
        id: format!("{}-crowd-{}-{}", route_id, now, crowd_idx),
        route_id: route_id.to_string(),
        route_name: route_display_name(route_id),
        lat,
        lng,
        passenger_count: count,
        confidence,
        last_updated: now,
        delay_minutes,
        status: status_label(delay_minutes),
        is_driver_bus: false,
    }
}

fn route_display_name(route_id: &str) -> String {
    format!("Route {}", route_id)
}

fn status_label(delay_minutes: f64) -> String {
    if delay_minutes > LATE_THRESHOLD_MIN {
        format!("Late {} min", delay_minutes.round() as i64)
    } else if delay_minutes < EARLY_THRESHOLD_MIN {
        "Early".to_string()
    } else {
        "On Time".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ScheduleStop;
    use chrono::TimeZone;
    use chrono_tz::Asia::Kolkata;

    const DEG_LAT_30M: f64 = 0.00027;
    const DEG_LAT_49M: f64 = 0.00044;
    const DEG_LAT_80M: f64 = 0.00072;

    fn report(id: &str, role: ReporterRole, lat: f64, lng: f64, ts: u64) -> PositionReport {
        PositionReport {
            reporter_id: id.to_string(),
            route_id: "R1".to_string(),
            lat,
            lng,
            timestamp: ts,
            speed: 0.0,
            role,
        }
    }

    fn bucket(reports: &[PositionReport]) -> HashMap<&str, Vec<&PositionReport>> {
        let mut map: HashMap<&str, Vec<&PositionReport>> = HashMap::new();
        for r in reports {
            map.entry(r.route_id.as_str()).or_default().push(r);
        }
        map
    }

    #[test]
    fn driver_claims_nearby_passenger() {
        let reports = vec![
            report("driver", ReporterRole::Driver, 28.6, 77.2, 1000),
            report("rider", ReporterRole::Passenger, 28.6 + DEG_LAT_80M, 77.2, 1001),
        ];
        let buses = build_virtual_buses(&bucket(&reports), &ScheduleIndex::default(), 1001);

        assert_eq!(buses.len(), 1);
        let bus = &buses[0];
        assert!(bus.is_driver_bus);
        assert_eq!(bus.passenger_count, 1);
        assert_eq!(bus.confidence, 1.0);
        assert_eq!(bus.lat, 28.6);
        assert_eq!(bus.status, "On Time");
    }

    #[test]
    fn two_nearby_passengers_form_one_confident_bus() {
        let reports = vec![
            report("p1", ReporterRole::Passenger, 28.6, 77.2, 1000),
            report("p2", ReporterRole::Passenger, 28.6 + DEG_LAT_30M, 77.2, 1001),
        ];
        let buses = build_virtual_buses(&bucket(&reports), &ScheduleIndex::default(), 1001);

        assert_eq!(buses.len(), 1);
        let bus = &buses[0];
        assert!(!bus.is_driver_bus);
        assert_eq!(bus.passenger_count, 2);
        assert_eq!(bus.confidence, 1.0);
        assert_eq!(bus.delay_minutes, 0.0);
        // mean position of the two members
        assert!((bus.lat - (28.6 + DEG_LAT_30M / 2.0)).abs() < 1e-9);
    }

    #[test]
    fn grouping_is_seed_anchored_not_transitive() {
        // Both 49 m from the seed, ~98 m from each other: one cluster.
        let reports = vec![
            report("seed", ReporterRole::Passenger, 28.6, 77.2, 1000),
            report("north", ReporterRole::Passenger, 28.6 + DEG_LAT_49M, 77.2, 1001),
            report("south", ReporterRole::Passenger, 28.6 - DEG_LAT_49M, 77.2, 1002),
        ];
        let buses = build_virtual_buses(&bucket(&reports), &ScheduleIndex::default(), 1002);

        assert_eq!(buses.len(), 1);
        assert_eq!(buses[0].passenger_count, 3);
    }

    #[test]
    fn distant_passengers_form_separate_buses() {
        let reports = vec![
            report("p1", ReporterRole::Passenger, 28.6, 77.2, 1000),
            report("p2", ReporterRole::Passenger, 28.61, 77.2, 1001),
        ];
        let buses = build_virtual_buses(&bucket(&reports), &ScheduleIndex::default(), 1001);

        assert_eq!(buses.len(), 2);
        assert!(buses.iter().all(|b| b.passenger_count == 1));
        assert!(buses.iter().all(|b| b.confidence == 0.5));
    }

    #[test]
    fn passenger_claimed_by_driver_skips_crowd_pass() {
        let reports = vec![
            report("p1", ReporterRole::Passenger, 28.6, 77.2, 1000),
            report("d1", ReporterRole::Driver, 28.6 + DEG_LAT_30M, 77.2, 1001),
        ];
        let buses = build_virtual_buses(&bucket(&reports), &ScheduleIndex::default(), 1001);

        assert_eq!(buses.len(), 1);
        assert!(buses[0].is_driver_bus);
        assert_eq!(buses[0].passenger_count, 1);
    }

    #[test]
    fn stop_match_raises_confidence_and_averages_delay() {
        // Single passenger sitting on a stop scheduled at 10:00, reporting
        // at 10:07 local time.
        let mut by_route = HashMap::new();
        by_route.insert(
            "R1".to_string(),
            vec![ScheduleStop {
                route_id: "R1".to_string(),
                stop_id: "s1".to_string(),
                lat: 28.6,
                lon: 77.2,
                scheduled_secs: 36_000,
            }],
        );
        let index = ScheduleIndex::new(by_route);
        let ts = Kolkata
            .with_ymd_and_hms(2024, 3, 4, 10, 7, 0)
            .unwrap()
            .timestamp() as u64;

        let reports = vec![report("p1", ReporterRole::Passenger, 28.6, 77.2, ts)];
        let buses = build_virtual_buses(&bucket(&reports), &index, ts);

        assert_eq!(buses.len(), 1);
        let bus = &buses[0];
        // 0.5 base for a lone passenger + 0.3 for the stop match
        assert!((bus.confidence - 0.8).abs() < 1e-9);
        assert!((bus.delay_minutes - 7.0).abs() < 1e-9);
        assert_eq!(bus.status, "Late 7 min");
    }

    #[test]
    fn status_labels() {
        assert_eq!(status_label(7.4), "Late 7 min");
        assert_eq!(status_label(5.1), "Late 5 min");
        assert_eq!(status_label(5.0), "On Time");
        assert_eq!(status_label(0.0), "On Time");
        assert_eq!(status_label(-2.0), "On Time");
        assert_eq!(status_label(-2.5), "Early");
    }

    #[test]
    fn ids_are_unique_within_one_pass() {
        let reports = vec![
            report("d1", ReporterRole::Driver, 28.6, 77.2, 1000),
            report("d2", ReporterRole::Driver, 28.7, 77.2, 1000),
            report("p1", ReporterRole::Passenger, 28.8, 77.2, 1000),
            report("p2", ReporterRole::Passenger, 28.9, 77.2, 1000),
        ];
        let buses = build_virtual_buses(&bucket(&reports), &ScheduleIndex::default(), 1000);

        let mut ids: Vec<&str> = buses.iter().map(|b| b.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), buses.len());
    }
}
