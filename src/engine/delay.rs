use crate::engine::report::PositionReport;
use crate::geo::haversine_distance;
use crate::schedule::ScheduleIndex;
use chrono::{TimeZone, Timelike};
use chrono_tz::Asia::Kolkata;
use chrono_tz::Tz;

/// A report further than this from its nearest stop is mid-route and carries
/// no usable schedule signal.
pub const STOP_GEOFENCE_M: f64 = 50.0;

/// The schedule is interpreted as a single service day in the agency's
/// timezone. No date or day-of-week matching.
const SERVICE_TZ: Tz = Kolkata;

#[derive(Debug, Clone, PartialEq)]
pub struct DelayEstimate {
    pub matched_stop_id: Option<String>,
    /// Signed: negative means early. Zero when no stop matched.
    pub delay_minutes: f64,
}

impl DelayEstimate {
    pub const NO_MATCH: Self = Self {
        matched_stop_id: None,
        delay_minutes: 0.0,
    };

    pub fn is_match(&self) -> bool {
        self.matched_stop_id.is_some()
    }
}

/// Reconcile a report against the static schedule: find the nearest stop on
/// the report's route (linear scan, first minimum wins), gate on the 50 m
/// geofence, and compare wall-clock receipt time against the scheduled
/// arrival. O(stops on route) per call.
pub fn estimate_delay(report: &PositionReport, index: &ScheduleIndex) -> DelayEstimate {
    let stops = index.stops_on_route(&report.route_id);

    let mut nearest: Option<(usize, f64)> = None;
    for (idx, stop) in stops.iter().enumerate() {
        let dist = haversine_distance(report.lat, report.lng, stop.lat, stop.lon);
        if nearest.map_or(true, |(_, best)| dist < best) {
            nearest = Some((idx, dist));
        }
    }

    let Some((idx, dist)) = nearest else {
        return DelayEstimate::NO_MATCH;
    };
    if dist > STOP_GEOFENCE_M {
        return DelayEstimate::NO_MATCH;
    }

    let stop = &stops[idx];
    let actual_secs = seconds_of_day(report.timestamp);
    let delay_minutes = (actual_secs - stop.scheduled_secs as i64) as f64 / 60.0;

    DelayEstimate {
        matched_stop_id: Some(stop.stop_id.clone()),
        delay_minutes,
    }
}

fn seconds_of_day(epoch_secs: u64) -> i64 {
    match SERVICE_TZ.timestamp_opt(epoch_secs as i64, 0).single() {
        Some(local) => (local.hour() * 3600 + local.minute() * 60 + local.second()) as i64,
        None => 0,
    }
}
