use std::collections::HashMap;

/// A single scheduled stop on a route. Immutable after load.
#[derive(Debug, Clone)]
pub struct ScheduleStop {
    pub route_id: String,
    pub stop_id: String,
    pub lat: f64,
    pub lon: f64,
    /// Scheduled arrival as seconds since local midnight.
    pub scheduled_secs: u32,
}

/// Static schedule data keyed by route, built once at startup and read-only
/// afterwards. Per-route stop counts are small, so lookups stay linear.
#[derive(Debug, Default)]
pub struct ScheduleIndex {
    stops_by_route: HashMap<String, Vec<ScheduleStop>>,
    stop_count: usize,
}

impl ScheduleIndex {
    pub fn new(stops_by_route: HashMap<String, Vec<ScheduleStop>>) -> Self {
        let stop_count = stops_by_route.values().map(|v| v.len()).sum();
        Self {
            stops_by_route,
            stop_count,
        }
    }

    pub fn stops_on_route(&self, route_id: &str) -> &[ScheduleStop] {
        self.stops_by_route
            .get(route_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn route_count(&self) -> usize {
        self.stops_by_route.len()
    }

    pub fn stop_count(&self) -> usize {
        self.stop_count
    }

    pub fn is_empty(&self) -> bool {
        self.stops_by_route.is_empty()
    }
}
