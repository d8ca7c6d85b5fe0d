use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reports older than this are dead weight and get evicted before every
/// clustering pass.
pub const REPORT_TTL_SECS: u64 = 300;

/// Reports moving faster than a bus plausibly does (km/h) come from cars,
/// trains or bad GPS and are rejected at ingest.
pub const MAX_PLAUSIBLE_SPEED_KMH: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReporterRole {
    Driver,
    #[default]
    #[serde(other)]
    Passenger,
}

/// The latest position broadcast from one reporter. Replaced wholesale when
/// the same reporter broadcasts again, never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionReport {
    pub reporter_id: String,
    pub route_id: String,
    pub lat: f64,
    pub lng: f64,
    /// Server receipt time (epoch seconds); client clocks are not trusted.
    pub timestamp: u64,
    pub speed: f64,
    pub role: ReporterRole,
}

/// Time-windowed collection of the latest report per reporter, in first
/// submission order.
#[derive(Debug, Default)]
pub struct ReportStore {
    reports: Vec<PositionReport>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any existing report from the same reporter, keeping the
    /// reporter's original position in submission order.
    pub fn upsert(&mut self, report: PositionReport) {
        match self
            .reports
            .iter_mut()
            .find(|r| r.reporter_id == report.reporter_id)
        {
            Some(existing) => *existing = report,
            None => self.reports.push(report),
        }
    }

    pub fn evict_expired(&mut self, now: u64) {
        self.reports
            .retain(|r| now.saturating_sub(r.timestamp) <= REPORT_TTL_SECS);
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Live reports partitioned by route, submission order preserved within
    /// each route.
    pub fn by_route(&self) -> HashMap<&str, Vec<&PositionReport>> {
        let mut buckets: HashMap<&str, Vec<&PositionReport>> = HashMap::new();
        for report in &self.reports {
            buckets.entry(&report.route_id).or_default().push(report);
        }
        buckets
    }

    /// Distinct route ids with at least one live report, in submission order.
    pub fn route_ids(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for report in &self.reports {
            if !seen.iter().any(|r| r == &report.route_id) {
                seen.push(report.route_id.clone());
            }
        }
        seen
    }
}
