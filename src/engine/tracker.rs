use crate::engine::cluster::{build_virtual_buses, VirtualBus};
use crate::engine::report::{PositionReport, ReportStore, MAX_PLAUSIBLE_SPEED_KMH};
use crate::schedule::ScheduleIndex;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted { active_reports: usize },
    Ignored { reason: &'static str },
}

/// Owns the report store and the published virtual bus set.
///
/// Ingest is one serialized unit of work: {evict, upsert, recluster, publish}
/// happens under a single mutex, so concurrent submitters never interleave
/// with a full-set recompute. Readers only touch the published generation,
/// which is swapped whole; they never see a partially rebuilt set.
pub struct BusTracker {
    schedule: Arc<ScheduleIndex>,
    store: Mutex<ReportStore>,
    published: RwLock<Arc<Vec<VirtualBus>>>,
}

impl BusTracker {
    pub fn new(schedule: Arc<ScheduleIndex>) -> Self {
        Self {
            schedule,
            store: Mutex::new(ReportStore::new()),
            published: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Ingest a crowd report and recluster before returning, so the caller's
    /// next read reflects it. The client-supplied timestamp is replaced with
    /// the server receipt time.
    pub async fn submit_report(&self, mut report: PositionReport) -> SubmitOutcome {
        if report.speed > MAX_PLAUSIBLE_SPEED_KMH {
            return SubmitOutcome::Ignored {
                reason: "speed_too_high",
            };
        }

        let now = unix_now();
        report.timestamp = now;

        let mut store = self.store.lock().await;
        store.evict_expired(now);
        store.upsert(report);

        let buses = build_virtual_buses(&store.by_route(), &self.schedule, now);
        let active_reports = store.len();

        // Publish while still holding the ingest lock: the new generation
        // must be visible before the next submitter runs.
        *self.published.write().await = Arc::new(buses);

        SubmitOutcome::Accepted { active_reports }
    }

    /// Snapshot of the current virtual bus generation. Cheap Arc clone.
    pub async fn virtual_buses(&self) -> Arc<Vec<VirtualBus>> {
        self.published.read().await.clone()
    }

    /// Route ids that currently have live reports.
    pub async fn active_routes(&self) -> Vec<String> {
        let mut store = self.store.lock().await;
        store.evict_expired(unix_now());
        store.route_ids()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}
