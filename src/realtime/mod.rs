pub mod fetcher;

use crate::matcher::LiveVehicle;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Latest decoded live-vehicle snapshot, shared between the fetcher task and
/// the API layer. Empty until the first successful fetch.
pub type LiveSnapshot = Arc<RwLock<Vec<LiveVehicle>>>;
