pub mod cluster;
pub mod delay;
pub mod report;
pub mod tracker;

pub use cluster::VirtualBus;
pub use report::{PositionReport, ReporterRole};
pub use tracker::{BusTracker, SubmitOutcome};
