pub mod loader;
pub mod types;

pub use loader::load_schedule;
pub use types::{ScheduleIndex, ScheduleStop};
