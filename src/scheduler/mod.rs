mod engine;
mod ledger;
mod offload;
mod outcome;
mod resolver;
mod timeline;
mod window;

pub use engine::{EngineSettings, ScheduleEngine};
pub use ledger::SatelliteLedger;
pub use offload::OffloadPlanner;
pub use outcome::{AssumptionViolation, DropReason, DroppedPass, PassRef, ScheduleOutcome};
pub use resolver::ConflictResolver;
pub use timeline::{ScheduledPass, StationTimeline};
pub use window::{Occupancy, Window};
