pub mod listing_monitor;
pub mod reporter;
pub mod schedule;
pub mod state;

pub use listing_monitor::{ListingMonitor, LoopAction};
pub use reporter::ListingAlert;
pub use schedule::Schedule;
pub use state::{ContractSet, Detection, DetectionOutcome, MonitorState};
