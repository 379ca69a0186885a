pub mod api;
pub mod core;
pub mod monitoring;

pub use api::{BinanceFuturesClient, ContractSource, LarkNotifier, Notifier};
pub use monitoring::{ListingMonitor, MonitorState};
