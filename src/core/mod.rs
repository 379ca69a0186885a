pub mod config;
pub mod error;
pub mod logging;

pub use config::{BinanceConfig, Config, LoggingConfig, NotificationConfig, ScheduleConfig};
pub use error::MonitorError;
