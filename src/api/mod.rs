pub mod binance;
pub mod lark;
pub mod types;

pub use binance::{BinanceFuturesClient, ContractSource};
pub use lark::{LarkNotifier, Notifier};
pub use types::*;
