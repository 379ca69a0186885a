use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::state::ContractSet;

/// Chat alert for one detection event.
#[derive(Debug, Clone)]
pub struct ListingAlert {
    pub detected_at: DateTime<Tz>,
    pub new_symbols: ContractSet,
}

impl ListingAlert {
    pub fn new(detected_at: DateTime<Utc>, timezone: Tz, new_symbols: ContractSet) -> Self {
        Self {
            detected_at: detected_at.with_timezone(&timezone),
            new_symbols,
        }
    }

    pub fn to_message(&self) -> String {
        let mut message = String::from("【Binance Futures New Listing】\n");
        message.push_str(&format!(
            "Time: {}\n",
            self.detected_at.format("%Y-%m-%d %H:%M:%S")
        ));
        message.push_str("New contracts:\n");

        for symbol in &self.new_symbols {
            message.push_str(&format!("- {}\n", symbol));
        }

        message
    }
}

/// Comma-separated symbols for log lines.
pub fn format_symbol_list(symbols: &ContractSet) -> String {
    symbols
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
