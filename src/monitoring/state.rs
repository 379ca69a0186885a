use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Symbols of the currently listed perpetual contracts. Ordered so alerts
/// list symbols deterministically.
pub type ContractSet = BTreeSet<String>;

/// Everything the monitor remembers between polls. Lives in memory only;
/// a restart starts from a fresh baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorState {
    /// Full set from the last successful poll, `None` until the baseline poll.
    pub last_symbols: Option<ContractSet>,
    /// Set only when the notifier acknowledged an alert.
    pub last_alert_time: Option<DateTime<Utc>>,
    /// New symbols whose alert was not delivered; re-announced next cycle.
    pub unalerted: ContractSet,
}

impl MonitorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_baseline<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            last_symbols: Some(symbols.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn has_baseline(&self) -> bool {
        self.last_symbols.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionOutcome {
    /// Fetch failed or returned nothing; state left untouched.
    FetchFailed,
    /// First successful poll; recorded without alerting.
    BaselineEstablished,
    NoChange,
    NewListings,
}

/// Result of one `detect_new_symbols` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub outcome: DetectionOutcome,
    pub new_symbols: ContractSet,
    pub alert_sent: bool,
}

impl Detection {
    pub fn quiet(outcome: DetectionOutcome) -> Self {
        Self {
            outcome,
            new_symbols: ContractSet::new(),
            alert_sent: false,
        }
    }

    pub fn new_listings(new_symbols: ContractSet, alert_sent: bool) -> Self {
        Self {
            outcome: DetectionOutcome::NewListings,
            new_symbols,
            alert_sent,
        }
    }
}
