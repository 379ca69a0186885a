use reqwest::StatusCode;
use thiserror::Error;

/// Failures the monitor recovers from locally. None of these stop the loop.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("exchange returned no perpetual contracts")]
    EmptyContractList,

    #[error("notification rejected with status {status}: {body}")]
    NotificationRejected { status: StatusCode, body: String },

    #[error("notifications disabled: no webhook configured")]
    NotificationsDisabled,

    #[error("invalid configuration: {0}")]
    Config(String),
}
