use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use super::types::LarkTextMessage;
use crate::core::{MonitorError, NotificationConfig};

/// Chat channel for listing alerts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// `Ok` only when the channel acknowledged delivery.
    async fn send_text(&self, message: &str) -> Result<(), MonitorError>;
}

/// Lark (Feishu) custom-bot webhook.
pub struct LarkNotifier {
    client: Client,
    webhook_url: Option<String>,
}

impl LarkNotifier {
    pub fn new(config: &NotificationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create Lark HTTP client")?;

        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }
}

#[async_trait]
impl Notifier for LarkNotifier {
    async fn send_text(&self, message: &str) -> Result<(), MonitorError> {
        let Some(webhook_url) = self.webhook_url.as_deref() else {
            tracing::warn!("No Lark webhook configured, alert not delivered:\n{}", message);
            return Err(MonitorError::NotificationsDisabled);
        };

        let response = self
            .client
            .post(webhook_url)
            .json(&LarkTextMessage::text(message))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK {
            tracing::info!("Lark message sent");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!("Lark message rejected: {} - {}", status, body);
        Err(MonitorError::NotificationRejected { status, body })
    }
}
