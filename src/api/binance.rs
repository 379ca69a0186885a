use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::types::ExchangeInfo;
use crate::core::{BinanceConfig, MonitorError};
use crate::monitoring::ContractSet;

const EXCHANGE_INFO_ENDPOINT: &str = "/fapi/v1/exchangeInfo";

/// Where the monitor gets the current perpetual contract list from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContractSource: Send + Sync {
    async fn fetch_contract_set(&self) -> Result<ContractSet, MonitorError>;
}

/// Binance USD-M futures public market data. No API key needed.
pub struct BinanceFuturesClient {
    client: Client,
    base_url: String,
}

impl BinanceFuturesClient {
    pub fn new(config: &BinanceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create Binance HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn get_exchange_info(&self) -> Result<ExchangeInfo, MonitorError> {
        let url = format!("{}{}", self.base_url, EXCHANGE_INFO_ENDPOINT);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!("Binance API error: {} - {}", status, body);
            return Err(MonitorError::Status { status, body });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ContractSource for BinanceFuturesClient {
    async fn fetch_contract_set(&self) -> Result<ContractSet, MonitorError> {
        let info = self.get_exchange_info().await?;
        let symbols = info.perpetual_symbols();

        tracing::debug!(
            "Fetched {} symbols, {} perpetual",
            info.symbols.len(),
            symbols.len()
        );

        Ok(symbols)
    }
}
