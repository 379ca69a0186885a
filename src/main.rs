use anyhow::Result;
use binance_listing_monitor::core::{self, Config};
use binance_listing_monitor::{BinanceFuturesClient, LarkNotifier, ListingMonitor};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging; the guard flushes the log file on exit
    let _log_guard = core::logging::init_logging(&config.logging)?;

    tracing::info!("🚀 Binance listing monitor starting...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Exchange endpoint: {}", config.binance.base_url);

    let source = BinanceFuturesClient::new(&config.binance)?;
    let notifier = LarkNotifier::new(&config.notification)?;
    if !notifier.is_enabled() {
        tracing::warn!("LARK_WEBHOOK_URL not set, detections will only be logged");
    }

    let monitor = ListingMonitor::new(source, notifier, config.schedule);
    let interval = monitor.poll_interval();

    monitor.run(interval, shutdown_signal()).await;

    tracing::info!("👋 Binance listing monitor exited");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
