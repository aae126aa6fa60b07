use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod common;
mod trades_logic;

use lib_common::events::{EventBus, RedisBus};
use lib_common::feeds::TradesResponse;
use lib_common::ingestors::{TradesConfig, TradesWssIngestor, TRADES_TOPIC};
use lib_common::loggers;
use tokio::sync::broadcast;
use trades_logic::config;

/// Logs every trade batch that comes back over the bus.
async fn announce(bus: Arc<RedisBus>, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
    let mut subscription = bus.subscribe(TRADES_TOPIC).await?;
    loop {
        tokio::select! {
            _ = shutdown.recv() => return Ok(()),
            next = subscription.next() => {
                let Some(event) = next else { return Ok(()) };
                match event.decode_json::<TradesResponse>() {
                    Ok(trades) => {
                        for tick in &trades.data {
                            log::info!("{} {} @ {}", tick.symbol, tick.price, tick.timestamp);
                        }
                    }
                    Err(e) => log::warn!("Unable to decode trades event {}: {}", event.id, e),
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let _ = dotenvy::dotenv();

    let config = config::load_config();
    let log_dir = config.log_dir.clone().unwrap_or_else(|| PathBuf::from("./logs"));
    loggers::setup_logging("trades_publisher", &log_dir, config.log_level.as_deref().unwrap_or("info"))?;

    let api_key = config
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .context("FINNHUB_KEY is required: get one at https://finnhub.io/")?;

    let redis_url = config.redis_url.as_deref().unwrap_or("redis://127.0.0.1:6379");
    let bus = Arc::new(
        RedisBus::connect(redis_url)
            .await
            .with_context(|| format!("connecting to event bus at {}", redis_url))?,
    );

    let defaults = TradesConfig::default();
    let trades_config = TradesConfig {
        wss_url: config.wss_url.clone().unwrap_or(defaults.wss_url),
        api_key,
        symbols: config.symbols.clone().unwrap_or(defaults.symbols),
        reconnect_delay: config
            .reconnect_seconds
            .map(Duration::from_secs)
            .unwrap_or(defaults.reconnect_delay),
        silent_failure_timeout: defaults.silent_failure_timeout,
    };
    log::info!("Streaming trades for {}", trades_config.symbols.join(", "));

    let (shutdown_tx, _) = broadcast::channel(1);

    let announce_handle = if config.announce.unwrap_or(false) {
        Some(tokio::spawn(announce(Arc::clone(&bus), shutdown_tx.subscribe())))
    } else {
        None
    };

    let ingestor = TradesWssIngestor::new(trades_config, bus);
    let shutdown_rx = shutdown_tx.subscribe();
    let ingestor_handle = tokio::spawn(async move { ingestor.run(shutdown_rx).await });

    common::shutdown::wait_for_signal().await;
    let _ = shutdown_tx.send(());

    match ingestor_handle.await {
        Ok(Err(e)) => log::error!("Trades ingestor failed: {}", e),
        Err(e) => log::error!("Trades ingestor task failed: {}", e),
        Ok(Ok(())) => {}
    }
    if let Some(handle) = announce_handle {
        if let Ok(Err(e)) = handle.await {
            log::error!("Announcer failed: {}", e);
        }
    }

    log::info!("Shutdown complete.");
    Ok(())
}
