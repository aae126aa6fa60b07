use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod common;
mod producer_logic;

use lib_common::events::RedisBus;
use lib_common::feeds::WeatherApiClient;
use lib_common::ingestors::WeatherPollingIngestor;
use lib_common::loggers;
use producer_logic::config;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let _ = dotenvy::dotenv();

    let config = config::load_config();
    let log_dir = config.log_dir.clone().unwrap_or_else(|| PathBuf::from("./logs"));
    loggers::setup_logging("weather_producer", &log_dir, config.log_level.as_deref().unwrap_or("info"))?;
    log::info!("Starting the producer");

    let location = config.location.as_deref().unwrap_or("Washington DC");
    let client = WeatherApiClient::new(config.api_key.as_deref().unwrap_or_default(), location)
        .context("WAPIKEY is required: get one at https://www.weatherapi.com/")?;

    let redis_url = config.redis_url.as_deref().unwrap_or("redis://127.0.0.1:6379");
    let bus = RedisBus::connect(redis_url)
        .await
        .with_context(|| format!("connecting to event bus at {}", redis_url))?;

    let ingestor = WeatherPollingIngestor::new(Arc::new(client), Arc::new(bus))
        .with_interval(Duration::from_secs(config.poll_seconds.unwrap_or(5)));

    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    let shutdown_rx = shutdown_tx.subscribe();
    let ingestor_handle = tokio::spawn(async move { ingestor.run(shutdown_rx).await });

    common::shutdown::wait_for_signal().await;

    // Signal the ingestor to stop publishing
    let _ = shutdown_tx.send(());
    if let Err(e) = ingestor_handle.await {
        log::error!("Ingestor task failed: {}", e);
    }

    log::info!("Shutdown complete.");
    Ok(())
}
