use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

mod common;
mod consumer_logic;

use consumer_logic::config;
use lib_common::connections::PgWeatherStore;
use lib_common::events::{RedisBus, Router};
use lib_common::ingestors::CURRENT_WEATHER_TOPIC;
use lib_common::loggers;
use lib_common::pipelines::{run_weather_sink, WeatherDedupHandler, WEATHER_INSERT_TOPIC};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let _ = dotenvy::dotenv();

    let config = config::load_config();
    let log_dir = config.log_dir.clone().unwrap_or_else(|| PathBuf::from("./logs"));
    loggers::setup_logging("weather_consumer", &log_dir, config.log_level.as_deref().unwrap_or("info"))?;

    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is required")?;
    let store = Arc::new(
        PgWeatherStore::connect(database_url, config.database_max_connections.unwrap_or(5)).await?,
    );

    let redis_url = config.redis_url.as_deref().unwrap_or("redis://127.0.0.1:6379");
    let bus = Arc::new(
        RedisBus::connect(redis_url)
            .await
            .with_context(|| format!("connecting to event bus at {}", redis_url))?,
    );

    let mut router = Router::new(Arc::clone(&bus));
    router.add_handler(
        "weather_info_inserter",
        CURRENT_WEATHER_TOPIC,
        WEATHER_INSERT_TOPIC,
        WeatherDedupHandler::new(Arc::clone(&store)),
    );

    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);

    let router_handle = tokio::spawn(router.run(shutdown_tx.subscribe()));
    let sink_handle = {
        let bus = Arc::clone(&bus);
        let store = Arc::clone(&store);
        let shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            run_weather_sink(bus.as_ref(), WEATHER_INSERT_TOPIC, store.as_ref(), shutdown_rx).await
        })
    };

    common::shutdown::wait_for_signal().await;
    let _ = shutdown_tx.send(());

    match router_handle.await {
        Ok(Err(e)) => log::error!("Router failed: {}", e),
        Err(e) => log::error!("Router task failed: {}", e),
        Ok(Ok(())) => {}
    }
    match sink_handle.await {
        Ok(Ok(rows)) => log::info!("{} weather record(s) stored this run", rows),
        Ok(Err(e)) => log::error!("Weather sink failed: {}", e),
        Err(e) => log::error!("Weather sink task failed: {}", e),
    }

    log::info!("Shutdown complete.");
    Ok(())
}
