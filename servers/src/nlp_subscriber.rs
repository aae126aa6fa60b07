use anyhow::{Context, Result};
use std::path::PathBuf;

mod common;
mod nlp_logic;

use lib_common::events::RedisBus;
use lib_common::loggers;
use lib_common::nlp::{DocumentParser, ParserOptions};
use lib_common::pipelines::{run_document_subscriber, EntityCsvSink};
use nlp_logic::{config, models};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let _ = dotenvy::dotenv();

    let config = config::load_config();
    let log_dir = config.log_dir.clone().unwrap_or_else(|| PathBuf::from("./logs"));
    loggers::setup_logging("nlp_subscriber", &log_dir, config.log_level.as_deref().unwrap_or("info"))?;

    let extractor = models::load_extractor(&config)?;
    let scorer = models::load_scorer(&config)?;
    let options = ParserOptions {
        merge_policy: config.merge_policy.unwrap_or_default(),
        parallel: config.parallel.unwrap_or(false),
    };
    let parser = DocumentParser::new(&extractor, &scorer, options);
    log::info!("Parser ready (merge policy {}, parallel {})", options.merge_policy, options.parallel);

    let redis_url = config.redis_url.as_deref().unwrap_or("redis://127.0.0.1:6379");
    let bus = RedisBus::connect(redis_url)
        .await
        .with_context(|| format!("connecting to event bus at {}", redis_url))?;

    let output = config.output_csv.clone().unwrap_or_else(|| PathBuf::from("entities.csv"));
    let mut sink = EntityCsvSink::create(&output)
        .with_context(|| format!("creating {}", output.display()))?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
    tokio::spawn(async move {
        common::shutdown::wait_for_signal().await;
        let _ = shutdown_tx.send(());
    });

    let topic = config.topic.as_deref().unwrap_or(lib_common::pipelines::DOCUMENTS_TOPIC);
    let processed = run_document_subscriber(&bus, topic, &parser, &mut sink, shutdown_rx).await?;

    log::info!("Shutdown complete. {} document(s) written to {}", processed, output.display());
    Ok(())
}
