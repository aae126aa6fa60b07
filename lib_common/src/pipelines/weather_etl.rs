//! # Weather ETL Pipeline
//!
//! Two stages between the `current_weather` topic and the `weather_info`
//! table:
//!
//! 1. [`WeatherDedupHandler`], registered on a [`Router`](crate::events::Router),
//!    drops readings whose `last_updated` is already stored and stamps the
//!    rest with `created_at`, emitting them on `weather_info`.
//! 2. [`run_weather_sink`] drains `weather_info` into a [`WeatherRepository`],
//!    batching whatever has queued up since the last write.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::connections::WeatherRepository;
use crate::events::{Event, EventBus, Handler};
use crate::feeds::weather::{ApiWeatherInfo, WeatherRecord, WEATHER_RECORD_TYPE};
use crate::pipelines::error::SinkError;
use crate::utils::current_datetime_rfc9557;

/// Topic accepted records are published to.
pub const WEATHER_INSERT_TOPIC: &str = "weather_info";
/// Most records written in one INSERT.
pub const MAX_BATCH: usize = 64;

/// Filters out readings that are already stored.
pub struct WeatherDedupHandler<R: ?Sized> {
    repository: Arc<R>,
}

impl<R: WeatherRepository + ?Sized> WeatherDedupHandler<R> {
    /// Creates a handler checking against `repository`.
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: WeatherRepository + ?Sized + 'static> Handler for WeatherDedupHandler<R> {
    async fn handle(&self, event: Event) -> anyhow::Result<Vec<Event>> {
        let info: ApiWeatherInfo = event.decode_json()?;
        log::info!("Received weather info for {}", info.last_updated);

        if self.repository.record_exists(&info.last_updated).await? {
            log::debug!("Found existing record for {}", info.last_updated);
            return Ok(Vec::new());
        }

        let record = info.into_record(current_datetime_rfc9557());
        Ok(vec![Event::json(WEATHER_RECORD_TYPE, 1, &record)?])
    }
}

/// Inserts records from `topic` until `shutdown` fires or the subscription
/// ends. Returns the number of rows written.
///
/// Undecodable events are skipped. A failed insert is logged and its batch
/// dropped; the sink keeps running.
pub async fn run_weather_sink<R>(
    bus: &dyn EventBus,
    topic: &str,
    repository: &R,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<u64, SinkError>
where
    R: WeatherRepository + ?Sized,
{
    let mut subscription = bus.subscribe(topic).await?;
    log::info!("Weather sink subscribed to '{}'", topic);
    let mut written = 0;

    loop {
        let first = tokio::select! {
            _ = shutdown.recv() => break,
            next = subscription.next() => match next {
                Some(event) => event,
                None => break,
            }
        };

        let mut batch = Vec::new();
        push_record(&mut batch, &first);
        while batch.len() < MAX_BATCH {
            match subscription.try_next() {
                Some(event) => push_record(&mut batch, &event),
                None => break,
            }
        }
        if batch.is_empty() {
            continue;
        }

        match repository.insert(&batch).await {
            Ok(rows) => {
                written += rows;
                log::info!("Inserted {} weather record(s)", rows);
            }
            Err(e) => log::error!("Dropping {} weather record(s): {}", batch.len(), e),
        }
    }

    log::info!("Weather sink stopped after {} row(s)", written);
    Ok(written)
}

fn push_record(batch: &mut Vec<WeatherRecord>, event: &Event) {
    match event.decode_json::<WeatherRecord>() {
        Ok(record) => batch.push(record),
        Err(e) => log::warn!("Skipping weather event {}: {}", event.id, e),
    }
}
