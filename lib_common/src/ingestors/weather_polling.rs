//! # Weather Polling Ingestor
//!
//! A self-scheduling ingestor for the WeatherAPI REST endpoint, which has no
//! streaming interface. Every tick it fetches the current conditions and
//! publishes them on the `current_weather` topic.
//!
//! ## Behaviour:
//! - **Fixed cadence**: the first poll happens one interval after start, then
//!   once per interval. Ticks missed while a slow request was running are
//!   skipped, not replayed.
//! - **Resilience**: a failed fetch or publish is logged and that tick is
//!   dropped; the loop carries on.
//! - **Shutdown**: the loop exits as soon as the shutdown signal fires.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::events::{Event, EventBus};
use crate::feeds::weather::{WeatherSource, WEATHER_INFO_TYPE};

/// Topic current readings are published to.
pub const CURRENT_WEATHER_TOPIC: &str = "current_weather";
/// Default time between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// # Weather Polling Ingestor
pub struct WeatherPollingIngestor {
    source: Arc<dyn WeatherSource>,
    bus: Arc<dyn EventBus>,
    topic: String,
    interval: Duration,
}

impl WeatherPollingIngestor {
    /// Creates an ingestor polling `source` every [`DEFAULT_POLL_INTERVAL`].
    pub fn new(source: Arc<dyn WeatherSource>, bus: Arc<dyn EventBus>) -> Self {
        Self {
            source,
            bus,
            topic: CURRENT_WEATHER_TOPIC.to_string(),
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Overrides the poll interval. A zero interval is raised to one second.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = if interval.is_zero() {
            Duration::from_secs(1)
        } else {
            interval
        };
        self
    }

    /// Polls until `shutdown` fires.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        log::info!(
            "Weather polling started: every {:?} to '{}'",
            self.interval,
            self.topic
        );
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    log::info!("Weather polling stopped.");
                    return;
                }
                _ = ticker.tick() => self.poll_once().await,
            }
        }
    }

    /// Fetches one reading and publishes it. Failures are logged.
    pub async fn poll_once(&self) {
        let info = match self.source.current().await {
            Ok(info) => info,
            Err(e) => {
                log::warn!("Issue retrieving weather data: {}", e);
                return;
            }
        };

        let event = match Event::json(WEATHER_INFO_TYPE, 1, &info) {
            Ok(event) => event,
            Err(e) => {
                log::error!("Could not encode weather data: {}", e);
                return;
            }
        };

        match self.bus.publish(&self.topic, &event).await {
            Ok(()) => log::debug!("Published weather reading {}", info.last_updated),
            Err(e) => log::error!("Cannot publish weather reading: {}", e),
        }
    }
}
