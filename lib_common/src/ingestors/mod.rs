//! # Data Ingestors Module
//!
//! Long-running clients that pull data from an external source and publish
//! it onto the event bus.
//!
//! ## Contained Modules:
//! - **`weather_polling`**: a self-scheduling REST poller for WeatherAPI
//!   current conditions.
//! - **`trades_wss`**: a reconnecting WebSocket client for the Finnhub
//!   trades stream.
//!
//! Both stop when the `tokio::sync::broadcast` shutdown signal fires.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// The WebSocket client for the Finnhub trades stream.
pub mod trades_wss;
/// The self-scheduling REST poller for WeatherAPI.
pub mod weather_polling;

pub use trades_wss::{TradesConfig, TradesWssIngestor, TRADES_TOPIC};
pub use weather_polling::{WeatherPollingIngestor, CURRENT_WEATHER_TOPIC};
