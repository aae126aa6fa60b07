//! # External Feeds Module
//!
//! Typed clients and message shapes for the third-party data sources that
//! the ingestors poll or stream from.
//!
//! - **`weather`**: WeatherAPI current conditions over the retrying
//!   [`ApiClient`](crate::retrieve::ky_http::ApiClient).
//! - **`finnhub`**: Finnhub real-time trade messages.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Feed error type.
pub mod error;
/// Finnhub trade stream messages.
pub mod finnhub;
/// WeatherAPI client and records.
#[allow(missing_docs)]
pub mod weather;

pub use error::FeedError;
pub use finnhub::{TradeTick, TradesResponse};
pub use weather::{ApiWeatherInfo, WeatherApiClient, WeatherRecord, WeatherSource};
