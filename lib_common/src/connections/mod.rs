//! # Connections Module
//!
//! Persistent connections to external stores. The weather pipeline talks to
//! storage only through the [`WeatherRepository`] trait; [`PgWeatherStore`]
//! is the PostgreSQL implementation.

/// PostgreSQL connection pool and the `weather_info` table.
pub mod db_postgres;
/// Storage trait and error type.
pub mod repository;

pub use db_postgres::PgWeatherStore;
pub use repository::{StoreError, WeatherRepository};
