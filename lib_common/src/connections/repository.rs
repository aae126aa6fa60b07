//! Storage seam for accepted weather readings.

use async_trait::async_trait;
use thiserror::Error;

use crate::feeds::weather::WeatherRecord;

/// Custom error types for storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("Failed to connect to database: {0}")]
    Connection(String),
    /// A statement failed.
    #[error("Query execution failed: {0}")]
    Query(String),
}

/// Where weather records are kept.
#[async_trait]
pub trait WeatherRepository: Send + Sync {
    /// Whether a record with this observation time is already stored.
    async fn record_exists(&self, last_updated: &str) -> Result<bool, StoreError>;

    /// Stores `records` in one batch and returns how many rows were written.
    async fn insert(&self, records: &[WeatherRecord]) -> Result<u64, StoreError>;
}
