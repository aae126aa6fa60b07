use thiserror::Error;

use crate::connections::StoreError;
use crate::events::BusError;

/// Failures of a pipeline stage.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The output file could not be opened or written.
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The CSV writer failed.
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),
    /// Subscribing or publishing failed.
    #[error(transparent)]
    Bus(#[from] BusError),
    /// The store rejected a read or write.
    #[error(transparent)]
    Store(#[from] StoreError),
}
