//! # Pipelines Module
//!
//! End-to-end consumers that sit at the far side of the event bus.
//!
//! - **`entity_csv`**: documents in, entity rows out. Runs every `Document`
//!   event through the NLP parser and appends the result to a CSV file.
//! - **`weather_etl`**: weather readings in, database rows out. A dedup
//!   handler filters readings already stored and a sink batches inserts.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Document to CSV entity export.
pub mod entity_csv;
/// Pipeline error type.
pub mod error;
/// Weather dedup and storage.
pub mod weather_etl;

pub use entity_csv::{run_document_subscriber, EntityCsvSink, DOCUMENTS_TOPIC};
pub use error::SinkError;
pub use weather_etl::{run_weather_sink, WeatherDedupHandler, WEATHER_INSERT_TOPIC};
