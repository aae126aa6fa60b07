//! # Document NLP Module
//!
//! Entity and sentiment extraction over fetched articles. Given a
//! [`Document`] (title + HTML body), the [`DocumentParser`] extracts named
//! entities from the title and every paragraph, scores the sentiment of each
//! paragraph, and aggregates everything into one [`ParseResult`].
//!
//! Both analyzers are capabilities passed in by the caller:
//!
//! - **`entities`**: the [`EntityExtractor`] trait and the bundled
//!   dictionary-based [`GazetteerExtractor`].
//! - **`sentiment`**: the [`SentimentScorer`] trait and the bundled
//!   word-weight [`LexiconModel`].
//!
//! The remaining modules hold the data model (`document`), HTML paragraph
//! splitting (`splitter`), the aggregation driver (`parser`) and the error
//! types (`error`).

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Input and output values of the pipeline.
pub mod document;
/// Pluggable named-entity recognition.
pub mod entities;
/// Error types for extraction, parsing and model loading.
pub mod error;
/// The aggregation driver.
pub mod parser;
/// Pluggable sentiment scoring.
pub mod sentiment;
/// HTML to paragraph splitting.
pub mod splitter;

// --- Public API Re-exports ---
pub use document::{Document, EntityMap, ParagraphBlock, ParseResult};
pub use entities::{EntityExtractor, GazetteerExtractor};
pub use error::{ExtractionError, ModelLoadError, ParseError};
pub use parser::{DocumentParser, MergePolicy, ParagraphAnalysis, ParseOutcome, ParserOptions};
pub use sentiment::{LexiconModel, SentimentScorer};
pub use splitter::split_paragraphs;
