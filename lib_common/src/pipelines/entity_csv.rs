//! # Entity CSV Pipeline
//!
//! Consumes `Document` events, runs them through the [`DocumentParser`] and
//! appends one CSV row per extracted entity:
//!
//! | entity | label | title | fetched_at | link | avg_sentiment |
//!
//! `fetched_at` is RFC 3339; `avg_sentiment` has six decimals and is empty
//! for documents without paragraphs.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::broadcast;

use crate::events::EventBus;
use crate::nlp::{
    Document, DocumentParser, EntityExtractor, ParseOutcome, ParseResult, SentimentScorer,
};
use crate::pipelines::error::SinkError;

/// Topic documents arrive on unless configured otherwise.
pub const DOCUMENTS_TOPIC: &str = "documents";
/// Event type carrying a [`Document`] payload.
pub const DOCUMENT_TYPE: &str = "Document";
/// Event type announcing a new feed item; logged only.
pub const FEED_ITEM_TYPE: &str = "FeedItem";

/// Column names of the output file.
pub const HEADER: [&str; 6] = ["entity", "label", "title", "fetched_at", "link", "avg_sentiment"];

/// # Entity CSV Sink
pub struct EntityCsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl EntityCsvSink<File> {
    /// Creates (or truncates) `path` and writes the header row.
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_writer(File::create(path)?)
    }
}

impl<W: Write> EntityCsvSink<W> {
    /// Wraps `inner` and writes the header row.
    pub fn from_writer(inner: W) -> Result<Self, SinkError> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(HEADER)?;
        Ok(Self { writer })
    }

    /// Appends one row per entity of `result`. Returns the number of rows.
    pub fn write_result(&mut self, document: &Document, result: &ParseResult) -> Result<usize, SinkError> {
        let fetched_at = document.fetched_at.to_rfc3339();
        let avg = result
            .avg_sentiment
            .map(|avg| format!("{:.6}", avg))
            .unwrap_or_default();

        for (entity, label) in &result.entities {
            self.writer.write_record([
                entity.as_str(),
                label.as_str(),
                document.title.as_str(),
                fetched_at.as_str(),
                document.link.as_str(),
                avg.as_str(),
            ])?;
        }
        Ok(result.entities.len())
    }

    /// Flushes buffered rows to the underlying writer.
    pub fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer
            .into_inner()
            .map_err(|e| SinkError::Io(e.into_error()))
    }
}

/// Processes documents from `topic` until `shutdown` fires or the
/// subscription ends. Returns how many documents were written.
///
/// Undecodable events are logged and skipped; a failing paragraph only
/// shrinks the document's result. Sink write errors are fatal.
pub async fn run_document_subscriber<E, S, W>(
    bus: &dyn EventBus,
    topic: &str,
    parser: &DocumentParser<'_, E, S>,
    sink: &mut EntityCsvSink<W>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<usize, SinkError>
where
    E: EntityExtractor + ?Sized,
    S: SentimentScorer + ?Sized,
    W: Write,
{
    let mut subscription = bus.subscribe(topic).await?;
    log::info!("Subscribed to '{}'", topic);
    let mut processed = 0;

    loop {
        let event = tokio::select! {
            _ = shutdown.recv() => break,
            next = subscription.next() => match next {
                Some(event) => event,
                None => {
                    log::warn!("Subscription to '{}' ended", topic);
                    break;
                }
            }
        };

        match event.type_name.as_str() {
            FEED_ITEM_TYPE => {
                log::info!("FeedItem {} detected", event.id);
                continue;
            }
            DOCUMENT_TYPE => {}
            other => {
                log::debug!("No document in event {} ({})", event.id, other);
                continue;
            }
        }

        let document: Document = match event.decode_json() {
            Ok(document) => document,
            Err(e) => {
                log::warn!("Skipping undecodable document {}: {}", event.id, e);
                continue;
            }
        };

        let outcome = parse_blocking(parser, &document);
        if let Some(e) = &outcome.error {
            log::warn!(
                "{} of {} blocks failed for {}; last error: {}",
                outcome.result.failed_blocks,
                outcome.result.paragraphs + 1,
                document.link,
                e
            );
        }

        let rows = sink.write_result(&document, &outcome.result)?;
        sink.flush()?;
        processed += 1;
        log::info!("Stored {} entities from '{}'", rows, document.title);
    }

    sink.flush()?;
    Ok(processed)
}

/// Parsing is CPU-bound (and joins rayon when `parallel` is set). On a
/// multi-threaded runtime the worker hands its other tasks off first;
/// `block_in_place` is not available on a current-thread runtime.
fn parse_blocking<E, S>(parser: &DocumentParser<'_, E, S>, document: &Document) -> ParseOutcome
where
    E: EntityExtractor + ?Sized,
    S: SentimentScorer + ?Sized,
{
    match Handle::current().runtime_flavor() {
        RuntimeFlavor::MultiThread => tokio::task::block_in_place(|| parser.parse(document)),
        _ => parser.parse(document),
    }
}
