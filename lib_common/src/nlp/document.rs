//! # Document Model
//!
//! The input and output values of the extraction pipeline. A `Document` is
//! what an upstream crawler publishes for every fetched article; it is
//! decoded from an event payload by the caller and handed to the parser
//! unchanged. `ParseResult` is what comes back.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mapping from an entity's exact surface text to its type label
/// (e.g. `"Paris" -> "GPE"`). Ordered so that output is stable.
pub type EntityMap = BTreeMap<String, String>;

/// # Document
///
/// A fetched article: its title, the raw HTML body and some provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The article headline. Run through entity extraction on its own.
    pub title: String,
    /// The raw HTML body as fetched. Carried as base64 in JSON payloads.
    #[serde(with = "crate::utils::base64_bytes")]
    pub content: Vec<u8>,
    /// When the crawler fetched the page.
    pub fetched_at: DateTime<Utc>,
    /// The canonical link of the article.
    pub link: String,
}

impl Document {
    /// Builds a document from a title and an HTML string, stamped with the
    /// current time and an empty link. Mostly useful for tests and demos.
    pub fn from_html(title: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: html.into().into_bytes(),
            fetched_at: Utc::now(),
            link: String::new(),
        }
    }
}

/// Plain text of one `<p>` element, tagged with its position among the
/// kept paragraphs of the document (0-based, document order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphBlock {
    /// Position in document order.
    pub index: usize,
    /// Whitespace-normalized text content.
    pub text: String,
}

/// # Parse Result
///
/// The aggregated output for one document.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ParseResult {
    /// Merged entities of the title and every paragraph. Key collisions are
    /// resolved by the parser's `MergePolicy`.
    pub entities: EntityMap,
    /// Every entity text that was produced with more than one distinct label,
    /// mapped to all of its labels in processing order (title first, then
    /// paragraphs in document order).
    pub conflicts: BTreeMap<String, Vec<String>>,
    /// Arithmetic mean of the paragraph sentiment scores, or `None` when
    /// the document has no paragraphs.
    pub avg_sentiment: Option<f32>,
    /// Number of paragraphs that were scored.
    pub paragraphs: usize,
    /// Number of blocks (title or paragraphs) whose entity extraction failed.
    pub failed_blocks: usize,
}
