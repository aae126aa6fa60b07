//! Error types of the extraction pipeline.

use thiserror::Error;

/// Failure of the entity model on one block of text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The text contains a NUL character the tokenizer cannot handle.
    #[error("cannot tokenize text: NUL character at byte {0}")]
    NulCharacter(usize),

    /// The text exceeds the extractor's input limit.
    #[error("cannot tokenize text: {len} characters exceeds the limit of {limit}")]
    TooLong {
        /// Length of the rejected text in characters.
        len: usize,
        /// The configured limit.
        limit: usize,
    },

    /// Any other failure reported by a pluggable model.
    #[error("entity model failed: {0}")]
    Model(String),
}

/// A block-level failure surfaced by the document parser.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Entity extraction failed on the document title.
    #[error("failed to extract entities from title: {0}")]
    Title(#[source] ExtractionError),

    /// Entity extraction failed on one paragraph.
    #[error("failed to extract entities from paragraph {index}: {source}")]
    Paragraph {
        /// Index of the paragraph in document order.
        index: usize,
        /// The underlying extractor error.
        #[source]
        source: ExtractionError,
    },
}

/// Errors while loading a gazetteer or sentiment lexicon from disk.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    /// The model file could not be read.
    #[error("failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    /// The model file is not a valid JSON object of the expected shape.
    #[error("failed to parse model file: {0}")]
    Json(#[from] serde_json::Error),

    /// The model file parsed but contains no entries.
    #[error("model file {0} contains no entries")]
    Empty(String),
}
