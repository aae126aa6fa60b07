use thiserror::Error;

/// Failures while pulling data from an external feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The request could not be built, sent, or its body decoded.
    #[error("feed request failed: {0:#}")]
    Request(anyhow::Error),

    /// The upstream answered with a non-success status.
    #[error("feed returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// A streamed message was not valid JSON for the expected shape.
    #[error("malformed feed message: {0}")]
    Decode(#[from] serde_json::Error),

    /// A required credential was not configured.
    #[error("missing credential: {0}")]
    MissingKey(&'static str),
}
