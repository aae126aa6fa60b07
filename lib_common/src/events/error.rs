use thiserror::Error;

/// Errors of the event bus layer.
#[derive(Debug, Error)]
pub enum BusError {
    /// A payload or envelope could not be serialized.
    #[error("failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),

    /// A payload or envelope could not be deserialized.
    #[error("failed to decode event: {0}")]
    Decode(#[source] serde_json::Error),

    /// The payload is not in the encoding the caller asked for.
    #[error("unexpected mimetype: expected {expected}, found {found}")]
    Mimetype {
        /// The mimetype the decoder understands.
        expected: String,
        /// The mimetype on the event.
        found: String,
    },

    /// The Redis transport failed.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}
