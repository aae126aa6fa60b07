//! # Event Envelope
//!
//! Everything that travels over the bus is an [`Event`]: a typed, versioned,
//! mimetype-tagged byte payload with an id and a creation time. On the wire
//! the envelope itself is JSON with the payload as base64.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::error::BusError;

/// Mimetype of JSON payloads.
pub const MIME_JSON: &str = "application/json";

/// A single message on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique id, assigned at creation.
    pub id: Uuid,
    /// Name of the payload type, e.g. `Document` or `Generic`.
    pub type_name: String,
    /// Version of the payload type.
    pub type_version: u32,
    /// Encoding of `data`.
    pub mimetype: String,
    /// The payload.
    #[serde(with = "crate::utils::base64_bytes")]
    pub data: Vec<u8>,
    /// When the event was created.
    pub created: DateTime<Utc>,
}

impl Event {
    /// Wraps raw bytes in a new event.
    pub fn new(type_name: &str, type_version: u32, mimetype: &str, data: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            type_name: type_name.to_string(),
            type_version,
            mimetype: mimetype.to_string(),
            data,
            created: Utc::now(),
        }
    }

    /// Serializes `value` as the JSON payload of a new event.
    pub fn json<T: Serialize>(type_name: &str, type_version: u32, value: &T) -> Result<Self, BusError> {
        let data = serde_json::to_vec(value).map_err(BusError::Encode)?;
        Ok(Self::new(type_name, type_version, MIME_JSON, data))
    }

    /// Deserializes the JSON payload.
    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T, BusError> {
        if self.mimetype != MIME_JSON {
            return Err(BusError::Mimetype {
                expected: MIME_JSON.to_string(),
                found: self.mimetype.clone(),
            });
        }
        serde_json::from_slice(&self.data).map_err(BusError::Decode)
    }

    /// Encodes the whole envelope for transport.
    pub fn to_wire(&self) -> Result<Vec<u8>, BusError> {
        serde_json::to_vec(self).map_err(BusError::Encode)
    }

    /// Decodes an envelope received from transport.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, BusError> {
        serde_json::from_slice(bytes).map_err(BusError::Decode)
    }
}
