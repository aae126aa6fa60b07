//! Use with `#[serde(with = "crate::utils::base64_bytes")]` on a `Vec<u8>` field.

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Deserializer, Serializer};

/// Encodes the bytes as a standard (padded) base64 string.
pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&general_purpose::STANDARD.encode(bytes))
}

/// Decodes a standard base64 string back into bytes.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let encoded = String::deserialize(deserializer)?;
    general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Carrier {
        #[serde(with = "super")]
        body: Vec<u8>,
    }

    #[test]
    fn test_body_travels_as_base64_string() {
        let carrier = Carrier { body: b"<p>hi</p>".to_vec() };
        let json = serde_json::to_value(&carrier).unwrap();
        assert_eq!(json["body"], "PHA+aGk8L3A+");
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        let res = serde_json::from_str::<Carrier>(r#"{"body":"***"}"#);
        assert!(res.is_err());
    }
}
