//! Stored document schema and its byte encoding.
//!
//! The cache store only sees bytes. Everything that knows the document's
//! shape or the table codec goes through [`DocumentCodec`].

use playercache_core::codec::{CodecError, PayloadCodec};
use playercache_core::types::UnixSeconds;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys the document owns; upstream fields with these names are replaced.
const RESERVED_KEYS: [&str; 2] = ["name", "timestamp"];

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A cached player document: every top-level upstream field, plus the
/// resolved display name and the time of the refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDocument {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub name: Option<String>,
    pub timestamp: UnixSeconds,
}

impl PlayerDocument {
    pub fn new(mut fields: Map<String, Value>, name: Option<String>, timestamp: UnixSeconds) -> Self {
        for key in RESERVED_KEYS {
            fields.remove(key);
        }
        Self {
            fields,
            name,
            timestamp,
        }
    }

    /// Placeholder stored for players the upstream does not know.
    pub fn not_found(timestamp: UnixSeconds) -> Self {
        Self::new(Map::new(), None, timestamp)
    }
}

/// JSON plus the table codec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentCodec {
    codec: PayloadCodec,
}

impl DocumentCodec {
    pub fn new(codec: PayloadCodec) -> Self {
        Self { codec }
    }

    pub fn payload_codec(&self) -> PayloadCodec {
        self.codec
    }

    pub fn encode(&self, document: &PlayerDocument) -> Result<Vec<u8>, DocumentError> {
        let json = serde_json::to_vec(document)?;
        Ok(self.codec.encode(&json)?)
    }

    pub fn decode(&self, stored: &[u8]) -> Result<PlayerDocument, DocumentError> {
        let json = self.codec.decode(stored)?;
        Ok(serde_json::from_slice(&json)?)
    }

    /// Decode and validate, returning the JSON bytes exactly as stored.
    pub fn decode_json(&self, stored: &[u8]) -> Result<Vec<u8>, DocumentError> {
        let json = self.codec.decode(stored)?;
        serde_json::from_slice::<PlayerDocument>(&json)?;
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn document_serializes_flat() {
        let doc = PlayerDocument::new(
            fields(json!({ "success": true, "player": { "displayname": "Notch" } })),
            Some("Notch".into()),
            1_700_000_000,
        );
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            json!({
                "success": true,
                "player": { "displayname": "Notch" },
                "name": "Notch",
                "timestamp": 1_700_000_000,
            })
        );
    }

    #[test]
    fn document_overrides_reserved_upstream_keys() {
        let doc = PlayerDocument::new(
            fields(json!({ "name": "upstream", "timestamp": 1, "x": 2 })),
            Some("resolved".into()),
            5,
        );
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value, json!({ "x": 2, "name": "resolved", "timestamp": 5 }));
    }

    #[test]
    fn not_found_has_null_name() {
        let value = serde_json::to_value(PlayerDocument::not_found(9)).unwrap();
        assert_eq!(value, json!({ "name": null, "timestamp": 9 }));
    }

    #[test]
    fn zstd_codec_round_trips_document() {
        let codec = DocumentCodec::new(PayloadCodec::Zstd { level: 3 });
        let doc = PlayerDocument::new(fields(json!({ "player": null })), None, 42);
        let stored = codec.encode(&doc).unwrap();
        assert_eq!(codec.decode(&stored).unwrap(), doc);
    }

    #[test]
    fn decode_json_returns_plain_bytes() {
        let codec = DocumentCodec::new(PayloadCodec::Zstd { level: 3 });
        let doc = PlayerDocument::not_found(1);
        let stored = codec.encode(&doc).unwrap();
        let json = codec.decode_json(&stored).unwrap();
        assert_eq!(json, serde_json::to_vec(&doc).unwrap());
    }

    #[test]
    fn corrupt_bytes_fail_to_decode() {
        let plain = DocumentCodec::default();
        assert_matches!(plain.decode(b"\x00\x01garbage"), Err(DocumentError::Json(_)));
        // A document must carry a timestamp.
        assert_matches!(plain.decode(br#"{"name":"x"}"#), Err(DocumentError::Json(_)));

        let zstd = DocumentCodec::new(PayloadCodec::Zstd { level: 3 });
        assert_matches!(zstd.decode(br#"{"name":null,"timestamp":1}"#), Err(DocumentError::Codec(_)));
    }
}
