//! Payload codec for objects exported to guests.
//!
//! Schema version 1 is compact JSON produced by `serde_json` from the types in
//! [`crate::types`]. Struct fields serialize in declaration order and every map
//! is ordered, so the same value always yields the same bytes. An absent
//! object is the empty payload.
//!
//! Host and guest are built separately and never negotiate at runtime. Guests
//! export `schema-version` so the host can refuse a mismatched build at load
//! time (see `wasmsched-runtime`).

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Version of the payload schema this build encodes and decodes.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode payload: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Encode an optional object. `None` encodes as zero bytes.
pub fn encode<T: Serialize>(value: Option<&T>) -> Result<Vec<u8>, CodecError> {
    match value {
        Some(value) => serde_json::to_vec(value).map_err(CodecError::Encode),
        None => Ok(Vec::new()),
    }
}

/// Decode a payload produced by [`encode`]. The empty payload is `None`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<Option<T>, CodecError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(CodecError::Decode)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::types::{Node, Pod, Resources};

    fn node() -> Node {
        Node {
            name: "node-a".to_string(),
            labels: BTreeMap::from([
                ("zone".to_string(), "eu-1".to_string()),
                ("arch".to_string(), "arm64".to_string()),
                ("disk".to_string(), "ssd".to_string()),
            ]),
            allocatable: Resources {
                cpu_millis: 4000,
                memory_bytes: 8 << 30,
                pods: 110,
            },
            ..Node::default()
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let node = node();
        let first = encode(Some(&node)).unwrap();
        let second = encode(Some(&node.clone())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn labels_encode_in_key_order() {
        let bytes = encode(Some(&node())).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let arch = text.find("\"arch\"").unwrap();
        let disk = text.find("\"disk\"").unwrap();
        let zone = text.find("\"zone\"").unwrap();
        assert!(arch < disk && disk < zone, "labels out of order: {text}");
    }

    #[test]
    fn absent_object_is_empty_payload() {
        let bytes = encode::<Node>(None).unwrap();
        assert!(bytes.is_empty());
        assert_eq!(decode::<Node>(&bytes).unwrap(), None);
    }

    #[test]
    fn decode_recovers_encoded_pod() {
        let pod = Pod {
            name: "web-0".to_string(),
            namespace: "prod".to_string(),
            node_name: Some("node-a".to_string()),
            ..Pod::default()
        };
        let bytes = encode(Some(&pod)).unwrap();
        assert_eq!(decode::<Pod>(&bytes).unwrap(), Some(pod));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode::<Pod>(b"{not json").unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }
}
