//! Codec trait and implementations for serializing/deserializing records.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! Persistent stores don't care HOW a record is serialized — they just
//! need something that implements the [`Codec`] trait.
//!
//! Currently we provide [`JsonCodec`], which keeps record files readable
//! with any text editor.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → safe to share between threads (stores are shared by
///   every identity actor task).
/// - `'static` → the codec owns everything it needs.
///
/// `decode` uses `DeserializeOwned` so the result doesn't borrow from the
/// input buffer, which is dropped right after decoding.
pub trait Codec: Send + Sync + 'static {
    /// File extension (without the dot) for values written by this codec.
    fn extension(&self) -> &'static str;

    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use gatehouse_protocol::{Codec, IdentityRecord, JsonCodec, Username};
///
/// let codec = JsonCodec;
/// let record = IdentityRecord::registered(
///     Username::new("alice"),
///     "c2FsdA".into(),
///     "aGFzaA".into(),
/// );
///
/// let bytes = codec.encode(&record).unwrap();
/// let decoded: IdentityRecord = codec.decode(&bytes).unwrap();
/// assert_eq!(record, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec_pretty(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{IdentityRecord, Username};

    #[test]
    fn test_json_codec_extension_is_json() {
        assert_eq!(JsonCodec.extension(), "json");
    }

    #[test]
    fn test_json_codec_decode_garbage_returns_decode_error() {
        let result: Result<IdentityRecord, _> =
            JsonCodec.decode(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_json_codec_output_is_readable_text() {
        let record = IdentityRecord::registered(
            Username::new("bob"),
            "salt".into(),
            "hash".into(),
        );
        let bytes = JsonCodec.encode(&record).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\"username\": \"bob\""));
        assert!(text.contains("\"exists\": true"));
    }
}
