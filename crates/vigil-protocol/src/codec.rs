//! Codec trait and implementations for serializing frames.
//!
//! The protocol layer doesn't care how frames become bytes; it only needs
//! something that implements the [`Codec`] trait. [`JsonCodec`] is the
//! default (human-readable, trivially interoperable); a binary codec can
//! be slotted in later without touching any other layer.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode values to bytes and decode bytes back.
///
/// `Send + Sync + 'static` so a codec can be shared across the Tokio
/// tasks that drive a connection.
pub trait Codec: Send + Sync + 'static {
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
    /// truncated, or don't match the expected type.
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
/// Behind the `json` feature flag (enabled by default).
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
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
    use crate::{Frame, Message};

    #[test]
    fn test_json_codec_round_trip() {
        let codec = JsonCodec;
        let frame = Frame {
            seq: 3,
            timestamp: 120,
            message: Message::Probe,
        };
        let bytes = codec.encode(&frame).unwrap();
        let decoded: Frame = codec.decode(&bytes).unwrap();
        assert_eq!(frame, decoded);
    }

    #[test]
    fn test_json_codec_decode_error_is_decode_variant() {
        let codec = JsonCodec;
        let result: Result<Frame, _> = codec.decode(b"{broken");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
