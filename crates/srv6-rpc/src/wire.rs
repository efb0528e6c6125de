//! Frame codec for the control protocol.
//!
//! Messages travel as JSON documents behind a 4-byte big-endian length
//! prefix. The frame layer knows nothing about message semantics.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::codec::LengthDelimitedCodec;

use crate::error::RpcError;

/// Upper bound on one frame; a request carrying a full uSID policy is a
/// few kilobytes, so this is generous.
pub const MAX_FRAME_LENGTH: usize = 1024 * 1024;

/// Builds the length-delimited codec both sides of the wire use.
pub fn frame_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(4)
        .max_frame_length(MAX_FRAME_LENGTH)
        .new_codec()
}

/// Serializes a message into one frame payload.
pub fn encode_message<T: Serialize>(message: &T) -> Result<Bytes, RpcError> {
    let raw = serde_json::to_vec(message).map_err(RpcError::Encode)?;
    Ok(Bytes::from(raw))
}

/// Parses one frame payload into a message.
pub fn decode_message<T: DeserializeOwned>(frame: &[u8]) -> Result<T, RpcError> {
    serde_json::from_slice(frame).map_err(RpcError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::Srv6ManagerReply;
    use srv6_types::StatusCode;

    #[test]
    fn test_message_round_trip() {
        let reply = Srv6ManagerReply::new(StatusCode::NoSuchProcess);
        let frame = encode_message(&reply).unwrap();
        let back: Srv6ManagerReply = decode_message(&frame).unwrap();
        assert_eq!(back, reply);
    }

    #[test]
    fn test_decode_garbage() {
        let err = decode_message::<Srv6ManagerReply>(b"not json").unwrap_err();
        assert!(matches!(err, RpcError::Decode(_)));
    }
}
