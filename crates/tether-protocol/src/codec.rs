//! Frame encoding and decoding
//!
//! Messages are serialized with CBOR: a compact, self-describing map keyed
//! by field name, so decoders tolerate fields they do not know about. The
//! payload ceiling is enforced on both directions; the encoder refuses to
//! produce an oversized frame and the decoder refuses to accept one.
//!
//! Encoding and decoding are pure functions with no shared state and are
//! safe to call from any thread.

use crate::error::ProtocolError;
use crate::message::{Message, MAX_PAYLOAD_SIZE};

/// Encode a message into one binary frame.
///
/// Fails with [`ProtocolError::PayloadTooLarge`] if the payload exceeds
/// [`MAX_PAYLOAD_SIZE`].
pub fn encode(message: &Message) -> Result<Vec<u8>, ProtocolError> {
    if message.data.len() > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::PayloadTooLarge {
            size: message.data.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }

    serde_cbor::to_vec(message).map_err(ProtocolError::Encode)
}

/// Decode one binary frame into a message.
///
/// Fails with [`ProtocolError::Decode`] on malformed input and with
/// [`ProtocolError::PayloadTooLarge`] if a peer smuggled an oversized
/// payload past its own encoder.
pub fn decode(bytes: &[u8]) -> Result<Message, ProtocolError> {
    let message: Message = serde_cbor::from_slice(bytes).map_err(ProtocolError::Decode)?;

    if message.data.len() > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::PayloadTooLarge {
            size: message.data.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageType;
    use bytes::Bytes;

    fn sample_message() -> Message {
        Message {
            message_type: MessageType::Stdout,
            data: Bytes::from_static(b"hello from the remote side"),
            target_id: "ms-1f2e3d".to_string(),
            session_id: "exec-0042".to_string(),
            timestamp: 1_722_000_000_123,
        }
    }

    #[test]
    fn test_roundtrip_preserves_every_field() {
        let original = sample_message();
        let bytes = encode(&original).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_roundtrip_empty_payload() {
        let mut msg = sample_message();
        msg.data = Bytes::new();
        let decoded = decode(&encode(&msg).unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_roundtrip_binary_payload() {
        let mut msg = sample_message();
        msg.data = Bytes::from((0u8..=255).collect::<Vec<u8>>());
        let decoded = decode(&encode(&msg).unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_encode_accepts_payload_at_limit() {
        let mut msg = sample_message();
        msg.data = Bytes::from(vec![0x41; MAX_PAYLOAD_SIZE]);
        let bytes = encode(&msg).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.data.len(), MAX_PAYLOAD_SIZE);
    }

    #[test]
    fn test_encode_rejects_payload_over_limit() {
        let mut msg = sample_message();
        msg.data = Bytes::from(vec![0x41; MAX_PAYLOAD_SIZE + 1]);
        match encode(&msg) {
            Err(ProtocolError::PayloadTooLarge { size, max }) => {
                assert_eq!(size, MAX_PAYLOAD_SIZE + 1);
                assert_eq!(max, MAX_PAYLOAD_SIZE);
            }
            other => panic!("expected PayloadTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode(b"\xFF\xFF not a cbor map");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_unknown_type_byte() {
        let mut msg = sample_message();
        msg.message_type = MessageType::Control;
        let mut bytes = encode(&msg).unwrap();
        // The type field value is the byte 3 following the "type" key text.
        let key = b"type";
        let pos = bytes
            .windows(key.len())
            .position(|w| w == key)
            .expect("type key present in encoded frame");
        let value_pos = pos + key.len();
        assert_eq!(bytes[value_pos], 3);
        bytes[value_pos] = 7; // unassigned type byte
        assert!(matches!(decode(&bytes), Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_wire_field_names() {
        let bytes = encode(&sample_message()).unwrap();
        let as_json: serde_json::Value = serde_cbor::from_slice::<serde_cbor::Value>(&bytes)
            .map(|v| serde_json::to_value(&v).unwrap())
            .unwrap();
        let map = as_json.as_object().unwrap();
        for field in ["type", "data", "targetId", "sessionId", "timestamp"] {
            assert!(map.contains_key(field), "missing wire field {}", field);
        }
    }
}
