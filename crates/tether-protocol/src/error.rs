//! Protocol error types

use thiserror::Error;

/// Errors that can occur while encoding or decoding frames
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Payload exceeds the maximum frame size
    #[error("Payload too large: {size} bytes exceeds maximum of {max} bytes")]
    PayloadTooLarge { size: usize, max: usize },

    /// Message could not be serialized
    #[error("Failed to encode message: {0}")]
    Encode(#[source] serde_cbor::Error),

    /// Incoming frame is not a valid message
    #[error("Malformed message frame: {0}")]
    Decode(#[source] serde_cbor::Error),
}
