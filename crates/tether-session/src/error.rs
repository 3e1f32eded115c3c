//! Session error types
//!
//! Variants are cheap to clone so the transport can keep its sticky copy
//! while handing the same error to the caller.

use tether_protocol::ProtocolError;
use thiserror::Error;

/// Errors raised by the session transport and controllers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Dial-phase failure before the connection was established
    #[error("failed to connect to {url}: {reason}")]
    ConnectFailure { url: String, reason: String },

    /// The controller answered the upgrade request with a plain HTTP status
    #[error("connection upgrade rejected: HTTP {status}")]
    HandshakeStatus { status: u16 },

    /// The remote side closed the session abnormally
    #[error("websocket: close {code}: {reason}")]
    RemoteClosure { code: u16, reason: String },

    /// Outgoing payload exceeds the frame ceiling
    #[error("payload too large: {size} bytes exceeds maximum of {max} bytes")]
    SizeExceeded { size: usize, max: usize },

    /// Incoming frame could not be decoded
    #[error("malformed frame: {0}")]
    Protocol(String),

    /// Operation attempted without a live connection
    #[error("not connected")]
    NotConnected,

    /// Local terminal discipline could not be changed
    #[error("terminal error: {0}")]
    Terminal(String),

    /// Socket-level read or write failure
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<ProtocolError> for SessionError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::PayloadTooLarge { size, max } => Self::SizeExceeded { size, max },
            other => Self::Protocol(other.to_string()),
        }
    }
}
