//! tether-protocol: Wire protocol for tether remote sessions
//!
//! This crate defines the framed message format exchanged between the CLI
//! and the controller over a persistent WebSocket connection. One `Message`
//! is carried per transport-level binary frame.

pub mod codec;
pub mod error;
pub mod message;

pub use codec::{decode, encode};
pub use error::ProtocolError;
pub use message::{Message, MessageType, MAX_PAYLOAD_SIZE};
