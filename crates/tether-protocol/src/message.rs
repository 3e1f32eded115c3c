//! Message types for the tether session protocol
//!
//! A `Message` is the unit of exchange for both interactive exec sessions
//! and log streams. The controller routes on `targetId` and correlates on
//! `sessionId`; both fields are stamped by the session transport at send
//! time and must not be trusted from caller input.
//!
//! # Message Flow
//!
//! Typical exec session:
//!
//! 1. CLI connects and the controller sends `Activation` once the remote
//!    side is attached
//! 2. Keystrokes flow up as `Stdin`, remote output flows down as `Stdout`
//!    and `Stderr`
//! 3. Either side sends `Close` to end the session
//!
//! Log streams use the reserved log subtype range: `LogStart`, then any
//! number of `LogLine` frames, terminated by `LogStop` or `LogError`.

use bytes::Bytes;
use serde::de::{Deserializer, Error as DeError};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Maximum payload size for a single message (1 MiB).
///
/// The controller rejects larger frames with close code 1009, so the limit
/// is enforced locally on both encode and decode.
pub const MAX_PAYLOAD_SIZE: usize = 1_048_576;

/// Message type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Keystrokes from the local terminal
    Stdin = 0,
    /// Remote standard output
    Stdout = 1,
    /// Remote standard error
    Stderr = 2,
    /// Out-of-band control data
    Control = 3,
    /// Session close request
    Close = 4,
    /// Remote side attached and ready
    Activation = 5,
    /// One log record (reserved log subtype range starts here)
    LogLine = 10,
    /// Log stream opened
    LogStart = 11,
    /// Log stream ended normally
    LogStop = 12,
    /// Log stream ended with a server-reported error
    LogError = 13,
}

impl MessageType {
    /// Convert to the 1-byte wire representation
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Convert from the 1-byte wire representation
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Stdin),
            1 => Some(Self::Stdout),
            2 => Some(Self::Stderr),
            3 => Some(Self::Control),
            4 => Some(Self::Close),
            5 => Some(Self::Activation),
            10 => Some(Self::LogLine),
            11 => Some(Self::LogStart),
            12 => Some(Self::LogStop),
            13 => Some(Self::LogError),
            _ => None,
        }
    }

    /// True for the reserved log subtype range
    pub fn is_log(&self) -> bool {
        matches!(
            self,
            Self::LogLine | Self::LogStart | Self::LogStop | Self::LogError
        )
    }
}

impl Serialize for MessageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for MessageType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Self::from_u8(value)
            .ok_or_else(|| D::Error::custom(format!("unknown message type {}", value)))
    }
}

/// One framed protocol message
///
/// Wire field names are fixed by the controller's contract; the struct is
/// serialized as a field-named map so new fields can be added without
/// breaking old decoders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message type discriminator
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// Payload, at most [`MAX_PAYLOAD_SIZE`] bytes
    #[serde(default)]
    pub data: Bytes,
    /// Microservice or agent identity this session is bound to
    #[serde(rename = "targetId", default)]
    pub target_id: String,
    /// Session correlation id
    #[serde(rename = "sessionId", default)]
    pub session_id: String,
    /// Milliseconds since the Unix epoch, stamped at send time
    #[serde(default)]
    pub timestamp: u64,
}

impl Message {
    /// Create a message with the current timestamp and empty correlation
    /// fields. The transport overwrites `target_id` and `session_id` with
    /// its own identity before the frame goes out.
    pub fn new(message_type: MessageType, data: impl Into<Bytes>) -> Self {
        Self {
            message_type,
            data: data.into(),
            target_id: String::new(),
            session_id: String::new(),
            timestamp: now_millis(),
        }
    }

    pub fn is_stdin(&self) -> bool {
        self.message_type == MessageType::Stdin
    }

    pub fn is_stdout(&self) -> bool {
        self.message_type == MessageType::Stdout
    }

    pub fn is_stderr(&self) -> bool {
        self.message_type == MessageType::Stderr
    }

    pub fn is_control(&self) -> bool {
        self.message_type == MessageType::Control
    }

    pub fn is_close(&self) -> bool {
        self.message_type == MessageType::Close
    }

    pub fn is_activation(&self) -> bool {
        self.message_type == MessageType::Activation
    }

    pub fn is_log_line(&self) -> bool {
        self.message_type == MessageType::LogLine
    }

    pub fn is_log_start(&self) -> bool {
        self.message_type == MessageType::LogStart
    }

    pub fn is_log_stop(&self) -> bool {
        self.message_type == MessageType::LogStop
    }

    pub fn is_log_error(&self) -> bool {
        self.message_type == MessageType::LogError
    }
}

/// Current Unix timestamp in milliseconds.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
