//! Session stream abstraction
//!
//! The terminal and log-stream controllers drive their session through
//! this trait so they can be exercised against scripted fakes; the
//! production implementation is [`crate::transport::WsTransport`].

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::SessionError;
use tether_protocol::Message;

/// One full-duplex, message-framed session
#[async_trait]
pub trait SessionStream: Send + Sync {
    /// Send one message; correlation fields are stamped by the stream.
    async fn send_message(&self, message: Message) -> Result<(), SessionError>;

    /// Receive the next message. `Ok(None)` is a graceful end-of-stream;
    /// an abnormal remote termination is an error.
    async fn read_message(&self) -> Result<Option<Message>, SessionError>;

    /// Tear the session down; idempotent.
    async fn close(&self);

    /// Token fired exactly once when the session finishes.
    fn done(&self) -> CancellationToken;

    /// Sticky first error, if any.
    fn error(&self) -> Option<SessionError>;
}
