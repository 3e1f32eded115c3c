//! Log stream controller
//!
//! One-directional consumer of a log session: Idle → Streaming → Done.
//! Every `LogLine` payload is written newline-terminated; the stream ends
//! on `LogStop`, `LogError`, or transport closure. Only an abnormal remote
//! termination is surfaced as an error.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::SessionError;
use crate::stream::SessionStream;
use crate::terminal::SharedOutput;
use tether_protocol::MessageType;

/// One-directional log consumer over a [`SessionStream`]
pub struct LogStreamController<T: SessionStream + 'static> {
    transport: Arc<T>,
    output: SharedOutput,
    cancel: CancellationToken,
}

impl<T: SessionStream + 'static> LogStreamController<T> {
    pub fn new(transport: Arc<T>, output: SharedOutput) -> Self {
        Self {
            transport,
            output,
            cancel: CancellationToken::new(),
        }
    }

    /// Controller writing to the process stdout.
    pub fn stdio(transport: Arc<T>) -> Self {
        Self::new(
            transport,
            Arc::new(std::sync::Mutex::new(
                Box::new(std::io::stdout()) as Box<dyn std::io::Write + Send>
            )),
        )
    }

    /// Token that stops the stream when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Consume the stream to completion.
    ///
    /// Returns `Ok(())` on `LogStop`, `LogError` (the error text has
    /// already been written to the output), graceful remote closure, or an
    /// explicit stop; returns the transport error on abnormal termination.
    /// The transport is closed exactly once regardless of exit path.
    pub async fn run(self) -> Result<(), SessionError> {
        let result = loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break Ok(()),
                read = self.transport.read_message() => match read {
                    Ok(Some(message)) => match message.message_type {
                        MessageType::LogLine => {
                            if let Err(err) = write_log_line(&self.output, &message.data) {
                                break Err(SessionError::Terminal(err.to_string()));
                            }
                        }
                        MessageType::LogStart => {}
                        MessageType::LogStop => break Ok(()),
                        MessageType::LogError => {
                            let line =
                                format!("Error: {}", String::from_utf8_lossy(&message.data));
                            let _ = write_log_line(&self.output, line.as_bytes());
                            break Ok(());
                        }
                        // Non-log frames are not expected on a log session.
                        _ => {}
                    },
                    Ok(None) => break Ok(()),
                    Err(err) => break Err(err),
                }
            }
        };

        self.cancel.cancel();
        self.transport.close().await;
        result
    }
}

/// Write one log payload, normalizing the trailing newline: an empty
/// payload becomes a bare newline, an unterminated payload gains one, and
/// an already-terminated payload is written unchanged.
fn write_log_line(output: &SharedOutput, payload: &[u8]) -> std::io::Result<()> {
    let mut out = output.lock().expect("output lock poisoned");
    out.write_all(payload)?;
    if !payload.ends_with(b"\n") {
        out.write_all(b"\n")?;
    }
    out.flush()
}
