//! Interactive terminal controller
//!
//! Drives a full-duplex exec session: Idle → Raw → Closing → Closed. On
//! start the local terminal discipline is switched to raw mode (the remote
//! side owns echo and line editing) and two readers are spawned: one
//! draining remote output frames into the output sink, one consuming local
//! keystrokes byte-by-byte. All writers to the output sink go through one
//! mutex so remote output never interleaves with local echo.
//!
//! One shared cancellation token coordinates shutdown: a remote read error
//! or EOF, a local termination sequence, or an explicit stop all fire it.
//! Cleanup runs once on the single exit path: close the transport, then
//! restore the prior terminal mode best-effort.

use std::io::{Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::SessionError;
use crate::keys::{KeyAction, KeyInterpreter};
use crate::resize::ResizeWatcher;
use crate::stream::SessionStream;
use tether_protocol::{Message, MessageType};

/// Output sink shared between remote output and local echo.
pub type SharedOutput = Arc<Mutex<Box<dyn Write + Send>>>;

/// Capacity of the keystroke channel between the blocking stdin thread
/// and the session loop. Keystrokes are tiny; 256 absorbs paste bursts
/// without noticeable backpressure.
const INPUT_CHANNEL_CAPACITY: usize = 256;

enum InputEvent {
    /// Forward one keystroke byte to the remote side
    Forward(u8),
    /// Locally echo `^C`; nothing is forwarded
    EchoInterrupt,
    /// Local termination sequence or input EOF
    Terminate,
}

/// Full-duplex raw-terminal session over a [`SessionStream`]
pub struct TerminalController<T: SessionStream + 'static> {
    transport: Arc<T>,
    input: Option<Box<dyn Read + Send>>,
    output: SharedOutput,
    manage_raw_mode: bool,
    cancel: CancellationToken,
}

impl<T: SessionStream + 'static> TerminalController<T> {
    /// Controller bound to the process stdin/stdout with raw-mode
    /// management enabled.
    pub fn stdio(transport: Arc<T>) -> Self {
        Self::with_io(
            transport,
            Box::new(std::io::stdin()),
            Arc::new(Mutex::new(Box::new(std::io::stdout()) as Box<dyn Write + Send>)),
            true,
        )
    }

    /// Controller with injected I/O. `manage_raw_mode` is disabled in
    /// tests, where there is no terminal to reconfigure.
    pub fn with_io(
        transport: Arc<T>,
        input: Box<dyn Read + Send>,
        output: SharedOutput,
        manage_raw_mode: bool,
    ) -> Self {
        Self {
            transport,
            input: Some(input),
            output,
            manage_raw_mode,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops the session when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the session to completion.
    ///
    /// Blocks until the shared cancellation fires, then cleans up and
    /// returns the first hard error observed, or `Ok(())` for a graceful
    /// termination.
    pub async fn run(mut self) -> Result<(), SessionError> {
        if self.manage_raw_mode {
            crossterm::terminal::enable_raw_mode()
                .map_err(|err| SessionError::Terminal(format!("cannot enter raw mode: {}", err)))?;
        }

        let cancel = self.cancel.clone();
        let remote = tokio::spawn(pump_remote(
            Arc::clone(&self.transport),
            Arc::clone(&self.output),
            cancel.clone(),
        ));

        let (input_tx, mut input_rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let input = self.input.take().expect("input source already taken");
        spawn_input_reader(input, input_tx, cancel.clone());

        let mut resize = ResizeWatcher::spawn();

        let mut result = Ok(());
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = input_rx.recv() => match event {
                    Some(InputEvent::Forward(byte)) => {
                        let message = Message::new(MessageType::Stdin, vec![byte]);
                        if let Err(err) = self.transport.send_message(message).await {
                            result = Err(err);
                            break;
                        }
                    }
                    Some(InputEvent::EchoInterrupt) => {
                        let mut out = self.output.lock().expect("output lock poisoned");
                        let _ = out.write_all(b"^C\r\n").and_then(|_| out.flush());
                    }
                    Some(InputEvent::Terminate) | None => break,
                },
                (cols, rows) = resize.next() => {
                    // Captured for local bookkeeping only; the remote side
                    // is not told about resizes.
                    tracing::trace!(cols, rows, "Local terminal resized");
                }
            }
        }

        cancel.cancel();

        self.transport.close().await;
        let _ = remote.await;

        if self.manage_raw_mode {
            // Best-effort: a failed restore must not block process exit.
            if let Err(err) = crossterm::terminal::disable_raw_mode() {
                tracing::warn!(error = %err, "Failed to restore terminal mode");
            }
        }

        // The transport's sticky slot holds the first hard error; fall back
        // to a local failure it never saw (for example an oversized frame).
        match self.transport.error() {
            Some(err) => Err(err),
            None => result,
        }
    }
}

/// Drain remote frames into the shared output sink until cancelled.
async fn pump_remote<T: SessionStream>(
    transport: Arc<T>,
    output: SharedOutput,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            read = transport.read_message() => match read {
                Ok(Some(message)) if message.is_stdout() || message.is_stderr() => {
                    let mut out = output.lock().expect("output lock poisoned");
                    if out.write_all(&message.data).and_then(|_| out.flush()).is_err() {
                        cancel.cancel();
                        break;
                    }
                }
                // Control and activation frames need no local action.
                Ok(Some(_)) => {}
                Ok(None) => {
                    cancel.cancel();
                    break;
                }
                Err(err) => {
                    tracing::debug!(error = %err, "Remote read failed");
                    cancel.cancel();
                    break;
                }
            }
        }
    }
}

/// Consume local keystrokes byte-by-byte on a dedicated thread.
///
/// The thread may stay blocked in `read` until the next keystroke or
/// process exit; it checks the cancellation token between reads and its
/// channel send fails once the session loop is gone.
fn spawn_input_reader(
    mut input: Box<dyn Read + Send>,
    tx: mpsc::Sender<InputEvent>,
    cancel: CancellationToken,
) {
    std::thread::spawn(move || {
        let mut keys = KeyInterpreter::new();
        let mut byte = [0u8; 1];

        loop {
            if cancel.is_cancelled() {
                break;
            }
            match input.read(&mut byte) {
                Ok(0) => {
                    let _ = tx.blocking_send(InputEvent::Terminate);
                    break;
                }
                Ok(_) => {
                    let event = match keys.handle_byte(byte[0], Instant::now()) {
                        KeyAction::Forward => InputEvent::Forward(byte[0]),
                        KeyAction::ClearAndEcho => InputEvent::EchoInterrupt,
                        KeyAction::Terminate => InputEvent::Terminate,
                    };
                    let terminate = matches!(event, InputEvent::Terminate);
                    if tx.blocking_send(event).is_err() || terminate {
                        break;
                    }
                }
                Err(err) => {
                    tracing::debug!(error = %err, "Keystroke read failed");
                    let _ = tx.blocking_send(InputEvent::Terminate);
                    break;
                }
            }
        }
    });
}
