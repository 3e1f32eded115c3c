//! Scripted session stream for controller tests

// Not every test binary uses every helper here.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use tether_protocol::Message;
use tether_session::{SessionError, SessionStream, SharedOutput};

type ScriptEntry = Result<Option<Message>, SessionError>;

/// SessionStream fed from a fixed script of read results.
///
/// When the script runs dry the stream either reports a graceful EOF or
/// pends forever, depending on `eof_when_empty`; input-driven terminal
/// tests use the pending variant so the session ends through keystrokes.
pub struct FakeStream {
    script: Mutex<VecDeque<ScriptEntry>>,
    eof_when_empty: bool,
    pub sent: Mutex<Vec<Message>>,
    pub close_calls: AtomicUsize,
    done: CancellationToken,
    error: Mutex<Option<SessionError>>,
}

impl FakeStream {
    pub fn scripted(script: Vec<ScriptEntry>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            eof_when_empty: true,
            sent: Mutex::new(Vec::new()),
            close_calls: AtomicUsize::new(0),
            done: CancellationToken::new(),
            error: Mutex::new(None),
        })
    }

    pub fn pending_after(script: Vec<ScriptEntry>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            eof_when_empty: false,
            sent: Mutex::new(Vec::new()),
            close_calls: AtomicUsize::new(0),
            done: CancellationToken::new(),
            error: Mutex::new(None),
        })
    }

    pub fn sent_messages(&self) -> Vec<Message> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionStream for FakeStream {
    async fn send_message(&self, message: Message) -> Result<(), SessionError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn read_message(&self) -> Result<Option<Message>, SessionError> {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(message)) => Ok(message),
            Some(Err(err)) => {
                let mut slot = self.error.lock().unwrap();
                if slot.is_none() {
                    *slot = Some(err.clone());
                }
                Err(err)
            }
            None if self.eof_when_empty => Ok(None),
            None => std::future::pending().await,
        }
    }

    async fn close(&self) {
        if self.close_calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.done.cancel();
        }
    }

    fn done(&self) -> CancellationToken {
        self.done.clone()
    }

    fn error(&self) -> Option<SessionError> {
        self.error.lock().unwrap().clone()
    }
}

/// Writer handle that lets a test read back what a controller wrote.
#[derive(Clone, Default)]
pub struct CaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CaptureWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.buffer.lock().unwrap().clone()
    }

    pub fn as_string(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    pub fn into_shared_output(self) -> SharedOutput {
        Arc::new(Mutex::new(Box::new(self) as Box<dyn Write + Send>))
    }
}

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Reader that yields a fixed byte sequence, then blocks forever the way
/// an idle stdin does.
pub struct ScriptedInput {
    bytes: VecDeque<u8>,
    park: Option<std::sync::mpsc::Receiver<()>>,
    _park_tx: std::sync::mpsc::Sender<()>,
}

impl ScriptedInput {
    pub fn new(bytes: &[u8]) -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        Self {
            bytes: bytes.to_vec().into(),
            park: Some(rx),
            _park_tx: tx,
        }
    }
}

impl Read for ScriptedInput {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if let Some(byte) = self.bytes.pop_front() {
            buf[0] = byte;
            return Ok(1);
        }
        // Blocks until the process exits; the sender half lives in self.
        if let Some(park) = self.park.take() {
            let _ = park.recv();
        }
        Ok(0)
    }
}
