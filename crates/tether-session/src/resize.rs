//! Local terminal resize watching
//!
//! Resize signals are platform-conditional: SIGWINCH exists on unix and
//! has no counterpart elsewhere, so the watcher is capability-gated behind
//! one interface with a no-op variant where unsupported. Resize events are
//! observed for local bookkeeping only and are not forwarded to the remote
//! side.

use tokio::sync::mpsc;

/// Receives `(cols, rows)` whenever the local terminal is resized.
pub struct ResizeWatcher {
    rx: mpsc::Receiver<(u16, u16)>,
}

impl ResizeWatcher {
    /// Spawn the platform listener and return the watcher.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel(4);
        imp::spawn(tx);
        Self { rx }
    }

    /// Next observed terminal size. Pends forever on platforms without
    /// resize signals.
    pub async fn next(&mut self) -> (u16, u16) {
        match self.rx.recv().await {
            Some(size) => size,
            None => std::future::pending().await,
        }
    }
}

#[cfg(unix)]
mod imp {
    use tokio::signal::unix::{signal, SignalKind};
    use tokio::sync::mpsc;

    pub fn spawn(tx: mpsc::Sender<(u16, u16)>) {
        tokio::spawn(async move {
            let mut winch = match signal(SignalKind::window_change()) {
                Ok(stream) => stream,
                Err(err) => {
                    tracing::warn!(error = %err, "Cannot listen for resize signals");
                    return;
                }
            };

            while winch.recv().await.is_some() {
                let size = crossterm::terminal::size().unwrap_or((80, 24));
                if tx.send(size).await.is_err() {
                    break;
                }
            }
        });
    }
}

#[cfg(not(unix))]
mod imp {
    use tokio::sync::mpsc;

    pub fn spawn(_tx: mpsc::Sender<(u16, u16)>) {
        // No resize signal on this platform; the watcher never fires.
    }
}
