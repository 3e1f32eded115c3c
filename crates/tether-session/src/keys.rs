//! Local keystroke interpretation
//!
//! The remote side owns echo and line editing, so almost every byte is
//! forwarded verbatim. Only two sequences are intercepted locally:
//!
//! - Ctrl+C pressed twice within one second terminates the session. A
//!   single press clears the pending-input mirror and echoes `^C`
//!   locally; nothing is forwarded.
//! - Ctrl+D on an empty pending-input mirror terminates the session.
//!
//! The interpreter is a pure state machine fed `(byte, now)` pairs, which
//! keeps the timing window testable with synthetic clocks.

use std::time::{Duration, Instant};

const CTRL_C: u8 = 0x03;
const CTRL_D: u8 = 0x04;
const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7f;

/// Window in which a second Ctrl+C terminates the session.
const INTERRUPT_WINDOW: Duration = Duration::from_secs(1);

/// Ceiling on the pending-input mirror. The mirror only tracks how many
/// bytes the remote side is still buffering on the current line, so it
/// saturates rather than growing without bound.
const MAX_PENDING_INPUT: usize = 4096;

/// What to do with one local keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Forward the byte to the remote side unchanged
    Forward,
    /// Clear pending input and echo `^C` locally; forward nothing
    ClearAndEcho,
    /// End the session
    Terminate,
}

/// Tracks the pending-input mirror and the Ctrl+C double-press window
#[derive(Debug, Default)]
pub struct KeyInterpreter {
    pending: usize,
    last_interrupt: Option<Instant>,
}

impl KeyInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes the remote side is still buffering on the current line
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Interpret one keystroke observed at `now`.
    pub fn handle_byte(&mut self, byte: u8, now: Instant) -> KeyAction {
        match byte {
            CTRL_C => {
                if let Some(previous) = self.last_interrupt {
                    if now.duration_since(previous) <= INTERRUPT_WINDOW {
                        return KeyAction::Terminate;
                    }
                }
                self.last_interrupt = Some(now);
                self.pending = 0;
                KeyAction::ClearAndEcho
            }
            CTRL_D => {
                if self.pending == 0 {
                    return KeyAction::Terminate;
                }
                // Mid-line Ctrl+D flushes the remote input buffer.
                self.last_interrupt = None;
                self.pending = 0;
                KeyAction::Forward
            }
            b'\r' | b'\n' => {
                self.last_interrupt = None;
                self.pending = 0;
                KeyAction::Forward
            }
            BACKSPACE | DELETE => {
                self.last_interrupt = None;
                self.pending = self.pending.saturating_sub(1);
                KeyAction::Forward
            }
            _ => {
                self.last_interrupt = None;
                self.pending = (self.pending + 1).min(MAX_PENDING_INPUT);
                KeyAction::Forward
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_interrupt_within_window_terminates() {
        let mut keys = KeyInterpreter::new();
        let start = Instant::now();

        assert_eq!(keys.handle_byte(CTRL_C, start), KeyAction::ClearAndEcho);
        let second = start + Duration::from_millis(900);
        assert_eq!(keys.handle_byte(CTRL_C, second), KeyAction::Terminate);
    }

    #[test]
    fn test_slow_double_interrupt_clears_and_echoes() {
        let mut keys = KeyInterpreter::new();
        let start = Instant::now();

        keys.handle_byte(b'l', start);
        keys.handle_byte(b's', start);
        assert_eq!(keys.pending(), 2);

        assert_eq!(keys.handle_byte(CTRL_C, start), KeyAction::ClearAndEcho);
        assert_eq!(keys.pending(), 0);

        let second = start + Duration::from_secs(2);
        assert_eq!(keys.handle_byte(CTRL_C, second), KeyAction::ClearAndEcho);
    }

    #[test]
    fn test_interleaved_keystroke_resets_interrupt_window() {
        let mut keys = KeyInterpreter::new();
        let start = Instant::now();

        keys.handle_byte(CTRL_C, start);
        keys.handle_byte(b'x', start);
        let second = start + Duration::from_millis(100);
        assert_eq!(keys.handle_byte(CTRL_C, second), KeyAction::ClearAndEcho);
    }

    #[test]
    fn test_eof_on_empty_buffer_terminates() {
        let mut keys = KeyInterpreter::new();
        assert_eq!(
            keys.handle_byte(CTRL_D, Instant::now()),
            KeyAction::Terminate
        );
    }

    #[test]
    fn test_eof_mid_line_is_forwarded() {
        let mut keys = KeyInterpreter::new();
        let now = Instant::now();

        keys.handle_byte(b'c', now);
        keys.handle_byte(b'a', now);
        keys.handle_byte(b't', now);
        assert_eq!(keys.handle_byte(CTRL_D, now), KeyAction::Forward);
        // Then an immediate second Ctrl+D sees the flushed buffer.
        assert_eq!(keys.handle_byte(CTRL_D, now), KeyAction::Terminate);
    }

    #[test]
    fn test_carriage_return_clears_pending() {
        let mut keys = KeyInterpreter::new();
        let now = Instant::now();

        keys.handle_byte(b'l', now);
        keys.handle_byte(b's', now);
        keys.handle_byte(b'\r', now);
        assert_eq!(keys.pending(), 0);
        assert_eq!(keys.handle_byte(CTRL_D, now), KeyAction::Terminate);
    }

    #[test]
    fn test_backspace_shrinks_pending() {
        let mut keys = KeyInterpreter::new();
        let now = Instant::now();

        keys.handle_byte(b'a', now);
        keys.handle_byte(DELETE, now);
        assert_eq!(keys.pending(), 0);
        // Underflow saturates instead of wrapping.
        keys.handle_byte(DELETE, now);
        assert_eq!(keys.pending(), 0);
    }
}
