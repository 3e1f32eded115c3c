//! tether-session: Remote session handling for tether
//!
//! This crate owns the client side of an interactive exec or log session:
//! the WebSocket transport with its sticky failure state, the raw-terminal
//! controller, the one-directional log-stream controller, and the
//! classifier that turns transport failures into operator-facing messages.

pub mod classify;
pub mod error;
pub mod keys;
pub mod logs;
pub mod registry;
pub mod resize;
pub mod stream;
pub mod terminal;
pub mod transport;

pub use classify::classify;
pub use error::SessionError;
pub use logs::LogStreamController;
pub use registry::{RegistryEntry, SessionRegistry};
pub use stream::SessionStream;
pub use terminal::{SharedOutput, TerminalController};
pub use transport::{WsTransport, HANDSHAKE_TIMEOUT};
