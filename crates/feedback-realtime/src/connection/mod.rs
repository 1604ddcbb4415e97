//! WebSocket connection lifecycle: the handle and its read/write pumps.

pub mod handle;
pub mod pump;

pub use handle::{Connection, ConnectionId, OutboundFrame, SendOutcome};
pub use pump::{PumpSettings, serve_socket};
