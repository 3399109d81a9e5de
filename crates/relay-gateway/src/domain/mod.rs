//! Domain layer for relay-gateway.
//!
//! Pure types with no dependencies on sockets, HTTP, or the async runtime.
//!
//! # What belongs in the domain layer?
//!
//! - Configuration structures
//! - Session identity and the session state machine
//! - Session descriptions exchanged during signaling
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `UdpSocket`, `warp`, or WebSocket types
//! - File I/O or environment variable reading

pub mod config;
pub mod sdp;
pub mod session;

pub use config::GatewayConfig;
pub use sdp::{SdpType, SessionDescription};
pub use session::{CloseReason, Session, SessionError, SessionId, SessionState};
