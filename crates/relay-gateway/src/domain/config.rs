//! Gateway configuration types.
//!
//! [`GatewayConfig`] is the single source of truth for all runtime settings.
//! `main.rs` builds it from CLI arguments, environment variables, and the
//! optional TOML settings file; tests build it directly.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Default port of the HTTP signaling surface.
pub const DEFAULT_HTTP_PORT: u16 = 8080;
/// Default port of the WebSocket rendezvous listener.
pub const DEFAULT_CHANNEL_PORT: u16 = 8081;
/// Default keyboard/mouse injector port on loopback.
pub const DEFAULT_KEYMOUSE_PORT: u16 = 9999;
/// Default gamepad injector port on loopback.
pub const DEFAULT_GAMEPAD_PORT: u16 = 9998;
/// Default time a session may wait for its channel to open.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// All runtime configuration for the gateway.
///
/// # Example
///
/// ```rust
/// use relay_gateway::domain::GatewayConfig;
///
/// let cfg = GatewayConfig::default();
/// assert_eq!(cfg.http_bind_addr.port(), 8080);
/// assert_eq!(cfg.keymouse_sink_addr.port(), 9999);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// Address of the HTTP surface (`/signal/offer`, `/offer`, `/toggle`, `/caps`).
    pub http_bind_addr: SocketAddr,

    /// Address of the WebSocket rendezvous listener.
    pub channel_bind_addr: SocketAddr,

    /// Host name written into answer SDPs so clients know where to dial.
    ///
    /// Must be reachable from the client; `0.0.0.0` is never a valid value
    /// here even when the listener binds all interfaces.
    pub public_host: String,

    /// Destination of keyboard and mouse events.
    pub keymouse_sink_addr: SocketAddr,

    /// Destination of gamepad events.
    pub gamepad_sink_addr: SocketAddr,

    /// How long a session waits for its channel to open before closing.
    pub handshake_timeout: Duration,

    /// Capability defaults document read once at startup.
    pub caps_path: PathBuf,
}

impl Default for GatewayConfig {
    /// | Field              | Default            |
    /// |--------------------|--------------------|
    /// | http_bind_addr     | `0.0.0.0:8080`     |
    /// | channel_bind_addr  | `0.0.0.0:8081`     |
    /// | public_host        | `127.0.0.1`        |
    /// | keymouse_sink_addr | `127.0.0.1:9999`   |
    /// | gamepad_sink_addr  | `127.0.0.1:9998`   |
    /// | handshake_timeout  | 30 seconds         |
    /// | caps_path          | `caps.json`        |
    fn default() -> Self {
        Self {
            http_bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_HTTP_PORT)),
            channel_bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_CHANNEL_PORT)),
            public_host: Ipv4Addr::LOCALHOST.to_string(),
            keymouse_sink_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_KEYMOUSE_PORT)),
            gamepad_sink_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_GAMEPAD_PORT)),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            caps_path: PathBuf::from("caps.json"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
