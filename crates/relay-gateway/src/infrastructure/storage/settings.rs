//! Optional TOML settings file for the gateway.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! [`GatewayConfig::default`].  Example:
//!
//! ```toml
//! [http]
//! bind_address = "0.0.0.0"
//! port = 8080
//!
//! [channel]
//! port = 8081
//! public_host = "192.168.1.20"
//! handshake_timeout_secs = 30
//!
//! [sinks]
//! keymouse = "127.0.0.1:9999"
//! gamepad = "127.0.0.1:9998"
//!
//! [capabilities]
//! path = "caps.json"
//! ```
//!
//! Command-line flags and `RELAY_*` environment variables override whatever
//! this file says; see `main.rs`.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::config::{
    GatewayConfig, DEFAULT_CHANNEL_PORT, DEFAULT_GAMEPAD_PORT, DEFAULT_HANDSHAKE_TIMEOUT,
    DEFAULT_HTTP_PORT, DEFAULT_KEYMOUSE_PORT,
};

/// Error type for the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A file system I/O error other than "not found".
    #[error("I/O error reading settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// An address field is not a valid IP or socket address.
    #[error("invalid address for {field}: {value:?}")]
    InvalidAddress { field: &'static str, value: String },
}

// ── Settings schema ───────────────────────────────────────────────────────────

/// Top-level settings document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RelaySettings {
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub channel: ChannelSettings,
    #[serde(default)]
    pub sinks: SinkSettings,
    #[serde(default)]
    pub capabilities: CapabilitySettings,
}

/// HTTP signaling surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
}

/// WebSocket rendezvous listener.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_channel_port")]
    pub port: u16,
    /// Host written into answers.  Clients dial `ws://<public_host>:<port>/`.
    #[serde(default = "default_public_host")]
    pub public_host: String,
    #[serde(default = "default_handshake_timeout_secs")]
    pub handshake_timeout_secs: u64,
}

/// Injector destinations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SinkSettings {
    #[serde(default = "default_keymouse_sink")]
    pub keymouse: String,
    #[serde(default = "default_gamepad_sink")]
    pub gamepad: String,
}

/// Capability defaults document location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilitySettings {
    #[serde(default = "default_caps_path")]
    pub path: PathBuf,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    DEFAULT_HTTP_PORT
}
fn default_channel_port() -> u16 {
    DEFAULT_CHANNEL_PORT
}
fn default_public_host() -> String {
    "127.0.0.1".to_string()
}
fn default_handshake_timeout_secs() -> u64 {
    DEFAULT_HANDSHAKE_TIMEOUT.as_secs()
}
fn default_keymouse_sink() -> String {
    format!("127.0.0.1:{DEFAULT_KEYMOUSE_PORT}")
}
fn default_gamepad_sink() -> String {
    format!("127.0.0.1:{DEFAULT_GAMEPAD_PORT}")
}
fn default_caps_path() -> PathBuf {
    PathBuf::from("caps.json")
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_http_port(),
        }
    }
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_channel_port(),
            public_host: default_public_host(),
            handshake_timeout_secs: default_handshake_timeout_secs(),
        }
    }
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            keymouse: default_keymouse_sink(),
            gamepad: default_gamepad_sink(),
        }
    }
}

impl Default for CapabilitySettings {
    fn default() -> Self {
        Self {
            path: default_caps_path(),
        }
    }
}

// ── Conversion ────────────────────────────────────────────────────────────────

impl RelaySettings {
    /// Resolves the textual settings into a [`GatewayConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidAddress`] if a bind address or sink
    /// address does not parse.
    pub fn into_gateway_config(self) -> Result<GatewayConfig, SettingsError> {
        let http_ip = parse_ip("http.bind_address", &self.http.bind_address)?;
        let channel_ip = parse_ip("channel.bind_address", &self.channel.bind_address)?;
        Ok(GatewayConfig {
            http_bind_addr: SocketAddr::new(http_ip, self.http.port),
            channel_bind_addr: SocketAddr::new(channel_ip, self.channel.port),
            public_host: self.channel.public_host,
            keymouse_sink_addr: parse_socket("sinks.keymouse", &self.sinks.keymouse)?,
            gamepad_sink_addr: parse_socket("sinks.gamepad", &self.sinks.gamepad)?,
            handshake_timeout: Duration::from_secs(self.channel.handshake_timeout_secs),
            caps_path: self.capabilities.path,
        })
    }
}

fn parse_ip(field: &'static str, value: &str) -> Result<IpAddr, SettingsError> {
    value.parse().map_err(|_| SettingsError::InvalidAddress {
        field,
        value: value.to_string(),
    })
}

fn parse_socket(field: &'static str, value: &str) -> Result<SocketAddr, SettingsError> {
    value.parse().map_err(|_| SettingsError::InvalidAddress {
        field,
        value: value.to_string(),
    })
}

/// Loads settings from `path`, returning defaults if the file does not exist.
///
/// # Errors
///
/// Returns [`SettingsError::Io`] for file-system errors other than "not
/// found", and [`SettingsError::Parse`] if the TOML is malformed.
pub fn load_settings(path: &Path) -> Result<RelaySettings, SettingsError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RelaySettings::default()),
        Err(source) => Err(SettingsError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
