//! Input relay gateway, entry point.
//!
//! Accepts connection offers over HTTP, opens a data channel per client, and
//! forwards permitted keyboard, mouse, and gamepad events to the local
//! injector processes over UDP.
//!
//! # Usage
//!
//! ```text
//! relay-gateway [OPTIONS]
//!
//! Options:
//!   --config <PATH>             TOML settings file [default: relay.toml]
//!   --http-bind <IP>            HTTP bind address
//!   --http-port <PORT>          HTTP port
//!   --ws-bind <IP>              Channel listener bind address
//!   --ws-port <PORT>            Channel listener port
//!   --public-host <HOST>        Host advertised in answers
//!   --keymouse-sink <ADDR>      Keyboard/mouse injector address
//!   --gamepad-sink <ADDR>       Gamepad injector address
//!   --caps-file <PATH>          Capability defaults document
//!   --handshake-timeout <SECS>  Time allowed for a channel to open
//! ```
//!
//! # Precedence
//!
//! Each option can also come from a `RELAY_*` environment variable.  A value
//! given on the command line or in the environment wins over the settings
//! file, which wins over the built-in defaults.
//!
//! | Variable                  | Built-in default   |
//! |---------------------------|--------------------|
//! | `RELAY_CONFIG`            | `relay.toml`       |
//! | `RELAY_HTTP_BIND`         | `0.0.0.0`          |
//! | `RELAY_HTTP_PORT`         | `8080`             |
//! | `RELAY_WS_BIND`           | `0.0.0.0`          |
//! | `RELAY_WS_PORT`           | `8081`             |
//! | `RELAY_PUBLIC_HOST`       | `127.0.0.1`        |
//! | `RELAY_KEYMOUSE_SINK`     | `127.0.0.1:9999`   |
//! | `RELAY_GAMEPAD_SINK`      | `127.0.0.1:9998`   |
//! | `RELAY_CAPS_FILE`         | `caps.json`        |
//! | `RELAY_HANDSHAKE_TIMEOUT` | `30`               |

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use relay_gateway::domain::GatewayConfig;
use relay_gateway::infrastructure::run_gateway;
use relay_gateway::infrastructure::storage::{load_settings, RelaySettings};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Input relay gateway.
///
/// Every option is optional; unset options fall back to the settings file
/// and then to built-in defaults.
#[derive(Debug, Parser)]
#[command(
    name = "relay-gateway",
    about = "Signaling endpoint and capability-gated input relay",
    version
)]
struct Cli {
    /// TOML settings file.  A missing file is not an error.
    #[arg(long, default_value = "relay.toml", env = "RELAY_CONFIG")]
    config: PathBuf,

    /// IP address for the HTTP signaling surface.
    #[arg(long, env = "RELAY_HTTP_BIND")]
    http_bind: Option<String>,

    /// Port for the HTTP signaling surface.
    #[arg(long, env = "RELAY_HTTP_PORT")]
    http_port: Option<u16>,

    /// IP address for the WebSocket channel listener.
    #[arg(long, env = "RELAY_WS_BIND")]
    ws_bind: Option<String>,

    /// Port for the WebSocket channel listener.
    #[arg(long, env = "RELAY_WS_PORT")]
    ws_port: Option<u16>,

    /// Host name clients use to reach the channel listener.
    #[arg(long, env = "RELAY_PUBLIC_HOST")]
    public_host: Option<String>,

    /// Keyboard and mouse injector, as `ip:port`.
    #[arg(long, env = "RELAY_KEYMOUSE_SINK")]
    keymouse_sink: Option<String>,

    /// Gamepad injector, as `ip:port`.
    #[arg(long, env = "RELAY_GAMEPAD_SINK")]
    gamepad_sink: Option<String>,

    /// Capability defaults document (JSON).
    #[arg(long, env = "RELAY_CAPS_FILE")]
    caps_file: Option<PathBuf>,

    /// Seconds a session waits for its channel to open.
    #[arg(long, env = "RELAY_HANDSHAKE_TIMEOUT")]
    handshake_timeout: Option<u64>,
}

impl Cli {
    /// Overlays every option that was given onto `settings`.
    fn overlay(self, mut settings: RelaySettings) -> RelaySettings {
        if let Some(v) = self.http_bind {
            settings.http.bind_address = v;
        }
        if let Some(v) = self.http_port {
            settings.http.port = v;
        }
        if let Some(v) = self.ws_bind {
            settings.channel.bind_address = v;
        }
        if let Some(v) = self.ws_port {
            settings.channel.port = v;
        }
        if let Some(v) = self.public_host {
            settings.channel.public_host = v;
        }
        if let Some(v) = self.handshake_timeout {
            settings.channel.handshake_timeout_secs = v;
        }
        if let Some(v) = self.keymouse_sink {
            settings.sinks.keymouse = v;
        }
        if let Some(v) = self.gamepad_sink {
            settings.sinks.gamepad = v;
        }
        if let Some(v) = self.caps_file {
            settings.capabilities.path = v;
        }
        settings
    }

    /// Resolves the final [`GatewayConfig`] from `settings` and these options.
    ///
    /// # Errors
    ///
    /// Returns an error if any address does not parse.
    fn into_gateway_config(self, settings: RelaySettings) -> anyhow::Result<GatewayConfig> {
        self.overlay(settings)
            .into_gateway_config()
            .context("invalid gateway configuration")
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli.config)
        .with_context(|| format!("cannot load settings from {}", cli.config.display()))?;
    let config = cli.into_gateway_config(settings)?;

    info!(
        "input relay gateway starting: http={}, channel={}, keymouse={}, gamepad={}",
        config.http_bind_addr,
        config.channel_bind_addr,
        config.keymouse_sink_addr,
        config.gamepad_sink_addr
    );

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    run_gateway(config, running).await?;

    info!("input relay gateway stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
