//! Gateway startup: wires storage, sinks, transport, and HTTP together.
//!
//! Startup order matters only for failure reporting: every fallible step runs
//! before anything starts serving, so a bad capability file or a busy port
//! stops the process before a client can connect.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use relay_core::CapabilityStore;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

use crate::application::dispatcher::EventDispatcher;
use crate::application::signaling::SignalingService;
use crate::domain::GatewayConfig;
use crate::infrastructure::http_server;
use crate::infrastructure::storage::load_capabilities;
use crate::infrastructure::udp_sink::UdpSink;
use crate::infrastructure::ws_transport::{run_channel_listener, WsRendezvousTransport};

/// A started gateway.
pub struct RunningGateway {
    /// Address the HTTP surface actually bound.
    pub http_addr: SocketAddr,
    /// Address the channel listener actually bound.
    pub channel_addr: SocketAddr,
    pub dispatcher: Arc<EventDispatcher>,
    http_task: JoinHandle<()>,
    channel_task: JoinHandle<anyhow::Result<()>>,
}

impl RunningGateway {
    /// Waits until both servers have stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if either server task panicked or the channel
    /// listener failed.
    pub async fn wait(self) -> anyhow::Result<()> {
        self.http_task.await.context("HTTP server task panicked")?;
        self.channel_task
            .await
            .context("channel listener task panicked")??;
        Ok(())
    }
}

/// Starts every gateway component and returns once all of them are bound.
///
/// Both servers stop when `running` is cleared.
///
/// # Errors
///
/// Returns an error if the capability file is unreadable or malformed, or if
/// any socket cannot be bound.
pub async fn start_gateway(
    config: GatewayConfig,
    running: Arc<AtomicBool>,
) -> anyhow::Result<RunningGateway> {
    // ── Capability store ──────────────────────────────────────────────────────
    let initial = load_capabilities(&config.caps_path).with_context(|| {
        format!(
            "cannot load capability defaults from {}",
            config.caps_path.display()
        )
    })?;
    info!(
        keyboard = initial.keyboard,
        mouse = initial.mouse,
        gamepad = initial.gamepad,
        "initial capabilities"
    );
    let store = Arc::new(CapabilityStore::new(initial));

    // ── Sinks and dispatcher ──────────────────────────────────────────────────
    let keymouse = UdpSink::bind("keymouse", config.keymouse_sink_addr)
        .await
        .context("cannot create keymouse sink")?;
    let gamepad = UdpSink::bind("gamepad", config.gamepad_sink_addr)
        .await
        .context("cannot create gamepad sink")?;
    let dispatcher = Arc::new(EventDispatcher::new(
        store,
        Arc::new(keymouse),
        Arc::new(gamepad),
    ));

    // ── Channel transport ─────────────────────────────────────────────────────
    let listener = TcpListener::bind(config.channel_bind_addr)
        .await
        .with_context(|| {
            format!(
                "failed to bind channel listener on {}",
                config.channel_bind_addr
            )
        })?;
    let channel_addr = listener
        .local_addr()
        .context("channel listener has no local address")?;
    let transport = Arc::new(WsRendezvousTransport::new(
        config.public_host.clone(),
        channel_addr.port(),
        config.handshake_timeout,
    ));

    // ── Signaling and HTTP ────────────────────────────────────────────────────
    let signaling = Arc::new(SignalingService::new(
        transport.clone(),
        Arc::clone(&dispatcher),
        config.handshake_timeout,
    ));
    let (http_addr, http_server) = http_server::bind(
        config.http_bind_addr,
        signaling,
        wait_for_shutdown(Arc::clone(&running)),
    )
    .with_context(|| format!("failed to bind HTTP server on {}", config.http_bind_addr))?;

    let http_task = tokio::spawn(http_server);
    let channel_task = tokio::spawn(run_channel_listener(listener, transport, running));

    info!("gateway ready: http={http_addr}, channel={channel_addr}");
    Ok(RunningGateway {
        http_addr,
        channel_addr,
        dispatcher,
        http_task,
        channel_task,
    })
}

/// Runs the gateway until `running` is cleared.
///
/// # Errors
///
/// See [`start_gateway`] and [`RunningGateway::wait`].
pub async fn run_gateway(config: GatewayConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    start_gateway(config, running).await?.wait().await
}

async fn wait_for_shutdown(running: Arc<AtomicBool>) {
    while running.load(Ordering::Relaxed) {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}
