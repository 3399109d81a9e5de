//! WebSocket rendezvous transport.
//!
//! A [`PeerTransport`] that needs nothing but a TCP port.  It lets the relay
//! run end to end without a WebRTC stack:
//!
//! 1. The client posts an SDP offer.  Only the `v=0` prefix is checked.
//! 2. The answer carries a one-time channel URL:
//!    `a=x-relay-channel:ws://<public_host>:<port>/<token>`
//! 3. The client opens a WebSocket to that URL.  The upgrade claims the token
//!    and the channel is reported open to the waiting session.
//!
//! Binary WebSocket messages are binary frames and text messages are JSON
//! events.  Appending `?format=json` to the URL marks the client as a text
//! client, so capability announcements arrive as bare JSON instead of `0x20`
//! frames.
//!
//! Tokens are single use.  A token nobody claims is dropped once the session
//! waiting on it gives up (handshake timeout) or after the timeout elapses,
//! whichever is first; a late upgrade gets `404`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::{
        handshake::server::{ErrorResponse, Request, Response},
        http::StatusCode,
        Error as WsError, Message as WsMessage,
    },
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::transport::{
    ChannelId, ChannelMessage, DataChannel, OpenedChannel, PeerTransport, PendingPeer,
    TransportError, WireFormat,
};
use crate::domain::SessionDescription;

/// SDP attribute that carries the channel URL.
pub const CHANNEL_ATTRIBUTE: &str = "a=x-relay-channel:";

const OUTBOUND_QUEUE: usize = 64;
const INBOUND_QUEUE: usize = 256;

struct PendingToken {
    opener: oneshot::Sender<OpenedChannel>,
    issued_at: Instant,
}

// ── Transport ─────────────────────────────────────────────────────────────────

/// Hands out channel URLs and matches incoming WebSocket upgrades to them.
pub struct WsRendezvousTransport {
    public_host: String,
    port: u16,
    handshake_timeout: Duration,
    pending: Mutex<HashMap<String, PendingToken>>,
}

impl WsRendezvousTransport {
    /// Creates a transport that advertises `ws://<public_host>:<port>/`.
    ///
    /// `port` must be the port the listener actually bound.
    pub fn new(public_host: impl Into<String>, port: u16, handshake_timeout: Duration) -> Self {
        Self {
            public_host: public_host.into(),
            port,
            handshake_timeout,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// The channel URL for `token`.
    pub fn channel_url(&self, token: &str) -> String {
        format!("ws://{}:{}/{}", self.public_host, self.port, token)
    }

    /// Number of issued tokens not yet claimed or expired.
    pub fn pending_count(&self) -> usize {
        let mut pending = self.lock();
        Self::prune(&mut pending, self.handshake_timeout);
        pending.len()
    }

    /// Removes and returns the opener for `token`, if it is still live.
    fn claim(&self, token: &str) -> Option<oneshot::Sender<OpenedChannel>> {
        let mut pending = self.lock();
        Self::prune(&mut pending, self.handshake_timeout);
        pending.remove(token).map(|p| p.opener)
    }

    fn prune(pending: &mut HashMap<String, PendingToken>, ttl: Duration) {
        pending.retain(|_, p| !p.opener.is_closed() && p.issued_at.elapsed() < ttl);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, PendingToken>> {
        self.pending.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn answer_sdp(&self, token: &str) -> String {
        let session_id = Uuid::new_v4().as_u64_pair().0 >> 1;
        [
            "v=0".to_string(),
            format!("o=- {session_id} 2 IN IP4 {}", self.public_host),
            "s=-".to_string(),
            "t=0 0".to_string(),
            format!("{CHANNEL_ATTRIBUTE}{}", self.channel_url(token)),
            String::new(),
        ]
        .join("\r\n")
    }
}

#[async_trait]
impl PeerTransport for WsRendezvousTransport {
    async fn accept_offer(&self, offer: SessionDescription) -> Result<PendingPeer, TransportError> {
        if !offer.sdp.trim_start().starts_with("v=0") {
            return Err(TransportError::InvalidOffer(
                "session description must start with v=0".into(),
            ));
        }

        let token = Uuid::new_v4().simple().to_string();
        let (opener, opened) = oneshot::channel();
        {
            let mut pending = self.lock();
            Self::prune(&mut pending, self.handshake_timeout);
            pending.insert(
                token.clone(),
                PendingToken {
                    opener,
                    issued_at: Instant::now(),
                },
            );
        }
        debug!("issued channel token {token}");

        Ok(PendingPeer {
            answer: SessionDescription::answer(self.answer_sdp(&token)),
            opened,
        })
    }
}

/// Extracts the channel URL from an answer produced by this transport.
pub fn parse_channel_url(answer_sdp: &str) -> Option<&str> {
    answer_sdp
        .lines()
        .find_map(|line| line.trim_end().strip_prefix(CHANNEL_ATTRIBUTE))
}

// ── Channel ───────────────────────────────────────────────────────────────────

/// A [`DataChannel`] backed by one WebSocket connection.
struct WsDataChannel {
    id: ChannelId,
    format: WireFormat,
    open: AtomicBool,
    outbound: mpsc::Sender<WsMessage>,
}

#[async_trait]
impl DataChannel for WsDataChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn wire_format(&self) -> WireFormat {
        self.format
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    async fn send(&self, message: ChannelMessage) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::ChannelClosed);
        }
        let frame = match message {
            ChannelMessage::Binary(bytes) => WsMessage::Binary(bytes),
            ChannelMessage::Text(text) => WsMessage::Text(text),
        };
        // Never waits on a slow reader: a full queue skips this message.
        self.outbound.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => TransportError::ChannelClosed,
        })
    }
}

// ── Listener ──────────────────────────────────────────────────────────────────

/// Accepts WebSocket upgrades until `running` is cleared.
///
/// # Errors
///
/// Currently never fails after binding; accept errors are logged and the loop
/// continues.
pub async fn run_channel_listener(
    listener: TcpListener,
    transport: Arc<WsRendezvousTransport>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("channel listener accepting WebSocket upgrades on {addr}");
    }

    while running.load(Ordering::Relaxed) {
        match timeout(Duration::from_millis(200), listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                let transport = Arc::clone(&transport);
                tokio::spawn(async move {
                    handle_connection(stream, peer_addr, transport).await;
                });
            }
            Ok(Err(e)) => error!("channel accept error: {e}"),
            Err(_) => {}
        }
    }

    info!("channel listener stopped");
    Ok(())
}

async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    transport: Arc<WsRendezvousTransport>,
) {
    match run_connection(stream, peer_addr, transport).await {
        Ok(()) => debug!("channel connection {peer_addr} closed"),
        Err(e) => warn!("channel connection {peer_addr} ended: {e:#}"),
    }
}

async fn run_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    transport: Arc<WsRendezvousTransport>,
) -> anyhow::Result<()> {
    // ── Step 1: Upgrade, claiming the token from the request path ─────────────
    let mut claimed: Option<(oneshot::Sender<OpenedChannel>, WireFormat)> = None;
    let ws_stream = accept_hdr_async(stream, |req: &Request, resp: Response| {
        let token = req.uri().path().trim_start_matches('/');
        match transport.claim(token) {
            Some(opener) => {
                claimed = Some((opener, wire_format_from_query(req.uri().query())));
                Ok(resp)
            }
            None => {
                let mut err = ErrorResponse::new(Some("unknown or expired channel token".into()));
                *err.status_mut() = StatusCode::NOT_FOUND;
                Err(err)
            }
        }
    })
    .await
    .with_context(|| format!("WebSocket upgrade from {peer_addr} refused"))?;

    let Some((opener, format)) = claimed else {
        bail!("upgrade from {peer_addr} completed without a claimed token");
    };

    // ── Step 2: Hand the channel to the waiting session ───────────────────────
    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    let (out_tx, mut out_rx) = mpsc::channel::<WsMessage>(OUTBOUND_QUEUE);
    let (in_tx, in_rx) = mpsc::channel::<ChannelMessage>(INBOUND_QUEUE);
    let channel = Arc::new(WsDataChannel {
        id: ChannelId::new(),
        format,
        open: AtomicBool::new(true),
        outbound: out_tx,
    });
    let channel_id = channel.id;

    if opener
        .send(OpenedChannel {
            channel: channel.clone(),
            inbound: in_rx,
        })
        .is_err()
    {
        let _ = ws_tx.send(WsMessage::Close(None)).await;
        bail!("session for {peer_addr} gave up before the channel opened");
    }
    info!("channel {channel_id} open from {peer_addr} ({format:?})");

    // ── Step 3: Writer task drains the outbound queue ─────────────────────────
    let writer = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            if ws_tx.send(msg).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    // ── Step 4: Reader feeds the session in arrival order ─────────────────────
    while let Some(frame) = ws_rx.next().await {
        let message = match frame {
            Ok(WsMessage::Binary(bytes)) => ChannelMessage::Binary(bytes),
            Ok(WsMessage::Text(text)) => ChannelMessage::Text(text),
            Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_)) => continue,
            Ok(WsMessage::Close(_)) => {
                debug!("channel {channel_id}: close frame received");
                break;
            }
            Err(WsError::ConnectionClosed | WsError::Protocol(_)) => break,
            Err(e) => {
                debug!("channel {channel_id}: read error: {e}");
                break;
            }
        };
        if in_tx.send(message).await.is_err() {
            break;
        }
    }

    channel.open.store(false, Ordering::Release);
    drop(in_tx);
    writer.abort();
    Ok(())
}

fn wire_format_from_query(query: Option<&str>) -> WireFormat {
    let is_text = query
        .unwrap_or_default()
        .split('&')
        .any(|pair| matches!(pair, "format=json" | "format=text"));
    if is_text {
        WireFormat::Text
    } else {
        WireFormat::Binary
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
