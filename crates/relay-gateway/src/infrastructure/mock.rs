//! In-memory sinks, channels, and transport for tests.
//!
//! These stand in for UDP sockets and real peer connections so the dispatcher,
//! the signaling service, and the HTTP routes can be exercised without
//! touching the network.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::application::dispatcher::{ForwardSink, SinkError};
use crate::application::transport::{
    ChannelId, ChannelMessage, DataChannel, OpenedChannel, PeerTransport, PendingPeer,
    TransportError, WireFormat,
};
use crate::domain::SessionDescription;

// ── Sink ──────────────────────────────────────────────────────────────────────

/// A [`ForwardSink`] that records every payload it is given.
pub struct RecordingSink {
    name: String,
    payloads: Mutex<Vec<Vec<u8>>>,
    attempts: AtomicUsize,
    should_fail: bool,
}

impl RecordingSink {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            payloads: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            should_fail: false,
        }
    }

    /// A sink whose every send fails.
    pub fn failing(name: &str) -> Self {
        Self {
            should_fail: true,
            ..Self::new(name)
        }
    }

    /// Payloads successfully "sent", in order.
    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.payloads.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Number of `forward` calls, including failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ForwardSink for RecordingSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn forward(&self, payload: &[u8]) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(SinkError::Send {
                target: self.name.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "injected failure"),
            });
        }
        self.payloads
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(payload.to_vec());
        Ok(())
    }
}

// ── Channel ───────────────────────────────────────────────────────────────────

/// A [`DataChannel`] that records outbound messages.
pub struct MockChannel {
    id: ChannelId,
    format: WireFormat,
    open: AtomicBool,
    should_fail: bool,
    sent: Mutex<Vec<ChannelMessage>>,
}

impl MockChannel {
    /// An open channel speaking `format`.
    pub fn open(format: WireFormat) -> Arc<Self> {
        Arc::new(Self {
            id: ChannelId::new(),
            format,
            open: AtomicBool::new(true),
            should_fail: false,
            sent: Mutex::new(Vec::new()),
        })
    }

    /// An open channel whose sends always fail.
    pub fn failing(format: WireFormat) -> Arc<Self> {
        Arc::new(Self {
            id: ChannelId::new(),
            format,
            open: AtomicBool::new(true),
            should_fail: true,
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Marks the channel closed.
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    /// Messages sent so far, in order.
    pub fn sent(&self) -> Vec<ChannelMessage> {
        self.sent.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl DataChannel for MockChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn wire_format(&self) -> WireFormat {
        self.format
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn send(&self, message: ChannelMessage) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::ChannelClosed);
        }
        if self.should_fail {
            return Err(TransportError::Setup("injected failure".into()));
        }
        self.sent
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(message);
        Ok(())
    }
}

// ── Transport ─────────────────────────────────────────────────────────────────

/// A [`PeerTransport`] that answers every offer and lets the caller open the
/// resulting channels by hand.
///
/// Offers whose SDP does not start with `v=0` are rejected, mirroring the
/// WebSocket rendezvous transport.
#[derive(Default)]
pub struct MemoryTransport {
    offers: Mutex<Vec<SessionDescription>>,
    pending: Mutex<Vec<oneshot::Sender<OpenedChannel>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers received so far.
    pub fn offers(&self) -> Vec<SessionDescription> {
        self.offers.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Opens the oldest unopened peer with a fresh [`MockChannel`].
    ///
    /// Returns the channel and the sender that feeds its inbound stream, or
    /// `None` if no peer is waiting.  Dropping the sender closes the channel.
    pub fn open_next(
        &self,
        format: WireFormat,
    ) -> Option<(Arc<MockChannel>, mpsc::Sender<ChannelMessage>)> {
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        while !pending.is_empty() {
            let opener = pending.remove(0);
            let channel = MockChannel::open(format);
            let (tx, rx) = mpsc::channel(64);
            let opened = OpenedChannel {
                channel: channel.clone(),
                inbound: rx,
            };
            if opener.send(opened).is_ok() {
                return Some((channel, tx));
            }
        }
        None
    }
}

#[async_trait]
impl PeerTransport for MemoryTransport {
    async fn accept_offer(&self, offer: SessionDescription) -> Result<PendingPeer, TransportError> {
        if !offer.sdp.trim_start().starts_with("v=0") {
            return Err(TransportError::InvalidOffer(
                "session description must start with v=0".into(),
            ));
        }
        self.offers
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(offer);

        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(tx);
        Ok(PendingPeer {
            answer: SessionDescription::answer("v=0\r\na=x-relay-channel:memory\r\n"),
            opened: rx,
        })
    }
}
