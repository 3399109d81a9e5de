//! Seams between the relay core and the real-time transport.
//!
//! The gateway never touches ICE, DTLS, or SCTP directly.  It consumes two
//! traits:
//!
//! - [`PeerTransport`]: accept an offer, produce an answer, and later report
//!   the opened channel.
//! - [`DataChannel`]: a reliable, ordered, message-oriented channel that can
//!   tell whether it is open and send a message.
//!
//! Inbound messages arrive on an `mpsc` receiver in delivery order; the
//! receiver ending means the channel closed.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::domain::SessionDescription;

/// Errors raised by transport implementations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The offer could not be parsed or is not acceptable.
    #[error("invalid offer: {0}")]
    InvalidOffer(String),

    /// The transport could not set up the peer connection.
    #[error("transport setup failed: {0}")]
    Setup(String),

    /// The channel is not open (never opened, or closed since).
    #[error("channel closed")]
    ChannelClosed,

    /// The channel's send queue is full; the message was not queued.
    #[error("channel send queue full")]
    QueueFull,

    /// An I/O error on the underlying socket.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Unique identifier of an opened channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub Uuid);

impl ChannelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One message on a data channel.
///
/// The variant, not the content, decides how the relay decodes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelMessage {
    /// A binary event frame.
    Binary(Vec<u8>),
    /// A JSON text event.
    Text(String),
}

/// The encoding a channel's client speaks.
///
/// Decides the shape of outbound control messages: binary channels get a
/// `0x20` frame, text channels get the bare JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    Binary,
    Text,
}

/// An open (or once-open) data channel.
#[async_trait]
pub trait DataChannel: Send + Sync {
    fn id(&self) -> ChannelId;

    fn wire_format(&self) -> WireFormat;

    /// `true` while the channel can carry messages.
    fn is_open(&self) -> bool;

    /// Sends one message without waiting on the remote reader.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ChannelClosed`] if the channel is not open,
    /// or [`TransportError::QueueFull`] if the message had to be skipped.
    async fn send(&self, message: ChannelMessage) -> Result<(), TransportError>;
}

/// A channel that has just opened, plus its inbound message stream.
pub struct OpenedChannel {
    pub channel: std::sync::Arc<dyn DataChannel>,
    pub inbound: mpsc::Receiver<ChannelMessage>,
}

impl fmt::Debug for OpenedChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenedChannel")
            .field("channel", &self.channel.id())
            .finish_non_exhaustive()
    }
}

/// The result of accepting an offer: the answer to return to the client and
/// a one-shot notification fired when the channel opens.
///
/// If the transport gives up on the peer it drops the sender, which the
/// session observes as a failed handshake.
#[derive(Debug)]
pub struct PendingPeer {
    pub answer: SessionDescription,
    pub opened: oneshot::Receiver<OpenedChannel>,
}

/// Accepts connection offers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Creates a peer for `offer` and returns its answer.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the offer is unusable or setup fails.
    async fn accept_offer(&self, offer: SessionDescription) -> Result<PendingPeer, TransportError>;
}
