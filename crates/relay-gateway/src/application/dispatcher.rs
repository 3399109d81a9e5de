//! EventDispatcher: the capability gate between channels and injectors.
//!
//! Every inbound channel message goes through [`EventDispatcher::handle`]:
//!
//! 1. The message kind picks the decoder (binary frame or JSON text).
//! 2. The decoded type maps to an [`InputClass`].
//! 3. The class flag is read from the [`CapabilityStore`].
//! 4. Enabled events are forwarded unchanged to the sink that owns the class.
//!
//! Nothing in this path returns an error.  Each call yields a [`Disposition`]
//! so callers and tests can see what happened; rejected messages are logged
//! at `debug` and otherwise vanish.
//!
//! In the other direction, [`EventDispatcher::announce`] and
//! [`EventDispatcher::broadcast`] push the capability set to clients.  Both
//! read the store and send under one announcement lock, so a channel never
//! receives an older set after a newer one.

use std::sync::Arc;

use async_trait::async_trait;
use relay_core::protocol::{
    control::{caps_json, encode_caps},
    frame::{FrameError, FrameHeader},
    json::{classify_text, to_ndjson, JsonEventError},
};
use relay_core::{CapabilitySet, CapabilityStore, CapabilityUpdate, InputClass};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::application::registry::ChannelRegistry;
use crate::application::transport::{ChannelId, ChannelMessage, DataChannel, WireFormat};

/// Errors from a forwarding sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The local socket could not be created.
    #[error("failed to bind sink socket for {target}: {source}")]
    Bind {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// The datagram could not be sent.
    #[error("send to {target} failed: {source}")]
    Send {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// Only part of the datagram was sent.
    #[error("short send to {target}: {sent} of {expected} bytes")]
    ShortSend {
        target: String,
        sent: usize,
        expected: usize,
    },
}

/// A best-effort, fire-and-forget destination for accepted events.
#[async_trait]
pub trait ForwardSink: Send + Sync {
    /// Short name for logs (`keymouse`, `gamepad`).
    fn name(&self) -> &str;

    /// Sends one payload.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the send fails.  The dispatcher swallows it.
    async fn forward(&self, payload: &[u8]) -> Result<(), SinkError>;
}

/// Why a message was not forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Too short, wrong version, or not valid JSON.
    Malformed,
    /// A binary frame with an unrecognized type code.
    UnknownType(u8),
    /// A JSON event with an unrecognized `t` value.
    UnknownFamily(String),
    /// A control frame arrived from the client.
    ControlFrame,
    /// The class is currently disabled.
    Disabled(InputClass),
    /// The sink rejected the send.
    SinkFailed(InputClass),
}

/// What [`EventDispatcher::handle`] did with one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Forwarded(InputClass),
    Dropped(DropReason),
}

/// Routes inbound events and pushes capability announcements.
pub struct EventDispatcher {
    store: Arc<CapabilityStore>,
    keymouse: Arc<dyn ForwardSink>,
    gamepad: Arc<dyn ForwardSink>,
    registry: ChannelRegistry,
    announce_lock: Mutex<()>,
}

impl EventDispatcher {
    /// Creates a dispatcher over a shared store and the two sinks.
    pub fn new(
        store: Arc<CapabilityStore>,
        keymouse: Arc<dyn ForwardSink>,
        gamepad: Arc<dyn ForwardSink>,
    ) -> Self {
        Self {
            store,
            keymouse,
            gamepad,
            registry: ChannelRegistry::new(),
            announce_lock: Mutex::new(()),
        }
    }

    /// The shared capability store.
    pub fn capabilities(&self) -> &CapabilityStore {
        &self.store
    }

    /// Channels currently registered for broadcasts.
    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    // ── Inbound ───────────────────────────────────────────────────────────────

    /// Validates one message and forwards it if its class is enabled.
    pub async fn handle(&self, message: &ChannelMessage) -> Disposition {
        match message {
            ChannelMessage::Binary(bytes) => self.handle_binary(bytes).await,
            ChannelMessage::Text(text) => self.handle_text(text).await,
        }
    }

    async fn handle_binary(&self, bytes: &[u8]) -> Disposition {
        let header = match FrameHeader::parse(bytes) {
            Ok(h) => h,
            Err(FrameError::UnknownFrameType(t)) => {
                debug!("dropping frame with unknown type 0x{t:02X}");
                return Disposition::Dropped(DropReason::UnknownType(t));
            }
            Err(e) => {
                debug!("dropping malformed frame ({} bytes): {e}", bytes.len());
                return Disposition::Dropped(DropReason::Malformed);
            }
        };

        let Some(class) = header.frame_type.input_class() else {
            debug!("dropping inbound control frame {:?}", header.frame_type);
            return Disposition::Dropped(DropReason::ControlFrame);
        };

        self.forward_if_enabled(class, bytes).await
    }

    async fn handle_text(&self, text: &str) -> Disposition {
        let kind = match classify_text(text) {
            Ok(k) => k,
            Err(JsonEventError::UnknownDiscriminant(t)) => {
                debug!("dropping JSON event with unknown family {t:?}");
                return Disposition::Dropped(DropReason::UnknownFamily(t));
            }
            Err(e) => {
                debug!("dropping malformed JSON event: {e}");
                return Disposition::Dropped(DropReason::Malformed);
            }
        };

        self.forward_if_enabled(kind.input_class(), &to_ndjson(text))
            .await
    }

    async fn forward_if_enabled(&self, class: InputClass, payload: &[u8]) -> Disposition {
        if !self.store.is_enabled(class) {
            debug!("dropping {class} event: class disabled");
            return Disposition::Dropped(DropReason::Disabled(class));
        }

        let sink = self.sink_for(class);
        match sink.forward(payload).await {
            Ok(()) => Disposition::Forwarded(class),
            Err(e) => {
                debug!("sink {} failed for {class} event: {e}", sink.name());
                Disposition::Dropped(DropReason::SinkFailed(class))
            }
        }
    }

    fn sink_for(&self, class: InputClass) -> &Arc<dyn ForwardSink> {
        match class {
            InputClass::Keyboard | InputClass::Mouse => &self.keymouse,
            InputClass::Gamepad => &self.gamepad,
        }
    }

    // ── Outbound ──────────────────────────────────────────────────────────────

    /// Registers a newly opened channel and sends it the current capabilities.
    pub async fn attach(&self, channel: Arc<dyn DataChannel>) {
        self.registry.register(Arc::clone(&channel));
        self.announce(channel.as_ref()).await;
    }

    /// Removes a closed channel from the broadcast list.
    pub fn detach(&self, id: ChannelId) {
        self.registry.remove(id);
    }

    /// Sends the current capability set to one channel.
    ///
    /// Returns `true` if the message was handed to the channel.  Channels that
    /// are not open are skipped; send failures are logged and swallowed.
    pub async fn announce(&self, channel: &dyn DataChannel) -> bool {
        let _guard = self.announce_lock.lock().await;
        let caps = self.store.get();
        self.send_caps(channel, &caps).await
    }

    /// Sends the current capability set to every open registered channel.
    ///
    /// Returns the number of channels the message was handed to.
    pub async fn broadcast(&self) -> usize {
        let _guard = self.announce_lock.lock().await;
        let caps = self.store.get();
        let pruned = self.registry.prune_closed();
        if pruned > 0 {
            debug!("pruned {pruned} closed channel(s) before broadcast");
        }

        let mut delivered = 0;
        for channel in self.registry.snapshot() {
            if self.send_caps(channel.as_ref(), &caps).await {
                delivered += 1;
            }
        }
        delivered
    }

    /// Applies an administrative toggle and re-broadcasts the result.
    ///
    /// The broadcast re-reads the store, so concurrent toggles all end with
    /// every channel holding the latest set.
    pub async fn apply_toggle(&self, update: &CapabilityUpdate) -> CapabilitySet {
        let caps = self.store.set(update);
        info!(
            keyboard = caps.keyboard,
            mouse = caps.mouse,
            gamepad = caps.gamepad,
            "capabilities updated"
        );
        let delivered = self.broadcast().await;
        debug!("capability announcement delivered to {delivered} channel(s)");
        caps
    }

    async fn send_caps(&self, channel: &dyn DataChannel, caps: &CapabilitySet) -> bool {
        if !channel.is_open() {
            return false;
        }

        let message = match channel.wire_format() {
            WireFormat::Binary => encode_caps(caps).map(ChannelMessage::Binary),
            WireFormat::Text => caps_json(caps).map(ChannelMessage::Text),
        };
        let message = match message {
            Ok(m) => m,
            Err(e) => {
                warn!("failed to encode capability announcement: {e}");
                return false;
            }
        };

        match channel.send(message).await {
            Ok(()) => true,
            Err(e) => {
                debug!("capability announcement to {} failed: {e}", channel.id());
                false
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
