//! SignalingService: turns a connection offer into a live relay session.
//!
//! # Flow
//!
//! ```text
//! HTTP offer ──► handle_offer ──► PeerTransport::accept_offer ──► answer returned
//!                                        │
//!                                        └─ spawned run_session:
//!                                             wait for open (bounded)
//!                                             attach + announce caps
//!                                             handle inbound messages in order
//!                                             detach on close
//! ```
//!
//! A failed handshake is reported to the caller and leaves nothing behind.
//! Once an answer is returned, the session belongs to its spawned task.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::dispatcher::EventDispatcher;
use crate::application::transport::{OpenedChannel, PeerTransport, PendingPeer, TransportError};
use crate::domain::{CloseReason, SdpType, Session, SessionDescription, SessionError, SessionId};

/// Errors returned to the HTTP layer when a handshake cannot complete.
#[derive(Debug, Error)]
pub enum SignalingError {
    /// The description was an answer where an offer was expected.
    #[error("expected an offer, got an answer")]
    NotAnOffer,

    /// The transport rejected the offer or failed to set up the peer.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The session state machine was driven out of order.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// A successfully answered offer.
#[derive(Debug)]
pub struct AcceptedOffer {
    pub session_id: SessionId,
    pub answer: SessionDescription,
    /// Resolves with the closed session once the channel ends or never opens.
    pub finished: JoinHandle<Session>,
}

/// Accepts offers and drives each session to completion.
pub struct SignalingService {
    transport: Arc<dyn PeerTransport>,
    dispatcher: Arc<EventDispatcher>,
    handshake_timeout: Duration,
}

impl SignalingService {
    pub fn new(
        transport: Arc<dyn PeerTransport>,
        dispatcher: Arc<EventDispatcher>,
        handshake_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            dispatcher,
            handshake_timeout,
        }
    }

    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    /// Handles one offer and returns the answer for the client.
    ///
    /// # Errors
    ///
    /// Returns [`SignalingError`] if `offer` is not an offer or the transport
    /// cannot accept it.  No session survives a failed handshake.
    pub async fn handle_offer(
        &self,
        offer: SessionDescription,
    ) -> Result<AcceptedOffer, SignalingError> {
        if offer.kind != SdpType::Offer {
            return Err(SignalingError::NotAnOffer);
        }

        let mut session = Session::new();
        session.receive_offer()?;
        let session_id = session.id();
        debug!("session {session_id}: offer received ({} bytes)", offer.sdp.len());

        let PendingPeer { answer, opened } = match self.transport.accept_offer(offer).await {
            Ok(p) => p,
            Err(e) => {
                let _ = session.close(CloseReason::HandshakeFailed);
                warn!("session {session_id}: handshake failed: {e}");
                return Err(e.into());
            }
        };

        session.answer()?;
        info!("session {session_id}: answered, waiting for channel");

        let finished = tokio::spawn(run_session(
            session,
            opened,
            Arc::clone(&self.dispatcher),
            self.handshake_timeout,
        ));

        Ok(AcceptedOffer {
            session_id,
            answer,
            finished,
        })
    }
}

/// Drives one answered session until its channel closes.
async fn run_session(
    mut session: Session,
    opened: tokio::sync::oneshot::Receiver<OpenedChannel>,
    dispatcher: Arc<EventDispatcher>,
    handshake_timeout: Duration,
) -> Session {
    let id = session.id();

    let OpenedChannel {
        channel,
        mut inbound,
    } = match tokio::time::timeout(handshake_timeout, opened).await {
        Ok(Ok(o)) => o,
        Ok(Err(_)) => {
            warn!("session {id}: transport gave up before the channel opened");
            let _ = session.close(CloseReason::HandshakeFailed);
            return session;
        }
        Err(_) => {
            warn!(
                "session {id}: channel did not open within {handshake_timeout:?} (session age {:?})",
                session.age()
            );
            let _ = session.close(CloseReason::HandshakeTimeout);
            return session;
        }
    };

    if let Err(e) = session.open() {
        warn!("session {id}: {e}");
        let _ = session.close(CloseReason::HandshakeFailed);
        return session;
    }
    let channel_id = channel.id();
    info!("session {id}: channel {channel_id} open");
    dispatcher.attach(Arc::clone(&channel)).await;

    let mut handled: u64 = 0;
    while let Some(message) = inbound.recv().await {
        dispatcher.handle(&message).await;
        handled += 1;
    }

    dispatcher.detach(channel_id);
    let _ = session.close(CloseReason::ChannelClosed);
    info!(
        "session {id}: channel closed after {handled} message(s), open for {:?}",
        session.open_duration().unwrap_or_default()
    );
    session
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::transport::{ChannelMessage, MockPeerTransport, WireFormat};
    use crate::domain::SessionState;
    use crate::infrastructure::mock::{MockChannel, RecordingSink};
    use relay_core::{CapabilitySet, CapabilityStore};
    use tokio::sync::{mpsc, oneshot};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn make_dispatcher() -> (Arc<EventDispatcher>, Arc<RecordingSink>) {
        let keymouse = Arc::new(RecordingSink::new("keymouse"));
        let dispatcher = Arc::new(EventDispatcher::new(
            Arc::new(CapabilityStore::new(CapabilitySet::default())),
            keymouse.clone(),
            Arc::new(RecordingSink::new("gamepad")),
        ));
        (dispatcher, keymouse)
    }

    /// A transport mock that answers once and hands back the open trigger.
    fn answering_transport() -> (MockPeerTransport, oneshot::Sender<OpenedChannel>) {
        let (open_tx, open_rx) = oneshot::channel();
        let mut transport = MockPeerTransport::new();
        transport
            .expect_accept_offer()
            .times(1)
            .return_once(move |_| {
                Ok(PendingPeer {
                    answer: SessionDescription::answer("v=0\r\n"),
                    opened: open_rx,
                })
            });
        (transport, open_tx)
    }

    #[tokio::test]
    async fn test_offer_is_answered_and_session_runs_to_close() {
        // Arrange
        let (transport, open_tx) = answering_transport();
        let (dispatcher, keymouse) = make_dispatcher();
        let service = SignalingService::new(Arc::new(transport), dispatcher.clone(), TIMEOUT);

        // Act: answer, open the channel, push one key frame, then close
        let accepted = service
            .handle_offer(SessionDescription::offer("v=0\r\n"))
            .await
            .unwrap();
        let channel = MockChannel::open(WireFormat::Binary);
        let (in_tx, in_rx) = mpsc::channel(8);
        open_tx
            .send(OpenedChannel {
                channel: channel.clone(),
                inbound: in_rx,
            })
            .unwrap();
        in_tx
            .send(ChannelMessage::Binary(vec![0x01, 0x05, 0x00, 0x00]))
            .await
            .unwrap();
        drop(in_tx);
        let session = accepted.finished.await.unwrap();

        // Assert
        assert_eq!(accepted.answer.kind, SdpType::Answer);
        assert_eq!(session.id(), accepted.session_id);
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.close_reason(), Some(CloseReason::ChannelClosed));
        assert_eq!(channel.sent().len(), 1, "caps announced on open");
        assert_eq!(keymouse.payloads(), vec![vec![0x01, 0x05, 0x00, 0x00]]);
        assert!(dispatcher.registry().is_empty(), "channel pruned on close");
    }

    #[tokio::test]
    async fn test_inbound_messages_are_handled_in_order() {
        let (transport, open_tx) = answering_transport();
        let (dispatcher, keymouse) = make_dispatcher();
        let service = SignalingService::new(Arc::new(transport), dispatcher, TIMEOUT);

        let accepted = service
            .handle_offer(SessionDescription::offer("v=0\r\n"))
            .await
            .unwrap();
        let (in_tx, in_rx) = mpsc::channel(16);
        open_tx
            .send(OpenedChannel {
                channel: MockChannel::open(WireFormat::Binary),
                inbound: in_rx,
            })
            .unwrap();
        for dx in 0u8..5 {
            in_tx
                .send(ChannelMessage::Binary(vec![0x01, 0x01, 0x04, 0x00, dx, 0, 0, 0]))
                .await
                .unwrap();
        }
        drop(in_tx);
        accepted.finished.await.unwrap();

        let order: Vec<u8> = keymouse.payloads().iter().map(|p| p[4]).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_transport_rejection_returns_error_and_keeps_no_session() {
        // Arrange
        let mut transport = MockPeerTransport::new();
        transport
            .expect_accept_offer()
            .times(1)
            .returning(|_| Err(TransportError::InvalidOffer("not sdp".into())));
        let (dispatcher, _) = make_dispatcher();
        let service = SignalingService::new(Arc::new(transport), dispatcher.clone(), TIMEOUT);

        // Act
        let result = service
            .handle_offer(SessionDescription::offer("garbage"))
            .await;

        // Assert
        assert!(matches!(
            result,
            Err(SignalingError::Transport(TransportError::InvalidOffer(_)))
        ));
        assert!(dispatcher.registry().is_empty());
    }

    #[tokio::test]
    async fn test_answer_description_is_rejected_without_calling_transport() {
        let mut transport = MockPeerTransport::new();
        transport.expect_accept_offer().times(0);
        let (dispatcher, _) = make_dispatcher();
        let service = SignalingService::new(Arc::new(transport), dispatcher, TIMEOUT);

        let result = service
            .handle_offer(SessionDescription::answer("v=0\r\n"))
            .await;

        assert!(matches!(result, Err(SignalingError::NotAnOffer)));
    }

    #[tokio::test]
    async fn test_channel_that_never_opens_times_out() {
        let (transport, _open_tx) = answering_transport();
        let (dispatcher, _) = make_dispatcher();
        let service =
            SignalingService::new(Arc::new(transport), dispatcher, Duration::from_millis(50));

        let accepted = service
            .handle_offer(SessionDescription::offer("v=0\r\n"))
            .await
            .unwrap();
        let session = accepted.finished.await.unwrap();

        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.close_reason(), Some(CloseReason::HandshakeTimeout));
        assert_eq!(session.open_duration(), None);
    }

    #[tokio::test]
    async fn test_transport_dropping_the_peer_fails_the_handshake() {
        let (transport, open_tx) = answering_transport();
        let (dispatcher, _) = make_dispatcher();
        let service = SignalingService::new(Arc::new(transport), dispatcher, TIMEOUT);

        let accepted = service
            .handle_offer(SessionDescription::offer("v=0\r\n"))
            .await
            .unwrap();
        drop(open_tx);
        let session = accepted.finished.await.unwrap();

        assert_eq!(session.close_reason(), Some(CloseReason::HandshakeFailed));
    }

    #[tokio::test]
    async fn test_open_channel_receives_current_caps_before_any_input() {
        let (transport, open_tx) = answering_transport();
        let (dispatcher, _) = make_dispatcher();
        let service = SignalingService::new(Arc::new(transport), dispatcher.clone(), TIMEOUT);

        let accepted = service
            .handle_offer(SessionDescription::offer("v=0\r\n"))
            .await
            .unwrap();
        let channel = MockChannel::open(WireFormat::Text);
        let (in_tx, in_rx) = mpsc::channel(1);
        open_tx
            .send(OpenedChannel {
                channel: channel.clone(),
                inbound: in_rx,
            })
            .unwrap();
        // A round trip through the dispatcher proves the session task has attached.
        in_tx
            .send(ChannelMessage::Text(r#"{"t":"mouse","dx":1}"#.into()))
            .await
            .unwrap();
        drop(in_tx);
        accepted.finished.await.unwrap();

        let sent = channel.sent();
        assert!(matches!(&sent[0], ChannelMessage::Text(t) if t.contains(r#""type":"caps""#)));
    }
}
