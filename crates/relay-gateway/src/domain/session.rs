//! Relay session lifecycle.
//!
//! A session is the result of one signaling handshake.  It moves through a
//! fixed sequence of states:
//!
//! ```text
//! New ──offer──► Offered ──answer──► Answered ──channel open──► Open
//!  │                │                    │                        │
//!  └────────────────┴────────────────────┴────────────────────────┴──► Closed
//! ```
//!
//! `Closed` is reachable from every other state (transport failure, handshake
//! timeout, or the channel closing).  Any other jump is an
//! [`SessionError::IllegalTransition`].

use std::fmt;
use std::time::{Duration, Instant};

use thiserror::Error;
use uuid::Uuid;

/// Unique identifier of a relay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    New,
    Offered,
    Answered,
    Open,
    Closed,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The offer was rejected or the transport failed before the channel opened.
    HandshakeFailed,
    /// The channel did not open within the handshake timeout.
    HandshakeTimeout,
    /// The channel opened and later closed.
    ChannelClosed,
}

/// Errors raised by the session state machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("illegal session transition {from:?} -> {to:?}")]
    IllegalTransition {
        from: SessionState,
        to: SessionState,
    },
}

/// One relay session and its state machine.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    state: SessionState,
    created_at: Instant,
    opened_at: Option<Instant>,
    close_reason: Option<CloseReason>,
}

impl Session {
    /// Creates a session in [`SessionState::New`].
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            state: SessionState::New,
            created_at: Instant::now(),
            opened_at: None,
            close_reason: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        self.close_reason
    }

    /// Time from channel open until now, or `None` if never opened.
    pub fn open_duration(&self) -> Option<Duration> {
        self.opened_at.map(|t| t.elapsed())
    }

    /// Time since the session was created.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// `New → Offered`: a connection offer has been received.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::IllegalTransition`] from any other state.
    pub fn receive_offer(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::New, SessionState::Offered)
    }

    /// `Offered → Answered`: the transport produced an answer.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::IllegalTransition`] from any other state.
    pub fn answer(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Offered, SessionState::Answered)
    }

    /// `Answered → Open`: the channel reported ready.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::IllegalTransition`] from any other state.
    pub fn open(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Answered, SessionState::Open)?;
        self.opened_at = Some(Instant::now());
        Ok(())
    }

    /// Any state except `Closed` → `Closed`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::IllegalTransition`] if already closed.
    pub fn close(&mut self, reason: CloseReason) -> Result<(), SessionError> {
        if self.state == SessionState::Closed {
            return Err(SessionError::IllegalTransition {
                from: SessionState::Closed,
                to: SessionState::Closed,
            });
        }
        self.state = SessionState::Closed;
        self.close_reason = Some(reason);
        Ok(())
    }

    fn transition(&mut self, from: SessionState, to: SessionState) -> Result<(), SessionError> {
        if self.state != from {
            return Err(SessionError::IllegalTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
