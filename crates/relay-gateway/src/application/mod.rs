//! Application layer for the relay gateway.
//!
//! # What is the "application" layer? (for beginners)
//!
//! The application layer sits between the domain (pure types) and the
//! infrastructure (sockets, HTTP, files).  It orchestrates domain objects and
//! talks to the outside world only through traits, so tests can substitute
//! in-memory fakes for UDP sockets and peer connections.
//!
//! # Sub-modules
//!
//! - **`transport`**  – The `PeerTransport` / `DataChannel` seams and the
//!   message type that flows over a channel.
//! - **`registry`**   – The list of open channels that receive capability
//!   broadcasts.
//! - **`dispatcher`** – The capability gate: decode, check the class flag,
//!   forward to the right sink.  Runs on every input event.
//! - **`signaling`**  – Turns an offer into an answer and drives the session
//!   task that feeds the dispatcher.

pub mod dispatcher;
pub mod registry;
pub mod signaling;
pub mod transport;

pub use dispatcher::{DropReason, Disposition, EventDispatcher, ForwardSink, SinkError};
pub use registry::ChannelRegistry;
pub use signaling::{AcceptedOffer, SignalingError, SignalingService};
pub use transport::{
    ChannelId, ChannelMessage, DataChannel, OpenedChannel, PeerTransport, PendingPeer,
    TransportError, WireFormat,
};
