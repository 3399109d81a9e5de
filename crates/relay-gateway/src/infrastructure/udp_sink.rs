//! UDP forwarding sinks.
//!
//! Each sink owns one socket bound to an ephemeral loopback port and aimed at
//! a fixed injector address.  Sends are single datagrams: one accepted event,
//! one `send_to`.  There is no acknowledgement, queueing, or retry.
//!
//! # Why UDP to localhost? (for beginners)
//!
//! The injector runs as a separate process so it can hold OS privileges the
//! gateway does not need.  A datagram on the loopback interface is the
//! cheapest way to hand it one event: no connection to keep alive, and if the
//! injector is down the packet simply disappears instead of blocking input.

use std::net::{Ipv4Addr, SocketAddr};

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::info;

use crate::application::dispatcher::{ForwardSink, SinkError};

/// A [`ForwardSink`] that sends each payload as one UDP datagram.
pub struct UdpSink {
    name: String,
    target: SocketAddr,
    socket: UdpSocket,
}

impl UdpSink {
    /// Binds an ephemeral local socket that sends to `target`.
    ///
    /// The local socket binds the loopback interface when `target` is on
    /// loopback, and all interfaces otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Bind`] if the local socket cannot be created.
    pub async fn bind(name: &str, target: SocketAddr) -> Result<Self, SinkError> {
        let local = if target.ip().is_loopback() {
            SocketAddr::from((Ipv4Addr::LOCALHOST, 0))
        } else {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|source| SinkError::Bind {
                target: target.to_string(),
                source,
            })?;
        if let Ok(addr) = socket.local_addr() {
            info!("{name} sink ready: {addr} -> {target}");
        }
        Ok(Self {
            name: name.to_string(),
            target,
            socket,
        })
    }
}

#[async_trait]
impl ForwardSink for UdpSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn forward(&self, payload: &[u8]) -> Result<(), SinkError> {
        let sent = self
            .socket
            .send_to(payload, self.target)
            .await
            .map_err(|source| SinkError::Send {
                target: self.target.to_string(),
                source,
            })?;
        if sent != payload.len() {
            return Err(SinkError::ShortSend {
                target: self.target.to_string(),
                sent,
                expected: payload.len(),
            });
        }
        Ok(())
    }
}
