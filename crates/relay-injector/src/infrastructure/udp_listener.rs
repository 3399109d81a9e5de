//! UDP receive loop for forwarded frames.
//!
//! The gateway sends one frame per datagram and never waits for a reply, so
//! the listener only ever reads.  Datagrams that fail to decode, belong to the
//! other injector, or name an unknown key are dropped with a `debug!` line.
//! Device failures are logged at `warn!` and the loop keeps going.
//!
//! # Read timeout
//!
//! Each `recv_from` is bounded by a 200 ms timeout.  On every timeout the
//! `running` flag is checked; once it is cleared the loop releases any held
//! keys, unplugs the pad, and returns.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::application::inject::InjectInputUseCase;

/// Largest datagram the listener accepts: a full-length frame.
const MAX_DATAGRAM: usize = 4 + u16::MAX as usize;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Error type for listener setup.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The UDP socket could not be bound.
    #[error("failed to bind injector socket on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Counters reported when the listener stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    /// Datagrams replayed on the device (including no-op repeats).
    pub injected: u64,
    /// Datagrams dropped as bad input.
    pub dropped: u64,
    /// Datagrams the device backend failed on.
    pub failed: u64,
}

/// Binds the injector's UDP socket.
///
/// # Errors
///
/// Returns [`ListenerError::BindFailed`] if the address is unavailable.
pub async fn bind_listener(addr: SocketAddr) -> Result<UdpSocket, ListenerError> {
    UdpSocket::bind(addr)
        .await
        .map_err(|source| ListenerError::BindFailed { addr, source })
}

/// Receives and replays datagrams until `running` is cleared.
pub async fn run_listener(
    socket: UdpSocket,
    mut use_case: InjectInputUseCase,
    running: Arc<AtomicBool>,
) -> ListenerStats {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    let mut stats = ListenerStats::default();
    if let Ok(addr) = socket.local_addr() {
        info!("{} injector listening on UDP {addr}", use_case.role());
    }

    while running.load(Ordering::Relaxed) {
        let (len, src) = match timeout(POLL_INTERVAL, socket.recv_from(&mut buf)).await {
            Err(_) => continue,
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                error!("injector recv error: {e}");
                continue;
            }
        };

        match use_case.handle_datagram(&buf[..len]) {
            Ok(()) => stats.injected += 1,
            Err(e) if e.is_bad_input() => {
                debug!("dropping datagram from {src}: {e}");
                stats.dropped += 1;
            }
            Err(e) => {
                warn!("injection failed for datagram from {src}: {e}");
                stats.failed += 1;
            }
        }
    }

    if let Err(e) = use_case.reset() {
        warn!("failed to release device state on shutdown: {e}");
    }
    info!(
        injected = stats.injected,
        dropped = stats.dropped,
        failed = stats.failed,
        "{} injector stopped",
        use_case.role()
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::inject::{InjectorRole, InputInjector};
    use crate::infrastructure::mock::MockInjector;

    #[tokio::test]
    async fn test_bind_failure_reports_address() {
        // Arrange: occupy a port
        let taken = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        // Act
        let err = bind_listener(addr).await.unwrap_err();

        // Assert
        assert!(err.to_string().contains(&addr.to_string()));
    }

    #[tokio::test]
    async fn test_listener_stops_when_flag_cleared() {
        // Arrange
        let socket = bind_listener("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let injector = Arc::new(MockInjector::new());
        let uc = InjectInputUseCase::new(injector as Arc<dyn InputInjector>, InjectorRole::KeyMouse);
        let running = Arc::new(AtomicBool::new(false));

        // Act
        let stats = timeout(Duration::from_secs(2), run_listener(socket, uc, running))
            .await
            .expect("listener returns");

        // Assert
        assert_eq!(stats, ListenerStats::default());
    }
}
