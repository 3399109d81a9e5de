//! Infrastructure layer for the relay gateway.
//!
//! Contains the adapters that touch the outside world: UDP sinks, the warp
//! HTTP surface, the WebSocket rendezvous transport, and startup files.
//!
//! **Dependency rule**: this layer may depend on `application`, `domain`, and
//! `relay_core`, but MUST NOT be imported by the `application` or domain
//! layers outside of tests.

pub mod gateway;
pub mod http_server;
pub mod mock;
pub mod storage;
pub mod udp_sink;
pub mod ws_transport;

pub use gateway::{run_gateway, start_gateway, RunningGateway};
