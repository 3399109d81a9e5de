//! Infrastructure layer for the injector.
//!
//! - [`udp_listener`]: receives forwarded frames from the gateway.
//! - [`logging_injector`]: a device backend that only traces what it would do.
//! - [`mock`]: a recording backend for tests.

pub mod logging_injector;
pub mod mock;
pub mod udp_listener;

pub use logging_injector::LoggingInjector;
pub use udp_listener::{bind_listener, run_listener, ListenerError, ListenerStats};
