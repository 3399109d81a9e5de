//! Domain entities for the input relay.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! The innermost layer of a Clean Architecture codebase is the **domain**.
//! Domain code has no imports from sockets, HTTP frameworks, or async
//! runtimes, so it compiles and tests anywhere.
//!
//! For the relay, the central domain concept is the *capability set*: the
//! on/off switch for each class of input the gateway is willing to forward.

/// Capability classes, the capability set, and its thread-safe store.
///
/// See [`capabilities::CapabilityStore`] for the main type.
pub mod capabilities;
