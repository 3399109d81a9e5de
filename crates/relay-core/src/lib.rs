//! # relay-core
//!
//! Shared library for the input relay containing the wire codec, the
//! capability model, and key code translation tables.
//!
//! This crate is used by both the gateway and the injector processes.
//! It has zero dependencies on OS APIs, async runtimes, or network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! A remote client (usually a browser) captures keyboard, mouse, and gamepad
//! input and sends it to the **gateway** over a low-latency data channel.  The
//! gateway checks whether that class of input is currently allowed and, if so,
//! forwards the event as a UDP datagram to a local **injector** process which
//! replays it as real OS input.
//!
//! This crate (`relay-core`) is the shared foundation.  It defines:
//!
//! - **`protocol`** – How bytes travel over the channel and the injector
//!   sockets.  Events are encoded into a compact binary frame (4-byte header +
//!   payload); a parallel JSON text encoding exists for text-only channels.
//!
//! - **`domain`** – The capability model: which input classes (keyboard,
//!   mouse, gamepad) are enabled, and the thread-safe store that guards them.
//!
//! - **`keymap`** – Translation from DOM `KeyboardEvent.code` strings (what the
//!   browser sends) to USB HID Usage IDs (what virtual keyboards consume).

pub mod domain;
pub mod keymap;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `relay_core::CapabilityStore` instead of the full module path.
pub use domain::capabilities::{CapabilitySet, CapabilityStore, CapabilityUpdate, InputClass};
pub use protocol::frame::{decode_event, encode_event, FrameError, FrameHeader};
pub use protocol::messages::{FrameType, InputEvent};
