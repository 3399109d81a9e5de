//! relay-injector library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does an injector do? (for beginners)
//!
//! The gateway never touches OS input APIs.  It forwards every permitted
//! event as a UDP datagram to a small local process, the *injector*, which
//! owns the virtual device.  There are two of them:
//!
//! 1. The **keymouse** injector (UDP 9999) replays mouse motion, buttons,
//!    wheel, and key presses.  Keys arrive as DOM `code` strings and are
//!    translated to USB HID usages before injection.
//! 2. The **gamepad** injector (UDP 9998) keeps one Xbox 360 style report,
//!    folds each button, axis, and connect frame into it, and pushes the
//!    whole report to the virtual pad after every change.
//!
//! The device itself sits behind the [`application::InputInjector`] trait.
//! This crate ships a tracing backend and a recording mock; an OS driver
//! binding is a drop-in implementation of the same trait.

/// Domain layer: keyboard and gamepad report state.
pub mod domain;

/// Application layer: frame-to-device translation.
pub mod application;

/// Infrastructure layer: UDP listener and injector backends.
pub mod infrastructure;
