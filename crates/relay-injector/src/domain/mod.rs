//! Device report state owned by an injector.
//!
//! Neither type performs I/O; both are folded forward one decoded event at a
//! time and handed to the device as a complete report.

pub mod gamepad;
pub mod keyboard;

pub use gamepad::{xusb_buttons, PadState, XusbReport};
pub use keyboard::{KeyboardReport, KeyboardState, MAX_PRESSED_KEYS};
