//! Key code translation tables.
//!
//! Clients send DOM `KeyboardEvent.code` strings inside key frames; injectors
//! that drive a virtual HID keyboard need USB HID Usage IDs (page 0x07).

pub mod dom;

pub use dom::{dom_code_to_hid, hid_to_dom_code, HidUsage};
