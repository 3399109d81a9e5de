//! Protocol module containing frame types, the binary codec, control
//! messages, and the JSON text variant.

pub mod control;
pub mod frame;
pub mod json;
pub mod messages;

pub use control::{caps_json, decode_control, encode_caps, ControlError, ControlMessage};
pub use frame::{decode_event, encode_event, FrameError, FrameHeader};
pub use json::{classify_text, to_ndjson, JsonEventError, JsonEventKind};
pub use messages::*;
