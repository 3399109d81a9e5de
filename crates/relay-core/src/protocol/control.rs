//! Control messages sent from the relay to the client.
//!
//! The only control message today is the capability announcement:
//!
//! ```json
//! {"type":"caps","caps":{"keyboard":true,"mouse":true,"gamepad":false}}
//! ```
//!
//! On binary channels the JSON is wrapped in a type `0x20` frame; on text
//! channels the bare JSON is sent as a text message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::capabilities::CapabilitySet;
use crate::protocol::frame::{encode_frame, frame_payload, FrameError, FrameHeader};
use crate::protocol::messages::FrameType;

/// Errors produced while encoding or decoding control messages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    /// The frame envelope is invalid.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The frame is valid but is an input event, not a control message.
    #[error("frame type {0:?} is not a control frame")]
    NotControl(FrameType),

    /// The JSON body could not be produced or parsed.
    #[error("invalid control JSON: {0}")]
    Json(String),
}

/// A relay → client control message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlMessage {
    /// Snapshot of the capability set.
    Caps { caps: CapabilitySet },
}

/// Serializes the caps announcement as its JSON text form.
///
/// # Errors
///
/// Returns [`ControlError::Json`] if serialization fails.
pub fn caps_json(caps: &CapabilitySet) -> Result<String, ControlError> {
    serde_json::to_string(&ControlMessage::Caps { caps: *caps })
        .map_err(|e| ControlError::Json(e.to_string()))
}

/// Encodes the caps announcement as a binary `0x20` frame.
///
/// # Errors
///
/// Returns [`ControlError`] if serialization fails.
pub fn encode_caps(caps: &CapabilitySet) -> Result<Vec<u8>, ControlError> {
    let json = caps_json(caps)?;
    Ok(encode_frame(FrameType::Caps, json.as_bytes())?)
}

/// Decodes a binary control frame.
///
/// # Errors
///
/// Returns [`ControlError`] if the frame is malformed, is not a control frame,
/// or carries invalid JSON.
pub fn decode_control(bytes: &[u8]) -> Result<ControlMessage, ControlError> {
    let header = FrameHeader::parse(bytes)?;
    if header.frame_type != FrameType::Caps {
        return Err(ControlError::NotControl(header.frame_type));
    }
    let payload = frame_payload(bytes)?;
    serde_json::from_slice(payload).map_err(|e| ControlError::Json(e.to_string()))
}

/// Decodes the text form of a control message.
///
/// # Errors
///
/// Returns [`ControlError::Json`] on invalid JSON or an unknown `type`.
pub fn decode_control_text(text: &str) -> Result<ControlMessage, ControlError> {
    serde_json::from_str(text).map_err(|e| ControlError::Json(e.to_string()))
}
