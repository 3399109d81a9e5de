//! Binary frame codec for input events.
//!
//! Wire format:
//! ```text
//! [version:1][type:1][payload_len:2][payload:N]
//! ```
//! Header size: 4 bytes. All multi-byte integers are little-endian.
//!
//! Two decoders live here:
//!
//! - [`FrameHeader::parse`] is the lenient *routing* decoder used by the
//!   gateway.  It only needs the version and type bytes, because the gateway
//!   forwards the original bytes unchanged and never looks inside the payload.
//! - [`decode_event`] is the strict *typed* decoder used by injectors.  It
//!   requires the full header and a payload long enough for the type's layout.

use thiserror::Error;

use crate::protocol::messages::{
    FrameType, GamepadAxis, InputEvent, MouseButton, HEADER_SIZE, MAX_PAYLOAD_LEN,
    PROTOCOL_VERSION,
};

/// Errors that can occur during frame encoding or decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The byte slice is shorter than the minimum required length.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The version byte is not [`PROTOCOL_VERSION`].
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// The type byte is not a recognized frame type.
    #[error("unknown frame type: 0x{0:02X}")]
    UnknownFrameType(u8),

    /// The frame is a control frame where an input event was expected.
    #[error("frame type {0:?} does not carry an input event")]
    NotAnInputFrame(FrameType),

    /// The declared payload length exceeds the bytes actually present.
    #[error("payload length mismatch: header says {declared}, available is {available}")]
    PayloadLengthMismatch { declared: usize, available: usize },

    /// The payload could not be parsed (too short, bad enum value, bad UTF-8).
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The payload does not fit in the 16-bit length field.
    #[error("payload of {0} bytes exceeds the 65535-byte frame limit")]
    PayloadTooLarge(usize),
}

// ── Routing header ────────────────────────────────────────────────────────────

/// The parts of a frame header the gateway needs for routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u8,
    pub frame_type: FrameType,
    /// Payload length from bytes 2..3, or `None` when the frame is shorter
    /// than the full 4-byte header.
    pub declared_len: Option<u16>,
}

impl FrameHeader {
    /// Reads the version and type bytes of a binary frame.
    ///
    /// Succeeds on any frame of at least two bytes whose version is 1 and whose
    /// type code is known.  The payload is not inspected.
    ///
    /// # Errors
    ///
    /// - [`FrameError::InsufficientData`] for frames shorter than 2 bytes.
    /// - [`FrameError::UnsupportedVersion`] when byte 0 is not 1.
    /// - [`FrameError::UnknownFrameType`] when byte 1 is not a known code.
    pub fn parse(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < 2 {
            return Err(FrameError::InsufficientData {
                needed: 2,
                available: bytes.len(),
            });
        }

        let version = bytes[0];
        if version != PROTOCOL_VERSION {
            return Err(FrameError::UnsupportedVersion(version));
        }

        let frame_type =
            FrameType::try_from(bytes[1]).map_err(|_| FrameError::UnknownFrameType(bytes[1]))?;

        let declared_len = if bytes.len() >= HEADER_SIZE {
            Some(u16::from_le_bytes([bytes[2], bytes[3]]))
        } else {
            None
        };

        Ok(Self {
            version,
            frame_type,
            declared_len,
        })
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Wraps `payload` in a 4-byte header of the given type.
///
/// # Errors
///
/// Returns [`FrameError::PayloadTooLarge`] if `payload` exceeds 65535 bytes.
pub fn encode_frame(frame_type: FrameType, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(FrameError::PayloadTooLarge(payload.len()));
    }
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.push(PROTOCOL_VERSION);
    buf.push(frame_type as u8);
    buf.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Encodes a typed [`InputEvent`] into a complete binary frame.
///
/// # Errors
///
/// Returns [`FrameError::MalformedPayload`] if a key code is longer than 255
/// bytes (the key length prefix is a single byte).
///
/// # Examples
///
/// ```rust
/// use relay_core::protocol::frame::{decode_event, encode_event};
/// use relay_core::protocol::messages::InputEvent;
///
/// let event = InputEvent::MouseMove { dx: -3, dy: 7 };
/// let bytes = encode_event(&event).unwrap();
/// assert_eq!(bytes[..4], [0x01, 0x01, 0x04, 0x00]);
/// assert_eq!(decode_event(&bytes).unwrap(), event);
/// ```
pub fn encode_event(event: &InputEvent) -> Result<Vec<u8>, FrameError> {
    let mut payload = Vec::with_capacity(8);
    match event {
        InputEvent::MouseMove { dx, dy } => {
            payload.extend_from_slice(&dx.to_le_bytes());
            payload.extend_from_slice(&dy.to_le_bytes());
        }
        InputEvent::MouseDown { button } | InputEvent::MouseUp { button } => {
            payload.push(*button as u8);
        }
        InputEvent::MouseWheel { dy } => payload.extend_from_slice(&dy.to_le_bytes()),
        InputEvent::KeyDown { code } | InputEvent::KeyUp { code } => {
            let bytes = code.as_bytes();
            let len = u8::try_from(bytes.len()).map_err(|_| {
                FrameError::MalformedPayload(format!(
                    "key code of {} bytes exceeds 255-byte limit",
                    bytes.len()
                ))
            })?;
            payload.push(len);
            payload.extend_from_slice(bytes);
        }
        InputEvent::GamepadButtons { mask } => payload.extend_from_slice(&mask.to_le_bytes()),
        InputEvent::GamepadAxis { axis, value } => {
            payload.push(*axis as u8);
            payload.extend_from_slice(&value.to_le_bytes());
        }
        InputEvent::GamepadConnect { connected } => payload.push(u8::from(*connected)),
    }
    encode_frame(event.frame_type(), &payload)
}

/// Decodes one complete input-event frame.
///
/// Bytes beyond the declared payload length are ignored.
///
/// # Errors
///
/// Returns [`FrameError`] if the header is incomplete or invalid, the frame is
/// a control frame, or the payload is too short for the type's layout.
pub fn decode_event(bytes: &[u8]) -> Result<InputEvent, FrameError> {
    if bytes.len() < HEADER_SIZE {
        return Err(FrameError::InsufficientData {
            needed: HEADER_SIZE,
            available: bytes.len(),
        });
    }
    let header = FrameHeader::parse(bytes)?;
    let payload = frame_payload(bytes)?;

    match header.frame_type {
        FrameType::MouseMove => {
            require_len(payload, 4, "MouseMove")?;
            Ok(InputEvent::MouseMove {
                dx: read_i16(payload, 0),
                dy: read_i16(payload, 2),
            })
        }
        FrameType::MouseDown => Ok(InputEvent::MouseDown {
            button: decode_button(payload, "MouseDown")?,
        }),
        FrameType::MouseUp => Ok(InputEvent::MouseUp {
            button: decode_button(payload, "MouseUp")?,
        }),
        FrameType::MouseWheel => {
            require_len(payload, 2, "MouseWheel")?;
            Ok(InputEvent::MouseWheel {
                dy: read_i16(payload, 0),
            })
        }
        FrameType::KeyDown => Ok(InputEvent::KeyDown {
            code: decode_key_code(payload, "KeyDown")?,
        }),
        FrameType::KeyUp => Ok(InputEvent::KeyUp {
            code: decode_key_code(payload, "KeyUp")?,
        }),
        FrameType::GamepadButtons => {
            require_len(payload, 4, "GamepadButtons")?;
            Ok(InputEvent::GamepadButtons {
                mask: u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]),
            })
        }
        FrameType::GamepadAxis => {
            require_len(payload, 3, "GamepadAxis")?;
            let axis = GamepadAxis::try_from(payload[0]).map_err(|_| {
                FrameError::MalformedPayload(format!("unknown gamepad axis: {}", payload[0]))
            })?;
            Ok(InputEvent::GamepadAxis {
                axis,
                value: read_i16(payload, 1),
            })
        }
        FrameType::GamepadConnect => {
            require_len(payload, 1, "GamepadConnect")?;
            Ok(InputEvent::GamepadConnect {
                connected: payload[0] != 0,
            })
        }
        FrameType::Caps => Err(FrameError::NotAnInputFrame(FrameType::Caps)),
    }
}

/// Returns the payload of a frame with a complete header, bounded by the
/// declared length.
///
/// # Errors
///
/// Returns [`FrameError::InsufficientData`] for frames shorter than the header
/// and [`FrameError::PayloadLengthMismatch`] when fewer payload bytes are
/// present than declared.
pub fn frame_payload(bytes: &[u8]) -> Result<&[u8], FrameError> {
    if bytes.len() < HEADER_SIZE {
        return Err(FrameError::InsufficientData {
            needed: HEADER_SIZE,
            available: bytes.len(),
        });
    }
    let declared = u16::from_le_bytes([bytes[2], bytes[3]]) as usize;
    let available = bytes.len() - HEADER_SIZE;
    if available < declared {
        return Err(FrameError::PayloadLengthMismatch {
            declared,
            available,
        });
    }
    Ok(&bytes[HEADER_SIZE..HEADER_SIZE + declared])
}

// ── Utility helpers ───────────────────────────────────────────────────────────

fn require_len(buf: &[u8], needed: usize, context: &str) -> Result<(), FrameError> {
    if buf.len() < needed {
        Err(FrameError::MalformedPayload(format!(
            "{context}: need {needed} bytes, got {}",
            buf.len()
        )))
    } else {
        Ok(())
    }
}

/// Caller must have checked that `offset + 2 <= buf.len()`.
fn read_i16(buf: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([buf[offset], buf[offset + 1]])
}

fn decode_button(payload: &[u8], context: &str) -> Result<MouseButton, FrameError> {
    require_len(payload, 1, context)?;
    MouseButton::try_from(payload[0])
        .map_err(|_| FrameError::MalformedPayload(format!("unknown mouse button: {}", payload[0])))
}

fn decode_key_code(payload: &[u8], context: &str) -> Result<String, FrameError> {
    require_len(payload, 1, context)?;
    let len = payload[0] as usize;
    require_len(payload, 1 + len, context)?;
    std::str::from_utf8(&payload[1..1 + len])
        .map(str::to_owned)
        .map_err(|e| FrameError::MalformedPayload(format!("invalid UTF-8 key code: {e}")))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
