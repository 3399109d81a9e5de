//! Frame type codes and typed input events.
//!
//! Every binary frame starts with a version byte and a type code.  The type
//! code decides which [`InputClass`] the frame belongs to and, for injectors,
//! how the payload is laid out.  All multi-byte integers are little-endian.

use serde::{Deserialize, Serialize};

use crate::domain::capabilities::InputClass;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Current protocol version byte.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Size of the fixed frame header in bytes: version, type, u16 payload length.
pub const HEADER_SIZE: usize = 4;

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

// ── Frame type codes ──────────────────────────────────────────────────────────

/// All frame type codes understood by this relay version.
///
/// Codes outside this set are legal on the wire (peers may be newer) but are
/// never forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FrameType {
    // Mouse / keyboard (0x01–0x0F)
    MouseMove = 0x01,
    MouseDown = 0x02,
    MouseUp = 0x03,
    KeyDown = 0x04,
    KeyUp = 0x05,
    MouseWheel = 0x06,
    // Gamepad (0x10–0x1F)
    GamepadButtons = 0x10,
    GamepadAxis = 0x11,
    GamepadConnect = 0x12,
    // Control (0x20–0x2F)
    Caps = 0x20,
}

impl TryFrom<u8> for FrameType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x01 => Ok(FrameType::MouseMove),
            0x02 => Ok(FrameType::MouseDown),
            0x03 => Ok(FrameType::MouseUp),
            0x04 => Ok(FrameType::KeyDown),
            0x05 => Ok(FrameType::KeyUp),
            0x06 => Ok(FrameType::MouseWheel),
            0x10 => Ok(FrameType::GamepadButtons),
            0x11 => Ok(FrameType::GamepadAxis),
            0x12 => Ok(FrameType::GamepadConnect),
            0x20 => Ok(FrameType::Caps),
            _ => Err(()),
        }
    }
}

impl FrameType {
    /// The capability class a frame of this type requires.
    ///
    /// Returns `None` for control frames, which are relay → client only and
    /// are never forwarded to an injector.
    pub fn input_class(self) -> Option<InputClass> {
        match self {
            FrameType::MouseMove
            | FrameType::MouseDown
            | FrameType::MouseUp
            | FrameType::MouseWheel => Some(InputClass::Mouse),
            FrameType::KeyDown | FrameType::KeyUp => Some(InputClass::Keyboard),
            FrameType::GamepadButtons | FrameType::GamepadAxis | FrameType::GamepadConnect => {
                Some(InputClass::Gamepad)
            }
            FrameType::Caps => None,
        }
    }
}

// ── Mouse buttons ─────────────────────────────────────────────────────────────

/// Mouse button identifier carried by `MouseDown` / `MouseUp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MouseButton {
    Left = 0,
    Middle = 1,
    Right = 2,
}

impl TryFrom<u8> for MouseButton {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0 => Ok(MouseButton::Left),
            1 => Ok(MouseButton::Middle),
            2 => Ok(MouseButton::Right),
            _ => Err(()),
        }
    }
}

// ── Gamepad ───────────────────────────────────────────────────────────────────

/// Analog axis index carried by `GamepadAxis`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum GamepadAxis {
    LeftX = 0,
    LeftY = 1,
    RightX = 2,
    RightY = 3,
    LeftTrigger = 4,
    RightTrigger = 5,
}

impl TryFrom<u8> for GamepadAxis {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0 => Ok(GamepadAxis::LeftX),
            1 => Ok(GamepadAxis::LeftY),
            2 => Ok(GamepadAxis::RightX),
            3 => Ok(GamepadAxis::RightY),
            4 => Ok(GamepadAxis::LeftTrigger),
            5 => Ok(GamepadAxis::RightTrigger),
            _ => Err(()),
        }
    }
}

/// Bit positions in the `GamepadButtons` mask (Xbox 360 layout).
pub mod gamepad_buttons {
    pub const A: u32 = 1 << 0;
    pub const B: u32 = 1 << 1;
    pub const X: u32 = 1 << 2;
    pub const Y: u32 = 1 << 3;
    pub const LEFT_SHOULDER: u32 = 1 << 4;
    pub const RIGHT_SHOULDER: u32 = 1 << 5;
    pub const BACK: u32 = 1 << 6;
    pub const START: u32 = 1 << 7;
    pub const LEFT_THUMB: u32 = 1 << 8;
    pub const RIGHT_THUMB: u32 = 1 << 9;
    pub const DPAD_UP: u32 = 1 << 10;
    pub const DPAD_DOWN: u32 = 1 << 11;
    pub const DPAD_LEFT: u32 = 1 << 12;
    pub const DPAD_RIGHT: u32 = 1 << 13;

    /// Every bit with a defined meaning.
    pub const ALL: u32 = (1 << 14) - 1;
}

// ── Typed events ──────────────────────────────────────────────────────────────

/// A fully decoded input event.
///
/// The gateway never needs this type (it forwards raw bytes); injectors use it
/// after [`crate::protocol::frame::decode_event`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Relative cursor motion in pixels.
    MouseMove { dx: i16, dy: i16 },
    MouseDown { button: MouseButton },
    MouseUp { button: MouseButton },
    /// Vertical wheel delta (positive = away from the user).
    MouseWheel { dy: i16 },
    /// `code` is the DOM `KeyboardEvent.code` string, e.g. `"KeyA"`.
    KeyDown { code: String },
    KeyUp { code: String },
    /// Bitmask of pressed buttons, see [`gamepad_buttons`].
    GamepadButtons { mask: u32 },
    GamepadAxis { axis: GamepadAxis, value: i16 },
    GamepadConnect { connected: bool },
}

impl InputEvent {
    /// The frame type code used to encode this event.
    pub fn frame_type(&self) -> FrameType {
        match self {
            InputEvent::MouseMove { .. } => FrameType::MouseMove,
            InputEvent::MouseDown { .. } => FrameType::MouseDown,
            InputEvent::MouseUp { .. } => FrameType::MouseUp,
            InputEvent::MouseWheel { .. } => FrameType::MouseWheel,
            InputEvent::KeyDown { .. } => FrameType::KeyDown,
            InputEvent::KeyUp { .. } => FrameType::KeyUp,
            InputEvent::GamepadButtons { .. } => FrameType::GamepadButtons,
            InputEvent::GamepadAxis { .. } => FrameType::GamepadAxis,
            InputEvent::GamepadConnect { .. } => FrameType::GamepadConnect,
        }
    }

    /// The capability class this event requires.
    pub fn input_class(&self) -> InputClass {
        match self {
            InputEvent::KeyDown { .. } | InputEvent::KeyUp { .. } => InputClass::Keyboard,
            InputEvent::GamepadButtons { .. }
            | InputEvent::GamepadAxis { .. }
            | InputEvent::GamepadConnect { .. } => InputClass::Gamepad,
            InputEvent::MouseMove { .. }
            | InputEvent::MouseDown { .. }
            | InputEvent::MouseUp { .. }
            | InputEvent::MouseWheel { .. } => InputClass::Mouse,
        }
    }
}
