//! Xbox 360 (XUSB) gamepad report state.
//!
//! The relay's button mask uses its own bit order (see
//! [`relay_core::protocol::messages::gamepad_buttons`]); virtual pad drivers
//! expect the XUSB layout.  [`PadState`] converts between the two and keeps
//! the last value of every stick and trigger so that each frame, which only
//! ever carries one field, produces a complete report.

use relay_core::protocol::messages::{gamepad_buttons, GamepadAxis};

/// XUSB button flags.
pub mod xusb_buttons {
    pub const DPAD_UP: u16 = 0x0001;
    pub const DPAD_DOWN: u16 = 0x0002;
    pub const DPAD_LEFT: u16 = 0x0004;
    pub const DPAD_RIGHT: u16 = 0x0008;
    pub const START: u16 = 0x0010;
    pub const BACK: u16 = 0x0020;
    pub const LEFT_THUMB: u16 = 0x0040;
    pub const RIGHT_THUMB: u16 = 0x0080;
    pub const LEFT_SHOULDER: u16 = 0x0100;
    pub const RIGHT_SHOULDER: u16 = 0x0200;
    pub const A: u16 = 0x1000;
    pub const B: u16 = 0x2000;
    pub const X: u16 = 0x4000;
    pub const Y: u16 = 0x8000;
}

/// Relay mask bit → XUSB flag.
const BUTTON_MAP: [(u32, u16); 14] = [
    (gamepad_buttons::A, xusb_buttons::A),
    (gamepad_buttons::B, xusb_buttons::B),
    (gamepad_buttons::X, xusb_buttons::X),
    (gamepad_buttons::Y, xusb_buttons::Y),
    (gamepad_buttons::LEFT_SHOULDER, xusb_buttons::LEFT_SHOULDER),
    (gamepad_buttons::RIGHT_SHOULDER, xusb_buttons::RIGHT_SHOULDER),
    (gamepad_buttons::BACK, xusb_buttons::BACK),
    (gamepad_buttons::START, xusb_buttons::START),
    (gamepad_buttons::LEFT_THUMB, xusb_buttons::LEFT_THUMB),
    (gamepad_buttons::RIGHT_THUMB, xusb_buttons::RIGHT_THUMB),
    (gamepad_buttons::DPAD_UP, xusb_buttons::DPAD_UP),
    (gamepad_buttons::DPAD_DOWN, xusb_buttons::DPAD_DOWN),
    (gamepad_buttons::DPAD_LEFT, xusb_buttons::DPAD_LEFT),
    (gamepad_buttons::DPAD_RIGHT, xusb_buttons::DPAD_RIGHT),
];

/// Converts a relay button mask to XUSB flags.  Undefined bits are ignored.
pub fn mask_to_xusb(mask: u32) -> u16 {
    BUTTON_MAP
        .iter()
        .filter(|(bit, _)| mask & bit != 0)
        .fold(0, |acc, (_, flag)| acc | flag)
}

/// Converts a signed axis value to an 8-bit trigger position.
///
/// Negative values count as released; `i16::MAX` maps to 255.
pub fn trigger_from_axis(value: i16) -> u8 {
    (value.max(0) >> 7) as u8
}

/// A complete XUSB input report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct XusbReport {
    pub buttons: u16,
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub thumb_lx: i16,
    pub thumb_ly: i16,
    pub thumb_rx: i16,
    pub thumb_ry: i16,
}

/// The virtual pad as the injector last reported it.
#[derive(Debug, Default)]
pub struct PadState {
    report: XusbReport,
    connected: bool,
}

impl PadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self) -> XusbReport {
        self.report
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Replaces the button flags.  Returns `true` if the report changed.
    pub fn apply_buttons(&mut self, mask: u32) -> bool {
        let buttons = mask_to_xusb(mask);
        let changed = self.report.buttons != buttons;
        self.report.buttons = buttons;
        changed
    }

    /// Updates one stick or trigger.  Returns `true` if the report changed.
    pub fn apply_axis(&mut self, axis: GamepadAxis, value: i16) -> bool {
        let before = self.report;
        match axis {
            GamepadAxis::LeftX => self.report.thumb_lx = value,
            GamepadAxis::LeftY => self.report.thumb_ly = value,
            GamepadAxis::RightX => self.report.thumb_rx = value,
            GamepadAxis::RightY => self.report.thumb_ry = value,
            GamepadAxis::LeftTrigger => self.report.left_trigger = trigger_from_axis(value),
            GamepadAxis::RightTrigger => self.report.right_trigger = trigger_from_axis(value),
        }
        self.report != before
    }

    /// Records a plug or unplug.  Unplugging returns the report to neutral.
    ///
    /// Returns `true` if the connection state changed.
    pub fn set_connected(&mut self, connected: bool) -> bool {
        if self.connected == connected {
            return false;
        }
        self.connected = connected;
        if !connected {
            self.report = XusbReport::default();
        }
        true
    }
}
