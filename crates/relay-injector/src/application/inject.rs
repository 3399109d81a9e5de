//! InjectInputUseCase: replays relayed frames on a virtual input device.
//!
//! Each datagram from the gateway holds one binary frame.  The use case
//! decodes it strictly, checks that it belongs to this injector's role, folds
//! it into the keyboard or pad state, and calls the [`InputInjector`] only
//! when the device-visible state actually changed.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use relay_core::keymap::dom::{dom_code_to_hid, HidUsage};
use relay_core::protocol::messages::MouseButton;
use relay_core::{decode_event, FrameError, InputClass, InputEvent};
use thiserror::Error;

use crate::domain::{KeyboardReport, KeyboardState, PadState, XusbReport};

/// Error type for injection.
#[derive(Debug, Error)]
pub enum InjectError {
    /// The datagram is not a valid input frame.
    #[error("undecodable frame: {0}")]
    Decode(#[from] FrameError),
    /// The frame belongs to the other injector.
    #[error("{class:?} input sent to the {role} injector")]
    WrongRole { role: InjectorRole, class: InputClass },
    /// The key code has no HID usage.
    #[error("unknown key code: {0:?}")]
    UnknownKeyCode(String),
    /// The device backend rejected the call.
    #[error("device error: {0}")]
    Device(String),
}

impl InjectError {
    /// `true` for errors caused by the datagram rather than the device.
    pub fn is_bad_input(&self) -> bool {
        !matches!(self, InjectError::Device(_))
    }
}

// ── Roles ─────────────────────────────────────────────────────────────────────

/// Which device family an injector process owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectorRole {
    /// Keyboard and mouse, UDP 9999.
    KeyMouse,
    /// Xbox 360 pad, UDP 9998.
    Gamepad,
}

impl InjectorRole {
    /// The loopback address the gateway forwards this role's frames to.
    pub fn default_listen_addr(self) -> SocketAddr {
        let port = match self {
            InjectorRole::KeyMouse => 9999,
            InjectorRole::Gamepad => 9998,
        };
        SocketAddr::from((Ipv4Addr::LOCALHOST, port))
    }

    pub fn accepts(self, class: InputClass) -> bool {
        match self {
            InjectorRole::KeyMouse => matches!(class, InputClass::Keyboard | InputClass::Mouse),
            InjectorRole::Gamepad => class == InputClass::Gamepad,
        }
    }
}

impl fmt::Display for InjectorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InjectorRole::KeyMouse => "keymouse",
            InjectorRole::Gamepad => "gamepad",
        })
    }
}

// ── Device seam ───────────────────────────────────────────────────────────────

/// A virtual input device.
///
/// Implementations wrap an OS driver or, for testing, record the calls.
pub trait InputInjector: Send + Sync {
    /// Moves the cursor by a relative offset.
    fn mouse_move(&self, dx: i16, dy: i16) -> Result<(), InjectError>;

    fn mouse_button(&self, button: MouseButton, pressed: bool) -> Result<(), InjectError>;

    /// Scrolls vertically; positive is away from the user.
    fn mouse_wheel(&self, dy: i16) -> Result<(), InjectError>;

    /// Presses or releases one key.
    ///
    /// `report` is the full keyboard state after the change, for backends
    /// that consume boot reports instead of single keys.
    fn key(&self, usage: HidUsage, pressed: bool, report: &KeyboardReport)
        -> Result<(), InjectError>;

    /// Pushes a complete pad report.
    fn gamepad(&self, report: &XusbReport) -> Result<(), InjectError>;

    /// Plugs or unplugs the virtual pad.
    fn gamepad_connected(&self, connected: bool) -> Result<(), InjectError>;
}

// ── Use case ──────────────────────────────────────────────────────────────────

/// The Inject Input use case.
///
/// Owns the device state for one injector process.
pub struct InjectInputUseCase {
    injector: Arc<dyn InputInjector>,
    role: InjectorRole,
    keyboard: KeyboardState,
    pad: PadState,
}

impl InjectInputUseCase {
    pub fn new(injector: Arc<dyn InputInjector>, role: InjectorRole) -> Self {
        Self {
            injector,
            role,
            keyboard: KeyboardState::new(),
            pad: PadState::new(),
        }
    }

    pub fn role(&self) -> InjectorRole {
        self.role
    }

    /// Decodes one datagram and replays it.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::Decode`] for anything that is not a valid
    /// input frame, and see [`Self::handle_event`].
    pub fn handle_datagram(&mut self, datagram: &[u8]) -> Result<(), InjectError> {
        let event = decode_event(datagram)?;
        self.handle_event(&event)
    }

    /// Replays one decoded event.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::WrongRole`] if the event belongs to the other
    /// injector, [`InjectError::UnknownKeyCode`] for key codes with no HID
    /// usage, and [`InjectError::Device`] if the backend fails.
    pub fn handle_event(&mut self, event: &InputEvent) -> Result<(), InjectError> {
        let class = event.input_class();
        if !self.role.accepts(class) {
            return Err(InjectError::WrongRole {
                role: self.role,
                class,
            });
        }

        match event {
            InputEvent::MouseMove { dx: 0, dy: 0 } => Ok(()),
            InputEvent::MouseMove { dx, dy } => self.injector.mouse_move(*dx, *dy),
            InputEvent::MouseDown { button } => self.injector.mouse_button(*button, true),
            InputEvent::MouseUp { button } => self.injector.mouse_button(*button, false),
            InputEvent::MouseWheel { dy: 0 } => Ok(()),
            InputEvent::MouseWheel { dy } => self.injector.mouse_wheel(*dy),
            InputEvent::KeyDown { code } => {
                let usage = lookup_usage(code)?;
                if self.keyboard.press(usage) {
                    self.injector.key(usage, true, &self.keyboard.report())?;
                }
                Ok(())
            }
            InputEvent::KeyUp { code } => {
                let usage = lookup_usage(code)?;
                if self.keyboard.release(usage) {
                    self.injector.key(usage, false, &self.keyboard.report())?;
                }
                Ok(())
            }
            InputEvent::GamepadButtons { mask } => {
                self.ensure_plugged()?;
                if self.pad.apply_buttons(*mask) {
                    self.injector.gamepad(&self.pad.report())?;
                }
                Ok(())
            }
            InputEvent::GamepadAxis { axis, value } => {
                self.ensure_plugged()?;
                if self.pad.apply_axis(*axis, *value) {
                    self.injector.gamepad(&self.pad.report())?;
                }
                Ok(())
            }
            InputEvent::GamepadConnect { connected } => {
                if self.pad.set_connected(*connected) {
                    self.injector.gamepad_connected(*connected)?;
                }
                Ok(())
            }
        }
    }

    /// Releases every held key and unplugs the pad.
    ///
    /// Called on shutdown so no key stays stuck on the host.
    ///
    /// # Errors
    ///
    /// Returns the first backend failure; remaining releases are still sent.
    pub fn reset(&mut self) -> Result<(), InjectError> {
        let mut first_error = None;
        let held = self.keyboard.release_all();
        let empty = self.keyboard.report();
        for usage in held {
            if let Err(e) = self.injector.key(usage, false, &empty) {
                first_error.get_or_insert(e);
            }
        }
        if self.pad.set_connected(false) {
            if let Err(e) = self.injector.gamepad_connected(false) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Button and axis frames plug the pad implicitly.
    fn ensure_plugged(&mut self) -> Result<(), InjectError> {
        if self.pad.set_connected(true) {
            self.injector.gamepad_connected(true)?;
        }
        Ok(())
    }
}

fn lookup_usage(code: &str) -> Result<HidUsage, InjectError> {
    dom_code_to_hid(code).ok_or_else(|| InjectError::UnknownKeyCode(code.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
