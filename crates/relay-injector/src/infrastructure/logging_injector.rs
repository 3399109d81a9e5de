//! A device backend that traces each call instead of touching the OS.
//!
//! This is the default backend of the `relay-injector` binary.  It is useful
//! for checking a gateway deployment end to end (`RUST_LOG=debug`) on a host
//! where no virtual input driver is installed.

use relay_core::keymap::dom::{hid_to_dom_code, HidUsage};
use relay_core::protocol::messages::MouseButton;
use tracing::{debug, info};

use crate::application::inject::{InjectError, InputInjector};
use crate::domain::{KeyboardReport, XusbReport};

/// Traces every device call at `debug` level (plug events at `info`).
#[derive(Debug, Default)]
pub struct LoggingInjector;

impl LoggingInjector {
    pub fn new() -> Self {
        Self
    }
}

impl InputInjector for LoggingInjector {
    fn mouse_move(&self, dx: i16, dy: i16) -> Result<(), InjectError> {
        debug!(dx, dy, "mouse move");
        Ok(())
    }

    fn mouse_button(&self, button: MouseButton, pressed: bool) -> Result<(), InjectError> {
        debug!(?button, pressed, "mouse button");
        Ok(())
    }

    fn mouse_wheel(&self, dy: i16) -> Result<(), InjectError> {
        debug!(dy, "mouse wheel");
        Ok(())
    }

    fn key(
        &self,
        usage: HidUsage,
        pressed: bool,
        report: &KeyboardReport,
    ) -> Result<(), InjectError> {
        debug!(
            usage = format_args!("0x{:02X}", usage.0),
            code = hid_to_dom_code(usage).unwrap_or("?"),
            pressed,
            report = ?report.to_bytes(),
            "key"
        );
        Ok(())
    }

    fn gamepad(&self, report: &XusbReport) -> Result<(), InjectError> {
        debug!(
            buttons = format_args!("0x{:04X}", report.buttons),
            lt = report.left_trigger,
            rt = report.right_trigger,
            lx = report.thumb_lx,
            ly = report.thumb_ly,
            rx = report.thumb_rx,
            ry = report.thumb_ry,
            "pad report"
        );
        Ok(())
    }

    fn gamepad_connected(&self, connected: bool) -> Result<(), InjectError> {
        if connected {
            info!("virtual pad plugged");
        } else {
            info!("virtual pad unplugged");
        }
        Ok(())
    }
}
