//! Mock input device for unit and integration testing.
//!
//! Every call is pushed into a `Mutex<Vec<...>>` so tests can inspect exactly
//! what reached the device and in what order.  Set `should_fail = true` to
//! make every method return [`InjectError::Device`].

use std::sync::Mutex;

use relay_core::keymap::dom::HidUsage;
use relay_core::protocol::messages::MouseButton;

use crate::application::inject::{InjectError, InputInjector};
use crate::domain::{KeyboardReport, XusbReport};

/// A device that records all calls.
#[derive(Default)]
pub struct MockInjector {
    /// (dx, dy) pairs from `mouse_move`.
    pub mouse_moves: Mutex<Vec<(i16, i16)>>,
    /// (button, pressed) pairs from `mouse_button`.
    pub mouse_buttons: Mutex<Vec<(MouseButton, bool)>>,
    pub wheels: Mutex<Vec<i16>>,
    /// (usage, pressed, report after the change) from `key`.
    pub keys: Mutex<Vec<(HidUsage, bool, KeyboardReport)>>,
    pub pad_reports: Mutex<Vec<XusbReport>>,
    /// Every plug (`true`) and unplug (`false`).
    pub connections: Mutex<Vec<bool>>,
    pub should_fail: bool,
}

impl MockInjector {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(&self) -> Result<(), InjectError> {
        if self.should_fail {
            return Err(InjectError::Device("mock failure".to_string()));
        }
        Ok(())
    }

    /// Total number of recorded calls of any kind.
    pub fn call_count(&self) -> usize {
        self.mouse_moves.lock().map(|v| v.len()).unwrap_or(0)
            + self.mouse_buttons.lock().map(|v| v.len()).unwrap_or(0)
            + self.wheels.lock().map(|v| v.len()).unwrap_or(0)
            + self.keys.lock().map(|v| v.len()).unwrap_or(0)
            + self.pad_reports.lock().map(|v| v.len()).unwrap_or(0)
            + self.connections.lock().map(|v| v.len()).unwrap_or(0)
    }
}

fn record<T>(log: &Mutex<Vec<T>>, item: T) -> Result<(), InjectError> {
    log.lock()
        .map_err(|_| InjectError::Device("mock lock poisoned".to_string()))?
        .push(item);
    Ok(())
}

impl InputInjector for MockInjector {
    fn mouse_move(&self, dx: i16, dy: i16) -> Result<(), InjectError> {
        self.check()?;
        record(&self.mouse_moves, (dx, dy))
    }

    fn mouse_button(&self, button: MouseButton, pressed: bool) -> Result<(), InjectError> {
        self.check()?;
        record(&self.mouse_buttons, (button, pressed))
    }

    fn mouse_wheel(&self, dy: i16) -> Result<(), InjectError> {
        self.check()?;
        record(&self.wheels, dy)
    }

    fn key(
        &self,
        usage: HidUsage,
        pressed: bool,
        report: &KeyboardReport,
    ) -> Result<(), InjectError> {
        self.check()?;
        record(&self.keys, (usage, pressed, *report))
    }

    fn gamepad(&self, report: &XusbReport) -> Result<(), InjectError> {
        self.check()?;
        record(&self.pad_reports, *report)
    }

    fn gamepad_connected(&self, connected: bool) -> Result<(), InjectError> {
        self.check()?;
        record(&self.connections, connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_records_calls_in_order() {
        // Arrange
        let mock = MockInjector::new();

        // Act
        mock.mouse_move(1, 2).unwrap();
        mock.mouse_move(-3, 4).unwrap();
        mock.gamepad_connected(true).unwrap();

        // Assert
        assert_eq!(*mock.mouse_moves.lock().unwrap(), vec![(1, 2), (-3, 4)]);
        assert_eq!(mock.call_count(), 3);
    }

    #[test]
    fn test_should_fail_records_nothing() {
        let mock = MockInjector {
            should_fail: true,
            ..MockInjector::default()
        };

        assert!(mock.mouse_wheel(120).is_err());
        assert!(mock
            .key(HidUsage(0x04), true, &KeyboardReport::default())
            .is_err());
        assert_eq!(mock.call_count(), 0);
    }
}
