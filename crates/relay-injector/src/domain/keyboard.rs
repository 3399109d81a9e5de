//! Boot-protocol keyboard report state.
//!
//! A virtual HID keyboard is driven with 8-byte boot reports: one modifier
//! byte, one reserved byte, and up to six usages of keys currently held.
//! [`KeyboardState`] tracks what is held so each key event becomes a full
//! report, and so a repeated key-down (browsers auto-repeat) changes nothing.

use relay_core::keymap::dom::HidUsage;

/// Number of non-modifier keys a boot report can carry.
pub const MAX_PRESSED_KEYS: usize = 6;

/// One boot-protocol keyboard input report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyboardReport {
    /// Bitmask of held modifiers (bit 0 = LeftCtrl ... bit 7 = RightGUI).
    pub modifiers: u8,
    /// Held key usages in press order; unused slots are zero.
    pub keys: [u8; MAX_PRESSED_KEYS],
}

impl KeyboardReport {
    /// Wire layout: `[modifiers, 0, k0, k1, k2, k3, k4, k5]`.
    pub fn to_bytes(&self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[0] = self.modifiers;
        out[2..].copy_from_slice(&self.keys);
        out
    }
}

/// Keys currently held on the virtual keyboard.
#[derive(Debug, Default)]
pub struct KeyboardState {
    modifiers: u8,
    pressed: Vec<HidUsage>,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `usage` as held.
    ///
    /// Returns `false` when nothing changed: the key was already held, or six
    /// ordinary keys are held already and the press is dropped.
    pub fn press(&mut self, usage: HidUsage) -> bool {
        if let Some(bit) = usage.modifier_bit() {
            let changed = self.modifiers & bit == 0;
            self.modifiers |= bit;
            return changed;
        }
        if self.pressed.contains(&usage) || self.pressed.len() >= MAX_PRESSED_KEYS {
            return false;
        }
        self.pressed.push(usage);
        true
    }

    /// Marks `usage` as released.  Returns `false` if it was not held.
    pub fn release(&mut self, usage: HidUsage) -> bool {
        if let Some(bit) = usage.modifier_bit() {
            let changed = self.modifiers & bit != 0;
            self.modifiers &= !bit;
            return changed;
        }
        let before = self.pressed.len();
        self.pressed.retain(|held| *held != usage);
        self.pressed.len() != before
    }

    /// Returns every held key, modifiers included, and clears the state.
    pub fn release_all(&mut self) -> Vec<HidUsage> {
        let mut held: Vec<HidUsage> = (0..8u8)
            .filter(|bit| self.modifiers & (1 << bit) != 0)
            .map(|bit| HidUsage(0xE0 + bit))
            .collect();
        held.append(&mut self.pressed);
        self.modifiers = 0;
        held
    }

    pub fn is_pressed(&self, usage: HidUsage) -> bool {
        match usage.modifier_bit() {
            Some(bit) => self.modifiers & bit != 0,
            None => self.pressed.contains(&usage),
        }
    }

    /// The report describing the current state.
    pub fn report(&self) -> KeyboardReport {
        let mut keys = [0u8; MAX_PRESSED_KEYS];
        for (slot, usage) in keys.iter_mut().zip(&self.pressed) {
            *slot = usage.0;
        }
        KeyboardReport {
            modifiers: self.modifiers,
            keys,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_A: HidUsage = HidUsage(0x04);
    const KEY_B: HidUsage = HidUsage(0x05);
    const SHIFT_LEFT: HidUsage = HidUsage(0xE1);

    #[test]
    fn test_press_adds_key_to_report() {
        // Arrange
        let mut state = KeyboardState::new();

        // Act
        let changed = state.press(KEY_A);

        // Assert
        assert!(changed);
        assert_eq!(state.report().to_bytes(), [0, 0, 0x04, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_repeated_press_is_not_a_change() {
        let mut state = KeyboardState::new();
        state.press(KEY_A);
        assert!(!state.press(KEY_A));
        assert_eq!(state.report().keys, [0x04, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_modifier_sets_its_bit_only() {
        let mut state = KeyboardState::new();

        state.press(SHIFT_LEFT);
        state.press(KEY_B);

        let report = state.report();
        assert_eq!(report.modifiers, 0x02);
        assert_eq!(report.keys, [0x05, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_release_removes_key_and_keeps_order() {
        let mut state = KeyboardState::new();
        for usage in [0x04, 0x05, 0x06] {
            state.press(HidUsage(usage));
        }

        assert!(state.release(KEY_B));

        assert_eq!(state.report().keys, [0x04, 0x06, 0, 0, 0, 0]);
    }

    #[test]
    fn test_release_of_unheld_key_is_not_a_change() {
        let mut state = KeyboardState::new();
        assert!(!state.release(KEY_A));
        assert!(!state.release(SHIFT_LEFT));
    }

    #[test]
    fn test_seventh_key_is_dropped() {
        // Arrange: six keys held
        let mut state = KeyboardState::new();
        for usage in 0x04..0x0A {
            assert!(state.press(HidUsage(usage)));
        }

        // Act
        let changed = state.press(HidUsage(0x0A));

        // Assert
        assert!(!changed);
        assert!(!state.is_pressed(HidUsage(0x0A)));
        assert_eq!(state.report().keys, [0x04, 0x05, 0x06, 0x07, 0x08, 0x09]);
    }

    #[test]
    fn test_modifiers_do_not_count_towards_rollover() {
        let mut state = KeyboardState::new();
        for usage in 0x04..0x0A {
            state.press(HidUsage(usage));
        }
        assert!(state.press(HidUsage(0xE0)));
    }

    #[test]
    fn test_release_all_returns_modifiers_then_keys() {
        let mut state = KeyboardState::new();
        state.press(KEY_A);
        state.press(HidUsage(0xE4));
        state.press(SHIFT_LEFT);

        let held = state.release_all();

        assert_eq!(held, vec![SHIFT_LEFT, HidUsage(0xE4), KEY_A]);
        assert_eq!(state.report(), KeyboardReport::default());
    }
}
