//! DOM `KeyboardEvent.code` → USB HID Usage ID translation.
//!
//! Browsers report physical key positions as strings such as `"KeyA"` or
//! `"ShiftLeft"`.  Virtual keyboards consume USB HID Usage IDs from the
//! Keyboard/Keypad page (0x07).  Both are position codes, so the mapping is
//! layout-independent.
//!
//! | DOM code      | HID Usage ID |
//! |---------------|-------------|
//! | `KeyA`        | 0x04        |
//! | `Enter`       | 0x28        |
//! | `ControlLeft` | 0xE0        |

use serde::{Deserialize, Serialize};

/// A USB HID Usage ID on the Keyboard/Keypad page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HidUsage(pub u8);

impl HidUsage {
    /// Returns `true` for the eight modifier keys (0xE0–0xE7).
    pub fn is_modifier(self) -> bool {
        (0xE0..=0xE7).contains(&self.0)
    }

    /// Bit of this modifier in a boot-protocol keyboard report's modifier
    /// byte, or `None` for ordinary keys.
    pub fn modifier_bit(self) -> Option<u8> {
        if self.is_modifier() {
            Some(1 << (self.0 - 0xE0))
        } else {
            None
        }
    }
}

/// Every DOM code the relay knows, paired with its HID usage.
const DOM_TO_HID: &[(&str, u8)] = &[
    // Letters
    ("KeyA", 0x04),
    ("KeyB", 0x05),
    ("KeyC", 0x06),
    ("KeyD", 0x07),
    ("KeyE", 0x08),
    ("KeyF", 0x09),
    ("KeyG", 0x0A),
    ("KeyH", 0x0B),
    ("KeyI", 0x0C),
    ("KeyJ", 0x0D),
    ("KeyK", 0x0E),
    ("KeyL", 0x0F),
    ("KeyM", 0x10),
    ("KeyN", 0x11),
    ("KeyO", 0x12),
    ("KeyP", 0x13),
    ("KeyQ", 0x14),
    ("KeyR", 0x15),
    ("KeyS", 0x16),
    ("KeyT", 0x17),
    ("KeyU", 0x18),
    ("KeyV", 0x19),
    ("KeyW", 0x1A),
    ("KeyX", 0x1B),
    ("KeyY", 0x1C),
    ("KeyZ", 0x1D),
    // Digit row
    ("Digit1", 0x1E),
    ("Digit2", 0x1F),
    ("Digit3", 0x20),
    ("Digit4", 0x21),
    ("Digit5", 0x22),
    ("Digit6", 0x23),
    ("Digit7", 0x24),
    ("Digit8", 0x25),
    ("Digit9", 0x26),
    ("Digit0", 0x27),
    // Control and punctuation
    ("Enter", 0x28),
    ("Escape", 0x29),
    ("Backspace", 0x2A),
    ("Tab", 0x2B),
    ("Space", 0x2C),
    ("Minus", 0x2D),
    ("Equal", 0x2E),
    ("BracketLeft", 0x2F),
    ("BracketRight", 0x30),
    ("Backslash", 0x31),
    ("Semicolon", 0x33),
    ("Quote", 0x34),
    ("Backquote", 0x35),
    ("Comma", 0x36),
    ("Period", 0x37),
    ("Slash", 0x38),
    ("CapsLock", 0x39),
    // Function row
    ("F1", 0x3A),
    ("F2", 0x3B),
    ("F3", 0x3C),
    ("F4", 0x3D),
    ("F5", 0x3E),
    ("F6", 0x3F),
    ("F7", 0x40),
    ("F8", 0x41),
    ("F9", 0x42),
    ("F10", 0x43),
    ("F11", 0x44),
    ("F12", 0x45),
    // Navigation cluster
    ("PrintScreen", 0x46),
    ("ScrollLock", 0x47),
    ("Pause", 0x48),
    ("Insert", 0x49),
    ("Home", 0x4A),
    ("PageUp", 0x4B),
    ("Delete", 0x4C),
    ("End", 0x4D),
    ("PageDown", 0x4E),
    ("ArrowRight", 0x4F),
    ("ArrowLeft", 0x50),
    ("ArrowDown", 0x51),
    ("ArrowUp", 0x52),
    // Numpad
    ("NumLock", 0x53),
    ("NumpadDivide", 0x54),
    ("NumpadMultiply", 0x55),
    ("NumpadSubtract", 0x56),
    ("NumpadAdd", 0x57),
    ("NumpadEnter", 0x58),
    ("Numpad1", 0x59),
    ("Numpad2", 0x5A),
    ("Numpad3", 0x5B),
    ("Numpad4", 0x5C),
    ("Numpad5", 0x5D),
    ("Numpad6", 0x5E),
    ("Numpad7", 0x5F),
    ("Numpad8", 0x60),
    ("Numpad9", 0x61),
    ("Numpad0", 0x62),
    ("NumpadDecimal", 0x63),
    ("ContextMenu", 0x65),
    // Modifiers
    ("ControlLeft", 0xE0),
    ("ShiftLeft", 0xE1),
    ("AltLeft", 0xE2),
    ("MetaLeft", 0xE3),
    ("ControlRight", 0xE4),
    ("ShiftRight", 0xE5),
    ("AltRight", 0xE6),
    ("MetaRight", 0xE7),
];

/// Translates a DOM `KeyboardEvent.code` string to its HID usage.
///
/// Returns `None` for codes with no mapping (media keys, IME keys, typos).
/// Matching is case-sensitive, as DOM codes are.
pub fn dom_code_to_hid(code: &str) -> Option<HidUsage> {
    DOM_TO_HID
        .iter()
        .find(|(dom, _)| *dom == code)
        .map(|&(_, usage)| HidUsage(usage))
}

/// Translates a HID usage back to its DOM code string.
pub fn hid_to_dom_code(usage: HidUsage) -> Option<&'static str> {
    DOM_TO_HID
        .iter()
        .find(|&&(_, u)| u == usage.0)
        .map(|&(dom, _)| dom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_letters_start_at_0x04() {
        assert_eq!(dom_code_to_hid("KeyA"), Some(HidUsage(0x04)));
        assert_eq!(dom_code_to_hid("KeyZ"), Some(HidUsage(0x1D)));
    }

    #[test]
    fn test_digit_zero_follows_nine() {
        assert_eq!(dom_code_to_hid("Digit9"), Some(HidUsage(0x26)));
        assert_eq!(dom_code_to_hid("Digit0"), Some(HidUsage(0x27)));
    }

    #[test]
    fn test_non_us_hash_slot_is_skipped() {
        // 0x32 is the non-US '#' key, which has no DOM code of its own here.
        assert_eq!(dom_code_to_hid("Backslash"), Some(HidUsage(0x31)));
        assert_eq!(dom_code_to_hid("Semicolon"), Some(HidUsage(0x33)));
        assert_eq!(hid_to_dom_code(HidUsage(0x32)), None);
    }

    #[test]
    fn test_unknown_and_wrong_case_codes_are_unmapped() {
        assert_eq!(dom_code_to_hid("MediaPlayPause"), None);
        assert_eq!(dom_code_to_hid("keya"), None);
        assert_eq!(dom_code_to_hid(""), None);
    }

    #[test]
    fn test_table_round_trips_both_directions() {
        for &(dom, usage) in DOM_TO_HID {
            // Arrange / Act
            let hid = dom_code_to_hid(dom).unwrap();
            let back = hid_to_dom_code(hid).unwrap();

            // Assert
            assert_eq!(hid, HidUsage(usage));
            assert_eq!(back, dom, "usage 0x{usage:02X} should map back to {dom}");
        }
    }

    #[test]
    fn test_table_has_no_duplicate_codes_or_usages() {
        let codes: HashSet<_> = DOM_TO_HID.iter().map(|(d, _)| *d).collect();
        let usages: HashSet<_> = DOM_TO_HID.iter().map(|(_, u)| *u).collect();
        assert_eq!(codes.len(), DOM_TO_HID.len());
        assert_eq!(usages.len(), DOM_TO_HID.len());
    }

    #[test]
    fn test_modifier_bits() {
        assert_eq!(HidUsage(0xE0).modifier_bit(), Some(0x01));
        assert_eq!(HidUsage(0xE1).modifier_bit(), Some(0x02));
        assert_eq!(HidUsage(0xE7).modifier_bit(), Some(0x80));
        assert_eq!(HidUsage(0x04).modifier_bit(), None);
        assert!(!HidUsage(0x65).is_modifier());
    }
}
