//! Capability model: which input classes the relay currently accepts.
//!
//! A [`CapabilitySet`] always holds exactly three flags, one per
//! [`InputClass`].  The process-wide copy lives inside a [`CapabilityStore`],
//! which is the only place the flags can be changed.
//!
//! # Partial updates
//!
//! The administrative toggle sends a JSON object that may mention any subset
//! of the three classes:
//!
//! ```json
//! {"gamepad": true}
//! ```
//!
//! Classes that are not mentioned keep their current value.  Keys that do not
//! name a class (e.g. `"touch"`) are ignored, not rejected, so older gateways
//! tolerate newer admin tools.

use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

// ── Input classes ─────────────────────────────────────────────────────────────

/// A category of input that the relay accepts or rejects as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputClass {
    Keyboard,
    Mouse,
    Gamepad,
}

impl InputClass {
    /// All classes, in wire order.
    pub const ALL: [InputClass; 3] = [InputClass::Keyboard, InputClass::Mouse, InputClass::Gamepad];

    /// The key used for this class in every JSON document.
    pub fn as_str(self) -> &'static str {
        match self {
            InputClass::Keyboard => "keyboard",
            InputClass::Mouse => "mouse",
            InputClass::Gamepad => "gamepad",
        }
    }

    /// Parses a JSON key into a class.  Returns `None` for unrecognised keys.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "keyboard" => Some(InputClass::Keyboard),
            "mouse" => Some(InputClass::Mouse),
            "gamepad" => Some(InputClass::Gamepad),
            _ => None,
        }
    }
}

impl fmt::Display for InputClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Capability set ────────────────────────────────────────────────────────────

/// Snapshot of the enabled flag for every input class.
///
/// Serializes as `{"keyboard":true,"mouse":true,"gamepad":false}`.  Missing
/// fields fall back to [`CapabilitySet::default`] when deserializing, so a
/// defaults document only needs to list the classes it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilitySet {
    pub keyboard: bool,
    pub mouse: bool,
    pub gamepad: bool,
}

impl Default for CapabilitySet {
    /// Keyboard and mouse on, gamepad off.
    fn default() -> Self {
        Self {
            keyboard: true,
            mouse: true,
            gamepad: false,
        }
    }
}

impl CapabilitySet {
    /// Returns whether `class` is enabled in this snapshot.
    pub fn is_enabled(&self, class: InputClass) -> bool {
        match class {
            InputClass::Keyboard => self.keyboard,
            InputClass::Mouse => self.mouse,
            InputClass::Gamepad => self.gamepad,
        }
    }

    fn set(&mut self, class: InputClass, enabled: bool) {
        match class {
            InputClass::Keyboard => self.keyboard = enabled,
            InputClass::Mouse => self.mouse = enabled,
            InputClass::Gamepad => self.gamepad = enabled,
        }
    }

    /// Applies every flag present in `update`, leaving the rest untouched.
    pub fn apply(&mut self, update: &CapabilityUpdate) {
        for class in InputClass::ALL {
            if let Some(enabled) = update.get(class) {
                self.set(class, enabled);
            }
        }
    }
}

// ── Partial update ────────────────────────────────────────────────────────────

/// Error returned when an administrative update body cannot be understood.
#[derive(Debug, Error, PartialEq)]
pub enum UpdateError {
    /// The body is not valid JSON.
    #[error("invalid json: {0}")]
    InvalidJson(String),

    /// The body is valid JSON but not an object.
    #[error("expected a JSON object")]
    NotAnObject,

    /// A recognised class key carried a non-boolean value.
    #[error("value for '{0}' must be a boolean")]
    NotABoolean(InputClass),
}

/// A partial capability change: `None` means "leave unchanged".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilityUpdate {
    pub keyboard: Option<bool>,
    pub mouse: Option<bool>,
    pub gamepad: Option<bool>,
}

impl CapabilityUpdate {
    /// Returns the requested value for `class`, if any.
    pub fn get(&self, class: InputClass) -> Option<bool> {
        match class {
            InputClass::Keyboard => self.keyboard,
            InputClass::Mouse => self.mouse,
            InputClass::Gamepad => self.gamepad,
        }
    }

    /// Builds an update that sets a single class.
    pub fn only(class: InputClass, enabled: bool) -> Self {
        let mut update = Self::default();
        match class {
            InputClass::Keyboard => update.keyboard = Some(enabled),
            InputClass::Mouse => update.mouse = Some(enabled),
            InputClass::Gamepad => update.gamepad = Some(enabled),
        }
        update
    }

    /// Parses an update from raw JSON bytes.
    ///
    /// The body must be a JSON object.  Unknown keys are skipped; a recognised
    /// key whose value is not a boolean rejects the whole body so a half-valid
    /// request never mutates the store.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError`] when the body is not a JSON object or a class
    /// key has a non-boolean value.
    pub fn from_json_slice(body: &[u8]) -> Result<Self, UpdateError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| UpdateError::InvalidJson(e.to_string()))?;
        match value {
            Value::Object(map) => Self::from_map(&map),
            _ => Err(UpdateError::NotAnObject),
        }
    }

    fn from_map(map: &Map<String, Value>) -> Result<Self, UpdateError> {
        let mut update = Self::default();
        for (key, value) in map {
            // Unrecognised keys have no observable effect.
            let Some(class) = InputClass::from_key(key) else {
                continue;
            };
            let enabled = value.as_bool().ok_or(UpdateError::NotABoolean(class))?;
            match class {
                InputClass::Keyboard => update.keyboard = Some(enabled),
                InputClass::Mouse => update.mouse = Some(enabled),
                InputClass::Gamepad => update.gamepad = Some(enabled),
            }
        }
        Ok(update)
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

/// Process-wide, thread-safe holder of the current [`CapabilitySet`].
///
/// Every read returns a copy, so a reader never observes a half-applied
/// update.  A single `Mutex` is enough: the set is three booleans and changes
/// only when an operator flips a switch.  The lock is never held across an
/// `.await`.
///
/// # Example
///
/// ```rust
/// use relay_core::{CapabilitySet, CapabilityStore, CapabilityUpdate, InputClass};
///
/// let store = CapabilityStore::new(CapabilitySet::default());
/// assert!(!store.is_enabled(InputClass::Gamepad));
///
/// let after = store.set(&CapabilityUpdate::only(InputClass::Gamepad, true));
/// assert!(after.gamepad);
/// assert!(store.get().gamepad);
/// ```
#[derive(Debug, Default)]
pub struct CapabilityStore {
    inner: Mutex<CapabilitySet>,
}

impl CapabilityStore {
    /// Creates a store seeded with `initial`.
    pub fn new(initial: CapabilitySet) -> Self {
        Self {
            inner: Mutex::new(initial),
        }
    }

    /// Returns a snapshot of the current set.
    pub fn get(&self) -> CapabilitySet {
        *self.lock()
    }

    /// Applies `update` and returns the resulting full set.
    pub fn set(&self, update: &CapabilityUpdate) -> CapabilitySet {
        let mut guard = self.lock();
        guard.apply(update);
        *guard
    }

    /// Returns whether `class` is currently enabled.
    pub fn is_enabled(&self, class: InputClass) -> bool {
        self.lock().is_enabled(class)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CapabilitySet> {
        // A panic while holding the lock cannot leave three booleans in an
        // invalid state, so a poisoned lock is still safe to use.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_default_set_enables_keyboard_and_mouse_only() {
        let caps = CapabilitySet::default();
        assert!(caps.keyboard);
        assert!(caps.mouse);
        assert!(!caps.gamepad);
    }

    #[test]
    fn test_set_serializes_with_class_keys() {
        // Arrange
        let caps = CapabilitySet {
            keyboard: true,
            mouse: false,
            gamepad: true,
        };

        // Act
        let json = serde_json::to_value(caps).unwrap();

        // Assert
        assert_eq!(
            json,
            serde_json::json!({"keyboard": true, "mouse": false, "gamepad": true})
        );
    }

    #[test]
    fn test_set_deserializes_missing_fields_from_defaults() {
        let caps: CapabilitySet = serde_json::from_str(r#"{"gamepad": true}"#).unwrap();
        assert_eq!(
            caps,
            CapabilitySet {
                keyboard: true,
                mouse: true,
                gamepad: true
            }
        );
    }

    #[test]
    fn test_store_get_returns_initial_snapshot() {
        let initial = CapabilitySet {
            keyboard: false,
            mouse: true,
            gamepad: true,
        };
        let store = CapabilityStore::new(initial);
        assert_eq!(store.get(), initial);
    }

    #[test]
    fn test_store_set_updates_only_specified_keys() {
        // Arrange
        let store = CapabilityStore::new(CapabilitySet::default());
        let update = CapabilityUpdate {
            keyboard: Some(false),
            mouse: None,
            gamepad: Some(true),
        };

        // Act
        let returned = store.set(&update);

        // Assert: updated keys reflect the request, the untouched key keeps its value
        let after = store.get();
        assert_eq!(returned, after);
        assert!(!after.keyboard);
        assert!(after.mouse);
        assert!(after.gamepad);
    }

    #[test]
    fn test_store_set_with_empty_update_is_a_no_op() {
        let store = CapabilityStore::new(CapabilitySet::default());
        let after = store.set(&CapabilityUpdate::default());
        assert_eq!(after, CapabilitySet::default());
    }

    #[test]
    fn test_store_is_enabled_tracks_updates() {
        let store = CapabilityStore::new(CapabilitySet::default());
        assert!(!store.is_enabled(InputClass::Gamepad));
        store.set(&CapabilityUpdate::only(InputClass::Gamepad, true));
        assert!(store.is_enabled(InputClass::Gamepad));
    }

    #[test]
    fn test_get_returns_copy_not_live_reference() {
        // Arrange
        let store = CapabilityStore::new(CapabilitySet::default());
        let snapshot = store.get();

        // Act
        store.set(&CapabilityUpdate::only(InputClass::Keyboard, false));

        // Assert: the earlier snapshot is unaffected
        assert!(snapshot.keyboard);
        assert!(!store.get().keyboard);
    }

    #[test]
    fn test_store_is_safe_under_concurrent_writers() {
        // Arrange
        let store = Arc::new(CapabilityStore::new(CapabilitySet::default()));

        // Act: many threads flip the gamepad flag while others read
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        store.set(&CapabilityUpdate::only(InputClass::Gamepad, i % 2 == 0));
                        let _ = store.get();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        // Assert: keys no writer touched are intact
        let after = store.get();
        assert!(after.keyboard);
        assert!(after.mouse);
    }

    // ── CapabilityUpdate parsing ──────────────────────────────────────────────

    #[test]
    fn test_update_parses_recognised_keys() {
        let update = CapabilityUpdate::from_json_slice(br#"{"keyboard": false, "gamepad": true}"#)
            .unwrap();
        assert_eq!(update.keyboard, Some(false));
        assert_eq!(update.mouse, None);
        assert_eq!(update.gamepad, Some(true));
    }

    #[test]
    fn test_update_ignores_unrecognised_keys() {
        // Arrange: only unknown keys
        let update =
            CapabilityUpdate::from_json_slice(br#"{"touch": true, "pen": "yes"}"#).unwrap();

        // Act
        let store = CapabilityStore::new(CapabilitySet::default());
        let after = store.set(&update);

        // Assert: no observable effect on the stored set
        assert_eq!(update, CapabilityUpdate::default());
        assert_eq!(after, CapabilitySet::default());
    }

    #[test]
    fn test_update_rejects_invalid_json() {
        let result = CapabilityUpdate::from_json_slice(b"{not json");
        assert!(matches!(result, Err(UpdateError::InvalidJson(_))));
    }

    #[test]
    fn test_update_rejects_non_object_body() {
        assert_eq!(
            CapabilityUpdate::from_json_slice(b"[true, false]"),
            Err(UpdateError::NotAnObject)
        );
    }

    #[test]
    fn test_update_rejects_non_boolean_value_for_known_key() {
        assert_eq!(
            CapabilityUpdate::from_json_slice(br#"{"mouse": 1}"#),
            Err(UpdateError::NotABoolean(InputClass::Mouse))
        );
    }

    #[test]
    fn test_input_class_keys_round_trip() {
        for class in InputClass::ALL {
            assert_eq!(InputClass::from_key(class.as_str()), Some(class));
        }
        assert_eq!(InputClass::from_key("touch"), None);
    }
}
