//! JSON text variant of the event protocol.
//!
//! Text-only clients send one JSON object per message with a `t` field naming
//! the event family:
//!
//! ```json
//! {"t":"key","code":"KeyA","down":true}
//! {"t":"mouse","dx":4,"dy":-2}
//! {"t":"pad","buttons":1}
//! ```
//!
//! The relay only reads `t`; every other field passes through untouched to the
//! injector as one newline-delimited JSON line.

use serde_json::Value;
use thiserror::Error;

use crate::domain::capabilities::InputClass;

/// Errors produced while classifying a JSON text event.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JsonEventError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("event is not a JSON object")]
    NotAnObject,

    #[error("event has no string \"t\" field")]
    MissingDiscriminant,

    #[error("unknown event family: {0:?}")]
    UnknownDiscriminant(String),
}

/// The event family named by the `t` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonEventKind {
    Key,
    Mouse,
    Pad,
}

impl JsonEventKind {
    /// The capability class this family requires.
    pub fn input_class(self) -> InputClass {
        match self {
            JsonEventKind::Key => InputClass::Keyboard,
            JsonEventKind::Mouse => InputClass::Mouse,
            JsonEventKind::Pad => InputClass::Gamepad,
        }
    }
}

/// Reads the `t` discriminant of a JSON text event.
///
/// # Errors
///
/// Returns [`JsonEventError`] if the text is not a JSON object or `t` is
/// missing, not a string, or not one of `key`, `mouse`, `pad`.
pub fn classify_text(text: &str) -> Result<JsonEventKind, JsonEventError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| JsonEventError::InvalidJson(e.to_string()))?;
    let object = value.as_object().ok_or(JsonEventError::NotAnObject)?;
    let t = object
        .get("t")
        .and_then(Value::as_str)
        .ok_or(JsonEventError::MissingDiscriminant)?;
    match t {
        "key" => Ok(JsonEventKind::Key),
        "mouse" => Ok(JsonEventKind::Mouse),
        "pad" => Ok(JsonEventKind::Pad),
        other => Err(JsonEventError::UnknownDiscriminant(other.to_string())),
    }
}

/// Produces the NDJSON datagram for a text event: the trimmed text plus `\n`.
pub fn to_ndjson(text: &str) -> Vec<u8> {
    let trimmed = text.trim();
    let mut line = Vec::with_capacity(trimmed.len() + 1);
    line.extend_from_slice(trimmed.as_bytes());
    line.push(b'\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_each_family() {
        assert_eq!(
            classify_text(r#"{"t":"key","code":"KeyA"}"#),
            Ok(JsonEventKind::Key)
        );
        assert_eq!(
            classify_text(r#"{"t":"mouse","dx":1}"#),
            Ok(JsonEventKind::Mouse)
        );
        assert_eq!(classify_text(r#"{"t":"pad"}"#), Ok(JsonEventKind::Pad));
    }

    #[test]
    fn test_kind_maps_to_class() {
        assert_eq!(JsonEventKind::Key.input_class(), InputClass::Keyboard);
        assert_eq!(JsonEventKind::Mouse.input_class(), InputClass::Mouse);
        assert_eq!(JsonEventKind::Pad.input_class(), InputClass::Gamepad);
    }

    #[test]
    fn test_classify_rejects_garbage() {
        assert!(matches!(
            classify_text("{not json"),
            Err(JsonEventError::InvalidJson(_))
        ));
        assert_eq!(classify_text("[1,2]"), Err(JsonEventError::NotAnObject));
        assert_eq!(
            classify_text(r#"{"code":"KeyA"}"#),
            Err(JsonEventError::MissingDiscriminant)
        );
        assert_eq!(
            classify_text(r#"{"t":7}"#),
            Err(JsonEventError::MissingDiscriminant)
        );
        assert_eq!(
            classify_text(r#"{"t":"touch"}"#),
            Err(JsonEventError::UnknownDiscriminant("touch".to_string()))
        );
    }

    #[test]
    fn test_to_ndjson_trims_and_terminates() {
        assert_eq!(to_ndjson("  {\"t\":\"key\"}\r\n"), b"{\"t\":\"key\"}\n".to_vec());
    }
}
