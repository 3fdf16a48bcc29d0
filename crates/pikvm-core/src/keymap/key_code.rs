//! Key names understood by the kvmd HID API.
//!
//! kvmd identifies keys by the web `KeyboardEvent.code` string of the
//! physical key (`"KeyA"`, `"Enter"`, `"ControlLeft"`, ...), independent of
//! the active keyboard layout.  The same strings are used by the HTTP
//! `send_key` endpoint and by `key` events on the WebSocket.
//!
//! # Why a typed enum instead of plain strings?
//!
//! A misspelt key name (`"Backspase"`) is silently ignored by the device.
//! Parsing names into [`KeyCode`] at the edge (CLI arguments, action files)
//! turns that into an early, descriptive error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a key name does not match any known [`KeyCode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyCodeError {
    #[error("unknown key name: {0:?}")]
    Unknown(String),
}

/// A physical key, named after its web `KeyboardEvent.code` string.
///
/// The variant name is the wire name; serde uses it unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    // Letters
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF,
    KeyG,
    KeyH,
    KeyI,
    KeyJ,
    KeyK,
    KeyL,
    KeyM,
    KeyN,
    KeyO,
    KeyP,
    KeyQ,
    KeyR,
    KeyS,
    KeyT,
    KeyU,
    KeyV,
    KeyW,
    KeyX,
    KeyY,
    KeyZ,

    // Digits
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    Digit0,

    // Control keys
    Enter,
    Escape,
    Backspace,
    Tab,
    Space,
    Minus,
    Equal,
    BracketLeft,
    BracketRight,
    Backslash,
    Semicolon,
    Quote,
    Backquote,
    Comma,
    Period,
    Slash,

    // Lock keys
    CapsLock,

    // Function keys
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,

    // Navigation cluster
    PrintScreen,
    ScrollLock,
    Pause,
    Insert,
    Home,
    PageUp,
    Delete,
    End,
    PageDown,
    ArrowRight,
    ArrowLeft,
    ArrowDown,
    ArrowUp,

    // Numpad
    NumLock,
    NumpadDivide,
    NumpadMultiply,
    NumpadSubtract,
    NumpadAdd,
    NumpadEnter,
    Numpad1,
    Numpad2,
    Numpad3,
    Numpad4,
    Numpad5,
    Numpad6,
    Numpad7,
    Numpad8,
    Numpad9,
    Numpad0,
    NumpadDecimal,

    ContextMenu,

    // Modifiers
    ControlLeft,
    ShiftLeft,
    AltLeft,
    MetaLeft,
    ControlRight,
    ShiftRight,
    AltRight,
    MetaRight,
}

/// Every [`KeyCode`], in declaration order.
pub const ALL_KEYS: &[KeyCode] = &[
    KeyCode::KeyA,
    KeyCode::KeyB,
    KeyCode::KeyC,
    KeyCode::KeyD,
    KeyCode::KeyE,
    KeyCode::KeyF,
    KeyCode::KeyG,
    KeyCode::KeyH,
    KeyCode::KeyI,
    KeyCode::KeyJ,
    KeyCode::KeyK,
    KeyCode::KeyL,
    KeyCode::KeyM,
    KeyCode::KeyN,
    KeyCode::KeyO,
    KeyCode::KeyP,
    KeyCode::KeyQ,
    KeyCode::KeyR,
    KeyCode::KeyS,
    KeyCode::KeyT,
    KeyCode::KeyU,
    KeyCode::KeyV,
    KeyCode::KeyW,
    KeyCode::KeyX,
    KeyCode::KeyY,
    KeyCode::KeyZ,
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
    KeyCode::Digit0,
    KeyCode::Enter,
    KeyCode::Escape,
    KeyCode::Backspace,
    KeyCode::Tab,
    KeyCode::Space,
    KeyCode::Minus,
    KeyCode::Equal,
    KeyCode::BracketLeft,
    KeyCode::BracketRight,
    KeyCode::Backslash,
    KeyCode::Semicolon,
    KeyCode::Quote,
    KeyCode::Backquote,
    KeyCode::Comma,
    KeyCode::Period,
    KeyCode::Slash,
    KeyCode::CapsLock,
    KeyCode::F1,
    KeyCode::F2,
    KeyCode::F3,
    KeyCode::F4,
    KeyCode::F5,
    KeyCode::F6,
    KeyCode::F7,
    KeyCode::F8,
    KeyCode::F9,
    KeyCode::F10,
    KeyCode::F11,
    KeyCode::F12,
    KeyCode::PrintScreen,
    KeyCode::ScrollLock,
    KeyCode::Pause,
    KeyCode::Insert,
    KeyCode::Home,
    KeyCode::PageUp,
    KeyCode::Delete,
    KeyCode::End,
    KeyCode::PageDown,
    KeyCode::ArrowRight,
    KeyCode::ArrowLeft,
    KeyCode::ArrowDown,
    KeyCode::ArrowUp,
    KeyCode::NumLock,
    KeyCode::NumpadDivide,
    KeyCode::NumpadMultiply,
    KeyCode::NumpadSubtract,
    KeyCode::NumpadAdd,
    KeyCode::NumpadEnter,
    KeyCode::Numpad1,
    KeyCode::Numpad2,
    KeyCode::Numpad3,
    KeyCode::Numpad4,
    KeyCode::Numpad5,
    KeyCode::Numpad6,
    KeyCode::Numpad7,
    KeyCode::Numpad8,
    KeyCode::Numpad9,
    KeyCode::Numpad0,
    KeyCode::NumpadDecimal,
    KeyCode::ContextMenu,
    KeyCode::ControlLeft,
    KeyCode::ShiftLeft,
    KeyCode::AltLeft,
    KeyCode::MetaLeft,
    KeyCode::ControlRight,
    KeyCode::ShiftRight,
    KeyCode::AltRight,
    KeyCode::MetaRight,
];

impl KeyCode {
    /// Returns the kvmd wire name of this key.
    pub fn name(self) -> &'static str {
        match self {
            KeyCode::KeyA => "KeyA",
            KeyCode::KeyB => "KeyB",
            KeyCode::KeyC => "KeyC",
            KeyCode::KeyD => "KeyD",
            KeyCode::KeyE => "KeyE",
            KeyCode::KeyF => "KeyF",
            KeyCode::KeyG => "KeyG",
            KeyCode::KeyH => "KeyH",
            KeyCode::KeyI => "KeyI",
            KeyCode::KeyJ => "KeyJ",
            KeyCode::KeyK => "KeyK",
            KeyCode::KeyL => "KeyL",
            KeyCode::KeyM => "KeyM",
            KeyCode::KeyN => "KeyN",
            KeyCode::KeyO => "KeyO",
            KeyCode::KeyP => "KeyP",
            KeyCode::KeyQ => "KeyQ",
            KeyCode::KeyR => "KeyR",
            KeyCode::KeyS => "KeyS",
            KeyCode::KeyT => "KeyT",
            KeyCode::KeyU => "KeyU",
            KeyCode::KeyV => "KeyV",
            KeyCode::KeyW => "KeyW",
            KeyCode::KeyX => "KeyX",
            KeyCode::KeyY => "KeyY",
            KeyCode::KeyZ => "KeyZ",
            KeyCode::Digit1 => "Digit1",
            KeyCode::Digit2 => "Digit2",
            KeyCode::Digit3 => "Digit3",
            KeyCode::Digit4 => "Digit4",
            KeyCode::Digit5 => "Digit5",
            KeyCode::Digit6 => "Digit6",
            KeyCode::Digit7 => "Digit7",
            KeyCode::Digit8 => "Digit8",
            KeyCode::Digit9 => "Digit9",
            KeyCode::Digit0 => "Digit0",
            KeyCode::Enter => "Enter",
            KeyCode::Escape => "Escape",
            KeyCode::Backspace => "Backspace",
            KeyCode::Tab => "Tab",
            KeyCode::Space => "Space",
            KeyCode::Minus => "Minus",
            KeyCode::Equal => "Equal",
            KeyCode::BracketLeft => "BracketLeft",
            KeyCode::BracketRight => "BracketRight",
            KeyCode::Backslash => "Backslash",
            KeyCode::Semicolon => "Semicolon",
            KeyCode::Quote => "Quote",
            KeyCode::Backquote => "Backquote",
            KeyCode::Comma => "Comma",
            KeyCode::Period => "Period",
            KeyCode::Slash => "Slash",
            KeyCode::CapsLock => "CapsLock",
            KeyCode::F1 => "F1",
            KeyCode::F2 => "F2",
            KeyCode::F3 => "F3",
            KeyCode::F4 => "F4",
            KeyCode::F5 => "F5",
            KeyCode::F6 => "F6",
            KeyCode::F7 => "F7",
            KeyCode::F8 => "F8",
            KeyCode::F9 => "F9",
            KeyCode::F10 => "F10",
            KeyCode::F11 => "F11",
            KeyCode::F12 => "F12",
            KeyCode::PrintScreen => "PrintScreen",
            KeyCode::ScrollLock => "ScrollLock",
            KeyCode::Pause => "Pause",
            KeyCode::Insert => "Insert",
            KeyCode::Home => "Home",
            KeyCode::PageUp => "PageUp",
            KeyCode::Delete => "Delete",
            KeyCode::End => "End",
            KeyCode::PageDown => "PageDown",
            KeyCode::ArrowRight => "ArrowRight",
            KeyCode::ArrowLeft => "ArrowLeft",
            KeyCode::ArrowDown => "ArrowDown",
            KeyCode::ArrowUp => "ArrowUp",
            KeyCode::NumLock => "NumLock",
            KeyCode::NumpadDivide => "NumpadDivide",
            KeyCode::NumpadMultiply => "NumpadMultiply",
            KeyCode::NumpadSubtract => "NumpadSubtract",
            KeyCode::NumpadAdd => "NumpadAdd",
            KeyCode::NumpadEnter => "NumpadEnter",
            KeyCode::Numpad1 => "Numpad1",
            KeyCode::Numpad2 => "Numpad2",
            KeyCode::Numpad3 => "Numpad3",
            KeyCode::Numpad4 => "Numpad4",
            KeyCode::Numpad5 => "Numpad5",
            KeyCode::Numpad6 => "Numpad6",
            KeyCode::Numpad7 => "Numpad7",
            KeyCode::Numpad8 => "Numpad8",
            KeyCode::Numpad9 => "Numpad9",
            KeyCode::Numpad0 => "Numpad0",
            KeyCode::NumpadDecimal => "NumpadDecimal",
            KeyCode::ContextMenu => "ContextMenu",
            KeyCode::ControlLeft => "ControlLeft",
            KeyCode::ShiftLeft => "ShiftLeft",
            KeyCode::AltLeft => "AltLeft",
            KeyCode::MetaLeft => "MetaLeft",
            KeyCode::ControlRight => "ControlRight",
            KeyCode::ShiftRight => "ShiftRight",
            KeyCode::AltRight => "AltRight",
            KeyCode::MetaRight => "MetaRight",
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyCode {
    type Err = KeyCodeError;

    /// Parses a kvmd key name.  Matching is exact (case-sensitive), like the
    /// device itself.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_KEYS
            .iter()
            .copied()
            .find(|key| key.name() == s)
            .ok_or_else(|| KeyCodeError::Unknown(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_key_parses_back_from_its_name() {
        for &key in ALL_KEYS {
            // Arrange / Act
            let parsed: KeyCode = key.name().parse().expect("name must parse");

            // Assert
            assert_eq!(parsed, key);
        }
    }

    #[test]
    fn test_key_names_are_unique() {
        let mut names: Vec<&str> = ALL_KEYS.iter().map(|k| k.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ALL_KEYS.len());
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let err = "Backspase".parse::<KeyCode>().unwrap_err();
        assert_eq!(err, KeyCodeError::Unknown("Backspase".to_string()));
    }

    #[test]
    fn test_parsing_is_case_sensitive() {
        assert!("enter".parse::<KeyCode>().is_err());
        assert_eq!("Enter".parse::<KeyCode>().unwrap(), KeyCode::Enter);
    }

    #[test]
    fn test_serde_name_matches_wire_name() {
        let json = serde_json::to_string(&KeyCode::ArrowLeft).unwrap();
        assert_eq!(json, "\"ArrowLeft\"");
        let back: KeyCode = serde_json::from_str("\"NumpadEnter\"").unwrap();
        assert_eq!(back, KeyCode::NumpadEnter);
    }

    #[test]
    fn test_display_uses_wire_name() {
        assert_eq!(KeyCode::Backspace.to_string(), "Backspace");
    }
}
