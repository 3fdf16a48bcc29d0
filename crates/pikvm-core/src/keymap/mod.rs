//! Key naming for the kvmd HID API.
//!
//! kvmd addresses keys by their web `KeyboardEvent.code` names, so unlike a
//! native input stack there is no per-platform translation here: one typed
//! table covers the HTTP and WebSocket APIs alike.

pub mod key_code;

pub use key_code::{KeyCode, KeyCodeError, ALL_KEYS};
