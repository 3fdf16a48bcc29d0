//! # pikvm-core
//!
//! Shared library for driving a PiKVM KVM-over-IP device: the human typing
//! cadence simulator, the kvmd key-name table, declarative action lists, and
//! the WebSocket event-script model.
//!
//! This crate has no dependencies on sockets, HTTP clients, or the file
//! system.  The `pikvm-client` crate supplies the transport and the CLI.
//!
//! # Architecture overview
//!
//! A PiKVM sits between a target computer and the network and exposes the
//! target's keyboard, mouse, and screen through the `kvmd` daemon's HTTP and
//! WebSocket APIs.  This crate defines *what* to send:
//!
//! - **`domain`** – the typing simulator (text → timed HID actions), its
//!   injectable random source, and action lists.
//! - **`keymap`** – the typed table of key names kvmd accepts.
//! - **`protocol`** – the JSON event scripts replayed over `/api/ws`.

pub mod domain;
pub mod keymap;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `pikvm_core::TypingParameters` instead of the full module path.
pub use domain::actions::{ActionList, DeviceAction, MouseButton};
pub use domain::random::{RandomSource, RngSource, StdRngSource};
pub use domain::typing::{
    generate, HidAction, TypingCadenceSimulator, TypingError, TypingParameters, TypingStep,
    TypingSteps,
};
pub use keymap::{KeyCode, KeyCodeError};
pub use protocol::script::{EventScript, ScriptError, ScriptEvent, ScriptStep};
