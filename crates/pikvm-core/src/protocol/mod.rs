//! Wire-level formats shared with the kvmd daemon.
//!
//! Only the WebSocket event-script format lives here; the HTTP API is plain
//! query parameters and is described where it is called (`pikvm-client`).

pub mod script;

pub use script::{EventScript, ScriptError, ScriptEvent, ScriptStep};
