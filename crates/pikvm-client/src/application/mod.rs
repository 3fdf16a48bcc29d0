//! Application layer use cases for the PiKVM client.
//!
//! # What use cases does the client have?
//!
//! - **`transport`** – The boundary traits.  `HidTransport` performs one HID
//!   action per call (the kvmd HTTP API); `EventSink` streams raw kvmd events
//!   (the WebSocket API).  Concrete implementations are injected at
//!   construction time from the infrastructure layer.
//!
//! - **`type_text`** – Plays the typing simulator's step stream against a
//!   transport: send the action, wait the delay, repeat.
//!
//! - **`replay`** – Replays a recorded JSON event script, honouring `delay`
//!   steps locally.
//!
//! - **`run_actions`** – Executes declarative action lists (mouse, keys,
//!   typing, waits, and concurrent groups).

pub mod replay;
pub mod run_actions;
pub mod transport;
pub mod type_text;

pub use replay::{replay_script, ReplayReport};
pub use run_actions::{ActionError, ActionRunner};
pub use transport::{EventSink, HidTransport, TransportError};
pub use type_text::{HumanTypist, TypeTextError, TypingReport};
