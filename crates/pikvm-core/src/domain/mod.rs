//! Domain layer for PiKVM remote control.
//!
//! Pure logic with no I/O: nothing in here opens a socket, touches the file
//! system, or sleeps.  That keeps the typing simulator and the action model
//! testable with nothing but `cargo test`.
//!
//! # What is in here?
//!
//! - **`typing`** – the human typing cadence simulator: text in, a lazy
//!   stream of timed HID actions out.
//! - **`random`** – the [`random::RandomSource`] seam the simulator draws
//!   from, so tests can script every random decision.
//! - **`actions`** – declarative action lists (move, click, type, wait, ...)
//!   loaded from TOML and executed by the client.

pub mod actions;
pub mod random;
pub mod typing;
