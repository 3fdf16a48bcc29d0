//! pikvm-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does pikvm-client do?
//!
//! A PiKVM exposes a target computer's keyboard, mouse, and screen over the
//! network.  This crate drives it:
//!
//! 1. Types text the way a person would, with realistic pacing and the
//!    occasional corrected typo (`pikvm type`).
//! 2. Sends individual key presses, pointer moves, clicks, and scrolls.
//! 3. Runs scripted action lists, including concurrent groups such as typing
//!    while the pointer moves.
//! 4. Replays recorded kvmd event scripts over the WebSocket API.
//! 5. Saves screenshots of the target screen.

/// Application layer: use cases and the transport boundary.
pub mod application;

/// Infrastructure layer: HTTP, WebSocket, and configuration adapters.
pub mod infrastructure;
