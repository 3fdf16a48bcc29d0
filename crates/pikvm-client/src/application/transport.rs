//! Transport boundary between the use cases and the PiKVM device.
//!
//! The application layer talks to the device only through these two traits:
//!
//! - [`HidTransport`] – one request per HID action (kvmd HTTP API).
//! - [`EventSink`] – a stream of JSON events (kvmd WebSocket).
//!
//! The real implementations live in the infrastructure layer
//! (`infrastructure::http`, `infrastructure::ws`); tests substitute
//! recording or `mockall` doubles.

use async_trait::async_trait;
use pikvm_core::{KeyCode, MouseButton, ScriptEvent};
use thiserror::Error;

/// Error type for device communication.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The device answered with a non-success HTTP status.
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },

    /// The request never produced a response (DNS, TCP, TLS, timeout, ...).
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The WebSocket connection failed or was closed underneath us.
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// The TLS connector could not be built.
    #[error("TLS setup failed: {0}")]
    Tls(String),
}

/// Keyboard and mouse injection, one call per HID action.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HidTransport: Send + Sync {
    /// Types `text` on the target using the configured keymap.
    async fn send_text(&self, text: &str) -> Result<(), TransportError>;

    /// Types a single character.
    async fn send_char(&self, ch: char) -> Result<(), TransportError> {
        let mut buf = [0u8; 4];
        self.send_text(ch.encode_utf8(&mut buf)).await
    }

    /// Presses and/or releases `key`.
    ///
    /// `state = None` performs a full click.  `Some(true)` presses,
    /// `Some(false)` releases; `finish` is only meaningful with a state.
    async fn send_key(
        &self,
        key: KeyCode,
        state: Option<bool>,
        finish: bool,
    ) -> Result<(), TransportError>;

    /// Moves the pointer to absolute device coordinates.
    async fn send_mouse_move(&self, to_x: i16, to_y: i16) -> Result<(), TransportError>;

    /// Presses and/or releases a mouse button (`None` clicks).
    async fn send_mouse_button(
        &self,
        button: MouseButton,
        state: Option<bool>,
    ) -> Result<(), TransportError>;

    /// Scrolls the wheel.
    async fn send_mouse_wheel(&self, delta_x: i16, delta_y: i16) -> Result<(), TransportError>;
}

/// Ordered delivery of raw kvmd events.
#[async_trait]
pub trait EventSink: Send {
    /// Sends one event.
    async fn send_event(&mut self, event: &ScriptEvent) -> Result<(), TransportError>;

    /// Closes the underlying channel.  Further sends fail.
    async fn close(&mut self) -> Result<(), TransportError>;
}
