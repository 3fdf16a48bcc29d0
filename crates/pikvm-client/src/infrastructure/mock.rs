//! Recording HID transport for tests and dry runs.
//!
//! [`RecordingTransport`] performs no I/O.  Every call is pushed into a
//! `Mutex<Vec<...>>` together with the (tokio) time it happened, so tests can
//! assert exactly what was sent, in what order, and how far apart.
//!
//! ```ignore
//! let transport = Arc::new(RecordingTransport::new());
//! let typist = HumanTypist::new(transport.clone(), TypingParameters::default());
//!
//! typist.type_text("hi", &mut RngSource::seeded(1)).await?;
//!
//! assert_eq!(transport.screen_text(), "hi");
//! ```
//!
//! Set `should_fail = true` to make every call return a
//! [`TransportError::Status`] with HTTP 503.

use std::sync::Mutex;

use async_trait::async_trait;
use pikvm_core::{KeyCode, MouseButton};
use tokio::time::Instant;

use crate::application::transport::{HidTransport, TransportError};

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HidCall {
    Text(String),
    Key {
        key: KeyCode,
        state: Option<bool>,
        finish: bool,
    },
    MouseMove {
        x: i16,
        y: i16,
    },
    MouseButton {
        button: MouseButton,
        state: Option<bool>,
    },
    MouseWheel {
        delta_x: i16,
        delta_y: i16,
    },
}

/// A transport that records calls instead of sending them.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    /// Every successful call with the instant it was made.
    pub calls: Mutex<Vec<(HidCall, Instant)>>,
    /// When `true`, every method fails without recording.
    pub should_fail: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded calls without timestamps.
    pub fn calls(&self) -> Vec<HidCall> {
        self.lock().iter().map(|(call, _)| call.clone()).collect()
    }

    /// Recorded calls with their timestamps.
    pub fn timed_calls(&self) -> Vec<(HidCall, Instant)> {
        self.lock().clone()
    }

    /// What a text field on the target would contain after the recorded
    /// keystrokes: printed text appended, each Backspace click removing one
    /// character.  Other calls are ignored.
    pub fn screen_text(&self) -> String {
        let mut screen = String::new();
        for (call, _) in self.lock().iter() {
            match call {
                HidCall::Text(text) => screen.push_str(text),
                HidCall::Key {
                    key: KeyCode::Backspace,
                    state: None,
                    ..
                } => {
                    screen.pop();
                }
                _ => {}
            }
        }
        screen
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(HidCall, Instant)>> {
        // A poisoned lock only means another test thread panicked mid-push.
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: HidCall) -> Result<(), TransportError> {
        if self.should_fail {
            return Err(TransportError::Status {
                endpoint: "mock",
                status: 503,
            });
        }
        self.lock().push((call, Instant::now()));
        Ok(())
    }
}

#[async_trait]
impl HidTransport for RecordingTransport {
    async fn send_text(&self, text: &str) -> Result<(), TransportError> {
        self.record(HidCall::Text(text.to_string()))
    }

    async fn send_key(
        &self,
        key: KeyCode,
        state: Option<bool>,
        finish: bool,
    ) -> Result<(), TransportError> {
        self.record(HidCall::Key { key, state, finish })
    }

    async fn send_mouse_move(&self, to_x: i16, to_y: i16) -> Result<(), TransportError> {
        self.record(HidCall::MouseMove { x: to_x, y: to_y })
    }

    async fn send_mouse_button(
        &self,
        button: MouseButton,
        state: Option<bool>,
    ) -> Result<(), TransportError> {
        self.record(HidCall::MouseButton { button, state })
    }

    async fn send_mouse_wheel(&self, delta_x: i16, delta_y: i16) -> Result<(), TransportError> {
        self.record(HidCall::MouseWheel { delta_x, delta_y })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_calls_are_recorded_in_order() {
        let transport = RecordingTransport::new();

        transport.send_char('x').await.unwrap();
        transport.send_mouse_move(1, -1).await.unwrap();

        assert_eq!(
            transport.calls(),
            vec![
                HidCall::Text("x".into()),
                HidCall::MouseMove { x: 1, y: -1 }
            ]
        );
    }

    #[tokio::test]
    async fn test_screen_text_applies_backspace_clicks_only() {
        // Arrange
        let transport = RecordingTransport::new();
        transport.send_text("abq").await.unwrap();
        transport.send_key(KeyCode::Backspace, None, false).await.unwrap();
        // A held Backspace press is not a click and is ignored.
        transport
            .send_key(KeyCode::Backspace, Some(true), false)
            .await
            .unwrap();
        transport.send_text("c").await.unwrap();

        // Act / Assert
        assert_eq!(transport.screen_text(), "abc");
    }

    #[tokio::test]
    async fn test_should_fail_records_nothing() {
        let transport = RecordingTransport {
            should_fail: true,
            ..Default::default()
        };

        let err = transport.send_text("a").await.unwrap_err();

        assert!(matches!(err, TransportError::Status { status: 503, .. }));
        assert!(transport.calls().is_empty());
    }
}
