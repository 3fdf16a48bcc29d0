//! HumanTypist: plays a simulated typing run against the device.
//!
//! The simulator in `pikvm-core` decides *what* to type and *how long to
//! wait*; this use case performs each action through a [`HidTransport`] and
//! then sleeps for the step's delay, preserving real-time pacing.
//!
//! Dropping the returned future stops typing between two steps.  Nothing
//! needs cleaning up: the simulator holds no resources and each HTTP request
//! is self-contained.

use std::sync::Arc;
use std::time::Duration;

use pikvm_core::{
    HidAction, RandomSource, TypingCadenceSimulator, TypingError, TypingParameters, TypingStep,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::application::transport::{HidTransport, TransportError};

/// Error type for a typing run.
#[derive(Debug, Error)]
pub enum TypeTextError {
    /// The typing parameters were rejected before anything was sent.
    #[error(transparent)]
    Parameter(#[from] TypingError),
    /// A request to the device failed; typing stopped at that step.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Summary of a completed typing run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypingReport {
    /// Characters of the input text that were typed.
    pub characters: usize,
    /// Wrong letters typed as part of injected typos.
    pub typo_characters: u64,
    /// Backspaces sent to correct typos.
    pub backspaces: usize,
    /// Sum of all delays waited.
    pub total_delay: Duration,
}

/// The human typing use case.
pub struct HumanTypist {
    transport: Arc<dyn HidTransport>,
    params: TypingParameters,
}

impl HumanTypist {
    /// Creates a typist that sends through `transport` with `params`.
    pub fn new(transport: Arc<dyn HidTransport>, params: TypingParameters) -> Self {
        Self { transport, params }
    }

    /// Types `text`, drawing typos and delays from `rng`.
    ///
    /// # Errors
    ///
    /// Returns [`TypeTextError::Parameter`] without sending anything if the
    /// parameters are invalid, or [`TypeTextError::Transport`] for the first
    /// failed request.
    pub async fn type_text<R>(&self, text: &str, rng: &mut R) -> Result<TypingReport, TypeTextError>
    where
        R: RandomSource + Send,
    {
        let simulator = TypingCadenceSimulator::new(self.params)?;
        info!(
            "typing {} characters at {} wpm (error rate {})",
            text.chars().count(),
            self.params.wpm,
            self.params.error_rate
        );

        let mut report = TypingReport::default();

        let mut steps = simulator.generate(text, rng);
        for step in steps.by_ref() {
            if let TypingStep::Emit { action, .. } = &step {
                match action {
                    HidAction::SendChar(ch) => {
                        debug!("send char {ch:?}");
                        self.transport.send_char(*ch).await?;
                    }
                    HidAction::SendKey(key) => {
                        debug!("send key {key}");
                        self.transport.send_key(*key, None, false).await?;
                        report.backspaces += 1;
                    }
                }
            }
            let delay = step.delay();
            report.total_delay += delay;
            tokio::time::sleep(delay).await;
        }
        report.typo_characters = steps.typo_characters();

        report.characters = text.chars().count();
        info!(
            "typed {} characters with {} typo letters",
            report.characters, report.typo_characters
        );
        Ok(report)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::transport::MockHidTransport;
    use mockall::predicate::eq;
    use mockall::Sequence;
    use pikvm_core::{KeyCode, RngSource};

    fn typist(mock: MockHidTransport, params: TypingParameters) -> HumanTypist {
        HumanTypist::new(Arc::new(mock), params)
    }

    #[tokio::test(start_paused = true)]
    async fn test_characters_are_sent_in_order() {
        // Arrange
        let mut mock = MockHidTransport::new();
        let mut seq = Sequence::new();
        for c in ['h', 'i'] {
            mock.expect_send_char()
                .with(eq(c))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(()));
        }
        let typist = typist(mock, TypingParameters::new(120.0, 0.0, 3));

        // Act
        let report = typist.type_text("hi", &mut RngSource::seeded(1)).await.unwrap();

        // Assert
        assert_eq!(report.characters, 2);
        assert_eq!(report.backspaces, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typos_are_corrected_with_backspace_clicks() {
        // Arrange – every character gets exactly one typo letter.
        let mut mock = MockHidTransport::new();
        mock.expect_send_char().times(4).returning(|_| Ok(()));
        mock.expect_send_key()
            .with(eq(KeyCode::Backspace), eq(None::<bool>), eq(false))
            .times(2)
            .returning(|_, _, _| Ok(()));
        let typist = typist(mock, TypingParameters::new(120.0, 1.0, 1));

        // Act
        let report = typist.type_text("ok", &mut RngSource::seeded(9)).await.unwrap();

        // Assert
        assert_eq!(report.typo_characters, 2);
        assert_eq!(report.backspaces, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_parameters_send_nothing() {
        // A mock with no expectations panics on any call.
        let typist = typist(MockHidTransport::new(), TypingParameters::new(0.0, 0.0, 1));

        let err = typist
            .type_text("abc", &mut RngSource::seeded(1))
            .await
            .unwrap_err();

        assert!(matches!(err, TypeTextError::Parameter(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_stops_typing() {
        // Arrange – the second character fails.
        let mut mock = MockHidTransport::new();
        let mut seq = Sequence::new();
        mock.expect_send_char()
            .with(eq('a'))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        mock.expect_send_char()
            .with(eq('b'))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Err(TransportError::Status {
                    endpoint: "/api/hid/print",
                    status: 503,
                })
            });
        let typist = typist(mock, TypingParameters::new(120.0, 0.0, 1));

        // Act – 'c' must never be sent (mock would panic on an unexpected call)
        let err = typist
            .type_text("abc", &mut RngSource::seeded(1))
            .await
            .unwrap_err();

        // Assert
        assert!(matches!(
            err,
            TypeTextError::Transport(TransportError::Status { status: 503, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_waits_for_every_delay() {
        // Arrange
        let mut mock = MockHidTransport::new();
        mock.expect_send_char().returning(|_| Ok(()));
        let typist = typist(mock, TypingParameters::new(120.0, 0.0, 1));
        let start = tokio::time::Instant::now();

        // Act
        let report = typist
            .type_text("a b c", &mut RngSource::seeded(4))
            .await
            .unwrap();

        // Assert – paused time advances exactly through the sleeps
        assert!(start.elapsed() >= report.total_delay);
        // 5 characters plus 2 post-space pauses, each at least 10 ms.
        assert!(report.total_delay >= Duration::from_millis(70));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_text_sends_nothing() {
        let typist = typist(MockHidTransport::new(), TypingParameters::default());
        let report = typist.type_text("", &mut RngSource::seeded(1)).await.unwrap();
        assert_eq!(report, TypingReport::default());
    }

    /// Always injects a typo of `len` copies of `letter`.
    struct SameLetterTypos {
        letter: char,
        len: u32,
    }

    impl RandomSource for SameLetterTypos {
        fn unit(&mut self) -> f64 {
            0.0
        }
        fn typo_length(&mut self, _max: u32) -> u32 {
            self.len
        }
        fn letter(&mut self) -> char {
            self.letter
        }
        fn gaussian(&mut self, mean: f64, _std_dev: f64) -> f64 {
            mean
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_typo_letters_are_counted_even_when_they_match_the_text() {
        // Arrange – "a" is preceded by the typo "aaa"
        let mut mock = MockHidTransport::new();
        mock.expect_send_char()
            .with(eq('a'))
            .times(4)
            .returning(|_| Ok(()));
        mock.expect_send_key().times(3).returning(|_, _, _| Ok(()));
        let typist = typist(mock, TypingParameters::new(120.0, 1.0, 3));
        let mut rng = SameLetterTypos { letter: 'a', len: 3 };

        // Act
        let report = typist.type_text("a", &mut rng).await.unwrap();

        // Assert
        assert_eq!(report.characters, 1);
        assert_eq!(report.typo_characters, 3);
        assert_eq!(report.backspaces, 3);
    }
}
