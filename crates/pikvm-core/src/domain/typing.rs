//! Human-like typing cadence simulator.
//!
//! Turns a piece of text into an ordered stream of [`TypingStep`]s: the HID
//! actions a person would perform to type it, each paired with the pause that
//! follows it.  Pacing is drawn from a normal distribution around the speed
//! implied by the words-per-minute setting, and typos (random lowercase
//! letters followed by the same number of backspaces) are injected at a
//! configurable rate.
//!
//! The simulator is pure: it performs no I/O and never sleeps.  Sending each
//! action to the device and waiting for its delay is the consumer's job (see
//! `pikvm-client`'s `HumanTypist`).
//!
//! # Example
//!
//! ```
//! use pikvm_core::domain::random::RngSource;
//! use pikvm_core::domain::typing::{generate, HidAction, TypingParameters};
//!
//! let params = TypingParameters::new(120.0, 0.0, 3);
//! let mut rng = RngSource::seeded(1);
//! let actions: Vec<HidAction> = generate("ab", &params, &mut rng)
//!     .unwrap()
//!     .filter_map(|step| step.action().cloned())
//!     .collect();
//!
//! assert_eq!(actions, vec![HidAction::SendChar('a'), HidAction::SendChar('b')]);
//! ```

use std::str::Chars;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::domain::random::RandomSource;
use crate::keymap::KeyCode;

/// Shortest delay ever emitted, in seconds.
pub const MIN_DELAY_SECS: f64 = 0.01;

/// Longest delay ever emitted, in seconds.
pub const MAX_DELAY_SECS: f64 = 1.0;

/// Average English word length used to convert WPM into characters per minute.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Standard deviation of a delay sample, relative to the base delay.
pub const DELAY_JITTER: f64 = 0.2;

/// Error type for invalid typing parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypingError {
    #[error("invalid typing parameter {parameter}: {value} ({expected})")]
    InvalidParameter {
        parameter: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Behavioural parameters for one typing run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypingParameters {
    /// Typing speed in words per minute.  Must be positive and finite.
    pub wpm: f64,
    /// Probability in `[0, 1]` that a typo is injected before a character.
    pub error_rate: f64,
    /// Upper bound (inclusive) on the number of characters in one typo.
    pub max_typo_length: u32,
}

impl Default for TypingParameters {
    /// 120 WPM, 5 % typo rate, typos of up to 3 characters.
    fn default() -> Self {
        Self {
            wpm: 120.0,
            error_rate: 0.05,
            max_typo_length: 3,
        }
    }
}

impl TypingParameters {
    /// Creates a parameter set.  Validation happens in [`validate`](Self::validate).
    pub fn new(wpm: f64, error_rate: f64, max_typo_length: u32) -> Self {
        Self {
            wpm,
            error_rate,
            max_typo_length,
        }
    }

    /// Checks every parameter against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`TypingError::InvalidParameter`] naming the first offending
    /// parameter.
    pub fn validate(&self) -> Result<(), TypingError> {
        if !(self.wpm.is_finite() && self.wpm > 0.0) {
            return Err(TypingError::InvalidParameter {
                parameter: "wpm",
                value: self.wpm.to_string(),
                expected: "a positive, finite number",
            });
        }
        if !(0.0..=1.0).contains(&self.error_rate) {
            return Err(TypingError::InvalidParameter {
                parameter: "error_rate",
                value: self.error_rate.to_string(),
                expected: "a probability in [0, 1]",
            });
        }
        if self.max_typo_length == 0 {
            return Err(TypingError::InvalidParameter {
                parameter: "max_typo_length",
                value: self.max_typo_length.to_string(),
                expected: "an integer >= 1",
            });
        }
        Ok(())
    }

    /// Mean delay between two characters, in seconds.
    pub fn base_delay_secs(&self) -> f64 {
        60.0 / (self.wpm * CHARS_PER_WORD)
    }
}

/// An atomic HID action sent to the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HidAction {
    /// Types a single character (kvmd `print`).
    SendChar(char),
    /// Clicks a single key (kvmd `send_key`).
    SendKey(KeyCode),
}

/// One element of a simulated typing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypingStep {
    /// Perform `action`, then wait `delay_secs`.
    Emit { action: HidAction, delay_secs: f64 },
    /// Wait `delay_secs` without doing anything (the pause after a word).
    Pause { delay_secs: f64 },
}

impl TypingStep {
    /// The action to perform, if any.
    pub fn action(&self) -> Option<&HidAction> {
        match self {
            TypingStep::Emit { action, .. } => Some(action),
            TypingStep::Pause { .. } => None,
        }
    }

    /// Delay that follows this step, in seconds.
    pub fn delay_secs(&self) -> f64 {
        match self {
            TypingStep::Emit { delay_secs, .. } | TypingStep::Pause { delay_secs } => *delay_secs,
        }
    }

    /// Delay that follows this step.
    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_secs())
    }
}

/// Stateless simulator holding one validated parameter set.
#[derive(Debug, Clone, Copy)]
pub struct TypingCadenceSimulator {
    params: TypingParameters,
}

impl TypingCadenceSimulator {
    /// Validates `params` and builds a simulator.
    ///
    /// # Errors
    ///
    /// Returns [`TypingError::InvalidParameter`] if any parameter is out of range.
    pub fn new(params: TypingParameters) -> Result<Self, TypingError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Starts a lazy typing run over `text`.
    ///
    /// Each call is an independent run; the stream borrows `rng` until it is
    /// dropped.
    pub fn generate<'a, R: RandomSource>(&self, text: &'a str, rng: &'a mut R) -> TypingSteps<'a, R> {
        TypingSteps {
            chars: text.chars(),
            params: self.params,
            base_delay: self.params.base_delay_secs(),
            rng,
            typo_left: 0,
            backspaces_left: 0,
            intended: None,
            pause_due: false,
            typo_characters: 0,
        }
    }
}

/// Validates `params` and starts a lazy typing run over `text`.
///
/// # Errors
///
/// Returns [`TypingError::InvalidParameter`] before anything is emitted if a
/// parameter is out of range.
pub fn generate<'a, R: RandomSource>(
    text: &'a str,
    params: &TypingParameters,
    rng: &'a mut R,
) -> Result<TypingSteps<'a, R>, TypingError> {
    Ok(TypingCadenceSimulator::new(*params)?.generate(text, rng))
}

/// Lazy stream of [`TypingStep`]s for one run.
///
/// Every step is drawn on demand.  A typo is tracked as two counters (letters
/// still to type, backspaces still owed), so even the longest allowed typo
/// costs constant memory.
pub struct TypingSteps<'a, R> {
    chars: Chars<'a>,
    params: TypingParameters,
    base_delay: f64,
    rng: &'a mut R,
    typo_left: u32,
    backspaces_left: u32,
    /// The character to type once the current typo is corrected.
    intended: Option<char>,
    pause_due: bool,
    typo_characters: u64,
}

impl<R: RandomSource> TypingSteps<'_, R> {
    /// Wrong letters yielded so far in this run.
    pub fn typo_characters(&self) -> u64 {
        self.typo_characters
    }

    fn sample_delay(&mut self) -> f64 {
        let sample = self
            .rng
            .gaussian(self.base_delay, self.base_delay * DELAY_JITTER);
        // NaN cannot survive `clamp`'s comparisons, so map it to the floor.
        if sample.is_nan() {
            MIN_DELAY_SECS
        } else {
            sample.clamp(MIN_DELAY_SECS, MAX_DELAY_SECS)
        }
    }

    fn emit(&mut self, action: HidAction) -> TypingStep {
        let delay_secs = self.sample_delay();
        TypingStep::Emit { action, delay_secs }
    }

    /// Reads the next character and decides whether it gets a typo.
    fn advance(&mut self) -> Option<()> {
        let c = self.chars.next()?;
        if self.rng.unit() < self.params.error_rate {
            let len = self.rng.typo_length(self.params.max_typo_length);
            trace!("injecting {len}-character typo before {c:?}");
            self.typo_left = len;
            self.backspaces_left = len;
        }
        self.intended = Some(c);
        Some(())
    }
}

impl<R: RandomSource> Iterator for TypingSteps<'_, R> {
    type Item = TypingStep;

    fn next(&mut self) -> Option<TypingStep> {
        loop {
            if self.typo_left > 0 {
                self.typo_left -= 1;
                self.typo_characters += 1;
                let letter = self.rng.letter();
                return Some(self.emit(HidAction::SendChar(letter)));
            }
            if self.backspaces_left > 0 {
                self.backspaces_left -= 1;
                return Some(self.emit(HidAction::SendKey(KeyCode::Backspace)));
            }
            if let Some(c) = self.intended.take() {
                self.pause_due = c == ' ';
                return Some(self.emit(HidAction::SendChar(c)));
            }
            if self.pause_due {
                self.pause_due = false;
                let delay_secs = self.sample_delay();
                return Some(TypingStep::Pause { delay_secs });
            }
            self.advance()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    // ── Scripted random source ────────────────────────────────────────────────

    /// Replays fixed draws so step lists can be asserted exactly.
    #[derive(Default)]
    struct Scripted {
        units: VecDeque<f64>,
        lengths: VecDeque<u32>,
        letters: VecDeque<char>,
        gaussians: VecDeque<f64>,
        gaussian_args: Vec<(f64, f64)>,
    }

    impl RandomSource for Scripted {
        fn unit(&mut self) -> f64 {
            self.units.pop_front().unwrap_or(0.99)
        }
        fn typo_length(&mut self, _max: u32) -> u32 {
            self.lengths.pop_front().expect("unexpected typo_length draw")
        }
        fn letter(&mut self) -> char {
            self.letters.pop_front().expect("unexpected letter draw")
        }
        fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
            self.gaussian_args.push((mean, std_dev));
            self.gaussians.pop_front().unwrap_or(mean)
        }
    }

    fn emit(c: char, delay_secs: f64) -> TypingStep {
        TypingStep::Emit {
            action: HidAction::SendChar(c),
            delay_secs,
        }
    }

    fn backspace(delay_secs: f64) -> TypingStep {
        TypingStep::Emit {
            action: HidAction::SendKey(KeyCode::Backspace),
            delay_secs,
        }
    }

    // ── Parameters ────────────────────────────────────────────────────────────

    #[test]
    fn test_default_parameters_match_documented_values() {
        let p = TypingParameters::default();
        assert_eq!(p.wpm, 120.0);
        assert_eq!(p.error_rate, 0.05);
        assert_eq!(p.max_typo_length, 3);
    }

    #[test]
    fn test_base_delay_at_120_wpm_is_100ms() {
        let p = TypingParameters::new(120.0, 0.0, 1);
        assert!((p.base_delay_secs() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_zero_wpm_is_rejected() {
        let err = TypingParameters::new(0.0, 0.0, 1).validate().unwrap_err();
        assert!(matches!(err, TypingError::InvalidParameter { parameter: "wpm", .. }));
    }

    #[test]
    fn test_negative_and_nan_wpm_are_rejected() {
        assert!(TypingParameters::new(-10.0, 0.0, 1).validate().is_err());
        assert!(TypingParameters::new(f64::NAN, 0.0, 1).validate().is_err());
        assert!(TypingParameters::new(f64::INFINITY, 0.0, 1).validate().is_err());
    }

    #[test]
    fn test_error_rate_outside_unit_interval_is_rejected() {
        for rate in [-0.01, 1.01, f64::NAN] {
            let err = TypingParameters::new(120.0, rate, 1).validate().unwrap_err();
            assert!(matches!(
                err,
                TypingError::InvalidParameter { parameter: "error_rate", .. }
            ));
        }
    }

    #[test]
    fn test_error_rate_bounds_are_accepted() {
        assert!(TypingParameters::new(120.0, 0.0, 1).validate().is_ok());
        assert!(TypingParameters::new(120.0, 1.0, 1).validate().is_ok());
    }

    #[test]
    fn test_zero_max_typo_length_is_rejected() {
        let err = TypingParameters::new(120.0, 0.1, 0).validate().unwrap_err();
        assert!(matches!(
            err,
            TypingError::InvalidParameter { parameter: "max_typo_length", .. }
        ));
    }

    #[test]
    fn test_generate_fails_before_drawing_anything() {
        // Arrange
        let mut rng = Scripted::default();

        // Act
        let result = generate("abc", &TypingParameters::new(0.0, 0.0, 1), &mut rng);

        // Assert
        assert!(result.is_err());
        assert!(rng.gaussian_args.is_empty());
    }

    // ── Step sequences ────────────────────────────────────────────────────────

    #[test]
    fn test_empty_text_produces_no_steps() {
        let mut rng = Scripted::default();
        let steps: Vec<_> = generate("", &TypingParameters::default(), &mut rng)
            .unwrap()
            .collect();
        assert!(steps.is_empty());
    }

    #[test]
    fn test_two_characters_without_typos() {
        // Arrange
        let mut rng = Scripted {
            units: VecDeque::from([0.5, 0.5]),
            gaussians: VecDeque::from([0.11, 0.09]),
            ..Default::default()
        };
        let params = TypingParameters::new(120.0, 0.0, 3);

        // Act
        let steps: Vec<_> = generate("ab", &params, &mut rng).unwrap().collect();

        // Assert
        assert_eq!(steps, vec![emit('a', 0.11), emit('b', 0.09)]);
    }

    #[test]
    fn test_delay_samples_use_base_delay_and_twenty_percent_jitter() {
        let mut rng = Scripted::default();
        let params = TypingParameters::new(120.0, 0.0, 1);

        let _: Vec<_> = generate("x", &params, &mut rng).unwrap().collect();

        let (mean, std_dev) = rng.gaussian_args[0];
        assert!((mean - 0.1).abs() < 1e-12);
        assert!((std_dev - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_space_is_followed_by_an_extra_pause() {
        // Arrange
        let mut rng = Scripted {
            gaussians: VecDeque::from([0.1, 0.2, 0.3, 0.4]),
            ..Default::default()
        };
        let params = TypingParameters::new(120.0, 0.0, 1);

        // Act
        let steps: Vec<_> = generate("a b", &params, &mut rng).unwrap().collect();

        // Assert
        assert_eq!(
            steps,
            vec![
                emit('a', 0.1),
                emit(' ', 0.2),
                TypingStep::Pause { delay_secs: 0.3 },
                emit('b', 0.4),
            ]
        );
    }

    #[test]
    fn test_typo_is_typed_then_erased_before_the_intended_character() {
        // Arrange – first char gets a two-letter typo, second char none.
        let mut rng = Scripted {
            units: VecDeque::from([0.0, 0.9]),
            lengths: VecDeque::from([2]),
            letters: VecDeque::from(['q', 'z']),
            gaussians: VecDeque::from([0.1, 0.2, 0.3, 0.4, 0.5, 0.6]),
            ..Default::default()
        };
        let params = TypingParameters::new(120.0, 0.5, 3);

        // Act
        let steps: Vec<_> = generate("hi", &params, &mut rng).unwrap().collect();

        // Assert
        assert_eq!(
            steps,
            vec![
                emit('q', 0.1),
                emit('z', 0.2),
                backspace(0.3),
                backspace(0.4),
                emit('h', 0.5),
                emit('i', 0.6),
            ]
        );
    }

    #[test]
    fn test_typo_decision_uses_strict_less_than() {
        // A draw equal to the error rate must not inject a typo.
        let mut rng = Scripted {
            units: VecDeque::from([0.25]),
            ..Default::default()
        };
        let params = TypingParameters::new(120.0, 0.25, 3);

        let steps: Vec<_> = generate("a", &params, &mut rng).unwrap().collect();

        assert_eq!(steps.len(), 1);
    }

    #[test]
    fn test_delays_are_clamped_to_bounds() {
        // Arrange – samples far outside the allowed interval, plus NaN.
        let mut rng = Scripted {
            gaussians: VecDeque::from([-3.0, 42.0, f64::NAN]),
            ..Default::default()
        };
        let params = TypingParameters::new(120.0, 0.0, 1);

        // Act
        let delays: Vec<f64> = generate("abc", &params, &mut rng)
            .unwrap()
            .map(|s| s.delay_secs())
            .collect();

        // Assert
        assert_eq!(delays, vec![MIN_DELAY_SECS, MAX_DELAY_SECS, MIN_DELAY_SECS]);
    }

    #[test]
    fn test_stream_is_lazy_per_character() {
        // Only the first character's draws happen before the first step is read.
        let mut rng = Scripted::default();
        let params = TypingParameters::new(120.0, 0.0, 1);
        {
            let mut steps = generate("abcdef", &params, &mut rng).unwrap();
            let first = steps.next().unwrap();
            assert_eq!(first.action(), Some(&HidAction::SendChar('a')));
        }
        assert_eq!(rng.gaussian_args.len(), 1);
    }

    #[test]
    fn test_multibyte_characters_are_sent_whole() {
        let mut rng = Scripted::default();
        let params = TypingParameters::new(120.0, 0.0, 1);

        let actions: Vec<_> = generate("é✓", &params, &mut rng)
            .unwrap()
            .filter_map(|s| s.action().cloned())
            .collect();

        assert_eq!(actions, vec![HidAction::SendChar('é'), HidAction::SendChar('✓')]);
    }

    #[test]
    fn test_step_delay_converts_to_duration() {
        let step = TypingStep::Pause { delay_secs: 0.25 };
        assert_eq!(step.delay(), Duration::from_millis(250));
        assert!(step.action().is_none());
    }

    #[test]
    fn test_longest_typo_is_drawn_one_letter_at_a_time() {
        // Arrange – a typo of u32::MAX letters must not be materialised.
        let mut rng = Scripted {
            units: VecDeque::from([0.0]),
            lengths: VecDeque::from([u32::MAX]),
            letters: VecDeque::from(['x', 'y', 'z']),
            ..Default::default()
        };
        let params = TypingParameters::new(120.0, 1.0, u32::MAX);

        // Act
        let first: Vec<_> = generate("a", &params, &mut rng)
            .unwrap()
            .take(3)
            .filter_map(|s| s.action().cloned())
            .collect();

        // Assert
        assert_eq!(
            first,
            vec![
                HidAction::SendChar('x'),
                HidAction::SendChar('y'),
                HidAction::SendChar('z'),
            ]
        );
        assert_eq!(rng.gaussian_args.len(), 3);
    }

    #[test]
    fn test_stream_counts_typo_letters_it_yields() {
        // Arrange – a typo letter equal to the intended character still counts.
        let mut rng = Scripted {
            units: VecDeque::from([0.0, 0.9, 0.0]),
            lengths: VecDeque::from([1, 2]),
            letters: VecDeque::from(['a', 'k', 'j']),
            ..Default::default()
        };
        let params = TypingParameters::new(120.0, 0.5, 3);
        let mut steps = generate("abc", &params, &mut rng).unwrap();

        // Act
        let count = steps.by_ref().count();

        // Assert – 1 + 2 typo letters, 3 backspaces, 3 characters
        assert_eq!(count, 9);
        assert_eq!(steps.typo_characters(), 3);
    }
}
