//! Injectable randomness for the typing cadence simulator.
//!
//! The simulator never calls `rand` directly.  Every random draw goes through
//! the [`RandomSource`] trait so that:
//!
//! - production code can use a real, entropy-seeded generator ([`RngSource`]),
//! - reproducible runs can use a fixed seed ([`RngSource::seeded`]),
//! - unit tests can script every draw and assert exact step lists.
//!
//! # Draw order
//!
//! For a single character the simulator draws, in this order:
//!
//! 1. `unit()` – decides whether a typo is injected.
//! 2. `typo_length(max)` – only when a typo is injected.
//! 3. `letter()` once per typo character.
//! 4. `gaussian(mean, std_dev)` once per emitted delay.
//!
//! Scripted sources in tests rely on this order.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Letters a typo is drawn from.
pub const TYPO_ALPHABET: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";

/// A source of the four kinds of random draws the simulator needs.
pub trait RandomSource {
    /// Returns a value uniformly distributed in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// Returns a typo length uniformly distributed in `[1, max]`.
    ///
    /// Callers guarantee `max >= 1`.
    fn typo_length(&mut self, max: u32) -> u32;

    /// Returns a lowercase ASCII letter drawn uniformly from `a..=z`.
    fn letter(&mut self) -> char;

    /// Returns a sample from a normal distribution.
    fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64;
}

/// The generator used for real typing runs.
pub type StdRngSource = RngSource<StdRng>;

/// [`RandomSource`] backed by any [`rand::Rng`].
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    /// Wraps an existing generator.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    /// Creates a generator seeded from operating-system entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Creates a deterministic generator: the same seed always produces the
    /// same typing run.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn typo_length(&mut self, max: u32) -> u32 {
        self.rng.gen_range(1..=max.max(1))
    }

    fn letter(&mut self) -> char {
        let idx = self.rng.gen_range(0..TYPO_ALPHABET.len());
        char::from(TYPO_ALPHABET[idx])
    }

    fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        // `Normal::new` rejects a non-finite deviation; fall back to the mean.
        match Normal::new(mean, std_dev) {
            Ok(normal) => normal.sample(&mut self.rng),
            Err(_) => mean,
        }
    }
}
