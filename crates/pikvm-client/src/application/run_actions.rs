//! Executes declarative action lists against the device.
//!
//! Steps run one after another.  A `parallel` group starts all of its
//! children at once on the current task and finishes when every child has
//! finished; the first failure aborts the rest of the group (the remaining
//! futures are dropped) and the list.
//!
//! Typing steps go through [`HumanTypist`], each with its own random source.
//! With a configured seed, run *n* uses `seed + n` so that a replayed list
//! reproduces the same typos without every text sharing one pattern.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{try_join_all, BoxFuture, FutureExt};
use pikvm_core::{ActionList, DeviceAction, RngSource, StdRngSource};
use thiserror::Error;
use tracing::{debug, info};

use crate::application::transport::{HidTransport, TransportError};
use crate::application::type_text::{HumanTypist, TypeTextError};

/// Error type for action-list execution.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Typing(#[from] TypeTextError),
}

/// Runs [`DeviceAction`]s through a shared transport.
pub struct ActionRunner {
    transport: Arc<dyn HidTransport>,
    typist: HumanTypist,
    seed: Option<u64>,
    typing_runs: AtomicU64,
}

impl ActionRunner {
    /// Creates a runner.  `typist` should share `transport`.
    pub fn new(transport: Arc<dyn HidTransport>, typist: HumanTypist, seed: Option<u64>) -> Self {
        Self {
            transport,
            typist,
            seed,
            typing_runs: AtomicU64::new(0),
        }
    }

    /// Runs every step of `list` in order.
    ///
    /// # Errors
    ///
    /// Returns the first [`ActionError`]; later steps are not executed.
    pub async fn run(&self, list: &ActionList) -> Result<(), ActionError> {
        info!("running action list with {} steps", list.leaf_count());
        for step in &list.steps {
            self.run_step(step).await?;
        }
        info!("action list complete");
        Ok(())
    }

    /// Runs a single step (recursively for parallel groups).
    pub fn run_step<'a>(&'a self, step: &'a DeviceAction) -> BoxFuture<'a, Result<(), ActionError>> {
        async move {
            debug!("step: {step:?}");
            match step {
                DeviceAction::MouseMove { x, y } => {
                    self.transport.send_mouse_move(*x, *y).await?;
                }
                DeviceAction::Click { button, state } => {
                    self.transport.send_mouse_button(*button, *state).await?;
                }
                DeviceAction::Scroll {
                    delta_x,
                    delta_y,
                    repeat,
                    interval_ms,
                } => {
                    for turn in 0..*repeat {
                        if turn > 0 {
                            tokio::time::sleep(Duration::from_millis(*interval_ms)).await;
                        }
                        self.transport.send_mouse_wheel(*delta_x, *delta_y).await?;
                    }
                }
                DeviceAction::Key { key, state, finish } => {
                    self.transport.send_key(*key, *state, *finish).await?;
                }
                DeviceAction::Type { text } => {
                    let mut rng = self.next_rng();
                    self.typist.type_text(text, &mut rng).await?;
                }
                DeviceAction::Print { text } => {
                    self.transport.send_text(text).await?;
                }
                DeviceAction::Wait { millis } => {
                    tokio::time::sleep(Duration::from_millis(*millis)).await;
                }
                DeviceAction::Parallel { steps } => {
                    try_join_all(steps.iter().map(|s| self.run_step(s))).await?;
                }
            }
            Ok(())
        }
        .boxed()
    }

    fn next_rng(&self) -> StdRngSource {
        let run = self.typing_runs.fetch_add(1, Ordering::Relaxed);
        match self.seed {
            Some(seed) => RngSource::seeded(seed.wrapping_add(run)),
            None => RngSource::from_entropy(),
        }
    }
}
