//! kvmd WebSocket event scripts.
//!
//! A script is a JSON array of events in the same shape kvmd accepts on its
//! `/api/ws` socket:
//!
//! ```json
//! [
//!   {"event_type": "key", "event": {"key": "KeyA", "state": true}},
//!   {"event_type": "delay", "event": {"millis": 250}},
//!   {"event_type": "key", "event": {"key": "KeyA", "state": false}}
//! ]
//! ```
//!
//! `delay` is the one event type that never reaches the device: it tells the
//! replayer to wait `millis` milliseconds (fractions allowed).  Every other
//! event is forwarded verbatim, top-level fields included, so scripts may use
//! any event kvmd understands without this crate having to model it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// The `event_type` that marks a replayer-side wait.
pub const DELAY_EVENT_TYPE: &str = "delay";

/// Error type for script parsing.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The document is not a JSON array of objects with an `event_type`.
    #[error("malformed event script: {0}")]
    Json(#[from] serde_json::Error),

    /// A delay event has no usable `millis` value.
    #[error("delay event #{index} needs a finite, non-negative \"millis\" number")]
    InvalidDelay { index: usize },
}

/// A raw script event exactly as it appears in the file and on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptEvent {
    pub event_type: String,
    /// Every other top-level field, `event` included, untouched.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// One step of a parsed script.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    /// Wait before processing the next step.
    Delay(Duration),
    /// Send this event as a JSON text frame.
    Send(ScriptEvent),
}

/// A parsed, validated event script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventScript {
    steps: Vec<ScriptStep>,
}

impl EventScript {
    /// Parses a script from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Json`] if the text is not a list of events and
    /// [`ScriptError::InvalidDelay`] for a delay event without valid `millis`.
    pub fn from_json(text: &str) -> Result<Self, ScriptError> {
        let events: Vec<ScriptEvent> = serde_json::from_str(text)?;
        Self::from_events(events)
    }

    /// Builds a script from already-decoded events.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::InvalidDelay`] for a delay event without valid
    /// `millis`.
    pub fn from_events(events: Vec<ScriptEvent>) -> Result<Self, ScriptError> {
        let steps = events
            .into_iter()
            .enumerate()
            .map(|(index, ev)| {
                if ev.event_type == DELAY_EVENT_TYPE {
                    ev.event()
                        .and_then(|e| e.get("millis"))
                        .and_then(Value::as_f64)
                        .filter(|ms| ms.is_finite() && *ms >= 0.0)
                        .map(|ms| ScriptStep::Delay(millis_to_duration(ms)))
                        .ok_or(ScriptError::InvalidDelay { index })
                } else {
                    Ok(ScriptStep::Send(ev))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { steps })
    }

    /// The steps in replay order.
    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }

    /// Number of events that will be sent to the device.
    pub fn send_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, ScriptStep::Send(_)))
            .count()
    }

    /// Sum of all delays in the script.
    pub fn total_delay(&self) -> Duration {
        self.steps
            .iter()
            .filter_map(|s| match s {
                ScriptStep::Delay(d) => Some(*d),
                ScriptStep::Send(_) => None,
            })
            .sum()
    }
}

/// Whole nanoseconds, so integral millisecond values convert exactly.
fn millis_to_duration(ms: f64) -> Duration {
    Duration::from_nanos((ms * 1_000_000.0).round() as u64)
}

impl ScriptEvent {
    /// The `event` payload, if the entry has one.
    pub fn event(&self) -> Option<&Value> {
        self.fields.get("event")
    }

    /// Serialises the event as the JSON text frame kvmd expects.
    pub fn to_frame(&self) -> String {
        // A string and a JSON map always serialise.
        serde_json::to_string(self).unwrap_or_default()
    }
}
