//! Replays a kvmd event script over an [`EventSink`].
//!
//! Delay steps are honoured locally with `tokio::time::sleep`; every other
//! step is forwarded in order.  The sink is closed when the script finishes,
//! and also when it fails part-way.

use std::time::Duration;

use pikvm_core::{EventScript, ScriptStep};
use tracing::{debug, info, warn};

use crate::application::transport::{EventSink, TransportError};

/// Summary of a completed replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Events delivered to the device.
    pub events_sent: usize,
    /// Total time spent in delay steps.
    pub waited: Duration,
}

/// Sends every step of `script` through `sink`, then closes it.
///
/// # Errors
///
/// Returns the first [`TransportError`] raised by the sink.  Events after the
/// failing one are not sent.
pub async fn replay_script<S>(sink: &mut S, script: &EventScript) -> Result<ReplayReport, TransportError>
where
    S: EventSink + ?Sized,
{
    info!(
        "replaying {} events ({:?} of delays)",
        script.send_count(),
        script.total_delay()
    );

    let result = send_steps(sink, script).await;

    if let Err(e) = sink.close().await {
        warn!("closing event socket failed: {e}");
    }
    result
}

async fn send_steps<S>(sink: &mut S, script: &EventScript) -> Result<ReplayReport, TransportError>
where
    S: EventSink + ?Sized,
{
    let mut report = ReplayReport::default();
    for step in script.steps() {
        match step {
            ScriptStep::Delay(d) => {
                tokio::time::sleep(*d).await;
                report.waited += *d;
            }
            ScriptStep::Send(event) => {
                debug!("send {} event", event.event_type);
                sink.send_event(event).await?;
                report.events_sent += 1;
            }
        }
    }
    Ok(report)
}
