//! Scripted keystrokes that bring the `/usage` report on screen.
//!
//! Claude Code gives no completion signal, so every step is followed by a
//! fixed sleep. Failures to send are logged and the script carries on; a
//! program that never got the keys shows up later as an empty parse.

use tracing::{debug, warn};

use crate::config::{ChoreographyStep, StepAction};
use crate::session::Session;
use crate::tmux::Multiplexer;

/// Plays a fixed list of steps into a session
pub struct Choreographer<'a> {
    steps: &'a [ChoreographyStep],
}

impl<'a> Choreographer<'a> {
    pub fn new(steps: &'a [ChoreographyStep]) -> Self {
        Self { steps }
    }

    /// Run every step in order, sleeping `delay_ms` after each
    pub async fn perform<M: Multiplexer + ?Sized>(&self, session: &Session<'_, M>) {
        for (i, step) in self.steps.iter().enumerate() {
            let sent = match &step.action {
                StepAction::Wait => Ok(()),
                StepAction::Type { text } => session.send_literal(text),
                StepAction::Key { key } => session.send_keys(key),
            };

            match sent {
                Ok(()) => debug!(
                    "Choreography {}: step {} {:?}, sleeping {}ms",
                    session.name(),
                    i,
                    step.action,
                    step.delay_ms
                ),
                Err(e) => warn!(
                    "Choreography {}: step {} {:?} failed: {:#}",
                    session.name(),
                    i,
                    step.action,
                    e
                ),
            }

            if step.delay_ms > 0 {
                tokio::time::sleep(step.delay()).await;
            }
        }
    }
}
