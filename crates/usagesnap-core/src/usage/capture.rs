//! Single point-in-time pane capture.

use chrono::Utc;
use tracing::debug;

use super::types::CapturedScreen;
use crate::error::UsageError;
use crate::session::Session;
use crate::tmux::Multiplexer;

/// Snapshot the session pane as plain text.
///
/// Fails when the session has already exited (the program crashed or quit)
/// or when `capture-pane` itself fails.
pub fn capture<M: Multiplexer + ?Sized>(
    session: &Session<'_, M>,
) -> Result<CapturedScreen, UsageError> {
    if !session.is_alive() {
        return Err(UsageError::SessionGone {
            name: session.name().to_string(),
        });
    }

    let text = session.capture_plain().map_err(|e| UsageError::Capture {
        name: session.name().to_string(),
        reason: format!("{:#}", e),
    })?;

    debug!(
        "Captured {} lines ({} bytes) from {}",
        text.lines().count(),
        text.len(),
        session.name()
    );

    Ok(CapturedScreen::new(text, Utc::now()))
}
