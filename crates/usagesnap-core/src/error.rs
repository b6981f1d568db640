use thiserror::Error;

/// Errors that abort a usage fetch.
///
/// A report with missing sections is not an error; it is reported through
/// [`SnapshotStatus`](crate::usage::SnapshotStatus) instead.
#[derive(Debug, Error)]
pub enum UsageError {
    /// The tmux binary could not be executed at all
    #[error("terminal multiplexer is not available: {reason}")]
    MultiplexerUnavailable { reason: String },

    /// `new-session` failed (name collision, bad command, server error)
    #[error("failed to create session {name}: {reason}")]
    SessionCreate { name: String, reason: String },

    /// The session died before its pane could be captured
    #[error("session {name} is no longer alive")]
    SessionGone { name: String },

    /// `capture-pane` failed
    #[error("failed to capture session {name}: {reason}")]
    Capture { name: String, reason: String },

    /// The process was asked to stop before the report was captured
    #[error("interrupted before the report was captured")]
    Interrupted,

    /// A saved capture could not be read
    #[error("failed to read capture file {path}: {reason}")]
    CaptureFile { path: String, reason: String },
}
