//! tmux access.
//!
//! [`Multiplexer`] is the seam between the pipeline and the external tmux
//! binary. [`TmuxClient`] shells out to tmux; tests use a recording fake.

mod client;
#[cfg(test)]
pub(crate) mod fake;

pub use client::{validate_session_name, TmuxClient};

use anyhow::Result;

/// Geometry and program of a detached session
#[derive(Debug, Clone)]
pub struct SessionSpec {
    /// Command started as the session's only pane
    pub program: String,
    /// Working directory for the program
    pub cwd: String,
    /// Pane width in columns
    pub width: u16,
    /// Pane height in rows
    pub height: u16,
}

/// Operations the usage pipeline needs from a terminal multiplexer.
///
/// Every method is a blocking call to an external command.
pub trait Multiplexer {
    /// Probe that the multiplexer binary can be executed
    fn probe(&self) -> Result<()>;

    /// Create a detached session named `name` running `spec.program`
    fn new_session(&self, name: &str, spec: &SessionSpec) -> Result<()>;

    /// Whether the named session exists
    fn has_session(&self, name: &str) -> bool;

    /// Send a key name (e.g. `Enter`, `Escape`, `C-c`)
    fn send_keys(&self, name: &str, keys: &str) -> Result<()>;

    /// Send literal text without key-name interpretation
    fn send_keys_literal(&self, name: &str, text: &str) -> Result<()>;

    /// Capture the pane contents as plain text (no escape sequences)
    fn capture_pane_plain(&self, name: &str) -> Result<String>;

    /// Kill the named session
    fn kill_session(&self, name: &str) -> Result<()>;
}
