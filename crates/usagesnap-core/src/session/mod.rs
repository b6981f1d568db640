//! Ephemeral session ownership.
//!
//! [`SessionManager::acquire`] starts the target program in a fresh detached
//! tmux session and returns a [`Session`] guard. The guard kills the session
//! exactly once, either through [`Session::release`] or when it is dropped,
//! so early returns and `?` can never leak a session.

pub mod namegen;

pub use namegen::{NamePolicy, PidRandomNames};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::error::UsageError;
use crate::tmux::{Multiplexer, SessionSpec};

/// Creates uniquely named sessions running the target program
pub struct SessionManager<'m, M: Multiplexer + ?Sized> {
    mux: &'m M,
    names: Box<dyn NamePolicy>,
    spec: SessionSpec,
}

impl<'m, M: Multiplexer + ?Sized> SessionManager<'m, M> {
    pub fn new(mux: &'m M, names: Box<dyn NamePolicy>, spec: SessionSpec) -> Self {
        Self { mux, names, spec }
    }

    /// Start a new session.
    ///
    /// On failure nothing is owned, so nothing is killed: a name collision
    /// means the existing session belongs to someone else.
    pub fn acquire(&self) -> Result<Session<'m, M>, UsageError> {
        self.mux
            .probe()
            .map_err(|e| UsageError::MultiplexerUnavailable {
                reason: format!("{:#}", e),
            })?;

        let name = self.names.next_name();
        self.mux
            .new_session(&name, &self.spec)
            .map_err(|e| UsageError::SessionCreate {
                name: name.clone(),
                reason: format!("{:#}", e),
            })?;

        info!(
            "Created session {} running {:?} in {}",
            name, self.spec.program, self.spec.cwd
        );

        Ok(Session {
            mux: self.mux,
            name,
            released: false,
        })
    }
}

/// Handle to one live ephemeral session; killed when released or dropped
pub struct Session<'m, M: Multiplexer + ?Sized> {
    mux: &'m M,
    name: String,
    released: bool,
}

impl<M: Multiplexer + ?Sized> Session<'_, M> {
    /// tmux session name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the session still exists
    pub fn is_alive(&self) -> bool {
        self.mux.has_session(&self.name)
    }

    /// Press a named key
    pub fn send_keys(&self, keys: &str) -> Result<()> {
        self.mux.send_keys(&self.name, keys)
    }

    /// Type literal text
    pub fn send_literal(&self, text: &str) -> Result<()> {
        self.mux.send_keys_literal(&self.name, text)
    }

    /// Plain-text pane contents
    pub fn capture_plain(&self) -> Result<String> {
        self.mux.capture_pane_plain(&self.name)
    }

    /// Kill the session now instead of at drop
    pub fn release(mut self) {
        self.teardown();
    }

    /// Kill the session once; errors are logged, never propagated
    fn teardown(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match self.mux.kill_session(&self.name) {
            Ok(()) => info!("Killed session {}", self.name),
            Err(e) if !self.mux.has_session(&self.name) => {
                debug!("Session {} already gone: {:#}", self.name, e)
            }
            Err(e) => warn!("Failed to kill session {}: {:#}", self.name, e),
        }
    }
}

impl<M: Multiplexer + ?Sized> Drop for Session<'_, M> {
    fn drop(&mut self) {
        self.teardown();
    }
}
