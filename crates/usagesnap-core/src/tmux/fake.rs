//! Recording multiplexer for deterministic pipeline tests

use anyhow::Result;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use super::{Multiplexer, SessionSpec};

/// Recorded call to [`FakeMultiplexer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MuxCall {
    NewSession { name: String, program: String },
    SendKeys { name: String, keys: String },
    SendLiteral { name: String, text: String },
    Capture { name: String },
    Kill { name: String },
}

#[derive(Default)]
struct FakeState {
    live: HashSet<String>,
    calls: Vec<MuxCall>,
    screen: String,
    unavailable: bool,
    fail_create: bool,
    fail_capture: bool,
    die_after_create: bool,
}

/// Fake multiplexer that keeps sessions in memory and records every call
#[derive(Clone, Default)]
pub struct FakeMultiplexer {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeMultiplexer {
    /// Fake whose panes always render `screen`
    pub fn with_screen(screen: &str) -> Self {
        let fake = Self::default();
        fake.inner.lock().screen = screen.to_string();
        fake
    }

    pub fn set_unavailable(&self) {
        self.inner.lock().unavailable = true;
    }

    pub fn fail_create(&self) {
        self.inner.lock().fail_create = true;
    }

    pub fn fail_capture(&self) {
        self.inner.lock().fail_capture = true;
    }

    /// Sessions are created but vanish immediately (program exited)
    pub fn die_after_create(&self) {
        self.inner.lock().die_after_create = true;
    }

    pub fn calls(&self) -> Vec<MuxCall> {
        self.inner.lock().calls.clone()
    }

    pub fn create_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, MuxCall::NewSession { .. }))
            .count()
    }

    pub fn kill_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, MuxCall::Kill { .. }))
            .count()
    }

    pub fn live_sessions(&self) -> usize {
        self.inner.lock().live.len()
    }
}

impl Multiplexer for FakeMultiplexer {
    fn probe(&self) -> Result<()> {
        if self.inner.lock().unavailable {
            anyhow::bail!("tmux: command not found");
        }
        Ok(())
    }

    fn new_session(&self, name: &str, spec: &SessionSpec) -> Result<()> {
        let mut state = self.inner.lock();
        state.calls.push(MuxCall::NewSession {
            name: name.to_string(),
            program: spec.program.clone(),
        });
        if state.fail_create {
            anyhow::bail!("tmux new-session failed: server exited unexpectedly");
        }
        if state.live.contains(name) {
            anyhow::bail!("tmux new-session failed: duplicate session: {}", name);
        }
        if !state.die_after_create {
            state.live.insert(name.to_string());
        }
        Ok(())
    }

    fn has_session(&self, name: &str) -> bool {
        self.inner.lock().live.contains(name)
    }

    fn send_keys(&self, name: &str, keys: &str) -> Result<()> {
        let mut state = self.inner.lock();
        state.calls.push(MuxCall::SendKeys {
            name: name.to_string(),
            keys: keys.to_string(),
        });
        if !state.live.contains(name) {
            anyhow::bail!("tmux send-keys failed: can't find session: {}", name);
        }
        Ok(())
    }

    fn send_keys_literal(&self, name: &str, text: &str) -> Result<()> {
        let mut state = self.inner.lock();
        state.calls.push(MuxCall::SendLiteral {
            name: name.to_string(),
            text: text.to_string(),
        });
        if !state.live.contains(name) {
            anyhow::bail!("tmux send-keys failed: can't find session: {}", name);
        }
        Ok(())
    }

    fn capture_pane_plain(&self, name: &str) -> Result<String> {
        let mut state = self.inner.lock();
        state.calls.push(MuxCall::Capture {
            name: name.to_string(),
        });
        if state.fail_capture {
            anyhow::bail!("tmux capture-pane failed: no server running");
        }
        Ok(state.screen.clone())
    }

    fn kill_session(&self, name: &str) -> Result<()> {
        let mut state = self.inner.lock();
        state.calls.push(MuxCall::Kill {
            name: name.to_string(),
        });
        if !state.live.remove(name) {
            anyhow::bail!("tmux kill-session failed: can't find session: {}", name);
        }
        Ok(())
    }
}
