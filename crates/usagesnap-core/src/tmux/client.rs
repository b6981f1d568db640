use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::process::{Command, Output};

use super::{Multiplexer, SessionSpec};

/// tmux session names we are willing to pass on the command line.
/// `.` and `:` are target separators in tmux, so they are excluded.
static SESSION_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid SESSION_NAME_PATTERN regex")
});

/// Validate a session name to prevent command and target injection
pub fn validate_session_name(name: &str) -> Result<()> {
    if !SESSION_NAME_PATTERN.is_match(name) {
        anyhow::bail!("Invalid tmux session name: {}", name);
    }
    Ok(())
}

/// Session target; `=` forces an exact match instead of tmux's prefix lookup
fn session_target(name: &str) -> String {
    format!("={}", name)
}

/// Active pane of exactly the named session
fn pane_target(name: &str) -> String {
    format!("={}:", name)
}

/// Client for interacting with tmux
pub struct TmuxClient {
    /// Number of scrollback lines to include in a capture
    capture_lines: u32,
}

impl TmuxClient {
    /// Creates a new TmuxClient with default settings
    pub fn new() -> Self {
        Self { capture_lines: 100 }
    }

    /// Creates a new TmuxClient with custom capture lines
    pub fn with_capture_lines(capture_lines: u32) -> Self {
        Self { capture_lines }
    }

    /// Run tmux with `args`, failing on a non-zero exit status
    fn run(&self, subcommand: &str, args: &[&str]) -> Result<Output> {
        let output = Command::new("tmux")
            .arg(subcommand)
            .args(args)
            .output()
            .with_context(|| format!("Failed to execute tmux {}", subcommand))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("tmux {} failed: {}", subcommand, stderr.trim());
        }

        Ok(output)
    }
}

impl Default for TmuxClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Multiplexer for TmuxClient {
    fn probe(&self) -> Result<()> {
        // `-V` works without a running server
        self.run("-V", &[])?;
        Ok(())
    }

    fn new_session(&self, name: &str, spec: &SessionSpec) -> Result<()> {
        validate_session_name(name)?;
        let width = spec.width.to_string();
        let height = spec.height.to_string();
        self.run(
            "new-session",
            &[
                "-d",
                "-s",
                name,
                "-x",
                &width,
                "-y",
                &height,
                "-c",
                &spec.cwd,
                &spec.program,
            ],
        )?;
        Ok(())
    }

    fn has_session(&self, name: &str) -> bool {
        if validate_session_name(name).is_err() {
            return false;
        }
        self.run("has-session", &["-t", &session_target(name)]).is_ok()
    }

    fn send_keys(&self, name: &str, keys: &str) -> Result<()> {
        validate_session_name(name)?;
        self.run("send-keys", &["-t", &pane_target(name), keys])?;
        Ok(())
    }

    fn send_keys_literal(&self, name: &str, text: &str) -> Result<()> {
        validate_session_name(name)?;
        self.run("send-keys", &["-t", &pane_target(name), "-l", text])?;
        Ok(())
    }

    fn capture_pane_plain(&self, name: &str) -> Result<String> {
        validate_session_name(name)?;
        let start_line = format!("-{}", self.capture_lines);
        let target = pane_target(name);
        let output = self.run("capture-pane", &["-p", "-t", &target, "-S", &start_line])?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn kill_session(&self, name: &str) -> Result<()> {
        validate_session_name(name)?;
        self.run("kill-session", &["-t", &session_target(name)])?;
        Ok(())
    }
}
