//! Tunable parameters of the pipeline.
//!
//! Every value that depends on how the target program currently renders
//! (startup latency, heading strings, lookahead depth) lives here so that
//! format drift is a config change, not a code change.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::tmux::SessionSpec;
use crate::usage::WindowKind;

/// Detached session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Interactive program started in the session
    #[serde(default = "default_program")]
    pub program: String,

    /// Prefix of generated session names
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,

    /// Pane width in columns (wide enough that meter lines do not wrap)
    #[serde(default = "default_width")]
    pub width: u16,

    /// Pane height in rows
    #[serde(default = "default_height")]
    pub height: u16,

    /// Scrollback lines included in the capture
    #[serde(default = "default_capture_lines")]
    pub capture_lines: u32,

    /// Working directory; home directory when unset
    #[serde(default)]
    pub working_dir: Option<String>,
}

fn default_program() -> String {
    "claude".to_string()
}

fn default_name_prefix() -> String {
    "usagesnap".to_string()
}

fn default_width() -> u16 {
    200
}

fn default_height() -> u16 {
    50
}

fn default_capture_lines() -> u32 {
    100
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            program: default_program(),
            name_prefix: default_name_prefix(),
            width: default_width(),
            height: default_height(),
            capture_lines: default_capture_lines(),
            working_dir: None,
        }
    }
}

impl SessionSettings {
    /// Resolve into the [`SessionSpec`] handed to the multiplexer.
    ///
    /// The home directory is preferred because Claude Code already trusts it
    /// and will not stop at a "trust this folder?" prompt.
    pub fn to_spec(&self) -> SessionSpec {
        let cwd = self
            .working_dir
            .clone()
            .or_else(|| dirs::home_dir().map(|p| p.display().to_string()))
            .unwrap_or_else(|| ".".to_string());
        SessionSpec {
            program: self.program.clone(),
            cwd,
            width: self.width,
            height: self.height,
        }
    }
}

/// What a choreography step does before its delay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    /// Send nothing, only wait
    Wait,
    /// Type literal text
    Type { text: String },
    /// Press a named key (`Enter`, `Escape`, `Tab`, ...)
    Key { key: String },
}

/// One `(payload, delayAfter)` step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoreographyStep {
    #[serde(flatten)]
    pub action: StepAction,

    /// Fixed sleep after the payload is sent
    #[serde(default)]
    pub delay_ms: u64,
}

impl ChoreographyStep {
    pub fn wait(delay_ms: u64) -> Self {
        Self {
            action: StepAction::Wait,
            delay_ms,
        }
    }

    pub fn type_text(text: &str, delay_ms: u64) -> Self {
        Self {
            action: StepAction::Type {
                text: text.to_string(),
            },
            delay_ms,
        }
    }

    pub fn key(key: &str, delay_ms: u64) -> Self {
        Self {
            action: StepAction::Key {
                key: key.to_string(),
            },
            delay_ms,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Keystroke script that brings the `/usage` report on screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoreographySettings {
    #[serde(default = "default_steps")]
    pub steps: Vec<ChoreographyStep>,
}

fn default_steps() -> Vec<ChoreographyStep> {
    vec![
        // Startup, including login banner and MCP server init
        ChoreographyStep::wait(4000),
        // Slash command menu needs a moment before Enter selects it
        ChoreographyStep::type_text("/usage", 1000),
        // Usage numbers are fetched over the network before rendering
        ChoreographyStep::key("Enter", 3000),
    ]
}

impl Default for ChoreographySettings {
    fn default() -> Self {
        Self {
            steps: default_steps(),
        }
    }
}

impl ChoreographySettings {
    /// Upper bound on the time spent in the choreography
    pub fn total_delay(&self) -> Duration {
        self.steps.iter().map(ChoreographyStep::delay).sum()
    }
}

/// How a heading string is compared with a trimmed screen line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingMode {
    Exact,
    Prefix,
}

/// A heading string identifying a window section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingPattern {
    pub text: String,
    #[serde(default = "default_heading_mode")]
    pub mode: HeadingMode,
}

fn default_heading_mode() -> HeadingMode {
    HeadingMode::Prefix
}

impl HeadingPattern {
    pub fn exact(text: &str) -> Self {
        Self {
            text: text.to_string(),
            mode: HeadingMode::Exact,
        }
    }

    pub fn prefix(text: &str) -> Self {
        Self {
            text: text.to_string(),
            mode: HeadingMode::Prefix,
        }
    }

    /// Whether `line` (already trimmed) is this heading
    pub fn matches(&self, line: &str) -> bool {
        match self.mode {
            HeadingMode::Exact => line == self.text,
            HeadingMode::Prefix => line.starts_with(&self.text),
        }
    }
}

/// One row of the declarative window table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRule {
    pub window: WindowKind,
    pub headings: Vec<HeadingPattern>,

    /// A snapshot missing this window's percentage is only partial
    #[serde(default)]
    pub required: bool,
}

impl WindowRule {
    fn new(window: WindowKind, headings: Vec<HeadingPattern>) -> Self {
        Self {
            window,
            headings,
            required: false,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Report parser settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserSettings {
    /// Lines after a heading searched for the percentage and reset lines
    #[serde(default = "default_lookahead")]
    pub lookahead: usize,

    /// Regex with one capture group around the number before `%`
    #[serde(default = "default_percent_pattern")]
    pub percent_pattern: String,

    /// Keyword that introduces the reset description
    #[serde(default = "default_reset_keyword")]
    pub reset_keyword: String,

    /// Keyword marking the spend line of the extra usage meter
    #[serde(default = "default_spend_keyword")]
    pub spend_keyword: String,

    /// Window table, searched in order
    #[serde(default = "default_windows")]
    pub windows: Vec<WindowRule>,
}

/// Lower and upper bounds applied to `lookahead` by settings validation
pub const LOOKAHEAD_RANGE: (usize, usize) = (1, 20);

fn default_lookahead() -> usize {
    3
}

fn default_percent_pattern() -> String {
    // Signs and decimals are captured so they can be rejected, not truncated
    r"(-?\d+(?:\.\d+)?)\s*%".to_string()
}

fn default_reset_keyword() -> String {
    "Resets".to_string()
}

fn default_spend_keyword() -> String {
    "spent".to_string()
}

fn default_windows() -> Vec<WindowRule> {
    vec![
        WindowRule::new(
            WindowKind::Session,
            vec![HeadingPattern::prefix("Current session")],
        )
        .required(),
        WindowRule::new(
            WindowKind::WeekAllModels,
            vec![
                HeadingPattern::prefix("Current week (all models)"),
                HeadingPattern::exact("Current week"),
            ],
        )
        .required(),
        WindowRule::new(
            WindowKind::WeekSonnet,
            vec![HeadingPattern::prefix("Current week (Sonnet")],
        ),
        WindowRule::new(
            WindowKind::WeekOpus,
            vec![HeadingPattern::prefix("Current week (Opus")],
        ),
        WindowRule::new(
            WindowKind::ExtraUsage,
            vec![HeadingPattern::prefix("Extra usage")],
        ),
    ]
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            lookahead: default_lookahead(),
            percent_pattern: default_percent_pattern(),
            reset_keyword: default_reset_keyword(),
            spend_keyword: default_spend_keyword(),
            windows: default_windows(),
        }
    }
}
