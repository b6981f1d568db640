use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use usagesnap_core::config::{
    ChoreographySettings, ParserSettings, SessionSettings, LOOKAHEAD_RANGE,
};

/// Choreography longer than this makes a status-bar refresh feel hung
const CHOREOGRAPHY_BUDGET: Duration = Duration::from_secs(10);

/// Command line arguments
#[derive(Parser, Debug, Default)]
#[command(
    author,
    version,
    about = "Print Claude Code /usage as a status line or JSON"
)]
pub struct Config {
    /// Enable debug logging (stderr)
    #[arg(short, long)]
    pub debug: bool,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print a JSON object instead of the compact line
    #[arg(short, long)]
    pub json: bool,

    /// Program started in the hidden session
    #[arg(long)]
    pub program: Option<String>,

    /// Lines searched after each section heading
    #[arg(short = 'l', long)]
    pub lookahead: Option<usize>,

    /// Parse a saved pane capture instead of starting a session
    #[arg(long, value_name = "PATH")]
    pub from_file: Option<PathBuf>,
}

impl Config {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Application settings (from config file)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Hidden session settings
    #[serde(default)]
    pub session: SessionSettings,

    /// Keystroke script and delays
    #[serde(default)]
    pub choreography: ChoreographySettings,

    /// Window table and field patterns
    #[serde(default)]
    pub parser: ParserSettings,
}

impl Settings {
    /// Load settings from config file or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        // Try custom path first
        if let Some(p) = path {
            if p.exists() {
                return Self::read(p);
            }
            warn!("Config file {:?} not found, trying default locations", p);
        }

        let default_paths = [
            dirs::config_dir().map(|p| p.join("usagesnap/config.toml")),
            dirs::home_dir().map(|p| p.join(".config/usagesnap/config.toml")),
            dirs::home_dir().map(|p| p.join(".usagesnap.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::read(path);
            }
        }

        // Return defaults if no config file found
        Ok(Self::default())
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Merge CLI config into settings (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: &Config) {
        if let Some(program) = &cli.program {
            self.session.program = program.clone();
        }
        if let Some(lookahead) = cli.lookahead {
            self.parser.lookahead = lookahead;
        }
    }

    /// Validate and normalize settings values
    pub fn validate(&mut self) {
        const MIN_WIDTH: u16 = 80;
        const MIN_HEIGHT: u16 = 24;

        let (min_lookahead, max_lookahead) = LOOKAHEAD_RANGE;
        let lookahead = self.parser.lookahead.clamp(min_lookahead, max_lookahead);
        if lookahead != self.parser.lookahead {
            warn!(
                "lookahead {} out of range, using {}",
                self.parser.lookahead, lookahead
            );
            self.parser.lookahead = lookahead;
        }

        self.session.width = self.session.width.max(MIN_WIDTH);
        self.session.height = self.session.height.max(MIN_HEIGHT);

        if self.session.program.trim().is_empty() {
            warn!("Empty session program, using default");
            self.session.program = SessionSettings::default().program;
        }

        if self.choreography.steps.is_empty() {
            warn!("Choreography has no steps; the report will never be opened");
        }
        let total = self.choreography.total_delay();
        if total > CHOREOGRAPHY_BUDGET {
            warn!(
                "Choreography delays add up to {:.1}s (budget {}s)",
                total.as_secs_f32(),
                CHOREOGRAPHY_BUDGET.as_secs()
            );
        }
    }
}
