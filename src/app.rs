//! One invocation: obtain a snapshot, render it in the requested mode.

use chrono::Utc;
use std::path::Path;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, warn};

use usagesnap_core::config::ParserSettings;
use usagesnap_core::usage::{
    format_compact, render_json, CapturedScreen, ReportParser, UsagePipeline, UsageSnapshot,
};
use usagesnap_core::UsageError;

use crate::config::{Config, Settings};

/// Output mode selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// `Claude: 45% | Week: 12%`
    Compact,
    /// One JSON object
    Json,
}

impl OutputMode {
    pub fn from_cli(cli: &Config) -> Self {
        if cli.json {
            OutputMode::Json
        } else {
            OutputMode::Compact
        }
    }

    pub fn render(&self, snapshot: &UsageSnapshot) -> String {
        match self {
            OutputMode::Compact => format_compact(snapshot),
            OutputMode::Json => render_json(snapshot),
        }
    }
}

/// Produce the single output line/object for this invocation. Never fails.
pub async fn run(cli: &Config, settings: &Settings) -> String {
    let snapshot = match &cli.from_file {
        Some(path) => snapshot_from_file(path, &parser_or_default(&settings.parser)),
        None => live_snapshot(settings).await,
    };
    debug!("Snapshot status: {}", snapshot.status.as_str());
    OutputMode::from_cli(cli).render(&snapshot)
}

async fn live_snapshot(settings: &Settings) -> UsageSnapshot {
    let parser = parser_or_default(&settings.parser);
    UsagePipeline::with_parser(&settings.session, &settings.choreography, parser)
        .run_until(shutdown_signal())
        .await
}

/// Resolves on SIGINT or SIGTERM; never resolves if neither can be watched
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => debug!("Received SIGINT"),
        _ = terminate => debug!("Received SIGTERM"),
    }
}

/// Parse a capture saved earlier (e.g. `tmux capture-pane -p > screen.txt`)
fn snapshot_from_file(path: &Path, parser: &ReportParser) -> UsageSnapshot {
    match std::fs::read_to_string(path) {
        Ok(text) => parser.parse(&CapturedScreen::new(text, Utc::now())),
        Err(e) => {
            let err = UsageError::CaptureFile {
                path: path.display().to_string(),
                reason: e.to_string(),
            };
            warn!("{}", err);
            UsageSnapshot::failed(&err, Utc::now())
        }
    }
}

fn parser_or_default(settings: &ParserSettings) -> ReportParser {
    ReportParser::from_settings(settings).unwrap_or_else(|e| {
        warn!("Invalid parser settings, using defaults: {:#}", e);
        ReportParser::default()
    })
}
