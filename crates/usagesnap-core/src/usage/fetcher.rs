//! End-to-end fetch: spawn a hidden Claude Code session, drive it to the
//! `/usage` report, capture the pane and parse it.

use anyhow::Result;
use chrono::Utc;
use std::future::Future;
use tracing::{info, warn};

use super::capture::capture;
use super::choreography::Choreographer;
use super::parser::ReportParser;
use super::types::{SnapshotStatus, UsageSnapshot};
use crate::config::{ChoreographySettings, ParserSettings, SessionSettings};
use crate::error::UsageError;
use crate::session::{NamePolicy, PidRandomNames, SessionManager};
use crate::tmux::{Multiplexer, SessionSpec, TmuxClient};

/// Fetch usage data through a fresh session.
///
/// 1. Creates a detached session running the target program
/// 2. Plays the choreography (types `/usage`, presses Enter, waits)
/// 3. Captures the pane once
/// 4. Kills the session
/// 5. Parses the capture
///
/// The session is killed exactly once on every path: explicitly after the
/// capture, or by the guard's drop if anything in between returns early.
pub async fn fetch_usage<M: Multiplexer + ?Sized>(
    sessions: &SessionManager<'_, M>,
    choreographer: &Choreographer<'_>,
    parser: &ReportParser,
) -> Result<UsageSnapshot, UsageError> {
    let session = sessions.acquire()?;

    choreographer.perform(&session).await;

    let screen = capture(&session);
    session.release();
    let screen = screen?;
    if screen.is_blank() {
        warn!("Usage fetch: captured pane is blank");
    }

    let snapshot = parser.parse(&screen);
    match &snapshot.status {
        SnapshotStatus::NothingRecognized => {
            warn!("Usage fetch: no usage data recognised in capture")
        }
        SnapshotStatus::Partial => info!("Usage fetch: partial usage report"),
        _ => info!("Usage fetch: {} windows parsed", snapshot.windows.len()),
    }
    Ok(snapshot)
}

/// [`fetch_usage`], with any error folded into a failed snapshot
pub async fn fetch_usage_best_effort<M: Multiplexer + ?Sized>(
    sessions: &SessionManager<'_, M>,
    choreographer: &Choreographer<'_>,
    parser: &ReportParser,
) -> UsageSnapshot {
    match fetch_usage(sessions, choreographer, parser).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Usage fetch failed: {}", e);
            UsageSnapshot::failed(&e, Utc::now())
        }
    }
}

/// [`fetch_usage_best_effort`], abandoned as soon as `shutdown` completes.
///
/// Abandoning drops the in-flight fetch, and with it the session guard, so
/// the session is killed before the failed snapshot is returned.
pub async fn fetch_usage_until<M, F>(
    sessions: &SessionManager<'_, M>,
    choreographer: &Choreographer<'_>,
    parser: &ReportParser,
    shutdown: F,
) -> UsageSnapshot
where
    M: Multiplexer + ?Sized,
    F: Future<Output = ()>,
{
    tokio::select! {
        snapshot = fetch_usage_best_effort(sessions, choreographer, parser) => snapshot,
        _ = shutdown => {
            let err = UsageError::Interrupted;
            warn!("Usage fetch: {}", err);
            UsageSnapshot::failed(&err, Utc::now())
        }
    }
}

/// Pipeline wired to the real tmux binary
pub struct UsagePipeline {
    tmux: TmuxClient,
    spec: SessionSpec,
    name_prefix: String,
    choreography: ChoreographySettings,
    parser: ReportParser,
}

impl UsagePipeline {
    /// Build the pipeline; fails only if the parser patterns do not compile
    pub fn new(
        session: &SessionSettings,
        choreography: &ChoreographySettings,
        parser: &ParserSettings,
    ) -> Result<Self> {
        let parser = ReportParser::from_settings(parser)?;
        Ok(Self::with_parser(session, choreography, parser))
    }

    /// Build the pipeline around an already compiled parser
    pub fn with_parser(
        session: &SessionSettings,
        choreography: &ChoreographySettings,
        parser: ReportParser,
    ) -> Self {
        Self {
            tmux: TmuxClient::with_capture_lines(session.capture_lines),
            spec: session.to_spec(),
            name_prefix: session.name_prefix.clone(),
            choreography: choreography.clone(),
            parser,
        }
    }

    /// Run once; never fails, see [`fetch_usage_best_effort`]
    pub async fn run(&self) -> UsageSnapshot {
        self.run_until(std::future::pending()).await
    }

    /// Run once, giving up cleanly when `shutdown` completes
    pub async fn run_until<F: Future<Output = ()>>(&self, shutdown: F) -> UsageSnapshot {
        let names: Box<dyn NamePolicy> = Box::new(PidRandomNames::new(&self.name_prefix));
        let sessions = SessionManager::new(&self.tmux, names, self.spec.clone());
        let choreographer = Choreographer::new(&self.choreography.steps);
        fetch_usage_until(&sessions, &choreographer, &self.parser, shutdown).await
    }
}
