//! Usage data types parsed from Claude Code `/usage` output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::UsageError;

/// Reporting period shown by `/usage`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    /// Rolling five-hour session window
    Session,
    /// Seven-day window across all models
    WeekAllModels,
    /// Seven-day window for Sonnet
    WeekSonnet,
    /// Seven-day window for Opus
    WeekOpus,
    /// Paid usage beyond the plan limits
    ExtraUsage,
}

impl WindowKind {
    /// Every known window, in report order
    pub const ALL: [WindowKind; 5] = [
        WindowKind::Session,
        WindowKind::WeekAllModels,
        WindowKind::WeekSonnet,
        WindowKind::WeekOpus,
        WindowKind::ExtraUsage,
    ];

    /// Key used in structured output
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowKind::Session => "session",
            WindowKind::WeekAllModels => "week_all_models",
            WindowKind::WeekSonnet => "week_sonnet",
            WindowKind::WeekOpus => "week_opus",
            WindowKind::ExtraUsage => "extra_usage",
        }
    }
}

impl std::fmt::Display for WindowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One point-in-time plain-text capture of the session pane
#[derive(Debug, Clone)]
pub struct CapturedScreen {
    text: String,
    captured_at: DateTime<Utc>,
}

impl CapturedScreen {
    pub fn new(text: String, captured_at: DateTime<Utc>) -> Self {
        Self { text, captured_at }
    }

    pub fn lines(&self) -> Vec<&str> {
        self.text.lines().collect()
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// True when the capture holds nothing but whitespace
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A single usage window (e.g. "Current session", "Current week (all models)")
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageWindow {
    pub window: WindowKind,
    /// Percentage used (0-100); `None` when not found or out of range
    pub percent_used: Option<u8>,
    /// Text after the reset keyword (e.g. "1am (Asia/Tokyo)")
    pub resets: Option<String>,
    /// Spend line of the extra usage meter (e.g. "$22.22 / $50.00 spent")
    pub spending: Option<String>,
}

impl UsageWindow {
    pub fn empty(window: WindowKind) -> Self {
        Self {
            window,
            percent_used: None,
            resets: None,
            spending: None,
        }
    }

    /// True when no field was recognised
    pub fn is_empty(&self) -> bool {
        self.percent_used.is_none() && self.resets.is_none() && self.spending.is_none()
    }
}

/// How much of the report was recognised
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStatus {
    /// Every required window and every window found has a percentage
    Complete,
    /// Something was recognised but fields or windows are missing
    Partial,
    /// The capture contained no recognisable usage data
    NothingRecognized,
    /// The pipeline failed before anything could be parsed
    Failed { reason: String },
}

impl SnapshotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotStatus::Complete => "complete",
            SnapshotStatus::Partial => "partial",
            SnapshotStatus::NothingRecognized => "nothing_recognized",
            SnapshotStatus::Failed { .. } => "failed",
        }
    }
}

/// Parsed result of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageSnapshot {
    /// When the pane was captured
    pub captured_at: DateTime<Utc>,
    /// Windows whose heading was found
    pub windows: BTreeMap<WindowKind, UsageWindow>,
    pub status: SnapshotStatus,
}

impl UsageSnapshot {
    /// Snapshot standing in for a failed run: no windows, reason recorded
    pub fn failed(error: &UsageError, at: DateTime<Utc>) -> Self {
        Self {
            captured_at: at,
            windows: BTreeMap::new(),
            status: SnapshotStatus::Failed {
                reason: error.to_string(),
            },
        }
    }

    pub fn window(&self, kind: WindowKind) -> Option<&UsageWindow> {
        self.windows.get(&kind)
    }

    pub fn percent(&self, kind: WindowKind) -> Option<u8> {
        self.window(kind).and_then(|w| w.percent_used)
    }

    pub fn resets(&self, kind: WindowKind) -> Option<&str> {
        self.window(kind).and_then(|w| w.resets.as_deref())
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, SnapshotStatus::Failed { .. })
    }
}
