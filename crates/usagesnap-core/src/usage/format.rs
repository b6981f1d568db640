//! Output modes for a [`UsageSnapshot`].
//!
//! Both are pure functions of the snapshot. They differ in how they render
//! missing data: the compact line shows a placeholder, the JSON record
//! treats an unknown percentage as zero and an unknown reset as `"unknown"`.

use chrono::SecondsFormat;
use serde_json::{json, Map, Value};

use super::types::{SnapshotStatus, UsageSnapshot, WindowKind};

/// Shown in the compact line for a missing percentage
pub const PLACEHOLDER: &str = "?";

/// Reset description used in JSON when none was parsed
pub const UNKNOWN_RESET: &str = "unknown";

/// Windows in the compact line, with their labels
const COMPACT_FIELDS: [(&str, WindowKind); 2] = [
    ("Claude", WindowKind::Session),
    ("Week", WindowKind::WeekAllModels),
];

const COMPACT_SEPARATOR: &str = " | ";

/// `Claude: 45% | Week: ?%`
pub fn format_compact(snapshot: &UsageSnapshot) -> String {
    COMPACT_FIELDS
        .iter()
        .map(|(label, kind)| {
            let value = snapshot
                .percent(*kind)
                .map(|p| p.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string());
            format!("{}: {}%", label, value)
        })
        .collect::<Vec<_>>()
        .join(COMPACT_SEPARATOR)
}

/// Structured record with every known window.
///
/// Lossy on purpose: unknown percentages become `0` ("unknown treated as
/// zero") so consumers always get an integer.
pub fn json_record(snapshot: &UsageSnapshot) -> Value {
    let mut record = Map::new();
    record.insert(
        "timestamp".to_string(),
        json!(snapshot
            .captured_at
            .to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    record.insert("status".to_string(), json!(snapshot.status.as_str()));
    if let SnapshotStatus::Failed { reason } = &snapshot.status {
        record.insert("error".to_string(), json!(reason));
    }

    for kind in WindowKind::ALL {
        let window = snapshot.window(kind);
        let mut entry = Map::new();
        entry.insert(
            "percent_used".to_string(),
            json!(window.and_then(|w| w.percent_used).unwrap_or(0)),
        );
        entry.insert(
            "resets".to_string(),
            json!(window
                .and_then(|w| w.resets.as_deref())
                .unwrap_or(UNKNOWN_RESET)),
        );
        if let Some(spending) = window.and_then(|w| w.spending.as_deref()) {
            entry.insert("spending".to_string(), json!(spending));
        }
        record.insert(kind.as_str().to_string(), Value::Object(entry));
    }

    Value::Object(record)
}

/// Pretty-printed [`json_record`]
pub fn render_json(snapshot: &UsageSnapshot) -> String {
    format!("{:#}", json_record(snapshot))
}
