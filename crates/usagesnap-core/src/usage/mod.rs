//! Usage monitoring — fetch and parse Claude Code `/usage` output.
//!
//! A temporary Claude Code instance is started in a detached tmux session,
//! sent `/usage`, captured once, and the capture is parsed into structured
//! data.

pub mod capture;
pub mod choreography;
pub mod fetcher;
pub mod format;
pub mod parser;
pub mod types;

pub use capture::capture;
pub use choreography::Choreographer;
pub use fetcher::{fetch_usage, fetch_usage_best_effort, fetch_usage_until, UsagePipeline};
pub use format::{format_compact, json_record, render_json, PLACEHOLDER, UNKNOWN_RESET};
pub use parser::ReportParser;
pub use types::{CapturedScreen, SnapshotStatus, UsageSnapshot, UsageWindow, WindowKind};
