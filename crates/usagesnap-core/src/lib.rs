//! Core library for usagesnap.
//!
//! Drives Claude Code inside a throwaway tmux session, waits for the `/usage`
//! report to render, captures the pane and parses the text into a
//! [`UsageSnapshot`](usage::UsageSnapshot).
//!
//! The pipeline is strictly linear:
//! session manager → choreographer → capturer → report parser → formatter.

pub mod config;
pub mod error;
pub mod session;
pub mod tmux;
pub mod usage;

pub use error::UsageError;
