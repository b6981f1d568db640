//! usagesnap - Claude Code `/usage` as a status line or JSON.
//!
//! The pipeline itself lives in `usagesnap-core`; this crate adds the
//! command line, config file handling and output dispatch.

pub mod app;
pub mod config;
