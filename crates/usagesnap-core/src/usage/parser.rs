//! Parse Claude Code `/usage` output from captured tmux pane content.
//!
//! Expected format (each meter block):
//! ```text
//!   Current session
//!   ████████████████████████████████████               72% used
//!   Resets 1am (Asia/Tokyo)
//!
//!   Current week (all models)
//!   ███████████▌                                       23% used
//!   Resets Mar 3, 12am (Asia/Tokyo)
//! ```
//!
//! Each window in the table is located by its heading, then only the next
//! `lookahead` lines are searched, stopping early at the next known heading.
//! A missing heading or field leaves that field empty; parsing never fails.

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::types::{CapturedScreen, SnapshotStatus, UsageSnapshot, UsageWindow, WindowKind};
use crate::config::{ParserSettings, WindowRule, LOOKAHEAD_RANGE};

/// Separator between the spend and reset parts of the extra usage line
const SPEND_SEPARATOR: char = '·';

/// Compiled window table and field patterns
#[derive(Debug, Clone)]
pub struct ReportParser {
    rules: Vec<WindowRule>,
    lookahead: usize,
    percent_re: Regex,
    reset_re: Regex,
    spend_keyword: String,
}

impl ReportParser {
    /// Compile the parser from settings; fails only on a bad `percent_pattern`
    pub fn from_settings(settings: &ParserSettings) -> Result<Self> {
        let percent_re = Regex::new(&settings.percent_pattern).with_context(|| {
            format!("Invalid percent_pattern: {}", settings.percent_pattern)
        })?;
        if percent_re.captures_len() < 2 {
            anyhow::bail!(
                "percent_pattern must contain a capture group: {}",
                settings.percent_pattern
            );
        }

        let reset_re = Regex::new(&format!(
            r"(?i)\b{}\b:?\s*(.*\S)",
            regex::escape(&settings.reset_keyword)
        ))
        .with_context(|| format!("Invalid reset_keyword: {}", settings.reset_keyword))?;

        let (min_lookahead, max_lookahead) = LOOKAHEAD_RANGE;
        let lookahead = settings.lookahead.clamp(min_lookahead, max_lookahead);
        if lookahead != settings.lookahead {
            warn!(
                "Usage parse: lookahead {} out of range, using {}",
                settings.lookahead, lookahead
            );
        }

        Ok(Self {
            rules: settings.windows.clone(),
            lookahead,
            percent_re,
            reset_re,
            spend_keyword: settings.spend_keyword.clone(),
        })
    }

    /// Parse one capture. Pure: the same screen always gives the same snapshot.
    pub fn parse(&self, screen: &CapturedScreen) -> UsageSnapshot {
        let lines = screen.lines();
        let mut windows = BTreeMap::new();

        for rule in &self.rules {
            let Some(heading) = self.find_heading(&lines, rule) else {
                debug!("Usage parse: no heading for {}", rule.window);
                continue;
            };

            let section = self.section(&lines, heading);
            let window = UsageWindow {
                window: rule.window,
                percent_used: self.extract_percent(section),
                resets: self.extract_reset(section),
                spending: self.extract_spending(section),
            };
            debug!(
                "Usage parse: {} at line {}: percent {:?}, resets {:?}",
                rule.window, heading, window.percent_used, window.resets
            );
            windows.insert(rule.window, window);
        }

        let status = self.status(&windows);
        UsageSnapshot {
            captured_at: screen.captured_at(),
            windows,
            status,
        }
    }

    /// Index of the first line that is one of the rule's headings
    fn find_heading(&self, lines: &[&str], rule: &WindowRule) -> Option<usize> {
        lines.iter().position(|line| {
            let line = line.trim();
            rule.headings.iter().any(|h| h.matches(line))
        })
    }

    fn is_any_heading(&self, line: &str) -> bool {
        let line = line.trim();
        self.rules
            .iter()
            .flat_map(|r| r.headings.iter())
            .any(|h| h.matches(line))
    }

    /// Lines after `heading`, at most `lookahead`, cut at the next heading
    fn section<'a>(&self, lines: &'a [&'a str], heading: usize) -> &'a [&'a str] {
        let start = heading.saturating_add(1);
        let end = start.saturating_add(self.lookahead).min(lines.len());
        let window = &lines[start.min(end)..end];
        let fence = window
            .iter()
            .position(|line| self.is_any_heading(line))
            .unwrap_or(window.len());
        &window[..fence]
    }

    /// First percentage token in the section, if it is an integer in 0..=100.
    ///
    /// Only the first token is considered; an invalid one makes the field
    /// absent rather than falling through to a later, unrelated number.
    fn extract_percent(&self, section: &[&str]) -> Option<u8> {
        let raw = section
            .iter()
            .find_map(|line| self.percent_re.captures(line))?
            .get(1)?
            .as_str();
        parse_percent(raw)
    }

    fn extract_reset(&self, section: &[&str]) -> Option<String> {
        section
            .iter()
            .find_map(|line| self.reset_re.captures(line))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn extract_spending(&self, section: &[&str]) -> Option<String> {
        let line = *section
            .iter()
            .find(|line| line.contains(self.spend_keyword.as_str()))?;
        let spend = match line.split_once(SPEND_SEPARATOR) {
            Some((spend, _)) => spend,
            None => line,
        };
        let spend = spend.trim();
        (!spend.is_empty()).then(|| spend.to_string())
    }

    fn status(&self, windows: &BTreeMap<WindowKind, UsageWindow>) -> SnapshotStatus {
        if windows.values().all(UsageWindow::is_empty) {
            return SnapshotStatus::NothingRecognized;
        }

        let required_ok = self
            .rules
            .iter()
            .filter(|r| r.required)
            .all(|r| windows.get(&r.window).is_some_and(|w| w.percent_used.is_some()));
        let found_ok = windows.values().all(|w| w.percent_used.is_some());

        if required_ok && found_ok {
            SnapshotStatus::Complete
        } else {
            SnapshotStatus::Partial
        }
    }
}

impl Default for ReportParser {
    fn default() -> Self {
        Self::from_settings(&ParserSettings::default())
            .expect("default parser settings must compile")
    }
}

/// Integer percentage in 0..=100; signs, decimals and overflow are rejected
fn parse_percent(raw: &str) -> Option<u8> {
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u8>().ok().filter(|p| *p <= 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeadingPattern;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    const FULL_REPORT: &str = r#"
 Settings:  Status   Config   Usage  (←/→ or tab to cycle)


  Current session
  ████████████████████████████████████               72% used
  Resets 1am (Asia/Tokyo)

  Current week (all models)
  ███████████▌                                       23% used
  Resets Mar 3, 12am (Asia/Tokyo)

  Current week (Sonnet only)
                                                     0% used

  Extra usage
  ██████████████████████▏                            44% used
  $22.22 / $50.00 spent · Resets Mar 1 (Asia/Tokyo)

  Esc to cancel
"#;

    fn screen(text: &str) -> CapturedScreen {
        CapturedScreen::new(text.to_string(), Utc::now())
    }

    #[test]
    fn test_parse_full_report() {
        let snapshot = ReportParser::default().parse(&screen(FULL_REPORT));

        assert_eq!(snapshot.percent(WindowKind::Session), Some(72));
        assert_eq!(
            snapshot.resets(WindowKind::Session),
            Some("1am (Asia/Tokyo)")
        );

        assert_eq!(snapshot.percent(WindowKind::WeekAllModels), Some(23));
        assert_eq!(
            snapshot.resets(WindowKind::WeekAllModels),
            Some("Mar 3, 12am (Asia/Tokyo)")
        );

        assert_eq!(snapshot.percent(WindowKind::WeekSonnet), Some(0));
        assert_eq!(snapshot.resets(WindowKind::WeekSonnet), None);

        assert!(snapshot.window(WindowKind::WeekOpus).is_none());

        let extra = snapshot.window(WindowKind::ExtraUsage).unwrap();
        assert_eq!(extra.percent_used, Some(44));
        assert_eq!(extra.spending.as_deref(), Some("$22.22 / $50.00 spent"));
        assert_eq!(extra.resets.as_deref(), Some("Mar 1 (Asia/Tokyo)"));

        assert_eq!(snapshot.status, SnapshotStatus::Complete);
    }

    #[test]
    fn test_minimal_session_block() {
        let snapshot =
            ReportParser::default().parse(&screen("Current session\n  45% used\n  Resets 2h 30m\n"));

        let session = snapshot.window(WindowKind::Session).unwrap();
        assert_eq!(session.percent_used, Some(45));
        assert_eq!(session.resets.as_deref(), Some("2h 30m"));
        // Week heading absent: partial, not an error
        assert!(snapshot.window(WindowKind::WeekAllModels).is_none());
        assert_eq!(snapshot.status, SnapshotStatus::Partial);
    }

    #[test]
    fn test_missing_heading_does_not_affect_other_windows() {
        let without_week = FULL_REPORT.replace("Current week (all models)", "");
        let snapshot = ReportParser::default().parse(&screen(&without_week));

        assert!(snapshot.window(WindowKind::WeekAllModels).is_none());
        assert_eq!(snapshot.percent(WindowKind::Session), Some(72));
        assert_eq!(snapshot.percent(WindowKind::WeekSonnet), Some(0));
        assert_eq!(snapshot.percent(WindowKind::ExtraUsage), Some(44));
        assert_eq!(snapshot.status, SnapshotStatus::Partial);
    }

    #[test]
    fn test_bare_current_week_heading() {
        let text = "Current week\n  ███  61% used\n  Resets Fri 9am\n";
        let snapshot = ReportParser::default().parse(&screen(text));
        assert_eq!(snapshot.percent(WindowKind::WeekAllModels), Some(61));
        assert_eq!(snapshot.resets(WindowKind::WeekAllModels), Some("Fri 9am"));
    }

    #[test]
    fn test_window_does_not_borrow_next_window_percent() {
        let text = "\
  Current week (Sonnet only)
  Extra usage
  ████ 44% used
";
        let snapshot = ReportParser::default().parse(&screen(text));
        let sonnet = snapshot.window(WindowKind::WeekSonnet).unwrap();
        assert_eq!(sonnet.percent_used, None);
        assert_eq!(snapshot.percent(WindowKind::ExtraUsage), Some(44));
    }

    #[test]
    fn test_lookahead_bounds_search() {
        let text = "Current session\n\n\n\n\n  45% used\n";
        let snapshot = ReportParser::default().parse(&screen(text));
        assert_eq!(snapshot.percent(WindowKind::Session), None);

        let settings = ParserSettings {
            lookahead: 5,
            ..ParserSettings::default()
        };
        let snapshot = ReportParser::from_settings(&settings)
            .unwrap()
            .parse(&screen(text));
        assert_eq!(snapshot.percent(WindowKind::Session), Some(45));
    }

    #[test]
    fn test_blank_lines_inside_lookahead() {
        let text = "Current session\n\n  45% used\n  Resets 2h 30m\n";
        let snapshot = ReportParser::default().parse(&screen(text));
        assert_eq!(snapshot.percent(WindowKind::Session), Some(45));
        assert_eq!(snapshot.resets(WindowKind::Session), Some("2h 30m"));
    }

    #[test]
    fn test_out_of_range_percent_is_absent() {
        for bad in ["101% used", "250% used", "-5% used", "12.5% used", "99999% used"] {
            let text = format!("Current session\n  {}\n  Resets 3pm\n", bad);
            let snapshot = ReportParser::default().parse(&screen(&text));
            let session = snapshot.window(WindowKind::Session).unwrap();
            assert_eq!(session.percent_used, None, "input: {}", bad);
            assert_eq!(session.resets.as_deref(), Some("3pm"));
        }
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent("0"), Some(0));
        assert_eq!(parse_percent("72"), Some(72));
        assert_eq!(parse_percent("100"), Some(100));
        assert_eq!(parse_percent("101"), None);
        assert_eq!(parse_percent("-1"), None);
        assert_eq!(parse_percent("4.5"), None);
        assert_eq!(parse_percent(""), None);
    }

    #[test]
    fn test_reset_without_description_is_absent() {
        let text = "Current session\n  10% used\n  Resets\n";
        let snapshot = ReportParser::default().parse(&screen(text));
        assert_eq!(snapshot.resets(WindowKind::Session), None);
        assert_eq!(snapshot.percent(WindowKind::Session), Some(10));
    }

    #[test]
    fn test_empty_input() {
        let snapshot = ReportParser::default().parse(&screen(""));
        assert!(snapshot.windows.is_empty());
        assert_eq!(snapshot.status, SnapshotStatus::NothingRecognized);
    }

    #[test]
    fn test_garbage_input() {
        let text = "bash: claude: command not found\n$ \n";
        let snapshot = ReportParser::default().parse(&screen(text));
        assert!(snapshot.windows.is_empty());
        assert_eq!(snapshot.status, SnapshotStatus::NothingRecognized);
    }

    #[test]
    fn test_found_window_without_percent_is_partial() {
        let text = "\
  Current session
  45% used
  Current week (all models)
  18% used
  Current week (Opus)
  Resets Fri 9am
";
        let snapshot = ReportParser::default().parse(&screen(text));
        assert_eq!(snapshot.percent(WindowKind::Session), Some(45));
        assert_eq!(snapshot.percent(WindowKind::WeekAllModels), Some(18));
        assert_eq!(snapshot.percent(WindowKind::WeekOpus), None);
        assert_eq!(snapshot.status, SnapshotStatus::Partial);

        // Optional windows that are simply absent do not block completeness
        let text = "Current session\n  45% used\nCurrent week\n  18% used\n";
        let snapshot = ReportParser::default().parse(&screen(text));
        assert_eq!(snapshot.status, SnapshotStatus::Complete);
    }

    #[test]
    fn test_heading_only_is_nothing_recognized() {
        let snapshot = ReportParser::default().parse(&screen("Current session\n\n"));
        assert!(snapshot.window(WindowKind::Session).unwrap().is_empty());
        assert_eq!(snapshot.status, SnapshotStatus::NothingRecognized);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let parser = ReportParser::default();
        let capture = screen(FULL_REPORT);
        assert_eq!(parser.parse(&capture), parser.parse(&capture));
    }

    #[test]
    fn test_custom_heading_is_data_only() {
        let mut settings = ParserSettings::default();
        settings.windows[0]
            .headings
            .push(HeadingPattern::exact("Session (5h)"));
        let parser = ReportParser::from_settings(&settings).unwrap();

        let snapshot = parser.parse(&screen("Session (5h)\n  8% used\n  Resets 4pm\n"));
        assert_eq!(snapshot.percent(WindowKind::Session), Some(8));
    }

    #[test]
    fn test_custom_reset_keyword() {
        let settings = ParserSettings {
            reset_keyword: "Renews".to_string(),
            ..ParserSettings::default()
        };
        let parser = ReportParser::from_settings(&settings).unwrap();
        let snapshot = parser.parse(&screen("Current session\n  8% used\n  renews: in 3h\n"));
        assert_eq!(snapshot.resets(WindowKind::Session), Some("in 3h"));
    }

    #[test]
    fn test_invalid_percent_pattern() {
        let settings = ParserSettings {
            percent_pattern: r"(\d+".to_string(),
            ..ParserSettings::default()
        };
        assert!(ReportParser::from_settings(&settings).is_err());

        let settings = ParserSettings {
            percent_pattern: r"\d+%".to_string(),
            ..ParserSettings::default()
        };
        assert!(ReportParser::from_settings(&settings).is_err());
    }

    #[test]
    fn test_huge_lookahead_is_clamped() {
        let settings = ParserSettings {
            lookahead: usize::MAX,
            ..ParserSettings::default()
        };
        let parser = ReportParser::from_settings(&settings).unwrap();
        assert_eq!(parser.lookahead, LOOKAHEAD_RANGE.1);

        let snapshot = parser.parse(&screen("Current session
 45% used
"));
        assert_eq!(snapshot.percent(WindowKind::Session), Some(45));
    }

    #[test]
    fn test_section_at_end_of_screen() {
        let parser = ReportParser::default();
        let lines = ["Current session"];
        assert!(parser.section(&lines, 0).is_empty());
        assert!(parser.section(&lines, usize::MAX).is_empty());
    }
}
