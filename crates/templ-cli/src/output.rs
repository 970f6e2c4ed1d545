// crates/templ-cli/src/output.rs
//
// Output formatting utilities for the Templ CLI.
// Supports table and JSON output modes.

use clap::ValueEnum;
use serde::Serialize;
use tabled::{Table, Tabled};

use templ_governance::proposal::ProposalStatus;
use templ_ledger::api::ProposalView;

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

/// One `field | value` row, for records shown as a two-column table.
#[derive(Debug, Tabled)]
pub struct FieldRow {
    #[tabled(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl FieldRow {
    pub fn new(field: &str, value: impl ToString) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// A row in the proposal listing.
#[derive(Debug, Tabled)]
pub struct ProposalRow {
    #[tabled(rename = "ID")]
    pub id: u64,
    #[tabled(rename = "Action")]
    pub action: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Yes")]
    pub yes: u64,
    #[tabled(rename = "No")]
    pub no: u64,
    #[tabled(rename = "Eligible")]
    pub eligible: u64,
    #[tabled(rename = "Status")]
    pub status: String,
}

impl From<&ProposalView> for ProposalRow {
    fn from(view: &ProposalView) -> Self {
        let p = &view.proposal;
        Self {
            id: p.id,
            action: p.action.kind().to_string(),
            title: truncate(&p.title, 40),
            yes: p.yes_votes,
            no: p.no_votes,
            eligible: p.rules.eligible_voters,
            status: status_label(&view.status),
        }
    }
}

/// Human-readable lifecycle label.
pub fn status_label(status: &ProposalStatus) -> String {
    match status {
        ProposalStatus::Open { deadline } => format!("open until {}", timestamp(*deadline)),
        ProposalStatus::QuorumMet { ready_at } => format!("quorum met, ready {}", timestamp(*ready_at)),
        ProposalStatus::Executable => "executable".to_string(),
        ProposalStatus::Expired => "expired".to_string(),
        ProposalStatus::Executed { passed: true } => "executed".to_string(),
        ProposalStatus::Executed { passed: false } => "failed".to_string(),
    }
}

/// Render a unix timestamp as RFC 3339, falling back to the raw number.
pub fn timestamp(ts: u64) -> String {
    i64::try_from(ts)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map_or_else(|| ts.to_string(), |dt| dt.to_rfc3339())
}

/// Truncate a string to `max` characters, adding an ellipsis if cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 40), "short");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }

    #[test]
    fn test_timestamp_rendering() {
        assert_eq!(timestamp(0), "1970-01-01T00:00:00+00:00");
        assert_eq!(timestamp(u64::MAX), u64::MAX.to_string());
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(status_label(&ProposalStatus::Executable), "executable");
        assert_eq!(
            status_label(&ProposalStatus::Executed { passed: false }),
            "failed"
        );
    }
}
