//! Terminal Log
//!
//! Append-only record of what every mutating or executing operation did.
//! Entries are never trimmed or reordered for the lifetime of the log.

use chrono::{DateTime, Utc};
use tracing::info;

pub const WELCOME_LINE: &str = "Welcome to Canopy Terminal";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct TerminalLog {
    entries: Vec<LogEntry>,
}

impl TerminalLog {
    /// Empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Log opened with the welcome line
    pub fn with_welcome() -> Self {
        let mut log = Self::new();
        log.push(WELCOME_LINE);
        log
    }

    pub fn push(&mut self, text: impl Into<String>) {
        let text = text.into();
        info!(target: "canopy::terminal", "{}", text);
        self.entries.push(LogEntry {
            at: Utc::now(),
            text,
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry texts from index `from` on; used to show what one command added.
    pub fn lines_since(&self, from: usize) -> Vec<&str> {
        self.entries
            .iter()
            .skip(from)
            .map(|e| e.text.as_str())
            .collect()
    }

    pub fn lines(&self) -> Vec<&str> {
        self.lines_since(0)
    }

    /// `> text` per entry, one per line
    pub fn render(&self) -> String {
        render_lines(self.lines())
    }
}

pub fn render_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> String {
    lines
        .into_iter()
        .map(|l| format!("> {}", l))
        .collect::<Vec<_>>()
        .join("\n")
}
