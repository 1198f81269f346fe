//! Append-only record of state transitions for the debug panel.

use std::fmt;

use chrono::{DateTime, Local};

use super::state::RequestState;

/// A single timestamped annotation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugLogEntry {
    message: String,
    state: RequestState,
    timestamp: DateTime<Local>,
}

impl DebugLogEntry {
    /// Create an entry stamped with the current local time.
    #[must_use]
    pub fn new(message: impl Into<String>, state: RequestState) -> Self {
        Self::at(message, state, Local::now())
    }

    #[must_use]
    pub fn at(message: impl Into<String>, state: RequestState, timestamp: DateTime<Local>) -> Self {
        Self {
            message: message.into(),
            state,
            timestamp,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }
}

impl fmt::Display for DebugLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

/// Ordered debug entries for one request.
///
/// Storage is never trimmed; [`recent`](Self::recent) is the display window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugLog {
    entries: Vec<DebugLogEntry>,
}

impl DebugLog {
    pub(crate) fn push(&mut self, entry: DebugLogEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DebugLogEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DebugLogEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&DebugLogEntry> {
        self.entries.last()
    }

    /// The newest `count` entries, oldest of the window first.
    #[must_use]
    pub fn recent(&self, count: usize) -> &[DebugLogEntry] {
        let start = self.entries.len().saturating_sub(count);
        &self.entries[start..]
    }
}

impl<'a> IntoIterator for &'a DebugLog {
    type Item = &'a DebugLogEntry;
    type IntoIter = std::slice::Iter<'a, DebugLogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn log_with(count: usize) -> DebugLog {
        let mut log = DebugLog::default();
        for idx in 0..count {
            log.push(DebugLogEntry::new(format!("entry {idx}"), RequestState::Thinking));
        }
        log
    }

    #[test]
    fn recent_returns_newest_window_oldest_first() {
        let log = log_with(7);
        let window: Vec<_> = log.recent(5).iter().map(DebugLogEntry::message).collect();
        assert_eq!(
            window,
            vec!["entry 2", "entry 3", "entry 4", "entry 5", "entry 6"]
        );
        // Storage keeps everything.
        assert_eq!(log.len(), 7);
    }

    #[test]
    fn recent_handles_short_logs() {
        let log = log_with(2);
        assert_eq!(log.recent(5).len(), 2);
        assert!(DebugLog::default().recent(5).is_empty());
    }

    #[test]
    fn entry_display_has_clock_prefix() {
        let timestamp = Local
            .with_ymd_and_hms(2024, 3, 9, 14, 5, 7)
            .single()
            .expect("unambiguous local time");
        let entry = DebugLogEntry::at("Request sent", RequestState::Thinking, timestamp);
        assert_eq!(entry.to_string(), "[14:05:07] Request sent");
    }
}
