//! Request phases and the live status record for one in-flight request.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::debug_log::DebugLog;
use super::status_text::StatusText;

/// Phase of an in-flight language-model request.
///
/// The variants are listed in their usual order of progress, but the tracker
/// accepts any transition from any phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    /// No active request
    #[default]
    Idle,
    /// Request sent, waiting for the pipeline to report progress
    Thinking,
    /// Pulling extra context (memory, lore, database lookups)
    FetchingContext,
    /// The model is streaming tokens
    Generating,
    /// Response is ready
    Complete,
}

impl RequestState {
    pub const ALL: [RequestState; 5] = [
        RequestState::Idle,
        RequestState::Thinking,
        RequestState::FetchingContext,
        RequestState::Generating,
        RequestState::Complete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RequestState::Idle => "idle",
            RequestState::Thinking => "thinking",
            RequestState::FetchingContext => "fetching_context",
            RequestState::Generating => "generating",
            RequestState::Complete => "complete",
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of the current request, including its debug log.
///
/// Only [`RequestStatusTracker`](super::RequestStatusTracker) mutates a status;
/// everyone else reads it through the accessors below.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestStatus {
    pub(crate) state: RequestState,
    pub(crate) npc_name: String,
    pub(crate) user_message: String,
    pub(crate) start_time: Option<DateTime<Local>>,
    pub(crate) end_time: Option<DateTime<Local>>,
    pub(crate) context_sources: Vec<String>,
    pub(crate) tokens_total: u32,
    pub(crate) tokens_generated: u32,
    pub(crate) response: Option<String>,
    pub(crate) debug_log: DebugLog,
}

impl RequestStatus {
    /// A fresh status for a request that was just sent.
    pub(crate) fn started(
        npc_name: impl Into<String>,
        user_message: impl Into<String>,
        now: DateTime<Local>,
    ) -> Self {
        Self {
            state: RequestState::Thinking,
            npc_name: npc_name.into(),
            user_message: user_message.into(),
            start_time: Some(now),
            ..Self::default()
        }
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn npc_name(&self) -> &str {
        &self.npc_name
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    /// Wall-clock time the request was started; `None` while idle.
    pub fn start_time(&self) -> Option<DateTime<Local>> {
        self.start_time
    }

    /// Wall-clock time the request completed; set only by `complete`.
    pub fn end_time(&self) -> Option<DateTime<Local>> {
        self.end_time
    }

    pub fn context_sources(&self) -> &[String] {
        &self.context_sources
    }

    pub fn tokens_total(&self) -> u32 {
        self.tokens_total
    }

    pub fn tokens_generated(&self) -> u32 {
        self.tokens_generated
    }

    pub fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    pub fn debug_log(&self) -> &DebugLog {
        &self.debug_log
    }

    /// Whether a request is in flight (any phase other than idle).
    pub fn is_active(&self) -> bool {
        self.state != RequestState::Idle
    }

    /// Time spent on the request so far, or in total once it completed.
    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Local::now())
    }

    /// Same as [`elapsed`](Self::elapsed) with an explicit "now".
    ///
    /// Never negative: a missing start time or a clock that stepped backwards
    /// yields zero.
    #[must_use]
    pub fn elapsed_at(&self, now: DateTime<Local>) -> Duration {
        let Some(start) = self.start_time else {
            return Duration::ZERO;
        };
        let end = self.end_time.unwrap_or(now);
        (end - start).to_std().unwrap_or(Duration::ZERO)
    }

    /// One-line text for the chat bubble. Empty for idle and complete.
    #[must_use]
    pub fn normal_mode_text(&self, text: &StatusText) -> String {
        text.normal(self)
    }

    /// One-line technical summary for the debug panel header.
    #[must_use]
    pub fn debug_mode_text(&self, text: &StatusText) -> String {
        text.summary(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn default_status_is_idle_and_inactive() {
        let status = RequestStatus::default();
        assert_eq!(status.state(), RequestState::Idle);
        assert!(!status.is_active());
        assert!(status.debug_log().is_empty());
        assert_eq!(status.elapsed(), Duration::ZERO);
    }

    #[test]
    fn every_non_idle_state_counts_as_active() {
        for state in RequestState::ALL {
            let status = RequestStatus {
                state,
                ..RequestStatus::default()
            };
            assert_eq!(status.is_active(), state != RequestState::Idle, "{state}");
        }
    }

    #[test]
    fn elapsed_uses_end_time_when_present() {
        let start = Local::now();
        let mut status = RequestStatus::started("Aldric", "Hello", start);
        status.end_time = Some(start + TimeDelta::milliseconds(2_500));

        let later = start + TimeDelta::seconds(60);
        assert_eq!(status.elapsed_at(later), Duration::from_millis(2_500));
    }

    #[test]
    fn elapsed_clamps_backwards_clock_to_zero() {
        let start = Local::now();
        let status = RequestStatus::started("Aldric", "Hello", start);
        let earlier = start - TimeDelta::seconds(5);
        assert_eq!(status.elapsed_at(earlier), Duration::ZERO);
    }

    #[test]
    fn state_names_are_snake_case() {
        assert_eq!(RequestState::FetchingContext.to_string(), "fetching_context");
        assert_eq!(RequestState::Idle.as_str(), "idle");
    }
}
