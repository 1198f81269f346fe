//! State-to-text lookup for bubble text, debug summaries and log messages.
//!
//! Templates use `{name}` placeholders:
//! `{npc}`, `{sources}`, `{count}`, `{generated}`, `{total}` and `{elapsed}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::state::{RequestState, RequestStatus};

/// Presentation strings, kept out of the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusText {
    // Chat bubble (the renderer appends the animated ellipsis)
    pub thinking: String,
    pub fetching_context: String,
    pub generating: String,

    // Debug panel header summary
    pub summary_idle: String,
    pub summary_thinking: String,
    pub summary_fetching_context: String,
    pub summary_generating: String,
    pub summary_complete: String,

    // Debug log entries written on transitions
    pub log_request_sent: String,
    pub log_fetching_context: String,
    pub log_generating: String,
    pub log_complete: String,

    pub debug_panel_title: String,
}

impl Default for StatusText {
    fn default() -> Self {
        Self::english()
    }
}

impl StatusText {
    #[must_use]
    pub fn english() -> Self {
        Self {
            thinking: "{npc} is thinking".to_string(),
            fetching_context: "{npc} is recalling".to_string(),
            generating: "{npc} is composing a response".to_string(),
            summary_idle: "Waiting...".to_string(),
            summary_thinking: "Sending request to LLM...".to_string(),
            summary_fetching_context: "Fetching context: {sources}".to_string(),
            summary_generating: "Generating response ({generated}/{total} tokens)".to_string(),
            summary_complete: "Response received".to_string(),
            log_request_sent: "Request sent".to_string(),
            log_fetching_context: "Loading context: {sources}".to_string(),
            log_generating: "Generating response...".to_string(),
            log_complete: "Response received in {elapsed}s".to_string(),
            debug_panel_title: "Debug".to_string(),
        }
    }

    #[must_use]
    pub fn russian() -> Self {
        Self {
            thinking: "{npc} думает".to_string(),
            fetching_context: "{npc} вспоминает".to_string(),
            generating: "{npc} сочиняет ответ".to_string(),
            summary_idle: "Ожидание...".to_string(),
            summary_thinking: "Отправка запроса к LLM...".to_string(),
            summary_fetching_context: "Загрузка контекста: {sources}".to_string(),
            summary_generating: "Генерация ответа ({generated}/{total} токенов)".to_string(),
            summary_complete: "Ответ получен".to_string(),
            log_request_sent: "Запрос отправлен".to_string(),
            log_fetching_context: "Загрузка контекста: {sources}".to_string(),
            log_generating: "Генерация ответа...".to_string(),
            log_complete: "Ответ получен за {elapsed}с".to_string(),
            debug_panel_title: "Отладка".to_string(),
        }
    }

    /// Preset for a locale tag; unknown tags fall back to English.
    #[must_use]
    pub fn for_locale(locale: &str) -> Self {
        match locale.trim().to_ascii_lowercase().as_str() {
            "ru" | "ru-ru" | "russian" => Self::russian(),
            _ => Self::english(),
        }
    }

    /// Replace individual templates by field name.
    ///
    /// Returns the keys that did not match any template so the caller can
    /// report them.
    pub fn apply_overrides(&mut self, overrides: &BTreeMap<String, String>) -> Vec<String> {
        let mut unknown = Vec::new();
        for (key, value) in overrides {
            match self.template_mut(key) {
                Some(slot) => slot.clone_from(value),
                None => unknown.push(key.clone()),
            }
        }
        unknown
    }

    fn template_mut(&mut self, key: &str) -> Option<&mut String> {
        let slot = match key {
            "thinking" => &mut self.thinking,
            "fetching_context" => &mut self.fetching_context,
            "generating" => &mut self.generating,
            "summary_idle" => &mut self.summary_idle,
            "summary_thinking" => &mut self.summary_thinking,
            "summary_fetching_context" => &mut self.summary_fetching_context,
            "summary_generating" => &mut self.summary_generating,
            "summary_complete" => &mut self.summary_complete,
            "log_request_sent" => &mut self.log_request_sent,
            "log_fetching_context" => &mut self.log_fetching_context,
            "log_generating" => &mut self.log_generating,
            "log_complete" => &mut self.log_complete,
            "debug_panel_title" => &mut self.debug_panel_title,
            _ => return None,
        };
        Some(slot)
    }

    /// Bubble text for the current phase; empty when there is nothing to show.
    #[must_use]
    pub fn normal(&self, status: &RequestStatus) -> String {
        let template = match status.state() {
            RequestState::Thinking => &self.thinking,
            RequestState::FetchingContext => &self.fetching_context,
            RequestState::Generating => &self.generating,
            RequestState::Idle | RequestState::Complete => return String::new(),
        };
        fill(template, status, None)
    }

    /// Debug panel summary for the current phase.
    #[must_use]
    pub fn summary(&self, status: &RequestStatus) -> String {
        let template = match status.state() {
            RequestState::Idle => &self.summary_idle,
            RequestState::Thinking => &self.summary_thinking,
            RequestState::FetchingContext => &self.summary_fetching_context,
            RequestState::Generating => &self.summary_generating,
            RequestState::Complete => &self.summary_complete,
        };
        fill(template, status, None)
    }

    pub(crate) fn request_sent(&self, status: &RequestStatus) -> String {
        fill(&self.log_request_sent, status, None)
    }

    pub(crate) fn fetching_context_entry(&self, status: &RequestStatus) -> String {
        fill(&self.log_fetching_context, status, None)
    }

    pub(crate) fn generating_entry(&self, status: &RequestStatus) -> String {
        fill(&self.log_generating, status, None)
    }

    pub(crate) fn complete_entry(&self, status: &RequestStatus, elapsed_secs: f64) -> String {
        fill(&self.log_complete, status, Some(elapsed_secs))
    }
}

fn fill(template: &str, status: &RequestStatus, elapsed_secs: Option<f64>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let Some(close) = tail.find('}') else {
            out.push_str(tail);
            return out;
        };
        match placeholder(&tail[1..close], status, elapsed_secs) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&tail[..=close]),
        }
        rest = &tail[close + 1..];
    }
    out.push_str(rest);
    out
}

fn placeholder(key: &str, status: &RequestStatus, elapsed_secs: Option<f64>) -> Option<String> {
    let value = match key {
        "npc" => status.npc_name().to_string(),
        "sources" => status.context_sources().join(", "),
        "count" => status.context_sources().len().to_string(),
        "generated" => status.tokens_generated().to_string(),
        "total" => status.tokens_total().to_string(),
        "elapsed" => {
            let elapsed = elapsed_secs.unwrap_or_else(|| status.elapsed().as_secs_f64());
            format!("{elapsed:.1}")
        }
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use pretty_assertions::assert_eq;

    fn status_in(state: RequestState) -> RequestStatus {
        let mut status = RequestStatus::started("Aldric", "Hello", Local::now());
        status.state = state;
        status.context_sources = vec!["memory".to_string(), "reputation".to_string()];
        status.tokens_total = 500;
        status.tokens_generated = 120;
        status
    }

    #[test]
    fn every_state_maps_to_a_summary() {
        let text = StatusText::english();
        for state in RequestState::ALL {
            assert!(!text.summary(&status_in(state)).is_empty(), "{state}");
        }
    }

    #[test]
    fn bubble_text_is_empty_for_idle_and_complete() {
        let text = StatusText::english();
        assert_eq!(text.normal(&status_in(RequestState::Idle)), "");
        assert_eq!(text.normal(&status_in(RequestState::Complete)), "");
        assert_eq!(
            text.normal(&status_in(RequestState::Thinking)),
            "Aldric is thinking"
        );
    }

    #[test]
    fn summaries_fill_placeholders() {
        let text = StatusText::english();
        assert_eq!(
            text.summary(&status_in(RequestState::FetchingContext)),
            "Fetching context: memory, reputation"
        );
        assert_eq!(
            text.summary(&status_in(RequestState::Generating)),
            "Generating response (120/500 tokens)"
        );
    }

    #[test]
    fn complete_entry_formats_one_decimal() {
        let text = StatusText::english();
        let status = status_in(RequestState::Complete);
        assert_eq!(
            text.complete_entry(&status, 2.345),
            "Response received in 2.3s"
        );
    }

    #[test]
    fn overrides_replace_known_keys_and_report_unknown() {
        let mut text = StatusText::english();
        let mut overrides = BTreeMap::new();
        overrides.insert("thinking".to_string(), "{npc} ponders".to_string());
        overrides.insert("bogus".to_string(), "x".to_string());

        let unknown = text.apply_overrides(&overrides);
        assert_eq!(unknown, vec!["bogus".to_string()]);
        assert_eq!(
            text.normal(&status_in(RequestState::Thinking)),
            "Aldric ponders"
        );
    }

    #[test]
    fn locale_lookup_falls_back_to_english() {
        assert_eq!(StatusText::for_locale("RU"), StatusText::russian());
        assert_eq!(StatusText::for_locale("de"), StatusText::english());
    }

    #[test]
    fn count_placeholder_reports_number_of_sources() {
        let mut text = StatusText::english();
        text.summary_fetching_context = "fetching context from {count} sources".to_string();
        assert_eq!(
            text.summary(&status_in(RequestState::FetchingContext)),
            "fetching context from 2 sources"
        );
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let text = StatusText::english();
        let mut status = status_in(RequestState::FetchingContext);
        status.npc_name = "{generated} the Bold".to_string();
        status.context_sources = vec!["lore{total}".to_string(), "memory".to_string()];

        assert_eq!(
            text.fetching_context_entry(&status),
            "Loading context: lore{total}, memory"
        );
        assert_eq!(text.summary(&status), "Fetching context: lore{total}, memory");

        status.state = RequestState::Thinking;
        assert_eq!(text.normal(&status), "{generated} the Bold is thinking");
    }

    #[test]
    fn unknown_or_unterminated_placeholders_pass_through() {
        let mut text = StatusText::english();
        text.thinking = "{npc} {mood} {npc".to_string();
        assert_eq!(
            text.normal(&status_in(RequestState::Thinking)),
            "Aldric {mood} {npc"
        );
    }
}
