//! The request status state machine.
//!
//! Every transition is accepted from every state. The tracker holds no locks;
//! callers serialize access (see [`ChannelListener`](super::ChannelListener)
//! and `crate::pipeline`).

use std::fmt;

use chrono::Local;

use super::animation::{AnimationClock, AnimationFrame};
use super::debug_log::DebugLogEntry;
use super::events::{StatusListener, SubscriptionId};
use super::state::{RequestState, RequestStatus};
use super::status_text::StatusText;

/// Token budget used when the pipeline does not announce one.
pub const DEFAULT_TOTAL_TOKENS: u32 = 500;

/// Owns the live [`RequestStatus`], drives the animation clock and notifies
/// subscribers of state changes.
pub struct RequestStatusTracker {
    status: RequestStatus,
    clock: AnimationClock,
    text: StatusText,
    listeners: Vec<(SubscriptionId, Box<dyn StatusListener>)>,
    next_subscription: u64,
}

impl fmt::Debug for RequestStatusTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestStatusTracker")
            .field("status", &self.status)
            .field("clock", &self.clock)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Default for RequestStatusTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestStatusTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::with_text(StatusText::default())
    }

    /// Tracker whose debug-log messages come from `text`.
    #[must_use]
    pub fn with_text(text: StatusText) -> Self {
        Self {
            status: RequestStatus::default(),
            clock: AnimationClock::new(),
            text,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    // === Read accessors ===

    pub fn status(&self) -> &RequestStatus {
        &self.status
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn text(&self) -> &StatusText {
        &self.text
    }

    /// Swap the text table; affects entries appended from now on.
    pub fn set_text(&mut self, text: StatusText) {
        self.text = text;
    }

    pub fn animation(&self) -> AnimationFrame {
        self.clock.frame()
    }

    /// Current ellipsis, one to four dots.
    pub fn animated_dots(&self) -> &'static str {
        self.clock.frame().dots()
    }

    // === Subscriptions ===

    /// Register a listener; it fires synchronously after every transition.
    pub fn subscribe(&mut self, listener: impl StatusListener + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    // === Transitions ===

    /// Begin a new request, silently abandoning any request in flight.
    pub fn start_request(&mut self, npc_name: impl Into<String>, user_message: impl Into<String>) {
        if self.status.is_active() {
            tracing::debug!(
                previous = %self.status.state(),
                "abandoning in-flight request"
            );
        }
        self.status = RequestStatus::started(npc_name, user_message, Local::now());
        tracing::debug!(npc = %self.status.npc_name(), "request started");

        let message = self.text.request_sent(&self.status);
        self.append_debug_log(message, RequestState::Thinking);
        self.emit(RequestState::Thinking);
    }

    /// Record that the pipeline is loading context from `sources`.
    pub fn set_fetching_context<I, S>(&mut self, sources: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.status.state = RequestState::FetchingContext;
        self.status.context_sources = sources.into_iter().map(Into::into).collect();
        tracing::debug!(
            sources = self.status.context_sources.len(),
            "fetching context"
        );

        let message = self.text.fetching_context_entry(&self.status);
        self.append_debug_log(message, RequestState::FetchingContext);
        self.emit(RequestState::FetchingContext);
    }

    /// Record that generation started with a budget of `total_tokens`.
    pub fn set_generating(&mut self, total_tokens: u32) {
        self.status.state = RequestState::Generating;
        self.status.tokens_total = total_tokens;
        self.status.tokens_generated = 0;
        tracing::debug!(total_tokens, "generating");

        let message = self.text.generating_entry(&self.status);
        self.append_debug_log(message, RequestState::Generating);
        self.emit(RequestState::Generating);
    }

    /// Update the streamed token count.
    ///
    /// High-frequency path: no debug entry and no change event.
    pub fn update_tokens(&mut self, generated: u32) {
        self.status.tokens_generated = generated;
        tracing::trace!(generated, "tokens updated");
    }

    /// Finish the request with its final response text.
    pub fn complete(&mut self, response: impl Into<String>) {
        self.status.state = RequestState::Complete;
        self.status.response = Some(response.into());
        self.status.end_time = Some(Local::now());

        let elapsed = self.status.elapsed().as_secs_f64();
        tracing::debug!(elapsed_secs = elapsed, "request complete");

        let message = self.text.complete_entry(&self.status, elapsed);
        self.append_debug_log(message, RequestState::Complete);
        self.emit(RequestState::Complete);
    }

    /// Drop the current status (and its log) for a fresh idle one.
    pub fn reset(&mut self) {
        self.status = RequestStatus::default();
        tracing::debug!("status reset");
        self.emit(RequestState::Idle);
    }

    /// Append an ad-hoc annotation to the current request's log.
    pub fn append_debug_log(&mut self, message: impl Into<String>, state: RequestState) {
        self.status
            .debug_log
            .push(DebugLogEntry::new(message, state));
    }

    /// Advance the spinner and ellipsis by one frame. Valid in any state.
    pub fn advance_animation(&mut self) -> AnimationFrame {
        self.clock.advance()
    }

    fn emit(&mut self, state: RequestState) {
        for (_, listener) in &mut self.listeners {
            listener.on_state_changed(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    fn recorder(tracker: &mut RequestStatusTracker) -> Arc<Mutex<Vec<RequestState>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        tracker.subscribe(move |state: RequestState| {
            if let Ok(mut states) = sink.lock() {
                states.push(state);
            }
        });
        seen
    }

    fn recorded(seen: &Arc<Mutex<Vec<RequestState>>>) -> Vec<RequestState> {
        seen.lock().map(|states| states.clone()).unwrap_or_default()
    }

    #[test]
    fn full_request_scenario() {
        let mut tracker = RequestStatusTracker::new();
        tracker.start_request("Aldric", "Hello");
        tracker.set_fetching_context(["memory", "reputation"]);
        tracker.set_generating(DEFAULT_TOTAL_TOKENS);
        tracker.update_tokens(120);
        tracker.complete("Greetings, traveler.");

        let status = tracker.status();
        assert_eq!(status.state(), RequestState::Complete);
        assert_eq!(status.tokens_generated(), 120);
        assert_eq!(status.tokens_total(), 500);
        assert_eq!(status.response(), Some("Greetings, traveler."));
        assert_eq!(status.debug_log().len(), 4);
        let start = status.start_time().expect("start time");
        let end = status.end_time().expect("end time");
        assert!(end >= start);

        let states: Vec<_> = status.debug_log().iter().map(DebugLogEntry::state).collect();
        assert_eq!(
            states,
            vec![
                RequestState::Thinking,
                RequestState::FetchingContext,
                RequestState::Generating,
                RequestState::Complete,
            ]
        );
        assert_eq!(
            status.debug_log().entries()[1].message(),
            "Loading context: memory, reputation"
        );
        assert!(
            status.debug_log().entries()[3]
                .message()
                .starts_with("Response received in ")
        );
    }

    #[test]
    fn start_request_always_yields_fresh_thinking_status() {
        let mut tracker = RequestStatusTracker::new();
        tracker.start_request("Aldric", "Hello");
        tracker.set_fetching_context(["memory"]);
        tracker.complete("done");

        tracker.start_request("Brenna", "Again");
        let status = tracker.status();
        assert_eq!(status.state(), RequestState::Thinking);
        assert_eq!(status.npc_name(), "Brenna");
        assert!(status.context_sources().is_empty());
        assert_eq!(status.response(), None);
        assert_eq!(status.end_time(), None);
        assert_eq!(status.debug_log().len(), 1);
    }

    #[test]
    fn log_counts_only_appending_calls() {
        let mut tracker = RequestStatusTracker::new();
        tracker.start_request("Aldric", "Hello");
        for generated in 0..50 {
            tracker.update_tokens(generated);
        }
        assert_eq!(tracker.status().debug_log().len(), 1);

        tracker.set_generating(10);
        tracker.append_debug_log("cache hit", RequestState::Generating);
        tracker.update_tokens(7);
        assert_eq!(tracker.status().debug_log().len(), 3);
        assert_eq!(tracker.status().tokens_generated(), 7);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut tracker = RequestStatusTracker::new();
        tracker.start_request("Aldric", "Hello");
        tracker.reset();
        let first = tracker.status().clone();
        tracker.reset();
        let second = tracker.status().clone();

        assert_eq!(first, second);
        assert_eq!(second, RequestStatus::default());
        assert!(!tracker.is_active());
        assert!(second.debug_log().is_empty());
    }

    #[test]
    fn transitions_are_accepted_from_any_state() {
        let mut tracker = RequestStatusTracker::new();
        tracker.complete("early");
        assert_eq!(tracker.status().state(), RequestState::Complete);
        assert_eq!(tracker.status().debug_log().len(), 1);

        tracker.set_generating(20);
        tracker.set_fetching_context(Vec::<String>::new());
        assert_eq!(tracker.status().state(), RequestState::FetchingContext);
        assert_eq!(tracker.status().tokens_total(), 20);
    }

    #[test]
    fn events_fire_once_per_transition_in_order() {
        let mut tracker = RequestStatusTracker::new();
        let seen = recorder(&mut tracker);

        tracker.start_request("Aldric", "Hello");
        tracker.set_fetching_context(["memory"]);
        tracker.set_generating(100);
        tracker.update_tokens(50);
        tracker.append_debug_log("note", RequestState::Generating);
        tracker.complete("ok");
        tracker.reset();

        assert_eq!(
            recorded(&seen),
            vec![
                RequestState::Thinking,
                RequestState::FetchingContext,
                RequestState::Generating,
                RequestState::Complete,
                RequestState::Idle,
            ]
        );
    }

    #[test]
    fn listener_sees_mutation_before_method_returns() {
        let mut tracker = RequestStatusTracker::new();
        let seen = recorder(&mut tracker);
        tracker.set_generating(10);
        // The event was recorded synchronously inside set_generating.
        assert_eq!(recorded(&seen), vec![RequestState::Generating]);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut tracker = RequestStatusTracker::new();
        let seen = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&seen);
        let id = tracker.subscribe(move |_state: RequestState| {
            if let Ok(mut count) = sink.lock() {
                *count += 1;
            }
        });

        tracker.start_request("Aldric", "Hello");
        assert!(tracker.unsubscribe(id));
        assert!(!tracker.unsubscribe(id));
        tracker.reset();

        assert_eq!(*seen.lock().expect("lock"), 1);
    }

    #[test]
    fn animation_runs_while_idle_and_survives_transitions() {
        let mut tracker = RequestStatusTracker::new();
        for _ in 0..20 {
            tracker.advance_animation();
        }
        let before = tracker.animation();
        tracker.start_request("Aldric", "Hello");
        tracker.reset();
        assert_eq!(tracker.animation(), before);
        assert_eq!(before.angle, 200.0);
        assert_eq!(tracker.animated_dots(), "..");
    }

    #[test]
    fn log_messages_follow_text_table() {
        let mut tracker = RequestStatusTracker::with_text(StatusText::russian());
        tracker.start_request("Ульрих", "Привет");
        tracker.set_fetching_context(["general_knowledge"]);
        let messages: Vec<_> = tracker
            .status()
            .debug_log()
            .iter()
            .map(|entry| entry.message().to_string())
            .collect();
        assert_eq!(
            messages,
            vec![
                "Запрос отправлен".to_string(),
                "Загрузка контекста: general_knowledge".to_string(),
            ]
        );
    }

    #[test]
    fn source_names_are_logged_verbatim() {
        let mut tracker = RequestStatusTracker::new();
        tracker.start_request("{generated} the Bold", "Hello");
        tracker.set_fetching_context(["lore{total}", "memory"]);

        let entry = tracker.status().debug_log().last().expect("entry");
        assert_eq!(entry.message(), "Loading context: lore{total}, memory");
        assert_eq!(
            tracker.status().normal_mode_text(tracker.text()),
            "{generated} the Bold is recalling"
        );
    }
}
