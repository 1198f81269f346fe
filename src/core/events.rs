//! Change notifications emitted by the status tracker.
//!
//! Listeners run synchronously on whatever context calls the tracker. Hosts
//! that drive the tracker from a background task and render elsewhere should
//! subscribe a [`ChannelListener`] and drain it on their render thread.

use tokio::sync::mpsc::UnboundedSender;

use super::state::RequestState;

/// Events emitted by the tracker to update the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// The request moved to a new phase (or was reset to idle)
    StateChanged { state: RequestState },
}

impl StatusEvent {
    pub fn state(&self) -> RequestState {
        match self {
            StatusEvent::StateChanged { state } => *state,
        }
    }
}

/// Receives state changes, once per transition, right after the mutation.
pub trait StatusListener: Send {
    fn on_state_changed(&mut self, state: RequestState);
}

impl<F> StatusListener for F
where
    F: FnMut(RequestState) + Send,
{
    fn on_state_changed(&mut self, state: RequestState) {
        self(state);
    }
}

/// Forwards state changes into an unbounded channel.
///
/// A closed receiver is not an error: the host simply stopped listening.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: UnboundedSender<StatusEvent>,
}

impl ChannelListener {
    #[must_use]
    pub fn new(tx: UnboundedSender<StatusEvent>) -> Self {
        Self { tx }
    }
}

impl StatusListener for ChannelListener {
    fn on_state_changed(&mut self, state: RequestState) {
        let _ = self.tx.send(StatusEvent::StateChanged { state });
    }
}

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);
