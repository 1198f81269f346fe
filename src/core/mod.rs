//! Request state machine, debug log and animation clock.

// === Submodules ===

pub mod animation;
pub mod debug_log;
pub mod events;
pub mod state;
pub mod status_text;
pub mod tracker;

// === Re-exports ===

pub use animation::{AnimationClock, AnimationFrame};
pub use debug_log::{DebugLog, DebugLogEntry};
pub use events::{ChannelListener, StatusEvent, StatusListener, SubscriptionId};
pub use state::{RequestState, RequestStatus};
pub use status_text::StatusText;
pub use tracker::{DEFAULT_TOTAL_TOKENS, RequestStatusTracker};
