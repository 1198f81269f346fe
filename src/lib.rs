//! Progress tracking and live status overlay for in-flight language-model requests.
//!
//! The [`core`] module owns the request state machine, its debug log and the
//! frame-driven animation clock. [`overlay`] turns a status snapshot into a list
//! of draw commands, and [`tui`] executes those commands on a ratatui buffer.

pub mod core;
pub mod logging;
pub mod overlay;
pub mod palette;
pub mod pipeline;
pub mod settings;
pub mod tui;

pub use crate::core::{
    AnimationClock, AnimationFrame, DebugLog, DebugLogEntry, RequestState, RequestStatus,
    RequestStatusTracker, StatusEvent, StatusText,
};
pub use crate::overlay::{DrawCommand, DrawList, OverlayRenderer, OverlayStyle};
