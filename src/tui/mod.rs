//! Terminal host for the status overlay: draw-command backend and demo UI.

// === Submodules ===

pub mod app;
pub mod canvas;
pub mod ui;
pub mod widgets;

// === Re-exports ===

pub use app::{App, DemoOptions};
pub use ui::run_demo;
