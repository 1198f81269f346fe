mod header;
mod overlay;
mod renderable;
mod transcript;

pub use header::{HeaderData, HeaderWidget};
pub use overlay::{DebugPanelWidget, OverlayFrame, StatusBubbleWidget};
pub use renderable::Renderable;
pub use transcript::TranscriptWidget;
