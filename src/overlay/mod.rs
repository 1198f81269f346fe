//! Status overlay rendering as a pure function of request status.

mod draw;
mod geometry;
mod renderer;

pub use draw::{ClipScope, DrawCommand, DrawList, FontRole, MonospaceMetrics, TextMeasure};
pub use geometry::{Point, Rect, Rgba, Size};
pub use renderer::{
    BUBBLE_PADDING, DEBUG_CONTENT_CAP, DEBUG_HEADER_HEIGHT, DEBUG_LINE_HEIGHT, DEBUG_PADDING,
    DEBUG_VISIBLE_ENTRIES, OverlayContext, OverlayRenderer, OverlayStyle, SPINNER_SEGMENTS,
    SPINNER_SLOT,
};
