use ratatui::{buffer::Buffer, layout::Rect};

/// A widget that can size itself for layout and draw by shared reference.
pub trait Renderable {
    fn render(&self, area: Rect, buf: &mut Buffer);

    /// Rows wanted at `width`; zero means the widget has nothing to show.
    fn desired_height(&self, width: u16) -> u16;
}
