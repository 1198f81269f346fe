//! Terminal widgets wrapping the overlay renderer.

use ratatui::{buffer::Buffer, layout::Rect};

use crate::core::{AnimationFrame, RequestStatus, StatusText};
use crate::overlay::{DrawList, OverlayContext, OverlayRenderer};
use crate::palette::OverlayTheme;
use crate::tui::canvas::{self, CELL_METRICS};

use super::Renderable;

/// What both overlay widgets need from the app for one frame.
#[derive(Clone, Copy)]
pub struct OverlayFrame<'a> {
    pub renderer: &'a OverlayRenderer,
    pub status: &'a RequestStatus,
    pub animation: AnimationFrame,
    pub text: &'a StatusText,
    pub theme: &'a OverlayTheme,
}

impl<'a> OverlayFrame<'a> {
    fn context(&self) -> OverlayContext<'a> {
        OverlayContext {
            metrics: &CELL_METRICS,
            style: self.theme.overlay_style(),
            text: self.text,
        }
    }
}

/// Spinner bubble on the conversation partner's side.
pub struct StatusBubbleWidget<'a> {
    frame: OverlayFrame<'a>,
}

impl<'a> StatusBubbleWidget<'a> {
    #[must_use]
    pub fn new(frame: OverlayFrame<'a>) -> Self {
        Self { frame }
    }

    fn layout(&self, area: Rect) -> (DrawList, Option<crate::overlay::Rect>) {
        let mut list = DrawList::new();
        let drawn = self.frame.renderer.render_status_bubble(
            &mut list,
            self.frame.status,
            self.frame.animation,
            canvas::area_bounds(area),
            &self.frame.context(),
        );
        (list, drawn)
    }
}

impl Renderable for StatusBubbleWidget<'_> {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        let (list, _) = self.layout(area);
        canvas::paint(&list, area, buf, self.frame.theme.background);
    }

    fn desired_height(&self, width: u16) -> u16 {
        let (_, drawn) = self.layout(Rect::new(0, 0, width, 0));
        drawn.map_or(0, |bubble| canvas::rows_for(bubble.height))
    }
}

/// Collapsible debug panel; its header row toggles it on click.
pub struct DebugPanelWidget<'a> {
    frame: OverlayFrame<'a>,
}

impl<'a> DebugPanelWidget<'a> {
    #[must_use]
    pub fn new(frame: OverlayFrame<'a>) -> Self {
        Self { frame }
    }
}

impl Renderable for DebugPanelWidget<'_> {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        let mut list = DrawList::new();
        self.frame.renderer.render_debug_panel(
            &mut list,
            self.frame.status,
            canvas::area_bounds(area),
            &self.frame.context(),
        );
        canvas::paint(&list, area, buf, self.frame.theme.background);
    }

    fn desired_height(&self, _width: u16) -> u16 {
        canvas::rows_for(self.frame.renderer.debug_panel_height(self.frame.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RequestStatusTracker;
    use crate::palette::overlay_theme;

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf.cell((x, y)).map_or(" ", |cell| cell.symbol()))
            .collect()
    }

    #[test]
    fn bubble_reserves_three_rows_while_active() {
        let renderer = OverlayRenderer::new();
        let theme = overlay_theme("dark");
        let text = StatusText::english();
        let mut tracker = RequestStatusTracker::new();

        let idle = OverlayFrame {
            renderer: &renderer,
            status: tracker.status(),
            animation: tracker.animation(),
            text: &text,
            theme: &theme,
        };
        assert_eq!(StatusBubbleWidget::new(idle).desired_height(60), 0);

        tracker.start_request("Ulrich", "Hello");
        let active = OverlayFrame {
            renderer: &renderer,
            status: tracker.status(),
            animation: tracker.animation(),
            text: &text,
            theme: &theme,
        };
        let widget = StatusBubbleWidget::new(active);
        assert_eq!(widget.desired_height(60), 3);

        let area = Rect::new(0, 0, 60, 3);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        assert!(row(&buf, 1).contains("Ulrich is thinking."));
    }

    #[test]
    fn debug_panel_shows_header_and_log() {
        let mut renderer = OverlayRenderer::with_debug_mode(true);
        let theme = overlay_theme("ocean");
        let text = StatusText::english();
        let mut tracker = RequestStatusTracker::new();
        tracker.start_request("Ulrich", "Hello");

        let frame = OverlayFrame {
            renderer: &renderer,
            status: tracker.status(),
            animation: tracker.animation(),
            text: &text,
            theme: &theme,
        };
        let widget = DebugPanelWidget::new(frame);
        // 25 + (18 + 16) = 59 units
        assert_eq!(widget.desired_height(60), 4);

        let area = Rect::new(0, 0, 60, 4);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        assert!(row(&buf, 0).starts_with(" ▼ Debug"));
        assert!(row(&buf, 0).trim_end().ends_with("Sending request to LLM..."));
        assert!(row(&buf, 2).contains("] Request sent"));

        renderer.toggle_debug_panel();
        let collapsed = OverlayFrame {
            renderer: &renderer,
            status: tracker.status(),
            animation: tracker.animation(),
            text: &text,
            theme: &theme,
        };
        assert_eq!(DebugPanelWidget::new(collapsed).desired_height(60), 2);
    }
}
