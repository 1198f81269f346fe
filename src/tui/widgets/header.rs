//! Header bar widget displaying the conversation partner, request phase and debug badge.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::core::RequestState;
use crate::palette::{self, OverlayTheme};

use super::Renderable;

/// Data required to render the header bar.
pub struct HeaderData<'a> {
    pub npc_name: &'a str,
    pub state: RequestState,
    pub debug_mode: bool,
    pub theme: &'a OverlayTheme,
}

/// Header bar widget (1 line height).
///
/// Layout: `npc-name | (spacer) | [phase] [DEBUG]`
pub struct HeaderWidget<'a> {
    data: HeaderData<'a>,
}

impl<'a> HeaderWidget<'a> {
    #[must_use]
    pub fn new(data: HeaderData<'a>) -> Self {
        Self { data }
    }

    fn name_span(&self) -> Span<'static> {
        Span::styled(
            format!(" {}", self.data.npc_name),
            Style::default()
                .fg(palette::to_color(self.data.theme.text))
                .add_modifier(Modifier::BOLD),
        )
    }

    fn badges(&self) -> Vec<Span<'static>> {
        let secondary = palette::to_color(self.data.theme.text_secondary);
        let mut spans = Vec::new();
        if self.data.state != RequestState::Idle {
            spans.push(Span::styled(
                format!(" {} ", self.data.state),
                Style::default().fg(secondary),
            ));
        }
        if self.data.debug_mode {
            spans.push(Span::styled(
                " DEBUG ",
                Style::default()
                    .fg(palette::to_color(self.data.theme.header))
                    .bg(secondary)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        spans
    }
}

impl Renderable for HeaderWidget<'_> {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let name = self.name_span();
        let badges = self.badges();
        let left_width = name.content.width();
        let right_width: usize = badges.iter().map(|s| s.content.width()).sum();
        let available = area.width as usize;

        let mut spans = vec![name];
        if available >= left_width + right_width {
            let padding_needed = available - left_width - right_width;
            if padding_needed > 0 {
                spans.push(Span::raw(" ".repeat(padding_needed)));
            }
            spans.extend(badges);
        }

        let paragraph = Paragraph::new(Line::from(spans))
            .style(Style::default().bg(palette::to_color(self.data.theme.header)));
        paragraph.render(area, buf);
    }

    fn desired_height(&self, _width: u16) -> u16 {
        1
    }
}
