//! Chat transcript, bottom-aligned so the newest message sits above the status bubble.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::palette::{self, OverlayTheme};
use crate::tui::app::ChatMessage;

use super::Renderable;

pub struct TranscriptWidget<'a> {
    messages: &'a [ChatMessage],
    theme: &'a OverlayTheme,
}

impl<'a> TranscriptWidget<'a> {
    #[must_use]
    pub fn new(messages: &'a [ChatMessage], theme: &'a OverlayTheme) -> Self {
        Self { messages, theme }
    }

    fn lines(&self, width: u16) -> Vec<Line<'static>> {
        // One column of margin on each side.
        let text_width = usize::from(width.saturating_sub(2)).max(1);
        let text_color = palette::to_color(self.theme.text);
        let secondary = palette::to_color(self.theme.text_secondary);

        let mut lines = Vec::new();
        for message in self.messages {
            let bubble = if message.is_player {
                self.theme.player_bubble
            } else {
                self.theme.npc_bubble
            };
            let body = Style::default()
                .fg(text_color)
                .bg(palette::to_color(bubble));

            let name = Line::from(Span::styled(
                format!(" {} · {} ", message.sender, message.timestamp.format("%H:%M")),
                Style::default().fg(secondary).add_modifier(Modifier::BOLD),
            ));
            lines.push(align(name, message.is_player));
            for row in wrap(&message.text, text_width) {
                let line = Line::from(Span::styled(format!(" {row} "), body));
                lines.push(align(line, message.is_player));
            }
            lines.push(Line::default());
        }
        lines
    }
}

fn align(line: Line<'static>, right: bool) -> Line<'static> {
    if right {
        line.right_aligned()
    } else {
        line.left_aligned()
    }
}

/// Greedy word wrap by display width; words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut rows = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.width()
        } else {
            current.width() + 1 + word.width()
        };
        if needed <= width {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            continue;
        }
        if !current.is_empty() {
            rows.push(std::mem::take(&mut current));
        }
        for ch in word.chars() {
            if current.width() + ch.width().unwrap_or(0) > width {
                rows.push(std::mem::take(&mut current));
            }
            current.push(ch);
        }
    }
    if !current.is_empty() || rows.is_empty() {
        rows.push(current);
    }
    rows
}

impl Renderable for TranscriptWidget<'_> {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let mut lines = self.lines(area.width);
        let visible = usize::from(area.height);
        if lines.len() > visible {
            lines.drain(..lines.len() - visible);
        } else {
            let mut padded = vec![Line::default(); visible - lines.len()];
            padded.append(&mut lines);
            lines = padded;
        }
        Paragraph::new(lines)
            .style(Style::default().bg(palette::to_color(self.theme.background)))
            .render(area, buf);
    }

    fn desired_height(&self, width: u16) -> u16 {
        u16::try_from(self.lines(width).len()).unwrap_or(u16::MAX)
    }
}
