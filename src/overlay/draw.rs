//! Backend-neutral draw commands and text metrics.

use std::ops::{Deref, DerefMut};

use unicode_width::UnicodeWidthStr;

use super::geometry::{Point, Rect, Rgba, Size};

/// Text roles; each backend maps them onto concrete fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontRole {
    /// Chat bubble text
    Body,
    /// Debug panel header
    Caption,
    /// Debug log lines
    Mono,
}

/// One primitive for a backend to execute, in list order.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Stroked circular arc. Angles are in degrees, clockwise from +x with y
    /// pointing down.
    Arc {
        center: Point,
        radius: f32,
        start_angle: f32,
        sweep_angle: f32,
        stroke_width: f32,
        color: Rgba,
    },
    FillRect {
        rect: Rect,
        color: Rgba,
    },
    FillRoundedRect {
        rect: Rect,
        radius: f32,
        color: Rgba,
    },
    /// A single line of text; `origin` is its top-left corner.
    Text {
        origin: Point,
        text: String,
        font: FontRole,
        color: Rgba,
    },
    /// Restrict subsequent commands to `rect` (intersected with any outer clip).
    PushClip(Rect),
    /// Undo the most recent `PushClip`.
    PopClip,
}

/// Ordered draw commands for one frame.
///
/// Clip regions are only opened through [`DrawList::clip`], whose guard closes
/// them again, so every `PushClip` has a matching `PopClip` on every path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a drawing command. Clip commands go through [`clip`](Self::clip).
    pub fn push(&mut self, command: DrawCommand) {
        debug_assert!(
            !matches!(command, DrawCommand::PushClip(_) | DrawCommand::PopClip),
            "clip commands must be issued through DrawList::clip"
        );
        self.commands.push(command);
    }

    /// Open a clip region that lasts until the returned scope is dropped.
    pub fn clip(&mut self, rect: Rect) -> ClipScope<'_> {
        self.commands.push(DrawCommand::PushClip(rect));
        ClipScope { list: self }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }
}

/// Guard for an open clip region; draws through it land inside the clip.
pub struct ClipScope<'a> {
    list: &'a mut DrawList,
}

impl Deref for ClipScope<'_> {
    type Target = DrawList;

    fn deref(&self) -> &DrawList {
        self.list
    }
}

impl DerefMut for ClipScope<'_> {
    fn deref_mut(&mut self) -> &mut DrawList {
        self.list
    }
}

impl Drop for ClipScope<'_> {
    fn drop(&mut self) {
        self.list.commands.push(DrawCommand::PopClip);
    }
}

/// Font-metrics provider used for layout.
pub trait TextMeasure {
    /// Size of `text` rendered on a single line in the given role.
    fn measure(&self, text: &str, font: FontRole) -> Size;
}

/// Fixed-advance metrics: every terminal column is `advance` units wide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMetrics {
    pub advance: f32,
    pub line_height: f32,
}

impl MonospaceMetrics {
    #[must_use]
    pub const fn new(advance: f32, line_height: f32) -> Self {
        Self {
            advance,
            line_height,
        }
    }
}

impl TextMeasure for MonospaceMetrics {
    fn measure(&self, text: &str, _font: FontRole) -> Size {
        if text.is_empty() {
            return Size::ZERO;
        }
        #[allow(clippy::cast_precision_loss)]
        let columns = text.width() as f32;
        Size::new(columns * self.advance, self.line_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_scope_closes_on_drop() {
        let mut list = DrawList::new();
        {
            let mut scope = list.clip(Rect::new(0.0, 0.0, 10.0, 10.0));
            scope.push(DrawCommand::FillRect {
                rect: Rect::new(0.0, 0.0, 5.0, 5.0),
                color: Rgba::WHITE,
            });
        }
        assert!(matches!(list.commands()[0], DrawCommand::PushClip(_)));
        assert!(matches!(list.commands()[1], DrawCommand::FillRect { .. }));
        assert_eq!(list.commands()[2], DrawCommand::PopClip);
    }

    #[test]
    fn clip_scope_closes_on_early_return() {
        fn draw_until_empty(list: &mut DrawList, items: &[&str]) -> usize {
            let mut scope = list.clip(Rect::new(0.0, 0.0, 10.0, 10.0));
            for (idx, item) in items.iter().enumerate() {
                if item.is_empty() {
                    return idx;
                }
                scope.push(DrawCommand::Text {
                    origin: Point::default(),
                    text: (*item).to_string(),
                    font: FontRole::Mono,
                    color: Rgba::WHITE,
                });
            }
            items.len()
        }

        let mut list = DrawList::new();
        assert_eq!(draw_until_empty(&mut list, &["a", "", "c"]), 1);
        assert_eq!(list.commands().last(), Some(&DrawCommand::PopClip));
    }

    #[test]
    fn monospace_measures_display_width() {
        let metrics = MonospaceMetrics::new(8.0, 16.0);
        assert_eq!(metrics.measure("abc", FontRole::Body), Size::new(24.0, 16.0));
        assert_eq!(metrics.measure("", FontRole::Body), Size::ZERO);
        // Wide glyphs take two columns.
        assert_eq!(metrics.measure("漢", FontRole::Mono).width, 16.0);
    }
}
