//! Executes overlay draw commands on a ratatui buffer.
//!
//! One terminal cell covers `CELL_WIDTH` x `CELL_HEIGHT` overlay units, with
//! overlay coordinates relative to the top-left of the target area. A cell
//! belongs to a shape when its center does. Arcs are rasterized onto braille
//! dots (2x4 per cell) and stroke width is not represented at that resolution.

use std::collections::HashMap;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use unicode_width::UnicodeWidthChar;

use crate::overlay::{DrawCommand, DrawList, MonospaceMetrics, Point, Rect as OverlayRect, Rgba};
use crate::palette;

pub const CELL_WIDTH: f32 = 8.0;
pub const CELL_HEIGHT: f32 = 16.0;

/// Text metrics matching the terminal grid.
pub const CELL_METRICS: MonospaceMetrics = MonospaceMetrics::new(CELL_WIDTH, CELL_HEIGHT);

const BRAILLE_BASE: u32 = 0x2800;
const DOT_WIDTH: f32 = CELL_WIDTH / 2.0;
const DOT_HEIGHT: f32 = CELL_HEIGHT / 4.0;

/// Overlay-space bounds covering the whole of `area`.
#[must_use]
pub fn area_bounds(area: Rect) -> OverlayRect {
    OverlayRect::new(
        0.0,
        0.0,
        f32::from(area.width) * CELL_WIDTH,
        f32::from(area.height) * CELL_HEIGHT,
    )
}

/// Rows needed to show `height` overlay units.
#[must_use]
pub fn rows_for(height: f32) -> u16 {
    if height <= 0.0 {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rows = (height / CELL_HEIGHT).ceil() as u16;
    rows
}

/// Overlay point at the center of a terminal cell inside `area`.
#[must_use]
pub fn cell_center(area: Rect, column: u16, row: u16) -> Option<Point> {
    if column < area.x || row < area.y || column >= area.right() || row >= area.bottom() {
        return None;
    }
    Some(Point::new(
        f32::from(column - area.x) * CELL_WIDTH + CELL_WIDTH / 2.0,
        f32::from(row - area.y) * CELL_HEIGHT + CELL_HEIGHT / 2.0,
    ))
}

/// Paint `list` into `area` of `buf`.
///
/// `base_bg` stands in for cells that carry no RGB background yet.
pub fn paint(list: &DrawList, area: Rect, buf: &mut Buffer, base_bg: Rgba) {
    let area = area.intersection(buf.area);
    if area.is_empty() {
        return;
    }
    let mut painter = Painter {
        buf,
        area,
        base_bg,
        clips: Vec::new(),
        braille_alpha: HashMap::new(),
    };
    for command in list.commands() {
        painter.execute(command);
    }
}

struct Painter<'a> {
    buf: &'a mut Buffer,
    area: Rect,
    base_bg: Rgba,
    clips: Vec<OverlayRect>,
    // Strongest alpha already drawn into each braille cell this frame.
    braille_alpha: HashMap<(u16, u16), u8>,
}

impl Painter<'_> {
    fn execute(&mut self, command: &DrawCommand) {
        match command {
            DrawCommand::FillRect { rect, color } => self.fill(*rect, *color, None),
            DrawCommand::FillRoundedRect {
                rect,
                radius,
                color,
            } => self.fill(*rect, *color, Some(*radius)),
            DrawCommand::Text {
                origin,
                text,
                color,
                ..
            } => self.text(*origin, text, *color),
            DrawCommand::Arc {
                center,
                radius,
                start_angle,
                sweep_angle,
                color,
                ..
            } => self.arc(*center, *radius, *start_angle, *sweep_angle, *color),
            DrawCommand::PushClip(rect) => {
                let clip = self.clip().intersection(rect);
                self.clips.push(clip);
            }
            DrawCommand::PopClip => {
                self.clips.pop();
            }
        }
    }

    fn clip(&self) -> OverlayRect {
        self.clips
            .last()
            .copied()
            .unwrap_or_else(|| area_bounds(self.area))
    }

    /// Buffer position of the cell containing `point`, if visible.
    fn cell_at(&self, point: Point) -> Option<(u16, u16)> {
        if !self.clip().contains(point) {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (column, row) = (
            (point.x / CELL_WIDTH).floor() as u16,
            (point.y / CELL_HEIGHT).floor() as u16,
        );
        let position = (self.area.x + column, self.area.y + row);
        (column < self.area.width && row < self.area.height).then_some(position)
    }

    fn background_of(&self, position: (u16, u16)) -> Rgba {
        match self.buf.cell(position).map(|cell| cell.bg) {
            Some(Color::Rgb(r, g, b)) => Rgba::rgb(r, g, b),
            _ => self.base_bg,
        }
    }

    fn fill(&mut self, rect: OverlayRect, color: Rgba, radius: Option<f32>) {
        let target = self.clip().intersection(&rect);
        if target.is_empty() {
            return;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (first_col, last_col, first_row, last_row) = (
            (target.x / CELL_WIDTH).floor() as u16,
            (target.right() / CELL_WIDTH).ceil() as u16,
            (target.y / CELL_HEIGHT).floor() as u16,
            (target.bottom() / CELL_HEIGHT).ceil() as u16,
        );
        for row in first_row..last_row {
            for column in first_col..last_col {
                let center = Point::new(
                    f32::from(column) * CELL_WIDTH + CELL_WIDTH / 2.0,
                    f32::from(row) * CELL_HEIGHT + CELL_HEIGHT / 2.0,
                );
                if !target.contains(center) {
                    continue;
                }
                if let Some(radius) = radius
                    && !inside_rounded(&rect, radius, center)
                {
                    continue;
                }
                let Some(position) = self.cell_at(center) else {
                    continue;
                };
                let blended = color.blend_over(self.background_of(position));
                if let Some(cell) = self.buf.cell_mut(position) {
                    if color.a == u8::MAX {
                        cell.set_symbol(" ");
                    } else if let Color::Rgb(r, g, b) = cell.fg {
                        // Translucent fills dim what is underneath.
                        let dimmed = color.blend_over(Rgba::rgb(r, g, b));
                        cell.set_fg(palette::to_color(dimmed));
                    }
                    cell.set_bg(palette::to_color(blended));
                }
                self.braille_alpha.remove(&position);
            }
        }
    }

    fn text(&mut self, origin: Point, text: &str, color: Rgba) {
        // Text lands on the row holding its vertical center.
        let y = origin.y + CELL_HEIGHT / 2.0;
        let mut x = origin.x;
        for ch in text.chars() {
            let width = ch.width().unwrap_or(0);
            if width == 0 {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let advance = width as f32 * CELL_WIDTH;
            let first = self.cell_at(Point::new(x + CELL_WIDTH / 2.0, y));
            let last = self.cell_at(Point::new(x + advance - CELL_WIDTH / 2.0, y));
            if let (Some(position), Some(_)) = (first, last) {
                let fg = color.blend_over(self.background_of(position));
                if let Some(cell) = self.buf.cell_mut(position) {
                    cell.set_char(ch).set_fg(palette::to_color(fg));
                }
                for offset in 1..width {
                    let trailing = (position.0 + offset as u16, position.1);
                    if let Some(cell) = self.buf.cell_mut(trailing) {
                        let bg = cell.bg;
                        cell.reset();
                        cell.set_bg(bg);
                    }
                }
                self.braille_alpha.remove(&position);
            }
            x += advance;
        }
    }

    fn arc(&mut self, center: Point, radius: f32, start_angle: f32, sweep_angle: f32, color: Rgba) {
        if radius <= 0.0 {
            return;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let samples = sweep_angle.abs().ceil().max(1.0) as u32;
        let mut dots: HashMap<(u16, u16), u8> = HashMap::new();
        for sample in 0..=samples {
            #[allow(clippy::cast_precision_loss)]
            let angle = (start_angle + sweep_angle * sample as f32 / samples as f32).to_radians();
            let point = Point::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            );
            let Some(position) = self.cell_at(point) else {
                continue;
            };
            let local_x = point.x.rem_euclid(CELL_WIDTH);
            let local_y = point.y.rem_euclid(CELL_HEIGHT);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let (dot_col, dot_row) = (
                ((local_x / DOT_WIDTH) as usize).min(1),
                ((local_y / DOT_HEIGHT) as usize).min(3),
            );
            *dots.entry(position).or_default() |= braille_bit(dot_col, dot_row);
        }

        for (position, bits) in dots {
            let existing = self
                .buf
                .cell(position)
                .and_then(|cell| braille_bits(cell.symbol()));
            let stronger = self
                .braille_alpha
                .get(&position)
                .is_none_or(|alpha| color.a >= *alpha);
            let combined = existing
                .filter(|_| self.braille_alpha.contains_key(&position))
                .unwrap_or(0)
                | bits;
            let fg = color.blend_over(self.background_of(position));
            let Some(symbol) = char::from_u32(BRAILLE_BASE + u32::from(combined)) else {
                continue;
            };
            if let Some(cell) = self.buf.cell_mut(position) {
                cell.set_char(symbol);
                if stronger {
                    cell.set_fg(palette::to_color(fg));
                }
            }
            if stronger {
                self.braille_alpha.insert(position, color.a);
            }
        }
    }
}

/// Braille dot bit for a column (0-1) and row (0-3) within a cell.
fn braille_bit(column: usize, row: usize) -> u8 {
    const BITS: [[u8; 2]; 4] = [[0x01, 0x08], [0x02, 0x10], [0x04, 0x20], [0x40, 0x80]];
    BITS[row][column]
}

fn braille_bits(symbol: &str) -> Option<u8> {
    let ch = symbol.chars().next()?;
    let offset = u32::from(ch).checked_sub(BRAILLE_BASE)?;
    u8::try_from(offset).ok()
}

fn inside_rounded(rect: &OverlayRect, radius: f32, point: Point) -> bool {
    let radius = radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
    let nearest_x = point.x.clamp(rect.x + radius, rect.right() - radius);
    let nearest_y = point.y.clamp(rect.y + radius, rect.bottom() - radius);
    let (dx, dy) = (point.x - nearest_x, point.y - nearest_y);
    dx * dx + dy * dy <= radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::FontRole;
    use pretty_assertions::assert_eq;

    const BASE: Rgba = Rgba::rgb(25, 25, 35);

    fn row_text(buf: &Buffer, row: u16) -> String {
        (0..buf.area.width)
            .map(|column| buf.cell((column, row)).map_or(" ", |cell| cell.symbol()))
            .collect()
    }

    #[test]
    fn fill_covers_cells_whose_center_is_inside() {
        let area = Rect::new(0, 0, 10, 4);
        let mut buf = Buffer::empty(area);
        let mut list = DrawList::new();
        list.push(DrawCommand::FillRect {
            rect: OverlayRect::new(8.0, 16.0, 24.0, 16.0),
            color: Rgba::rgb(50, 55, 70),
        });
        paint(&list, area, &mut buf, BASE);

        let filled: Vec<(u16, u16)> = (0..4)
            .flat_map(|row| (0..10).map(move |column| (column, row)))
            .filter(|position| buf.cell(*position).map(|cell| cell.bg) == Some(Color::Rgb(50, 55, 70)))
            .collect();
        assert_eq!(filled, vec![(1, 1), (2, 1), (3, 1)]);
    }

    #[test]
    fn translucent_fill_blends_with_base() {
        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        let mut list = DrawList::new();
        list.push(DrawCommand::FillRect {
            rect: OverlayRect::new(0.0, 0.0, 16.0, 16.0),
            color: Rgba::WHITE.with_alpha(0),
        });
        paint(&list, area, &mut buf, BASE);
        assert_eq!(buf.cell((0, 0)).map(|cell| cell.bg), Some(palette::to_color(BASE)));
    }

    #[test]
    fn text_is_clipped_to_scope() {
        let area = Rect::new(0, 0, 12, 2);
        let mut buf = Buffer::empty(area);
        let mut list = DrawList::new();
        {
            let mut scope = list.clip(OverlayRect::new(0.0, 0.0, 40.0, 16.0));
            scope.push(DrawCommand::Text {
                origin: Point::new(0.0, 0.0),
                text: "abcdefgh".to_string(),
                font: FontRole::Mono,
                color: Rgba::WHITE,
            });
            scope.push(DrawCommand::Text {
                origin: Point::new(0.0, 16.0),
                text: "hidden".to_string(),
                font: FontRole::Mono,
                color: Rgba::WHITE,
            });
        }
        list.push(DrawCommand::Text {
            origin: Point::new(0.0, 16.0),
            text: "shown".to_string(),
            font: FontRole::Mono,
            color: Rgba::WHITE,
        });
        paint(&list, area, &mut buf, BASE);

        assert_eq!(row_text(&buf, 0), "abcde       ");
        assert_eq!(row_text(&buf, 1), "shown       ");
    }

    #[test]
    fn text_is_offset_by_area_origin() {
        let area = Rect::new(3, 1, 6, 1);
        let mut buf = Buffer::empty(Rect::new(0, 0, 10, 3));
        let mut list = DrawList::new();
        list.push(DrawCommand::Text {
            origin: Point::new(8.0, 0.0),
            text: "hi".to_string(),
            font: FontRole::Body,
            color: Rgba::WHITE,
        });
        paint(&list, area, &mut buf, BASE);
        assert_eq!(row_text(&buf, 1), "    hi    ");
    }

    #[test]
    fn arcs_rasterize_to_braille() {
        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        let mut list = DrawList::new();
        list.push(DrawCommand::Arc {
            center: Point::new(16.0, 16.0),
            radius: 8.0,
            start_angle: 0.0,
            sweep_angle: 360.0,
            stroke_width: 2.5,
            color: Rgba::WHITE,
        });
        paint(&list, area, &mut buf, BASE);

        let braille_cells = (0..2)
            .flat_map(|row| (0..4).map(move |column| (column, row)))
            .filter(|position| {
                buf.cell(*position)
                    .and_then(|cell| braille_bits(cell.symbol()))
                    .is_some_and(|bits| bits != 0)
            })
            .count();
        assert!(braille_cells >= 2, "only {braille_cells} braille cells");
    }

    #[test]
    fn rows_and_hit_points_follow_cell_size() {
        assert_eq!(rows_for(0.0), 0);
        assert_eq!(rows_for(44.0), 3);
        assert_eq!(rows_for(145.0), 10);

        let area = Rect::new(2, 5, 10, 4);
        assert_eq!(cell_center(area, 2, 5), Some(Point::new(4.0, 8.0)));
        assert_eq!(cell_center(area, 12, 5), None);
    }

    #[test]
    fn rounded_corners_exclude_far_corner_points() {
        let rect = OverlayRect::new(0.0, 0.0, 100.0, 44.0);
        assert!(inside_rounded(&rect, 12.0, Point::new(4.0, 8.0)));
        assert!(!inside_rounded(&rect, 12.0, Point::new(0.5, 0.5)));
        assert!(inside_rounded(&rect, 12.0, Point::new(50.0, 0.5)));
    }
}
