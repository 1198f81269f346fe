//! Points, sizes, rectangles and colors in overlay units.
//!
//! Overlay units are abstract pixels; a backend decides how they map onto its
//! surface (the terminal backend uses one cell per 8x16 units).

/// A position in overlay units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Width and height in overlay units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size::new(0.0, 0.0);

    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle; `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Left and top edges are inside, right and bottom edges are not.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Overlap of two rectangles; empty (zero-sized) when they do not touch.
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Rect::new(x, y, (right - x).max(0.0), (bottom - y).max(0.0))
    }
}

/// Straight (non-premultiplied) RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Composite this color over an opaque background.
    #[must_use]
    pub fn blend_over(self, background: Rgba) -> Rgba {
        let alpha = u32::from(self.a);
        let mix = |fg: u8, bg: u8| -> u8 {
            let value = (u32::from(fg) * alpha + u32::from(bg) * (255 - alpha) + 127) / 255;
            u8::try_from(value).unwrap_or(u8::MAX)
        };
        Rgba::rgb(
            mix(self.r, background.r),
            mix(self.g, background.g),
            mix(self.b, background.b),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_excludes_far_edges() {
        let rect = Rect::new(10.0, 20.0, 100.0, 25.0);
        assert!(rect.contains(Point::new(10.0, 20.0)));
        assert!(rect.contains(Point::new(109.9, 44.9)));
        assert!(!rect.contains(Point::new(110.0, 30.0)));
        assert!(!rect.contains(Point::new(50.0, 45.0)));
        assert!(!rect.contains(Point::new(9.9, 30.0)));
    }

    #[test]
    fn intersection_of_disjoint_rects_is_empty() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 5.0, 5.0);
        assert!(a.intersection(&b).is_empty());

        let c = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersection(&c), Rect::new(5.0, 5.0, 5.0, 5.0));
    }

    #[test]
    fn blending_respects_alpha_extremes() {
        let fg = Rgba::rgb(200, 100, 50);
        let bg = Rgba::rgb(10, 20, 30);
        assert_eq!(fg.blend_over(bg), fg);
        assert_eq!(fg.with_alpha(0).blend_over(bg), bg);

        let half = Rgba::WHITE.with_alpha(128).blend_over(Rgba::BLACK);
        assert_eq!(half, Rgba::rgb(128, 128, 128));
    }
}
