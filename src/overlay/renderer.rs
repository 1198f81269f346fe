//! Spinner, status bubble and debug panel layout.

use crate::core::{AnimationFrame, RequestStatus, StatusText};

use super::draw::{DrawCommand, DrawList, FontRole, TextMeasure};
use super::geometry::{Point, Rect, Rgba};

// === Spinner ===

pub const SPINNER_SEGMENTS: u8 = 8;
const SEGMENT_SPACING_DEGREES: f32 = 45.0;
const SEGMENT_SWEEP_DEGREES: f32 = 30.0;
const SEGMENT_ALPHA_STEP: u8 = 30;
const SEGMENT_MIN_ALPHA: u8 = 50;
const SPINNER_INSET: f32 = 2.0;
const SPINNER_STROKE: f32 = 2.5;

// === Bubble ===

pub const BUBBLE_PADDING: f32 = 12.0;
pub const SPINNER_SLOT: f32 = 20.0;
const BUBBLE_RADIUS: f32 = 12.0;
const SPINNER_TEXT_GAP: f32 = 8.0;

// === Debug panel ===

pub const DEBUG_HEADER_HEIGHT: f32 = 25.0;
pub const DEBUG_LINE_HEIGHT: f32 = 18.0;
pub const DEBUG_PADDING: f32 = 8.0;
pub const DEBUG_CONTENT_CAP: f32 = 120.0;
pub const DEBUG_VISIBLE_ENTRIES: usize = 5;
const DEBUG_HEADER_TEXT_OFFSET: f32 = 5.0;
const DEBUG_PANEL_ALPHA: u8 = 200;
const DEBUG_LOG_TEXT_ALPHA: u8 = 200;

/// Colors supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayStyle {
    pub bubble_color: Rgba,
    pub text_color: Rgba,
    pub debug_bg_color: Rgba,
    pub debug_header_color: Rgba,
}

/// Per-frame inputs shared by the bubble and the debug panel.
#[derive(Clone, Copy)]
pub struct OverlayContext<'a> {
    pub metrics: &'a dyn TextMeasure,
    pub style: OverlayStyle,
    pub text: &'a StatusText,
}

/// Lays out the status overlay into draw commands.
///
/// Holds only interaction state (debug mode and whether the debug panel is
/// expanded); request data is passed in on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayRenderer {
    debug_mode: bool,
    debug_panel_expanded: bool,
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self {
            debug_mode: false,
            debug_panel_expanded: true,
        }
    }
}

impl OverlayRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_debug_mode(debug_mode: bool) -> Self {
        Self {
            debug_mode,
            ..Self::default()
        }
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    pub fn set_debug_mode(&mut self, enabled: bool) {
        self.debug_mode = enabled;
    }

    /// Flip debug mode and return the new value.
    pub fn toggle_debug_mode(&mut self) -> bool {
        self.debug_mode = !self.debug_mode;
        self.debug_mode
    }

    pub fn is_debug_panel_expanded(&self) -> bool {
        self.debug_panel_expanded
    }

    pub fn set_debug_panel_expanded(&mut self, expanded: bool) {
        self.debug_panel_expanded = expanded;
    }

    pub fn toggle_debug_panel(&mut self) {
        self.debug_panel_expanded = !self.debug_panel_expanded;
    }

    /// Ring of arc segments with a fading tail, leading segment at `angle`.
    pub fn render_spinner(
        &self,
        list: &mut DrawList,
        center: Point,
        size: f32,
        color: Rgba,
        angle: f32,
    ) {
        let radius = (size / 2.0 - SPINNER_INSET).max(0.0);
        for segment in 0..SPINNER_SEGMENTS {
            let fade = u16::from(segment) * u16::from(SEGMENT_ALPHA_STEP);
            let alpha = 255u16.saturating_sub(fade).max(u16::from(SEGMENT_MIN_ALPHA));
            let start_angle = (angle + f32::from(segment) * SEGMENT_SPACING_DEGREES).rem_euclid(360.0);
            list.push(DrawCommand::Arc {
                center,
                radius,
                start_angle,
                sweep_angle: SEGMENT_SWEEP_DEGREES,
                stroke_width: SPINNER_STROKE,
                color: color.with_alpha(u8::try_from(alpha).unwrap_or(u8::MAX)),
            });
        }
    }

    /// Chat bubble with spinner and status text, anchored to the left edge of
    /// `bounds` (the conversation partner's side).
    ///
    /// Returns the bubble rectangle, or `None` when nothing was drawn.
    pub fn render_status_bubble(
        &self,
        list: &mut DrawList,
        status: &RequestStatus,
        frame: AnimationFrame,
        bounds: Rect,
        ctx: &OverlayContext<'_>,
    ) -> Option<Rect> {
        if !status.is_active() {
            return None;
        }
        let label = status.normal_mode_text(ctx.text);
        if label.is_empty() {
            return None;
        }

        // Reserve room for the widest ellipsis so the bubble does not pulse.
        let layout = ctx.metrics.measure(
            &format!("{label}{}", AnimationFrame::WIDEST_DOTS),
            FontRole::Body,
        );
        let text = format!("{label}{}", frame.dots());
        let text_size = ctx.metrics.measure(&text, FontRole::Body);

        let width = layout.width + SPINNER_SLOT + BUBBLE_PADDING * 2.0 + SPINNER_TEXT_GAP;
        let height = (layout.height + BUBBLE_PADDING * 2.0).max(SPINNER_SLOT + BUBBLE_PADDING * 2.0);
        let bubble = Rect::new(bounds.x + BUBBLE_PADDING, bounds.y, width, height);

        list.push(DrawCommand::FillRoundedRect {
            rect: bubble,
            radius: BUBBLE_RADIUS,
            color: ctx.style.bubble_color,
        });

        let spinner_x = bubble.x + BUBBLE_PADDING;
        let spinner_y = bubble.y + (height - SPINNER_SLOT) / 2.0;
        self.render_spinner(
            list,
            Point::new(spinner_x + SPINNER_SLOT / 2.0, spinner_y + SPINNER_SLOT / 2.0),
            SPINNER_SLOT,
            ctx.style.text_color,
            frame.angle,
        );

        list.push(DrawCommand::Text {
            origin: Point::new(
                spinner_x + SPINNER_SLOT + SPINNER_TEXT_GAP,
                bubble.y + (height - text_size.height) / 2.0,
            ),
            text,
            font: FontRole::Body,
            color: ctx.style.text_color,
        });

        Some(bubble)
    }

    /// Collapsible panel with a one-line summary and the newest log entries.
    ///
    /// Returns the panel rectangle, or `None` when nothing was drawn.
    pub fn render_debug_panel(
        &self,
        list: &mut DrawList,
        status: &RequestStatus,
        bounds: Rect,
        ctx: &OverlayContext<'_>,
    ) -> Option<Rect> {
        let height = self.debug_panel_height(status);
        if height <= 0.0 {
            return None;
        }
        let content_height = height - DEBUG_HEADER_HEIGHT;
        let panel = Rect::new(bounds.x, bounds.y, bounds.width, height);
        let style = ctx.style;

        list.push(DrawCommand::FillRect {
            rect: panel,
            color: style.debug_bg_color.with_alpha(DEBUG_PANEL_ALPHA),
        });

        let header = Rect::new(panel.x, panel.y, panel.width, DEBUG_HEADER_HEIGHT);
        list.push(DrawCommand::FillRect {
            rect: header,
            color: style.debug_header_color,
        });

        let indicator = if self.debug_panel_expanded { "▼" } else { "►" };
        list.push(DrawCommand::Text {
            origin: Point::new(header.x + DEBUG_PADDING, header.y + DEBUG_HEADER_TEXT_OFFSET),
            text: format!("{indicator} {}", ctx.text.debug_panel_title),
            font: FontRole::Caption,
            color: style.text_color,
        });

        let summary = status.debug_mode_text(ctx.text);
        let summary_width = ctx.metrics.measure(&summary, FontRole::Caption).width;
        list.push(DrawCommand::Text {
            origin: Point::new(
                header.right() - summary_width - DEBUG_PADDING,
                header.y + DEBUG_HEADER_TEXT_OFFSET,
            ),
            text: summary,
            font: FontRole::Caption,
            color: style.text_color,
        });

        if self.debug_panel_expanded && content_height > 0.0 {
            let content = Rect::new(panel.x, header.bottom(), panel.width, content_height);
            let mut clipped = list.clip(content);
            let log_color = style.text_color.with_alpha(DEBUG_LOG_TEXT_ALPHA);
            let mut y = content.y + DEBUG_PADDING;
            for entry in status.debug_log().recent(DEBUG_VISIBLE_ENTRIES) {
                clipped.push(DrawCommand::Text {
                    origin: Point::new(content.x + DEBUG_PADDING, y),
                    text: entry.to_string(),
                    font: FontRole::Mono,
                    color: log_color,
                });
                y += DEBUG_LINE_HEIGHT;
            }
        }

        Some(panel)
    }

    /// Height the debug panel will occupy, for layout reservation.
    #[must_use]
    pub fn debug_panel_height(&self, status: &RequestStatus) -> f32 {
        let entries = status.debug_log().len();
        if !self.debug_mode || entries == 0 {
            return 0.0;
        }
        if !self.debug_panel_expanded {
            return DEBUG_HEADER_HEIGHT;
        }
        #[allow(clippy::cast_precision_loss)]
        let lines = entries as f32 * DEBUG_LINE_HEIGHT;
        DEBUG_HEADER_HEIGHT + (lines + DEBUG_PADDING * 2.0).min(DEBUG_CONTENT_CAP)
    }

    /// Whether `point` falls on the header strip of a panel drawn at
    /// `panel_bounds`. Always false with debug mode off.
    #[must_use]
    pub fn hit_test_debug_header(&self, point: Point, panel_bounds: Rect) -> bool {
        if !self.debug_mode {
            return false;
        }
        Rect::new(
            panel_bounds.x,
            panel_bounds.y,
            panel_bounds.width,
            DEBUG_HEADER_HEIGHT,
        )
        .contains(point)
    }
}
