//! Chat themes and the overlay colors derived from them.

use ratatui::style::Color;

use crate::overlay::{OverlayStyle, Rgba};

pub const DEFAULT_THEME: &str = "dark";
pub const THEME_NAMES: [&str; 4] = ["dark", "light", "ocean", "forest"];

// Debug panel tones shared by the dark-family themes
pub const DEBUG_PANEL_BG: Rgba = Rgba::rgb(40, 40, 55);
pub const DEBUG_PANEL_HEADER: Rgba = Rgba::rgb(50, 50, 70);
pub const LIGHT_DEBUG_PANEL_BG: Rgba = Rgba::rgb(230, 232, 240);
pub const LIGHT_DEBUG_PANEL_HEADER: Rgba = Rgba::rgb(210, 215, 228);

pub const TEXT_LIGHT: Rgba = Rgba::WHITE;
pub const TEXT_DARK: Rgba = Rgba::rgb(40, 40, 50);

/// Colors of one chat theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayTheme {
    pub name: &'static str,
    pub background: Rgba,
    pub header: Rgba,
    pub input_bg: Rgba,
    pub player_bubble: Rgba,
    pub npc_bubble: Rgba,
    pub text: Rgba,
    pub text_secondary: Rgba,
    pub debug_bg: Rgba,
    pub debug_header: Rgba,
}

impl OverlayTheme {
    /// The status bubble is drawn on the NPC's side, so it borrows the NPC bubble color.
    pub fn overlay_style(&self) -> OverlayStyle {
        OverlayStyle {
            bubble_color: self.npc_bubble,
            text_color: self.text,
            debug_bg_color: self.debug_bg,
            debug_header_color: self.debug_header,
        }
    }
}

/// Look up a theme by name; unknown names get the dark theme.
#[must_use]
pub fn overlay_theme(name: &str) -> OverlayTheme {
    match name.trim().to_ascii_lowercase().as_str() {
        "light" => OverlayTheme {
            name: "light",
            background: Rgba::rgb(245, 245, 250),
            header: Rgba::rgb(85, 140, 200),
            input_bg: Rgba::rgb(250, 250, 255),
            player_bubble: Rgba::rgb(220, 248, 198),
            npc_bubble: Rgba::WHITE,
            text: TEXT_DARK,
            text_secondary: Rgba::rgb(100, 100, 110),
            debug_bg: LIGHT_DEBUG_PANEL_BG,
            debug_header: LIGHT_DEBUG_PANEL_HEADER,
        },
        "ocean" => OverlayTheme {
            name: "ocean",
            background: Rgba::rgb(15, 25, 45),
            header: Rgba::rgb(25, 45, 75),
            input_bg: Rgba::rgb(20, 35, 60),
            player_bubble: Rgba::rgb(40, 120, 180),
            npc_bubble: Rgba::rgb(35, 50, 80),
            text: TEXT_LIGHT,
            text_secondary: Rgba::rgb(150, 180, 210),
            debug_bg: DEBUG_PANEL_BG,
            debug_header: DEBUG_PANEL_HEADER,
        },
        "forest" => OverlayTheme {
            name: "forest",
            background: Rgba::rgb(15, 35, 25),
            header: Rgba::rgb(25, 55, 40),
            input_bg: Rgba::rgb(20, 45, 35),
            player_bubble: Rgba::rgb(60, 160, 100),
            npc_bubble: Rgba::rgb(35, 65, 50),
            text: TEXT_LIGHT,
            text_secondary: Rgba::rgb(150, 210, 170),
            debug_bg: DEBUG_PANEL_BG,
            debug_header: DEBUG_PANEL_HEADER,
        },
        _ => OverlayTheme {
            name: "dark",
            background: Rgba::rgb(25, 25, 35),
            header: Rgba::rgb(35, 35, 50),
            input_bg: Rgba::rgb(40, 40, 55),
            player_bubble: Rgba::rgb(58, 142, 65),
            npc_bubble: Rgba::rgb(50, 55, 70),
            text: TEXT_LIGHT,
            text_secondary: Rgba::rgb(180, 180, 180),
            debug_bg: DEBUG_PANEL_BG,
            debug_header: DEBUG_PANEL_HEADER,
        },
    }
}

/// Theme after `name` in [`THEME_NAMES`], wrapping around.
#[must_use]
pub fn next_theme(name: &str) -> &'static str {
    let current = overlay_theme(name).name;
    let idx = THEME_NAMES
        .iter()
        .position(|candidate| *candidate == current)
        .unwrap_or(0);
    THEME_NAMES[(idx + 1) % THEME_NAMES.len()]
}

/// Terminal color for an opaque overlay color.
#[must_use]
pub fn to_color(color: Rgba) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_fall_back_to_dark() {
        assert_eq!(overlay_theme("sepia").name, "dark");
        assert_eq!(overlay_theme(" Ocean ").name, "ocean");
    }

    #[test]
    fn cycling_visits_every_theme() {
        let mut name = DEFAULT_THEME;
        let mut seen = Vec::new();
        for _ in 0..THEME_NAMES.len() {
            seen.push(name);
            name = next_theme(name);
        }
        assert_eq!(seen, THEME_NAMES.to_vec());
        assert_eq!(name, DEFAULT_THEME);
    }

    #[test]
    fn overlay_style_uses_npc_side() {
        let theme = overlay_theme("forest");
        let style = theme.overlay_style();
        assert_eq!(style.bubble_color, theme.npc_bubble);
        assert_eq!(style.text_color, theme.text);
    }
}
