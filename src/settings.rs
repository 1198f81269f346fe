//! Settings system - Persistent user preferences
//!
//! Settings are stored at ~/.config/llm-status/settings.toml

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::StatusText;
use crate::palette::{self, OverlayTheme, THEME_NAMES};

pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 30;
const FRAME_INTERVAL_RANGE: std::ops::RangeInclusive<u64> = 10..=200;

/// User settings with defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Color theme: dark, light, ocean, forest
    pub theme: String,
    /// Show the debug panel
    pub debug_mode: bool,
    /// Status text language: en, ru
    pub locale: String,
    /// Milliseconds between animation frames
    pub frame_interval_ms: u64,
    /// Name of the conversation partner in the demo
    pub npc_name: String,
    /// Per-template overrides on top of the locale's text
    pub status_text: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: palette::DEFAULT_THEME.to_string(),
            debug_mode: false,
            locale: "en".to_string(),
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            npc_name: "Ulrich".to_string(),
            status_text: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to resolve config directory: not found.")?
            .join("llm-status");
        Ok(config_dir.join("settings.toml"))
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let mut settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))?;
        settings.theme = palette::overlay_theme(&settings.theme).name.to_string();
        settings.locale = normalize_locale(&settings.locale).to_string();
        settings.frame_interval_ms = settings
            .frame_interval_ms
            .clamp(*FRAME_INTERVAL_RANGE.start(), *FRAME_INTERVAL_RANGE.end());
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        Ok(())
    }

    /// Set a single setting by key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "theme" => {
                let normalized = value.trim().to_ascii_lowercase();
                if !THEME_NAMES.contains(&normalized.as_str()) {
                    anyhow::bail!(
                        "Failed to update setting: invalid theme '{value}'. Expected: {}.",
                        THEME_NAMES.join(", ")
                    );
                }
                self.theme = normalized;
            }
            "debug_mode" | "debug" => {
                self.debug_mode = parse_bool(value)?;
            }
            "locale" | "lang" => {
                let normalized = value.trim().to_ascii_lowercase();
                if !["en", "ru"].contains(&normalized.as_str()) {
                    anyhow::bail!(
                        "Failed to update setting: invalid locale '{value}'. Expected: en, ru."
                    );
                }
                self.locale = normalized;
            }
            "frame_interval_ms" | "frame_interval" => {
                let interval: u64 = value.parse().map_err(|_| {
                    anyhow::anyhow!(
                        "Failed to update setting: invalid frame interval '{value}'. Expected a number between 10-200."
                    )
                })?;
                if !FRAME_INTERVAL_RANGE.contains(&interval) {
                    anyhow::bail!(
                        "Failed to update setting: frame interval must be between 10 and 200 ms."
                    );
                }
                self.frame_interval_ms = interval;
            }
            "npc_name" | "npc" => {
                let name = value.trim();
                if name.is_empty() {
                    anyhow::bail!("Failed to update setting: npc name must not be empty.");
                }
                self.npc_name = name.to_string();
            }
            _ => {
                if let Some(template) = key.strip_prefix("status_text.") {
                    let mut probe = StatusText::default();
                    let single = BTreeMap::from([(template.to_string(), value.to_string())]);
                    if !probe.apply_overrides(&single).is_empty() {
                        anyhow::bail!(
                            "Failed to update setting: unknown status text template '{template}'."
                        );
                    }
                    self.status_text
                        .insert(template.to_string(), value.to_string());
                    return Ok(());
                }
                anyhow::bail!("Failed to update setting: unknown setting '{key}'.");
            }
        }
        Ok(())
    }

    /// Locale text with any configured overrides applied.
    ///
    /// Unknown override keys are logged and skipped.
    pub fn status_text(&self) -> StatusText {
        let mut text = StatusText::for_locale(&self.locale);
        for key in text.apply_overrides(&self.status_text) {
            tracing::warn!(key = %key, "ignoring unknown status text override");
        }
        text
    }

    pub fn overlay_theme(&self) -> OverlayTheme {
        palette::overlay_theme(&self.theme)
    }

    /// Get all settings as a displayable string
    pub fn display(&self) -> String {
        let mut lines = Vec::new();
        lines.push("Settings:".to_string());
        lines.push("─────────────────────────────".to_string());
        lines.push(format!("  theme:              {}", self.theme));
        lines.push(format!("  debug_mode:         {}", self.debug_mode));
        lines.push(format!("  locale:             {}", self.locale));
        lines.push(format!("  frame_interval_ms:  {}", self.frame_interval_ms));
        lines.push(format!("  npc_name:           {}", self.npc_name));
        for (key, value) in &self.status_text {
            lines.push(format!("  status_text.{key}: {value}"));
        }
        lines.push(String::new());
        lines.push(format!(
            "Config file: {}",
            Self::path().map_or_else(|_| "(unknown)".to_string(), |p| p.display().to_string())
        ));
        lines.join("\n")
    }

    /// Get available setting keys and their descriptions
    pub fn available_settings() -> Vec<(&'static str, &'static str)> {
        vec![
            ("theme", "Color theme: dark, light, ocean, forest"),
            ("debug_mode", "Show the debug panel: on/off"),
            ("locale", "Status text language: en, ru"),
            ("frame_interval_ms", "Animation frame interval: 10-200"),
            ("npc_name", "Name of the demo conversation partner"),
            ("status_text.<template>", "Override one status text template"),
        ]
    }
}

/// Parse a boolean value from various formats
fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" | "enabled" => Ok(true),
        "off" | "false" | "no" | "0" | "disabled" => Ok(false),
        _ => {
            anyhow::bail!("Failed to parse boolean '{value}': expected on/off, true/false, yes/no.")
        }
    }
}

fn normalize_locale(value: &str) -> &'static str {
    match value.trim().to_ascii_lowercase().as_str() {
        "ru" | "ru-ru" | "russian" => "ru",
        _ => "en",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = Settings::load_from(&dir.path().join("settings.toml")).expect("load");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn save_and_reload_preserves_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.set("theme", "Ocean").expect("theme");
        settings.set("debug", "on").expect("debug");
        settings.set("status_text.thinking", "{npc} ponders").expect("override");
        settings.save_to(&path).expect("save");

        let loaded = Settings::load_from(&path).expect("load");
        assert_eq!(loaded, settings);
        assert_eq!(loaded.theme, "ocean");
        assert!(loaded.debug_mode);
    }

    #[test]
    fn load_normalizes_out_of_range_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "theme = \"sepia\"\nlocale = \"RU\"\nframe_interval_ms = 5\n",
        )
        .expect("write");

        let settings = Settings::load_from(&path).expect("load");
        assert_eq!(settings.theme, "dark");
        assert_eq!(settings.locale, "ru");
        assert_eq!(settings.frame_interval_ms, 10);
        assert_eq!(settings.npc_name, "Ulrich");
    }

    #[test]
    fn set_rejects_invalid_values() {
        let mut settings = Settings::default();
        assert!(settings.set("theme", "sepia").is_err());
        assert!(settings.set("frame_interval_ms", "500").is_err());
        assert!(settings.set("locale", "de").is_err());
        assert!(settings.set("status_text.bogus", "x").is_err());
        assert!(settings.set("volume", "11").is_err());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn status_text_applies_locale_and_overrides() {
        let mut settings = Settings::default();
        settings.set("locale", "ru").expect("locale");
        settings
            .status_text
            .insert("debug_panel_title".to_string(), "Журнал".to_string());
        settings
            .status_text
            .insert("unknown".to_string(), "x".to_string());

        let text = settings.status_text();
        assert_eq!(text.debug_panel_title, "Журнал");
        assert_eq!(text.log_request_sent, StatusText::russian().log_request_sent);
    }
}
