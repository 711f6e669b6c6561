//! Light/dark palettes, theme resolution and feature color schemes.

use anyhow::{anyhow, Context, Result};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, str::FromStr};
use strum::{Display, EnumIter, EnumString};

use crate::core::persistence::{
    feature_colors_key, feature_theme_key, panel_theme_key, Preferences,
};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    /// Label of the footer toggle: it names the mode a press switches to.
    pub fn toggle_label(self) -> &'static str {
        match self {
            ThemeMode::Dark => "☀ Light",
            ThemeMode::Light => "☾ Dark",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            ThemeMode::Light => Palette::LIGHT,
            ThemeMode::Dark => Palette::DARK,
        }
    }
}

/// Requested theme of a panel. `Auto` is resolved against stored
/// preferences and the terminal background.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ThemeChoice {
    #[default]
    Auto,
    Light,
    Dark,
}

impl ThemeChoice {
    pub fn fixed(self) -> Option<ThemeMode> {
        match self {
            ThemeChoice::Auto => None,
            ThemeChoice::Light => Some(ThemeMode::Light),
            ThemeChoice::Dark => Some(ThemeMode::Dark),
        }
    }
}

/// Terminal dark-background detection from `COLORFGBG` (`fg;bg`).
pub fn system_prefers_dark() -> bool {
    std::env::var("COLORFGBG")
        .ok()
        .and_then(|value| value.rsplit(';').next().map(str::to_string))
        .and_then(|bg| bg.trim().parse::<u8>().ok())
        .map(|bg| bg < 7 || bg == 8)
        .unwrap_or(false)
}

/// Resolve `choice` to a concrete mode.
///
/// Order for `Auto`: the panel's own stored mode, the feature-wide stored
/// mode, the system preference, light.
pub fn resolve_theme(
    choice: ThemeChoice,
    panel_key: Option<&str>,
    feature: &str,
    prefs: &Preferences,
    system_dark: bool,
) -> ThemeMode {
    if let Some(mode) = choice.fixed() {
        return mode;
    }
    let stored = |key: String| {
        prefs
            .get(&key)
            .and_then(|value| value.parse::<ThemeMode>().ok())
    };
    if let Some(mode) = panel_key.and_then(|key| stored(panel_theme_key(key))) {
        return mode;
    }
    if let Some(mode) = stored(feature_theme_key(feature)) {
        return mode;
    }
    if system_dark {
        ThemeMode::Dark
    } else {
        ThemeMode::Light
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub bg: Color,
    pub text: Color,
    pub border: Color,
    pub border_light: Color,
    pub header_bg: Color,
    pub header_text: Color,
    pub close: Color,
    pub footer_bg: Color,
    pub primary: Color,
    pub primary_hover: Color,
    pub text_muted: Color,
    pub text_error: Color,
    pub bg_hover: Color,
}

impl Palette {
    pub const LIGHT: Palette = Palette {
        bg: Color::Rgb(0xff, 0xff, 0xff),
        text: Color::Rgb(0x32, 0x31, 0x30),
        border: Color::Rgb(0xe1, 0xe1, 0xe1),
        border_light: Color::Rgb(0xdd, 0xdd, 0xdd),
        header_bg: Color::Rgb(0xf3, 0xf2, 0xf1),
        header_text: Color::Rgb(0x32, 0x31, 0x30),
        close: Color::Rgb(0x60, 0x5e, 0x5c),
        footer_bg: Color::Rgb(0xf3, 0xf2, 0xf1),
        primary: Color::Rgb(0x25, 0x63, 0xeb),
        primary_hover: Color::Rgb(0x1d, 0x4e, 0xd8),
        text_muted: Color::Rgb(0x6b, 0x72, 0x80),
        text_error: Color::Rgb(0xdc, 0x26, 0x26),
        bg_hover: Color::Rgb(0xf0, 0xf2, 0xf5),
    };

    pub const DARK: Palette = Palette {
        bg: Color::Rgb(0x1f, 0x29, 0x37),
        text: Color::Rgb(0xee, 0xf2, 0xff),
        border: Color::Rgb(0x37, 0x41, 0x51),
        border_light: Color::Rgb(0x37, 0x41, 0x51),
        header_bg: Color::Rgb(0x0b, 0x12, 0x20),
        header_text: Color::Rgb(0xe5, 0xe7, 0xeb),
        close: Color::Rgb(0xcb, 0xd5, 0xe1),
        footer_bg: Color::Rgb(0x0b, 0x12, 0x20),
        primary: Color::Rgb(0x60, 0xa5, 0xfa),
        primary_hover: Color::Rgb(0x93, 0xc5, 0xfd),
        text_muted: Color::Rgb(0x9c, 0xa3, 0xaf),
        text_error: Color::Rgb(0xf8, 0x71, 0x71),
        bg_hover: Color::Rgb(0x11, 0x18, 0x27),
    };

    /// Set one field from a color-map key. Returns false for unknown keys.
    pub fn set(&mut self, key: &str, color: Color) -> bool {
        let slot = match key {
            "primary" => &mut self.primary,
            "primaryHover" => &mut self.primary_hover,
            "border" => &mut self.border,
            "borderLight" => &mut self.border_light,
            "text" => &mut self.text,
            "textMuted" => &mut self.text_muted,
            "textError" => &mut self.text_error,
            "bg" => &mut self.bg,
            "bgHover" => &mut self.bg_hover,
            "headerBg" => &mut self.header_bg,
            "headerColor" => &mut self.header_text,
            "closeColor" => &mut self.close,
            "footerBg" => &mut self.footer_bg,
            _ => return false,
        };
        *slot = color;
        true
    }
}

/// Parse `#rgb`, `#rrggbb` or a named color.
pub fn parse_color(value: &str) -> Result<Color> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() == 3 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
            return Color::from_str(&format!("#{expanded}"))
                .map_err(|_| anyhow!("Invalid color '{value}'"));
        }
    }
    Color::from_str(value).map_err(|_| anyhow!("Invalid color '{value}'"))
}

pub type ColorMap = BTreeMap<String, String>;

/// Per-feature color overrides, stored as JSON under `<feature>-colors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColorScheme {
    pub light: ColorMap,
    pub dark: ColorMap,
}

impl ColorScheme {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse color scheme")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize color scheme")
    }

    /// Load the stored scheme. A malformed value is logged and ignored.
    pub fn load(prefs: &Preferences, feature: &str) -> Option<Self> {
        let raw = prefs.get(&feature_colors_key(feature))?;
        match Self::from_json(&raw) {
            Ok(scheme) => Some(scheme),
            Err(err) => {
                log::warn!("Ignoring stored colors for {feature}: {err:#}");
                None
            }
        }
    }

    /// Replace the stored scheme wholesale.
    pub fn save(&self, prefs: &Preferences, feature: &str) -> Result<()> {
        for (key, value) in self.light.iter().chain(self.dark.iter()) {
            parse_color(value).with_context(|| format!("Invalid value for '{key}'"))?;
        }
        prefs.set(&feature_colors_key(feature), &self.to_json()?);
        log::info!("💾 Saved color scheme for {feature}");
        Ok(())
    }

    pub fn apply(&self, mode: ThemeMode, palette: &mut Palette) {
        let map = match mode {
            ThemeMode::Light => &self.light,
            ThemeMode::Dark => &self.dark,
        };
        for (key, value) in map {
            match parse_color(value) {
                Ok(color) => {
                    if !palette.set(key, color) {
                        log::debug!("Unknown color key '{key}'");
                    }
                }
                Err(err) => log::debug!("{err}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_label_names_target_mode() {
        assert_eq!(ThemeMode::Dark.toggle_label(), "☀ Light");
        assert_eq!(ThemeMode::Light.toggle_label(), "☾ Dark");
        assert_eq!(ThemeMode::Light.toggled(), ThemeMode::Dark);
    }

    #[test]
    fn test_resolve_order() {
        let prefs = Preferences::in_memory();
        assert_eq!(
            resolve_theme(ThemeChoice::Auto, Some("p"), "feat", &prefs, false),
            ThemeMode::Light
        );
        assert_eq!(
            resolve_theme(ThemeChoice::Auto, Some("p"), "feat", &prefs, true),
            ThemeMode::Dark
        );

        prefs.set("feat-theme-mode", "dark");
        assert_eq!(
            resolve_theme(ThemeChoice::Auto, Some("p"), "feat", &prefs, false),
            ThemeMode::Dark
        );

        prefs.set("overlay-theme-p", "light");
        assert_eq!(
            resolve_theme(ThemeChoice::Auto, Some("p"), "feat", &prefs, true),
            ThemeMode::Light
        );
        assert_eq!(
            resolve_theme(ThemeChoice::Dark, Some("p"), "feat", &prefs, false),
            ThemeMode::Dark
        );
    }

    #[test]
    fn test_color_scheme_requires_both_modes() -> Result<()> {
        assert!(ColorScheme::from_json(r#"{"light":{}}"#).is_err());
        assert!(ColorScheme::from_json(r#"{"light":{},"dark":{},"x":{}}"#).is_err());

        let scheme = ColorScheme::from_json(r##"{"light":{"bg":"#fff"},"dark":{"text":"red"}}"##)?;
        let mut palette = Palette::DARK;
        scheme.apply(ThemeMode::Dark, &mut palette);
        assert_eq!(palette.text, Color::Red);
        assert_eq!(palette.bg, Palette::DARK.bg);

        let mut palette = Palette::LIGHT;
        scheme.apply(ThemeMode::Light, &mut palette);
        assert_eq!(palette.bg, Color::Rgb(0xff, 0xff, 0xff));
        Ok(())
    }

    #[test]
    fn test_save_replaces_scheme() -> Result<()> {
        let prefs = Preferences::in_memory();
        let mut scheme = ColorScheme::default();
        scheme.light.insert("primary".into(), "#123456".into());
        scheme.save(&prefs, "explorer")?;
        assert_eq!(ColorScheme::load(&prefs, "explorer"), Some(scheme));

        let mut bad = ColorScheme::default();
        bad.dark.insert("primary".into(), "not-a-color".into());
        assert!(bad.save(&prefs, "explorer").is_err());
        Ok(())
    }
}
