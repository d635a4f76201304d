use mserv_cache::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use tracing::{debug, warn};

use crate::Result;

/// Storage key for the saved theme preference
pub const THEME_KEY: &str = "mserv_theme";

/// Color theme for the TUI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub kind: ThemeKind,
    pub colors: ThemeColors,
}

/// All color definitions for a theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeColors {
    // Surfaces
    pub primary_bg: Color,
    pub secondary_bg: Color,
    pub tertiary_bg: Color,

    // Text
    pub primary_text: Color,
    pub secondary_text: Color,
    pub muted: Color,

    pub accent: Color,
    pub border: Color,
    pub favorite: Color,

    // Status colors
    pub good: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
}

/// RGB color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn rgb(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as u8,
            g: ((hex >> 8) & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeKind {
    Light,
    Dark,
}

impl ThemeKind {
    pub fn toggled(self) -> Self {
        match self {
            ThemeKind::Light => ThemeKind::Dark,
            ThemeKind::Dark => ThemeKind::Light,
        }
    }

    /// Icon on the theme toggle: a moon while dark, a sun while light
    pub fn icon(self) -> &'static str {
        match self {
            ThemeKind::Dark => "☾",
            ThemeKind::Light => "☀",
        }
    }

    pub fn theme(self) -> Theme {
        match self {
            ThemeKind::Light => Theme::light(),
            ThemeKind::Dark => Theme::dark(),
        }
    }
}

/// What the user asked for. `Auto` tracks the terminal's appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    Auto,
}

impl ThemePreference {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Auto => "auto",
        }
    }

    pub fn resolve(self, system: ThemeKind) -> ThemeKind {
        match self {
            Self::Light => ThemeKind::Light,
            Self::Dark => ThemeKind::Dark,
            Self::Auto => system,
        }
    }
}

impl From<ThemeKind> for ThemePreference {
    fn from(kind: ThemeKind) -> Self {
        match kind {
            ThemeKind::Light => Self::Light,
            ThemeKind::Dark => Self::Dark,
        }
    }
}

impl Theme {
    /// Dark palette
    pub fn dark() -> Self {
        Self {
            name: "Dark".to_string(),
            kind: ThemeKind::Dark,
            colors: ThemeColors {
                primary_bg: Color::rgb(0x121212),
                secondary_bg: Color::rgb(0x1a1a1a),
                tertiary_bg: Color::rgb(0x232323),

                primary_text: Color::rgb(0xffffff),
                secondary_text: Color::rgb(0xe0e0e0),
                muted: Color::rgb(0x8a8a8e),

                accent: Color::rgb(0x7371fc),
                border: Color::rgb(0x333333),
                favorite: Color::rgb(0xffc107),

                good: Color::rgb(0x4caf50),
                warning: Color::rgb(0xff9800),
                error: Color::rgb(0xf44336),
                info: Color::rgb(0x2196f3),
            },
        }
    }

    /// Light palette
    pub fn light() -> Self {
        Self {
            name: "Light".to_string(),
            kind: ThemeKind::Light,
            colors: ThemeColors {
                primary_bg: Color::rgb(0xf5f5f7),
                secondary_bg: Color::rgb(0xffffff),
                tertiary_bg: Color::rgb(0xf0f0f2),

                primary_text: Color::rgb(0x1d1d1f),
                secondary_text: Color::rgb(0x333333),
                muted: Color::rgb(0x6e6e73),

                accent: Color::rgb(0x7371fc),
                border: Color::rgb(0xd2d2d7),
                favorite: Color::rgb(0xd99a00),

                good: Color::rgb(0x34a853),
                warning: Color::rgb(0xf57c00),
                error: Color::rgb(0xd32f2f),
                info: Color::rgb(0x1976d2),
            },
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

/// Terminal appearance from a `COLORFGBG` value such as `"15;0"` or
/// `"15;default;0"`. The last field is the background palette index.
pub fn appearance_from_colorfgbg(value: &str) -> Option<ThemeKind> {
    let background: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    match background {
        0..=6 | 8 => Some(ThemeKind::Dark),
        _ => Some(ThemeKind::Light),
    }
}

/// Appearance of the current terminal, dark when it can't be told
pub fn system_appearance() -> ThemeKind {
    std::env::var("COLORFGBG")
        .ok()
        .and_then(|v| appearance_from_colorfgbg(&v))
        .unwrap_or(ThemeKind::Dark)
}

/// Resolves and persists the active theme
pub struct ThemeManager {
    preference: ThemePreference,
    system: ThemeKind,
    storage: Rc<dyn KeyValueStore>,
}

impl ThemeManager {
    /// Restore the saved preference; nothing saved (or junk) means `Auto`
    pub fn load(storage: Rc<dyn KeyValueStore>, system: ThemeKind) -> Self {
        let preference = match storage.get(THEME_KEY) {
            Ok(Some(raw)) => ThemePreference::parse(&raw).unwrap_or_else(|| {
                warn!("Unknown stored theme '{}', following the terminal", raw);
                ThemePreference::Auto
            }),
            Ok(None) => ThemePreference::Auto,
            Err(e) => {
                warn!("Could not read theme preference ({}), following the terminal", e);
                ThemePreference::Auto
            }
        };

        debug!(
            "Theme preference {} resolves to {:?}",
            preference.as_str(),
            preference.resolve(system)
        );

        Self {
            preference,
            system,
            storage,
        }
    }

    pub fn preference(&self) -> ThemePreference {
        self.preference
    }

    pub fn kind(&self) -> ThemeKind {
        self.preference.resolve(self.system)
    }

    pub fn theme(&self) -> Theme {
        self.kind().theme()
    }

    /// Flip dark and light and save the explicit choice
    pub fn toggle(&mut self) -> Result<ThemeKind> {
        let next = self.kind().toggled();
        let preference = ThemePreference::from(next);
        self.storage.set(THEME_KEY, preference.as_str())?;
        self.preference = preference;
        debug!("Theme switched to {:?}", next);
        Ok(next)
    }
}
