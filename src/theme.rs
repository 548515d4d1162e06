// 🌗 Dark / light mode
// The choice lives in local storage under "theme" and is reapplied on every start.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }

    /// Stored choice wins; otherwise the terminal's preference; otherwise `fallback`.
    pub fn resolve(stored: Option<&str>, terminal_hint: Option<&str>, fallback: Theme) -> Theme {
        if let Some(theme) = stored.and_then(|s| s.parse().ok()) {
            return theme;
        }
        terminal_hint
            .and_then(theme_from_colorfgbg)
            .unwrap_or(fallback)
    }
}

/// `COLORFGBG` is "fg;bg" (sometimes "fg;default;bg"); a background index
/// below 7 or equal to 8 is a dark terminal.
fn theme_from_colorfgbg(value: &str) -> Option<Theme> {
    let bg: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    Some(if bg < 7 || bg == 8 { Theme::Dark } else { Theme::Light })
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("unknown theme '{}' (expected dark or light)", other)),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_value_wins() {
        assert_eq!(Theme::resolve(Some("dark"), Some("0;15"), Theme::Light), Theme::Dark);
        assert_eq!(Theme::resolve(Some("light"), Some("15;0"), Theme::Dark), Theme::Light);
    }

    #[test]
    fn test_terminal_hint_then_fallback() {
        assert_eq!(Theme::resolve(None, Some("15;0"), Theme::Light), Theme::Dark);
        assert_eq!(Theme::resolve(None, Some("0;default;15"), Theme::Dark), Theme::Light);
        assert_eq!(Theme::resolve(Some("purple"), None, Theme::Dark), Theme::Dark);
        assert_eq!(Theme::resolve(None, Some("garbage"), Theme::Light), Theme::Light);
    }

    #[test]
    fn test_toggle_round_trip() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled().toggled(), Theme::Light);
        assert!(Theme::Dark.is_dark());
    }
}
