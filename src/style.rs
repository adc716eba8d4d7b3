use std::path::PathBuf;

use ratatui::style::{Color, Modifier, Style as RatStyle};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Color that can be serialized/deserialized from the theme file.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThemeColor {
    /// Named color: "red", "cyan", etc.
    Named(NamedColor),
    /// RGB color: [255, 128, 0]
    Rgb([u8; 3]),
    /// 256-color index
    Indexed(u8),
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Gray,
    DarkGray,
    LightRed,
    LightGreen,
    LightYellow,
    LightBlue,
    LightMagenta,
    LightCyan,
    White,
    Reset,
}

impl From<ThemeColor> for Color {
    fn from(tc: ThemeColor) -> Color {
        match tc {
            ThemeColor::Named(n) => match n {
                NamedColor::Black => Color::Black,
                NamedColor::Red => Color::Red,
                NamedColor::Green => Color::Green,
                NamedColor::Yellow => Color::Yellow,
                NamedColor::Blue => Color::Blue,
                NamedColor::Magenta => Color::Magenta,
                NamedColor::Cyan => Color::Cyan,
                NamedColor::Gray => Color::Gray,
                NamedColor::DarkGray => Color::DarkGray,
                NamedColor::LightRed => Color::LightRed,
                NamedColor::LightGreen => Color::LightGreen,
                NamedColor::LightYellow => Color::LightYellow,
                NamedColor::LightBlue => Color::LightBlue,
                NamedColor::LightMagenta => Color::LightMagenta,
                NamedColor::LightCyan => Color::LightCyan,
                NamedColor::White => Color::White,
                NamedColor::Reset => Color::Reset,
            },
            ThemeColor::Rgb([r, g, b]) => Color::Rgb(r, g, b),
            ThemeColor::Indexed(i) => Color::Indexed(i),
        }
    }
}

/// Style definition for a single grid element.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ElementStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fg: Option<ThemeColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg: Option<ThemeColor>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub dim: bool,
    #[serde(default)]
    pub underline: bool,
}

impl ElementStyle {
    fn fg(color: ThemeColor) -> Self {
        Self { fg: Some(color), ..Default::default() }
    }

    fn on(mut self, color: ThemeColor) -> Self {
        self.bg = Some(color);
        self
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn dim(mut self) -> Self {
        self.dim = true;
        self
    }

    pub fn to_ratatui(&self) -> RatStyle {
        let mut style = RatStyle::default();
        if let Some(fg) = self.fg {
            style = style.fg(fg.into());
        }
        if let Some(bg) = self.bg {
            style = style.bg(bg.into());
        }
        if self.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.dim {
            style = style.add_modifier(Modifier::DIM);
        }
        if self.underline {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        style
    }
}

/// The demo's theme, loadable from `~/.config/ledgergrid/theme.toml`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub header: ElementStyle,
    /// Header of a column with an active filter.
    pub header_filtered: ElementStyle,
    pub cell: ElementStyle,
    /// Placeholder dash for null cells.
    pub null_cell: ElementStyle,
    pub selected_cell: ElementStyle,
    /// A row whose selector checkbox is checked.
    pub selected_row: ElementStyle,
    pub edit_cell: ElementStyle,
    pub status: ElementStyle,
    pub menu: ElementStyle,
    pub popup: ElementStyle,
    pub popup_checked: ElementStyle,
}

impl Default for Theme {
    fn default() -> Self {
        use NamedColor::*;
        Self {
            header: ElementStyle::fg(ThemeColor::Named(Black))
                .on(ThemeColor::Named(Gray))
                .bold(),
            header_filtered: ElementStyle::fg(ThemeColor::Named(Black))
                .on(ThemeColor::Named(Cyan))
                .bold(),
            cell: ElementStyle::default(),
            null_cell: ElementStyle::default().dim(),
            selected_cell: ElementStyle::fg(ThemeColor::Named(Black))
                .on(ThemeColor::Named(LightBlue)),
            selected_row: ElementStyle::fg(ThemeColor::Named(Black))
                .on(ThemeColor::Named(LightYellow)),
            edit_cell: ElementStyle::fg(ThemeColor::Named(Black))
                .on(ThemeColor::Named(LightGreen)),
            status: ElementStyle::fg(ThemeColor::Named(White)).on(ThemeColor::Named(DarkGray)),
            menu: ElementStyle::fg(ThemeColor::Named(White)).on(ThemeColor::Named(DarkGray)),
            popup: ElementStyle::fg(ThemeColor::Named(White)).on(ThemeColor::Named(DarkGray)),
            popup_checked: ElementStyle::fg(ThemeColor::Named(LightGreen))
                .on(ThemeColor::Named(DarkGray)),
        }
    }
}

impl Theme {
    fn config_path() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".config/ledgergrid/theme.toml"))
    }

    /// Load the user theme, falling back to the default on any problem.
    /// A broken theme file must never keep the tool from starting.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else { return Self::default() };
        match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(theme) => theme,
                Err(e) => {
                    warn!(error = %e, path = %path.display(), "bad theme file, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_theme_round_trips_through_toml() {
        let theme = Theme::default();
        let text = toml::to_string(&theme).unwrap();
        let back: Theme = toml::from_str(&text).unwrap();
        assert_eq!(back.header.bold, theme.header.bold);
    }

    #[test]
    fn partial_theme_file_fills_in_defaults() {
        let theme: Theme = toml::from_str("[header]\nfg = \"red\"\nbold = true\n").unwrap();
        assert!(theme.header.bold);
        assert!(matches!(theme.header.fg, Some(ThemeColor::Named(NamedColor::Red))));
        // untouched elements keep their defaults
        assert!(theme.null_cell.dim);
    }
}
