use std::collections::HashSet;

use ratatui::style::Color;

use super::ThemeName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub accent: Color,
    pub muted: Color,
    pub selection_fg: Color,
    pub selection_bg: Color,
    pub warning: Color,
    pub status: Color,
}

#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    names: HashSet<ThemeName>,
}

impl ThemeRegistry {
    pub fn contains(&self, theme: &ThemeName) -> bool {
        self.names.contains(theme)
    }

    pub fn all(&self) -> impl Iterator<Item = &ThemeName> {
        self.names.iter()
    }

    pub fn palette(&self, theme: &ThemeName) -> Palette {
        match theme {
            ThemeName::Dark => Palette {
                accent: Color::Cyan,
                muted: Color::Gray,
                selection_fg: Color::Black,
                selection_bg: Color::Blue,
                warning: Color::Yellow,
                status: Color::Yellow,
            },
            ThemeName::Light => Palette {
                accent: Color::Blue,
                muted: Color::DarkGray,
                selection_fg: Color::White,
                selection_bg: Color::Blue,
                warning: Color::Red,
                status: Color::Magenta,
            },
            ThemeName::HighContrast => Palette {
                accent: Color::White,
                muted: Color::White,
                selection_fg: Color::Black,
                selection_bg: Color::Yellow,
                warning: Color::LightRed,
                status: Color::LightYellow,
            },
        }
    }
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        let names = [ThemeName::Dark, ThemeName::Light, ThemeName::HighContrast]
            .into_iter()
            .collect();
        Self { names }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_registered_theme_has_distinct_selection_colors() {
        let registry = ThemeRegistry::default();
        assert_eq!(registry.all().count(), 3);
        for name in registry.all() {
            let palette = registry.palette(name);
            assert_ne!(palette.selection_fg, palette.selection_bg, "{name:?}");
        }
    }
}
