use serde::Serialize;

/// Terminal color token. The core never interprets these; drivers map
/// them to backend attributes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    Default,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    /// Palette index for backends with extended colors.
    Indexed(u8),
}

/// Foreground/background pair attached to every painted cell.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CellStyle {
    pub fg: Color,
    pub bg: Color,
}

impl CellStyle {
    pub const fn new(fg: Color, bg: Color) -> Self {
        Self { fg, bg }
    }

    pub const fn fg(fg: Color) -> Self {
        Self {
            fg,
            bg: Color::Default,
        }
    }
}

/// Border line style for a container frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    #[default]
    None,
    Light,
    Double,
    Rounded,
}

/// Glyph set used to paint a rectangular frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderGlyphs {
    pub top_left: char,
    pub top_right: char,
    pub bottom_left: char,
    pub bottom_right: char,
    pub horizontal: char,
    pub vertical: char,
}

impl LineStyle {
    /// The frame glyphs for this style, or none for borderless nodes.
    pub fn glyphs(&self) -> Option<BorderGlyphs> {
        match self {
            LineStyle::None => None,
            LineStyle::Light => Some(BorderGlyphs {
                top_left: '┌',
                top_right: '┐',
                bottom_left: '└',
                bottom_right: '┘',
                horizontal: '─',
                vertical: '│',
            }),
            LineStyle::Double => Some(BorderGlyphs {
                top_left: '╔',
                top_right: '╗',
                bottom_left: '╚',
                bottom_right: '╝',
                horizontal: '═',
                vertical: '║',
            }),
            LineStyle::Rounded => Some(BorderGlyphs {
                top_left: '╭',
                top_right: '╮',
                bottom_left: '╰',
                bottom_right: '╯',
                horizontal: '─',
                vertical: '│',
            }),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, LineStyle::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_has_no_glyphs() {
        assert!(LineStyle::None.glyphs().is_none());
        assert!(LineStyle::None.is_none());
    }

    #[test]
    fn light_frame_glyphs() {
        let glyphs = LineStyle::Light.glyphs().unwrap();
        assert_eq!(glyphs.top_left, '┌');
        assert_eq!(glyphs.vertical, '│');
    }

    #[test]
    fn default_color_is_default() {
        assert_eq!(Color::default(), Color::Default);
        assert_eq!(CellStyle::default().bg, Color::Default);
    }
}
