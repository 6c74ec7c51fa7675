//! Partial run and paragraph properties as they appear in styles and direct formatting

use quick_xml::events::BytesStart;

use super::reader::{attr, parse_half_points, parse_on_off, parse_twips};
use super::theme::ThemeFonts;

/// Horizontal paragraph alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    fn from_jc(value: &str) -> Self {
        match value {
            "center" => Alignment::Center,
            "right" | "end" => Alignment::Right,
            "both" | "distribute" => Alignment::Justify,
            _ => Alignment::Left,
        }
    }
}

/// Spacing between the lines of a paragraph
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineSpacing {
    /// Multiple of single spacing (`lineRule="auto"`)
    Multiple(f32),
    /// Exact line height in points
    Exact(f32),
    /// Minimum line height in points
    AtLeast(f32),
}

impl Default for LineSpacing {
    fn default() -> Self {
        LineSpacing::Multiple(1.0)
    }
}

/// RGB text color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    /// Parse a `RRGGBB` hex value; `auto` and malformed values yield `None`
    pub fn from_hex(value: &str) -> Option<Self> {
        let value = value.trim_start_matches('#');
        if value.len() != 6 || !value.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&value[i..i + 2], 16).ok();
        Some(Color {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    pub fn is_black(&self) -> bool {
        *self == Color::BLACK
    }
}

/// Font named directly or through the theme's font scheme
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FontRef {
    Named(String),
    ThemeMajor,
    ThemeMinor,
}

impl FontRef {
    pub(crate) fn resolve(&self, theme: &ThemeFonts) -> Option<String> {
        match self {
            FontRef::Named(name) => Some(name.clone()),
            FontRef::ThemeMajor => theme.major.clone(),
            FontRef::ThemeMinor => theme.minor.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RunProps {
    pub font: Option<FontRef>,
    pub size: Option<f32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub color: Option<Color>,
}

impl RunProps {
    /// Overlay `other` on top of `self`; set values in `other` win
    pub fn apply(&mut self, other: &RunProps) {
        if other.font.is_some() {
            self.font = other.font.clone();
        }
        self.size = other.size.or(self.size);
        self.bold = other.bold.or(self.bold);
        self.italic = other.italic.or(self.italic);
        self.underline = other.underline.or(self.underline);
        self.color = other.color.or(self.color);
    }

    /// Read one child element of `w:rPr`
    pub fn read_property(&mut self, e: &BytesStart) {
        match e.local_name().as_ref() {
            b"rFonts" => {
                let theme = attr(e, "asciiTheme").or_else(|| attr(e, "hAnsiTheme"));
                if let Some(name) = attr(e, "ascii").or_else(|| attr(e, "hAnsi")) {
                    self.font = Some(FontRef::Named(name));
                } else if let Some(theme) = theme {
                    self.font = Some(if theme.starts_with("major") {
                        FontRef::ThemeMajor
                    } else {
                        FontRef::ThemeMinor
                    });
                } else if let Some(name) = attr(e, "cs") {
                    self.font = Some(FontRef::Named(name));
                }
            }
            b"sz" => {
                if let Some(size) = attr(e, "val").as_deref().and_then(parse_half_points) {
                    self.size = Some(size);
                }
            }
            b"b" => self.bold = Some(parse_on_off(attr(e, "val"))),
            b"i" => self.italic = Some(parse_on_off(attr(e, "val"))),
            b"u" => self.underline = Some(parse_on_off(attr(e, "val"))),
            b"color" => {
                if let Some(val) = attr(e, "val") {
                    self.color = Some(Color::from_hex(&val).unwrap_or(Color::BLACK));
                }
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ParaProps {
    pub alignment: Option<Alignment>,
    pub space_before: Option<f32>,
    pub space_after: Option<f32>,
    pub line_spacing: Option<LineSpacing>,
    pub indent_left: Option<f32>,
    pub indent_right: Option<f32>,
    pub indent_first_line: Option<f32>,
    pub page_break_before: Option<bool>,
}

impl ParaProps {
    /// Overlay `other` on top of `self`; set values in `other` win
    pub fn apply(&mut self, other: &ParaProps) {
        self.alignment = other.alignment.or(self.alignment);
        self.space_before = other.space_before.or(self.space_before);
        self.space_after = other.space_after.or(self.space_after);
        self.line_spacing = other.line_spacing.or(self.line_spacing);
        self.indent_left = other.indent_left.or(self.indent_left);
        self.indent_right = other.indent_right.or(self.indent_right);
        self.indent_first_line = other.indent_first_line.or(self.indent_first_line);
        self.page_break_before = other.page_break_before.or(self.page_break_before);
    }

    /// Read one child element of `w:pPr`
    pub fn read_property(&mut self, e: &BytesStart) {
        match e.local_name().as_ref() {
            b"jc" => {
                if let Some(val) = attr(e, "val") {
                    self.alignment = Some(Alignment::from_jc(&val));
                }
            }
            b"spacing" => {
                if let Some(v) = attr(e, "before").as_deref().and_then(parse_twips) {
                    self.space_before = Some(v);
                }
                if let Some(v) = attr(e, "after").as_deref().and_then(parse_twips) {
                    self.space_after = Some(v);
                }
                if let Some(line) = attr(e, "line").and_then(|v| v.trim().parse::<f32>().ok()) {
                    let rule = attr(e, "lineRule").unwrap_or_else(|| "auto".to_string());
                    self.line_spacing = Some(match rule.as_str() {
                        "exact" => LineSpacing::Exact(line / 20.0),
                        "atLeast" => LineSpacing::AtLeast(line / 20.0),
                        _ => LineSpacing::Multiple(line / 240.0),
                    });
                }
            }
            b"ind" => {
                if let Some(v) = attr(e, "left").or_else(|| attr(e, "start")).as_deref().and_then(parse_twips) {
                    self.indent_left = Some(v);
                }
                if let Some(v) = attr(e, "right").or_else(|| attr(e, "end")).as_deref().and_then(parse_twips) {
                    self.indent_right = Some(v);
                }
                if let Some(v) = attr(e, "firstLine").as_deref().and_then(parse_twips) {
                    self.indent_first_line = Some(v);
                }
                if let Some(v) = attr(e, "hanging").as_deref().and_then(parse_twips) {
                    self.indent_first_line = Some(-v);
                }
            }
            b"pageBreakBefore" => self.page_break_before = Some(parse_on_off(attr(e, "val"))),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_hex() {
        assert_eq!(Color::from_hex("FF8000"), Some(Color { r: 255, g: 128, b: 0 }));
        assert_eq!(Color::from_hex("auto"), None);
        assert_eq!(Color::from_hex("12345"), None);
    }

    #[test]
    fn test_run_props_overlay() {
        let mut base = RunProps {
            font: Some(FontRef::Named("Inter".into())),
            size: Some(11.0),
            bold: Some(false),
            ..Default::default()
        };
        let direct = RunProps {
            bold: Some(true),
            size: Some(14.0),
            ..Default::default()
        };
        base.apply(&direct);

        assert_eq!(base.font, Some(FontRef::Named("Inter".into())));
        assert_eq!(base.size, Some(14.0));
        assert_eq!(base.bold, Some(true));
        assert_eq!(base.italic, None);
    }

    #[test]
    fn test_theme_font_resolution() {
        let theme = ThemeFonts {
            major: Some("Heading Face".into()),
            minor: None,
        };
        assert_eq!(FontRef::ThemeMajor.resolve(&theme).as_deref(), Some("Heading Face"));
        assert_eq!(FontRef::ThemeMinor.resolve(&theme), None);
        assert_eq!(FontRef::Named("X".into()).resolve(&theme).as_deref(), Some("X"));
    }

    #[test]
    fn test_alignment_values() {
        assert_eq!(Alignment::from_jc("center"), Alignment::Center);
        assert_eq!(Alignment::from_jc("both"), Alignment::Justify);
        assert_eq!(Alignment::from_jc("end"), Alignment::Right);
        assert_eq!(Alignment::from_jc("start"), Alignment::Left);
    }
}
