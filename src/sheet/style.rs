//! Cell styles as plain values.
//!
//! A [`StyleDescription`] is a hashable description of everything a cell
//! style sets. The workbook's [`StyleTable`] interns descriptions, so two
//! cells described alike share one style.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An opaque RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0x000000);
    pub const WHITE: Color = Color(0xFFFFFF);
    pub const RED: Color = Color(0xFF0000);
    pub const BLUE: Color = Color(0x0000FF);
    pub const GREY_25: Color = Color(0xC0C0C0);

    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Color(((red as u32) << 16) | ((green as u32) << 8) | blue as u32)
    }

    /// `AARRGGBB` hex as stored in a styles part, fully opaque.
    pub fn to_argb_hex(self) -> String {
        format!("FF{:06X}", self.0 & 0xFFFFFF)
    }

    /// Parse `RRGGBB` or `AARRGGBB` hex. The alpha channel is dropped.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let rgb = match hex.len() {
            6 => hex,
            8 => &hex[2..],
            _ => return None,
        };
        u32::from_str_radix(rgb, 16).ok().map(Color)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontDescription {
    pub name: String,
    /// Height in points
    pub size: u16,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Option<Color>,
}

impl Default for FontDescription {
    fn default() -> Self {
        Self {
            name: "Calibri".to_string(),
            size: 11,
            bold: false,
            italic: false,
            underline: false,
            color: None,
        }
    }
}

impl FontDescription {
    pub fn new(name: impl Into<String>, size: u16) -> Self {
        Self {
            name: name.into(),
            size,
            ..Self::default()
        }
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    pub fn with_underline(mut self, underline: bool) -> Self {
        self.underline = underline;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FillPattern {
    #[default]
    None,
    Solid,
    Gray125,
}

impl FillPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            FillPattern::None => "none",
            FillPattern::Solid => "solid",
            FillPattern::Gray125 => "gray125",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "solid" => FillPattern::Solid,
            "gray125" => FillPattern::Gray125,
            _ => FillPattern::None,
        }
    }
}

/// Line style of one border edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BorderStyle {
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
    Hair,
}

impl BorderStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorderStyle::Thin => "thin",
            BorderStyle::Medium => "medium",
            BorderStyle::Thick => "thick",
            BorderStyle::Dashed => "dashed",
            BorderStyle::Dotted => "dotted",
            BorderStyle::Double => "double",
            BorderStyle::Hair => "hair",
        }
    }

    /// `None` for `none` and unknown styles.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "thin" => BorderStyle::Thin,
            "medium" => BorderStyle::Medium,
            "thick" => BorderStyle::Thick,
            "dashed" => BorderStyle::Dashed,
            "dotted" => BorderStyle::Dotted,
            "double" => BorderStyle::Double,
            "hair" => BorderStyle::Hair,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BorderLine {
    pub style: BorderStyle,
    pub color: Option<Color>,
}

impl BorderLine {
    pub fn new(style: BorderStyle) -> Self {
        Self { style, color: None }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Border {
    pub left: Option<BorderLine>,
    pub right: Option<BorderLine>,
    pub top: Option<BorderLine>,
    pub bottom: Option<BorderLine>,
}

impl Border {
    /// The same line on all four edges.
    pub fn uniform(line: BorderLine) -> Self {
        Self {
            left: Some(line),
            right: Some(line),
            top: Some(line),
            bottom: Some(line),
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Border::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HorizontalAlignment {
    General,
    Left,
    Center,
    Right,
    Fill,
    Justify,
}

impl HorizontalAlignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            HorizontalAlignment::General => "general",
            HorizontalAlignment::Left => "left",
            HorizontalAlignment::Center => "center",
            HorizontalAlignment::Right => "right",
            HorizontalAlignment::Fill => "fill",
            HorizontalAlignment::Justify => "justify",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "general" => HorizontalAlignment::General,
            "left" => HorizontalAlignment::Left,
            "center" => HorizontalAlignment::Center,
            "right" => HorizontalAlignment::Right,
            "fill" => HorizontalAlignment::Fill,
            "justify" => HorizontalAlignment::Justify,
            _ => return None,
        })
    }
}

/// Everything a cell style sets; `None` fields keep the workbook default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StyleDescription {
    /// Number format code such as `0.00` or `dd.mm.yyyy`
    pub number_format: Option<String>,
    pub foreground: Option<Color>,
    pub background: Option<Color>,
    pub fill_pattern: Option<FillPattern>,
    pub font: Option<FontDescription>,
    pub border: Border,
    pub alignment: Option<HorizontalAlignment>,
    pub wrap_text: bool,
}

impl StyleDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_default(&self) -> bool {
        *self == StyleDescription::default()
    }

    pub fn with_number_format(mut self, format: impl Into<String>) -> Self {
        self.number_format = Some(format.into());
        self
    }

    /// Solid fill in `color`.
    pub fn with_fill(mut self, color: Color) -> Self {
        self.foreground = Some(color);
        self.fill_pattern = Some(FillPattern::Solid);
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn with_font(mut self, font: FontDescription) -> Self {
        self.font = Some(font);
        self
    }

    pub fn with_border(mut self, border: Border) -> Self {
        self.border = border;
        self
    }

    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    pub fn with_wrap_text(mut self, wrap_text: bool) -> Self {
        self.wrap_text = wrap_text;
        self
    }
}

/// Index of a style in a [`StyleTable`]. `StyleId::DEFAULT` is the unstyled look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct StyleId(pub(crate) u32);

impl StyleId {
    pub const DEFAULT: StyleId = StyleId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Interned style descriptions of one workbook.
#[derive(Debug, Clone)]
pub struct StyleTable {
    styles: Vec<StyleDescription>,
    index: HashMap<StyleDescription, StyleId>,
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleTable {
    pub fn new() -> Self {
        let mut index = HashMap::new();
        index.insert(StyleDescription::default(), StyleId::DEFAULT);
        Self {
            styles: vec![StyleDescription::default()],
            index,
        }
    }

    /// The id of `description`, adding it on first use.
    pub fn intern(&mut self, description: StyleDescription) -> StyleId {
        if let Some(&id) = self.index.get(&description) {
            return id;
        }
        let id = StyleId(self.styles.len() as u32);
        self.styles.push(description.clone());
        self.index.insert(description, id);
        id
    }

    pub fn get(&self, id: StyleId) -> Option<&StyleDescription> {
        self.styles.get(id.index())
    }

    pub fn find(&self, description: &StyleDescription) -> Option<StyleId> {
        self.index.get(description).copied()
    }

    /// Number of styles including the default.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StyleId, &StyleDescription)> {
        self.styles
            .iter()
            .enumerate()
            .map(|(i, style)| (StyleId(i as u32), style))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::rgb(0x12, 0x34, 0x56).to_argb_hex(), "FF123456");
        assert_eq!(Color::from_hex("FF123456"), Some(Color(0x123456)));
        assert_eq!(Color::from_hex("#00FF00"), Some(Color(0x00FF00)));
        assert_eq!(Color::from_hex("xyz"), None);
    }

    #[test]
    fn test_intern_deduplicates_equal_descriptions() {
        let mut table = StyleTable::new();
        assert_eq!(table.intern(StyleDescription::new()), StyleId::DEFAULT);

        let bold = || {
            StyleDescription::new()
                .with_font(FontDescription::new("Arial", 10).with_bold(true))
                .with_wrap_text(true)
        };
        let first = table.intern(bold());
        let second = table.intern(bold());
        assert_eq!(first, second);
        assert_ne!(first, StyleId::DEFAULT);

        let other = table.intern(bold().with_number_format("0.00"));
        assert_ne!(other, first);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(other).unwrap().number_format.as_deref(), Some("0.00"));
    }

    #[test]
    fn test_is_default() {
        assert!(StyleDescription::default().is_default());
        assert!(!StyleDescription::new().with_wrap_text(true).is_default());
        assert!(!StyleDescription::new()
            .with_border(Border::uniform(BorderLine::new(BorderStyle::Thin)))
            .is_default());
    }
}
