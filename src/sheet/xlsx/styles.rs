//! The styles part: fonts, fills, borders, number formats and cell formats.

use super::{
    FIRST_CUSTOM_NUMBER_FORMAT, NS_MAIN, XML_DECLARATION, attribute, builtin_format_code,
    builtin_format_id, is_date_format,
};
use crate::common::{Result, escape_xml};
use crate::sheet::style::{
    Border, BorderLine, BorderStyle, Color, FillPattern, FontDescription, HorizontalAlignment,
    StyleDescription,
};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Fill {
    pattern: FillPattern,
    foreground: Option<Color>,
    background: Option<Color>,
}

/// One cell format record, pointing into the other tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellFormat {
    font: usize,
    fill: usize,
    border: usize,
    number_format: u32,
    alignment: Option<HorizontalAlignment>,
    wrap_text: bool,
}

const DEFAULT_CELL_FORMAT: CellFormat = CellFormat {
    font: 0,
    fill: 0,
    border: 0,
    number_format: 0,
    alignment: None,
    wrap_text: false,
};

/// Builder for the styles part.
///
/// Collects the distinct fonts, fills, borders and number formats used by
/// the workbook's style descriptions and assigns each description a cell
/// format index.
#[derive(Debug)]
pub(crate) struct StylesBuilder {
    fonts: Vec<FontDescription>,
    font_map: HashMap<FontDescription, usize>,
    fills: Vec<Fill>,
    fill_map: HashMap<Fill, usize>,
    borders: Vec<Border>,
    border_map: HashMap<Border, usize>,
    /// Custom number formats, ids from 164 on
    number_formats: Vec<String>,
    number_format_map: HashMap<String, u32>,
    cell_formats: Vec<CellFormat>,
    cell_format_map: HashMap<StyleDescription, usize>,
}

impl StylesBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            fonts: Vec::new(),
            font_map: HashMap::new(),
            fills: Vec::new(),
            fill_map: HashMap::new(),
            borders: Vec::new(),
            border_map: HashMap::new(),
            number_formats: Vec::new(),
            number_format_map: HashMap::new(),
            cell_formats: Vec::new(),
            cell_format_map: HashMap::new(),
        };

        // Spreadsheet applications expect the default font first
        builder.add_font(&FontDescription::default());

        // and the two default fills: none, then gray125.
        for pattern in [FillPattern::None, FillPattern::Gray125] {
            let fill = Fill {
                pattern,
                foreground: None,
                background: None,
            };
            builder.fill_map.insert(fill, builder.fills.len());
            builder.fills.push(fill);
        }

        builder.add_border(&Border::default());

        builder.cell_formats.push(DEFAULT_CELL_FORMAT);
        builder
            .cell_format_map
            .insert(StyleDescription::default(), 0);

        builder
    }

    /// Cell format index of `description`, adding it on first use.
    pub fn add(&mut self, description: &StyleDescription) -> usize {
        if let Some(&index) = self.cell_format_map.get(description) {
            return index;
        }

        let font = match &description.font {
            Some(font) => self.add_font(font),
            None => 0,
        };

        let pattern = description.fill_pattern.unwrap_or(if description.foreground.is_some() {
            FillPattern::Solid
        } else {
            FillPattern::None
        });
        let fill = Fill {
            pattern,
            foreground: description.foreground,
            background: description.background,
        };
        let fill = self.add_fill(fill);

        let border = self.add_border(&description.border);

        let number_format = match &description.number_format {
            Some(code) => self.add_number_format(code),
            None => 0,
        };

        let index = self.cell_formats.len();
        self.cell_formats.push(CellFormat {
            font,
            fill,
            border,
            number_format,
            alignment: description.alignment,
            wrap_text: description.wrap_text,
        });
        self.cell_format_map.insert(description.clone(), index);
        index
    }

    fn add_font(&mut self, font: &FontDescription) -> usize {
        if let Some(&index) = self.font_map.get(font) {
            return index;
        }
        let index = self.fonts.len();
        self.fonts.push(font.clone());
        self.font_map.insert(font.clone(), index);
        index
    }

    fn add_fill(&mut self, fill: Fill) -> usize {
        if fill.pattern == FillPattern::None && fill.foreground.is_none() && fill.background.is_none() {
            return 0;
        }
        if let Some(&index) = self.fill_map.get(&fill) {
            return index;
        }
        let index = self.fills.len();
        self.fills.push(fill);
        self.fill_map.insert(fill, index);
        index
    }

    fn add_border(&mut self, border: &Border) -> usize {
        if let Some(&index) = self.border_map.get(border) {
            return index;
        }
        let index = self.borders.len();
        self.borders.push(*border);
        self.border_map.insert(*border, index);
        index
    }

    fn add_number_format(&mut self, code: &str) -> u32 {
        if let Some(id) = builtin_format_id(code) {
            return id;
        }
        if let Some(&id) = self.number_format_map.get(code) {
            return id;
        }
        let id = FIRST_CUSTOM_NUMBER_FORMAT + self.number_formats.len() as u32;
        self.number_formats.push(code.to_string());
        self.number_format_map.insert(code.to_string(), id);
        id
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(4096);
        xml.push_str(XML_DECLARATION);
        write!(xml, r#"<styleSheet xmlns="{}">"#, NS_MAIN)?;

        if !self.number_formats.is_empty() {
            write!(xml, r#"<numFmts count="{}">"#, self.number_formats.len())?;
            for (i, code) in self.number_formats.iter().enumerate() {
                write!(
                    xml,
                    r#"<numFmt numFmtId="{}" formatCode="{}"/>"#,
                    FIRST_CUSTOM_NUMBER_FORMAT + i as u32,
                    escape_xml(code)
                )?;
            }
            xml.push_str("</numFmts>");
        }

        write!(xml, r#"<fonts count="{}">"#, self.fonts.len())?;
        for font in &self.fonts {
            write_font(&mut xml, font)?;
        }
        xml.push_str("</fonts>");

        write!(xml, r#"<fills count="{}">"#, self.fills.len())?;
        for fill in &self.fills {
            write_fill(&mut xml, fill)?;
        }
        xml.push_str("</fills>");

        write!(xml, r#"<borders count="{}">"#, self.borders.len())?;
        for border in &self.borders {
            write_border(&mut xml, border)?;
        }
        xml.push_str("</borders>");

        xml.push_str(r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);

        write!(xml, r#"<cellXfs count="{}">"#, self.cell_formats.len())?;
        for format in &self.cell_formats {
            write!(
                xml,
                r#"<xf numFmtId="{}" fontId="{}" fillId="{}" borderId="{}" xfId="0""#,
                format.number_format, format.font, format.fill, format.border
            )?;
            if format.font != 0 {
                xml.push_str(r#" applyFont="1""#);
            }
            if format.fill != 0 {
                xml.push_str(r#" applyFill="1""#);
            }
            if format.border != 0 {
                xml.push_str(r#" applyBorder="1""#);
            }
            if format.number_format != 0 {
                xml.push_str(r#" applyNumberFormat="1""#);
            }
            if format.alignment.is_none() && !format.wrap_text {
                xml.push_str("/>");
                continue;
            }
            xml.push_str(r#" applyAlignment="1"><alignment"#);
            if let Some(alignment) = format.alignment {
                write!(xml, r#" horizontal="{}""#, alignment.as_str())?;
            }
            if format.wrap_text {
                xml.push_str(r#" wrapText="1""#);
            }
            xml.push_str("/></xf>");
        }
        xml.push_str("</cellXfs>");

        xml.push_str(r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#);
        xml.push_str("</styleSheet>");
        Ok(xml)
    }
}

fn write_font(xml: &mut String, font: &FontDescription) -> Result<()> {
    xml.push_str("<font>");
    if font.bold {
        xml.push_str("<b/>");
    }
    if font.italic {
        xml.push_str("<i/>");
    }
    if font.underline {
        xml.push_str("<u/>");
    }
    write!(xml, r#"<sz val="{}"/>"#, font.size)?;
    if let Some(color) = font.color {
        write!(xml, r#"<color rgb="{}"/>"#, color.to_argb_hex())?;
    }
    write!(xml, r#"<name val="{}"/>"#, escape_xml(&font.name))?;
    xml.push_str("</font>");
    Ok(())
}

fn write_fill(xml: &mut String, fill: &Fill) -> Result<()> {
    write!(xml, r#"<fill><patternFill patternType="{}""#, fill.pattern.as_str())?;
    if fill.foreground.is_none() && fill.background.is_none() {
        xml.push_str("/></fill>");
        return Ok(());
    }
    xml.push('>');
    if let Some(color) = fill.foreground {
        write!(xml, r#"<fgColor rgb="{}"/>"#, color.to_argb_hex())?;
    }
    if let Some(color) = fill.background {
        write!(xml, r#"<bgColor rgb="{}"/>"#, color.to_argb_hex())?;
    }
    xml.push_str("</patternFill></fill>");
    Ok(())
}

fn write_border(xml: &mut String, border: &Border) -> Result<()> {
    xml.push_str("<border>");
    write_border_side(xml, "left", border.left.as_ref())?;
    write_border_side(xml, "right", border.right.as_ref())?;
    write_border_side(xml, "top", border.top.as_ref())?;
    write_border_side(xml, "bottom", border.bottom.as_ref())?;
    xml.push_str("<diagonal/></border>");
    Ok(())
}

fn write_border_side(xml: &mut String, side: &str, line: Option<&BorderLine>) -> Result<()> {
    match line {
        Some(line) => {
            write!(xml, r#"<{} style="{}">"#, side, line.style.as_str())?;
            if let Some(color) = line.color {
                write!(xml, r#"<color rgb="{}"/>"#, color.to_argb_hex())?;
            }
            write!(xml, "</{}>", side)?;
        },
        None => write!(xml, "<{}/>", side)?,
    }
    Ok(())
}

/// A cell format of a loaded styles part.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LoadedStyle {
    pub description: StyleDescription,
    /// Numbers in cells of this format are dates
    pub is_date: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    NumberFormats,
    Fonts,
    Fills,
    Borders,
    CellFormats,
    Other,
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

#[derive(Debug)]
struct StylesParser {
    section: Section,
    number_formats: HashMap<u32, String>,
    fonts: Vec<FontDescription>,
    fills: Vec<Fill>,
    borders: Vec<Border>,
    cell_formats: Vec<CellFormat>,
    font: Option<FontDescription>,
    fill: Option<Fill>,
    border: Option<Border>,
    side: Option<(Side, Option<BorderLine>)>,
    cell_format: Option<CellFormat>,
}

/// Parse a styles part into one entry per cell format.
///
/// Font, fill and border 0 are the workbook defaults and map to an unset
/// description field; theme and indexed colours are not resolved.
pub(crate) fn parse_styles(xml: &[u8]) -> Result<Vec<LoadedStyle>> {
    let mut parser = StylesParser {
        section: Section::None,
        number_formats: HashMap::new(),
        fonts: Vec::new(),
        fills: Vec::new(),
        borders: Vec::new(),
        cell_formats: Vec::new(),
        font: None,
        fill: None,
        border: None,
        side: None,
        cell_format: None,
    };
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => parser.open(e, false)?,
            Event::Empty(ref e) => parser.open(e, true)?,
            Event::End(ref e) => parser.close(e.local_name().as_ref()),
            Event::Eof => break,
            _ => {},
        }
        buf.clear();
    }
    Ok(parser.finish())
}

fn color_attribute(e: &BytesStart<'_>) -> Result<Option<Color>> {
    Ok(attribute(e, b"rgb")?.and_then(|hex| Color::from_hex(&hex)))
}

fn flag_attribute(e: &BytesStart<'_>) -> Result<bool> {
    Ok(attribute(e, b"val")?.is_none_or(|v| v != "0" && v != "false" && v != "none"))
}

fn index_attribute(e: &BytesStart<'_>, name: &[u8]) -> Result<usize> {
    Ok(attribute(e, name)?
        .and_then(|v| v.parse().ok())
        .unwrap_or(0))
}

impl StylesParser {
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<()> {
        let name = e.local_name();
        let name = name.as_ref();
        match (self.section, name) {
            (_, b"numFmts") => self.section = Section::NumberFormats,
            (_, b"fonts") => self.section = Section::Fonts,
            (_, b"fills") => self.section = Section::Fills,
            (_, b"borders") => self.section = Section::Borders,
            (_, b"cellXfs") => self.section = Section::CellFormats,
            (_, b"cellStyleXfs" | b"dxfs" | b"cellStyles" | b"colors" | b"extLst") => {
                self.section = Section::Other;
            },

            (Section::NumberFormats, b"numFmt") => {
                let id = index_attribute(e, b"numFmtId")? as u32;
                if let Some(code) = attribute(e, b"formatCode")? {
                    self.number_formats.insert(id, code);
                }
            },

            (Section::Fonts, b"font") => {
                self.font = Some(FontDescription::default());
                if empty {
                    self.close(b"font");
                }
            },
            (Section::Fonts, _) => {
                if let Some(font) = self.font.as_mut() {
                    match name {
                        b"b" => font.bold = flag_attribute(e)?,
                        b"i" => font.italic = flag_attribute(e)?,
                        b"u" => font.underline = flag_attribute(e)?,
                        b"sz" => {
                            if let Some(size) = attribute(e, b"val")?.and_then(|v| v.parse::<f64>().ok()) {
                                font.size = size.round() as u16;
                            }
                        },
                        b"color" => font.color = color_attribute(e)?,
                        b"name" => {
                            if let Some(family) = attribute(e, b"val")? {
                                font.name = family;
                            }
                        },
                        _ => {},
                    }
                }
            },

            (Section::Fills, b"fill") => {
                self.fill = Some(Fill {
                    pattern: FillPattern::None,
                    foreground: None,
                    background: None,
                });
                if empty {
                    self.close(b"fill");
                }
            },
            (Section::Fills, _) => {
                if let Some(fill) = self.fill.as_mut() {
                    match name {
                        b"patternFill" => {
                            fill.pattern = attribute(e, b"patternType")?
                                .map_or(FillPattern::None, |p| FillPattern::parse(&p));
                        },
                        b"fgColor" => fill.foreground = color_attribute(e)?,
                        b"bgColor" => fill.background = color_attribute(e)?,
                        _ => {},
                    }
                }
            },

            (Section::Borders, b"border") => {
                self.border = Some(Border::default());
                if empty {
                    self.close(b"border");
                }
            },
            (Section::Borders, b"left" | b"right" | b"top" | b"bottom" | b"start" | b"end") => {
                let side = match name {
                    b"left" | b"start" => Side::Left,
                    b"right" | b"end" => Side::Right,
                    b"top" => Side::Top,
                    _ => Side::Bottom,
                };
                let line = attribute(e, b"style")?
                    .and_then(|s| BorderStyle::parse(&s))
                    .map(BorderLine::new);
                self.side = Some((side, line));
                if empty {
                    self.close(name);
                }
            },
            (Section::Borders, b"color") => {
                let color = color_attribute(e)?;
                if let Some((_, Some(line))) = self.side.as_mut() {
                    line.color = color;
                }
            },

            (Section::CellFormats, b"xf") => {
                self.cell_format = Some(CellFormat {
                    font: index_attribute(e, b"fontId")?,
                    fill: index_attribute(e, b"fillId")?,
                    border: index_attribute(e, b"borderId")?,
                    number_format: index_attribute(e, b"numFmtId")? as u32,
                    alignment: None,
                    wrap_text: false,
                });
                if empty {
                    self.close(b"xf");
                }
            },
            (Section::CellFormats, b"alignment") => {
                let horizontal = attribute(e, b"horizontal")?;
                let wrap = attribute(e, b"wrapText")?;
                if let Some(format) = self.cell_format.as_mut() {
                    format.alignment = horizontal.and_then(|h| HorizontalAlignment::parse(&h));
                    format.wrap_text = wrap.is_some_and(|w| w == "1" || w == "true");
                }
            },
            _ => {},
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"numFmts" | b"fonts" | b"fills" | b"borders" | b"cellXfs" | b"cellStyleXfs"
            | b"dxfs" | b"cellStyles" | b"colors" | b"extLst" => self.section = Section::None,
            b"font" if self.section == Section::Fonts => {
                if let Some(font) = self.font.take() {
                    self.fonts.push(font);
                }
            },
            b"fill" if self.section == Section::Fills => {
                if let Some(fill) = self.fill.take() {
                    self.fills.push(fill);
                }
            },
            b"border" if self.section == Section::Borders => {
                if let Some(border) = self.border.take() {
                    self.borders.push(border);
                }
            },
            b"left" | b"right" | b"top" | b"bottom" | b"start" | b"end"
                if self.section == Section::Borders =>
            {
                if let (Some((side, line)), Some(border)) = (self.side.take(), self.border.as_mut()) {
                    match side {
                        Side::Left => border.left = line,
                        Side::Right => border.right = line,
                        Side::Top => border.top = line,
                        Side::Bottom => border.bottom = line,
                    }
                }
            },
            b"xf" if self.section == Section::CellFormats => {
                if let Some(format) = self.cell_format.take() {
                    self.cell_formats.push(format);
                }
            },
            _ => {},
        }
    }

    fn finish(self) -> Vec<LoadedStyle> {
        self.cell_formats
            .iter()
            .map(|format| {
                let code = self
                    .number_formats
                    .get(&format.number_format)
                    .cloned()
                    .or_else(|| builtin_format_code(format.number_format).map(str::to_string));
                let is_date = match &code {
                    Some(code) => is_date_format(code),
                    // Locale specific date formats without a code
                    None => matches!(format.number_format, 27..=36 | 50..=58),
                };

                let mut description = StyleDescription {
                    number_format: code.filter(|c| c != "General"),
                    alignment: format.alignment,
                    wrap_text: format.wrap_text,
                    ..StyleDescription::default()
                };
                if format.font != 0 {
                    description.font = self.fonts.get(format.font).cloned();
                }
                if format.fill > 1
                    && let Some(fill) = self.fills.get(format.fill)
                {
                    description.foreground = fill.foreground;
                    description.background = fill.background;
                    description.fill_pattern = Some(fill.pattern);
                }
                if format.border != 0
                    && let Some(border) = self.borders.get(format.border)
                {
                    description.border = *border;
                }
                LoadedStyle {
                    description,
                    is_date,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_styles() {
        let builder = StylesBuilder::new();
        let xml = builder.to_xml().unwrap();
        assert!(xml.contains(r#"<fonts count="1">"#));
        assert!(xml.contains(r#"<fills count="2">"#));
        assert!(xml.contains(r#"<patternFill patternType="gray125"/>"#));
        assert!(xml.contains(r#"<cellXfs count="1">"#));
        assert!(!xml.contains("<numFmts"));
    }

    #[test]
    fn test_formats_are_shared() {
        let mut builder = StylesBuilder::new();
        let date = StyleDescription::new().with_number_format("dd.mm.yyyy");
        let real = StyleDescription::new().with_number_format("0.00");
        assert_eq!(builder.add(&date), 1);
        assert_eq!(builder.add(&real), 2);
        assert_eq!(builder.add(&date), 1);
        assert_eq!(builder.add(&StyleDescription::default()), 0);

        let xml = builder.to_xml().unwrap();
        assert!(xml.contains(r#"<numFmt numFmtId="164" formatCode="dd.mm.yyyy"/>"#));
        // Builtin formats are referenced by id only
        assert!(xml.contains(r#"<xf numFmtId="2" fontId="0""#));
        assert!(!xml.contains(r#"formatCode="0.00""#));
    }

    #[test]
    fn test_styles_round_trip() {
        let description = StyleDescription::new()
            .with_number_format("0.000")
            .with_font(FontDescription::new("Arial", 10).with_bold(true).with_color(Color::BLUE))
            .with_fill(Color::GREY_25)
            .with_border(Border::uniform(BorderLine::new(BorderStyle::Thin).with_color(Color::RED)))
            .with_alignment(HorizontalAlignment::Center)
            .with_wrap_text(true);
        let date = StyleDescription::new().with_number_format("yyyy-mm-dd");

        let mut builder = StylesBuilder::new();
        builder.add(&description);
        builder.add(&date);
        let loaded = parse_styles(builder.to_xml().unwrap().as_bytes()).unwrap();

        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].description, StyleDescription::default());
        assert!(!loaded[0].is_date);
        assert_eq!(loaded[1].description, description);
        assert!(!loaded[1].is_date);
        assert_eq!(loaded[2].description, date);
        assert!(loaded[2].is_date);
    }

    #[test]
    fn test_builtin_date_id_without_code() {
        let xml = r#"<styleSheet><cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="14"/></cellXfs></styleSheet>"#;
        let loaded = parse_styles(xml.as_bytes()).unwrap();
        assert!(loaded[1].is_date);
        assert_eq!(loaded[1].description.number_format.as_deref(), Some("mm-dd-yy"));
    }
}
