//! Writing a workbook as a package.

use super::strings::SharedStrings;
use super::styles::StylesBuilder;
use super::{
    NS_MAIN, NS_PACKAGE_RELATIONSHIPS, NS_RELATIONSHIPS, REL_OFFICE_DOCUMENT, REL_SHARED_STRINGS,
    REL_STYLES, REL_WORKSHEET, XML_DECLARATION, is_date_format,
};
use crate::common::{Result, escape_xml};
use crate::sheet::cell::{CellValue, cell_reference, format_number, to_serial};
use crate::sheet::style::StyleId;
use crate::sheet::workbook::{Workbook, Worksheet};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::{Seek, Write};
use tracing::debug;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Number format given to date cells whose style has none.
pub(crate) const FALLBACK_DATE_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

const CT_WORKBOOK: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CT_WORKSHEET: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
const CT_SHARED_STRINGS: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";

/// Maps workbook styles to cell format indices of the styles part.
struct StyleResolver<'a> {
    workbook: &'a Workbook,
    builder: StylesBuilder,
    resolved: HashMap<(StyleId, bool), usize>,
}

impl StyleResolver<'_> {
    fn resolve(&mut self, style: StyleId, is_date: bool) -> usize {
        if let Some(&index) = self.resolved.get(&(style, is_date)) {
            return index;
        }
        let mut description = self
            .workbook
            .styles()
            .get(style)
            .cloned()
            .unwrap_or_default();
        // A date without a date format would show as a bare serial number
        if is_date && !description.number_format.as_deref().is_some_and(is_date_format) {
            description.number_format = Some(FALLBACK_DATE_FORMAT.to_string());
        }
        let index = self.builder.add(&description);
        self.resolved.insert((style, is_date), index);
        index
    }
}

/// Write `workbook` as a package into `writer`.
pub(crate) fn write_package<W: Write + Seek>(workbook: &Workbook, writer: W) -> Result<W> {
    let fallback;
    let sheets: &[Worksheet] = if workbook.sheets().is_empty() {
        fallback = [Worksheet::new("Sheet1")];
        &fallback
    } else {
        workbook.sheets()
    };

    let mut strings = SharedStrings::new();
    let mut styles = StyleResolver {
        workbook,
        builder: StylesBuilder::new(),
        resolved: HashMap::new(),
    };
    let sheet_parts = sheets
        .iter()
        .enumerate()
        .map(|(i, sheet)| worksheet_xml(sheet, i == 0, &mut strings, &mut styles))
        .collect::<Result<Vec<String>>>()?;

    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let add = |zip: &mut ZipWriter<W>, name: &str, content: &str| -> Result<()> {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
        Ok(())
    };

    add(&mut zip, "[Content_Types].xml", &content_types_xml(sheets.len(), !strings.is_empty())?)?;
    add(&mut zip, "_rels/.rels", &root_rels_xml()?)?;
    add(&mut zip, "xl/workbook.xml", &workbook_xml(sheets)?)?;
    add(
        &mut zip,
        "xl/_rels/workbook.xml.rels",
        &workbook_rels_xml(sheets.len(), !strings.is_empty())?,
    )?;
    for (i, part) in sheet_parts.iter().enumerate() {
        add(&mut zip, &format!("xl/worksheets/sheet{}.xml", i + 1), part)?;
    }
    add(&mut zip, "xl/styles.xml", &styles.builder.to_xml()?)?;
    if !strings.is_empty() {
        add(&mut zip, "xl/sharedStrings.xml", &strings.to_xml()?)?;
    }

    debug!(sheets = sheets.len(), "Workbook package written");
    Ok(zip.finish()?)
}

fn content_types_xml(sheet_count: usize, has_strings: bool) -> Result<String> {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECLARATION);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    write!(xml, r#"<Override PartName="/xl/workbook.xml" ContentType="{}"/>"#, CT_WORKBOOK)?;
    for i in 1..=sheet_count {
        write!(
            xml,
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="{}"/>"#,
            i, CT_WORKSHEET
        )?;
    }
    write!(xml, r#"<Override PartName="/xl/styles.xml" ContentType="{}"/>"#, CT_STYLES)?;
    if has_strings {
        write!(
            xml,
            r#"<Override PartName="/xl/sharedStrings.xml" ContentType="{}"/>"#,
            CT_SHARED_STRINGS
        )?;
    }
    xml.push_str("</Types>");
    Ok(xml)
}

fn root_rels_xml() -> Result<String> {
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_DECLARATION);
    write!(
        xml,
        r#"<Relationships xmlns="{}"><Relationship Id="rId1" Type="{}" Target="xl/workbook.xml"/></Relationships>"#,
        NS_PACKAGE_RELATIONSHIPS, REL_OFFICE_DOCUMENT
    )?;
    Ok(xml)
}

fn workbook_xml(sheets: &[Worksheet]) -> Result<String> {
    let mut xml = String::with_capacity(512 + sheets.len() * 64);
    xml.push_str(XML_DECLARATION);
    write!(xml, r#"<workbook xmlns="{}" xmlns:r="{}">"#, NS_MAIN, NS_RELATIONSHIPS)?;
    xml.push_str(r#"<bookViews><workbookView activeTab="0"/></bookViews>"#);
    xml.push_str("<sheets>");
    for (i, sheet) in sheets.iter().enumerate() {
        write!(
            xml,
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape_xml(sheet.name()),
            i + 1,
            i + 1
        )?;
    }
    xml.push_str("</sheets></workbook>");
    Ok(xml)
}

fn workbook_rels_xml(sheet_count: usize, has_strings: bool) -> Result<String> {
    let mut xml = String::with_capacity(512 + sheet_count * 128);
    xml.push_str(XML_DECLARATION);
    write!(xml, r#"<Relationships xmlns="{}">"#, NS_PACKAGE_RELATIONSHIPS)?;
    for i in 1..=sheet_count {
        write!(
            xml,
            r#"<Relationship Id="rId{}" Type="{}" Target="worksheets/sheet{}.xml"/>"#,
            i, REL_WORKSHEET, i
        )?;
    }
    write!(
        xml,
        r#"<Relationship Id="rId{}" Type="{}" Target="styles.xml"/>"#,
        sheet_count + 1,
        REL_STYLES
    )?;
    if has_strings {
        write!(
            xml,
            r#"<Relationship Id="rId{}" Type="{}" Target="sharedStrings.xml"/>"#,
            sheet_count + 2,
            REL_SHARED_STRINGS
        )?;
    }
    xml.push_str("</Relationships>");
    Ok(xml)
}

fn worksheet_xml(
    sheet: &Worksheet,
    selected: bool,
    strings: &mut SharedStrings,
    styles: &mut StyleResolver<'_>,
) -> Result<String> {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECLARATION);
    write!(xml, r#"<worksheet xmlns="{}" xmlns:r="{}">"#, NS_MAIN, NS_RELATIONSHIPS)?;
    if selected {
        xml.push_str(r#"<sheetViews><sheetView tabSelected="1" workbookViewId="0"/></sheetViews>"#);
    } else {
        xml.push_str(r#"<sheetViews><sheetView workbookViewId="0"/></sheetViews>"#);
    }
    xml.push_str(r#"<sheetFormatPr defaultRowHeight="15"/>"#);

    let mut widths = sheet.column_widths().peekable();
    if widths.peek().is_some() {
        xml.push_str("<cols>");
        for (column, width) in widths {
            // Column numbers are one-based here
            write!(
                xml,
                r#"<col min="{}" max="{}" width="{}" customWidth="1"/>"#,
                column + 1,
                column + 1,
                format_number(width)
            )?;
        }
        xml.push_str("</cols>");
    }

    xml.push_str("<sheetData>");
    for (row, cells) in sheet.rows() {
        let written: Vec<_> = cells
            .iter()
            .filter(|(_, cell)| !cell.value.is_blank() || cell.style != StyleId::DEFAULT)
            .collect();
        if written.is_empty() {
            continue;
        }
        write!(xml, r#"<row r="{}">"#, row + 1)?;
        for (&column, cell) in written {
            let is_date = matches!(cell.value, CellValue::Date(_));
            let style = styles.resolve(cell.style, is_date);
            write_cell(&mut xml, &cell_reference(row, column), style, &cell.value, strings)?;
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    Ok(xml)
}

fn write_cell(
    xml: &mut String,
    reference: &str,
    style: usize,
    value: &CellValue,
    strings: &mut SharedStrings,
) -> Result<()> {
    write!(xml, r#"<c r="{}""#, reference)?;
    if style != 0 {
        write!(xml, r#" s="{}""#, style)?;
    }
    match value {
        CellValue::Blank => xml.push_str("/>"),
        CellValue::String(s) => write!(xml, r#" t="s"><v>{}</v></c>"#, strings.add(s))?,
        CellValue::Number(n) if !n.is_finite() => xml.push_str(r#" t="e"><v>#NUM!</v></c>"#),
        CellValue::Number(n) => write!(xml, "><v>{}</v></c>", format_number(*n))?,
        CellValue::Bool(b) => write!(xml, r#" t="b"><v>{}</v></c>"#, u8::from(*b))?,
        CellValue::Date(d) => write!(xml, "><v>{}</v></c>", format_number(to_serial(*d)))?,
        CellValue::Error(e) => write!(xml, r#" t="e"><v>{}</v></c>"#, escape_xml(e))?,
        CellValue::Formula { formula, cached } => {
            let (kind, text) = match cached.as_deref() {
                Some(CellValue::String(s)) => (Some("str"), Some(escape_xml(s))),
                Some(CellValue::Bool(b)) => (Some("b"), Some(u8::from(*b).to_string())),
                Some(CellValue::Error(e)) => (Some("e"), Some(escape_xml(e))),
                Some(CellValue::Number(n)) if n.is_finite() => (None, Some(format_number(*n))),
                Some(CellValue::Date(d)) => (None, Some(format_number(to_serial(*d)))),
                _ => (None, None),
            };
            if let Some(kind) = kind {
                write!(xml, r#" t="{}""#, kind)?;
            }
            write!(xml, "><f>{}</f>", escape_xml(formula))?;
            if let Some(text) = text {
                write!(xml, "<v>{}</v>", text)?;
            }
            xml.push_str("</c>");
        },
    }
    Ok(())
}
