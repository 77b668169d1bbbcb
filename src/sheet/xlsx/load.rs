//! Reading a workbook from a package.

use super::strings::parse_shared_strings;
use super::styles::parse_styles;
use super::{attribute, resolve_target};
use crate::common::{Error, Result, resolve_entity};
use crate::sheet::cell::{Cell, CellValue, from_serial, parse_reference};
use crate::sheet::style::StyleId;
use crate::sheet::workbook::{Workbook, Worksheet};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::io::{Read, Seek};
use tracing::{debug, warn};
use zip::ZipArchive;

const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";

/// Upper bound on the buffer reserved from a part's declared size.
const MAX_PART_RESERVE: u64 = 1 << 20;

/// One `<Relationship>` of a relationships part.
#[derive(Debug, Clone)]
struct Relationship {
    id: String,
    kind: String,
    target: String,
}

impl Relationship {
    /// Transitional and strict packages differ only in the namespace of the type.
    fn is(&self, kind: &str) -> bool {
        self.kind.rsplit('/').next() == Some(kind)
    }
}

struct Package<R> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> Package<R> {
    fn part(&mut self, name: &str) -> Result<Vec<u8>> {
        self.optional_part(name)?
            .ok_or_else(|| Error::InvalidFormat(format!("Package part '{}' is missing", name)))
    }

    fn optional_part(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let Some(index) = self.archive.index_for_name(name) else {
            return Ok(None);
        };
        let mut file = self.archive.by_index(index)?;
        let mut bytes = Vec::with_capacity(part_reserve(file.size()));
        file.read_to_end(&mut bytes)?;
        Ok(Some(bytes))
    }

    fn relationships(&mut self, part: &str) -> Result<Vec<Relationship>> {
        match self.optional_part(&relationships_path(part))? {
            Some(xml) => parse_relationships(&xml),
            None => Ok(Vec::new()),
        }
    }
}

/// Folder of a part name, without the trailing slash.
fn part_dir(part: &str) -> &str {
    part.rfind('/').map_or("", |i| &part[..i])
}

/// Name of the relationships part that belongs to `part`.
fn relationships_path(part: &str) -> String {
    match part.rfind('/') {
        Some(i) => format!("{}/_rels/{}.rels", &part[..i], &part[i + 1..]),
        None => format!("_rels/{}.rels", part),
    }
}

fn parse_relationships(xml: &[u8]) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut relationships = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"Relationship" => {
                let external = attribute(e, b"TargetMode")?.as_deref() == Some("External");
                if !external
                    && let (Some(id), Some(kind), Some(target)) = (
                        attribute(e, b"Id")?,
                        attribute(e, b"Type")?,
                        attribute(e, b"Target")?,
                    )
                {
                    relationships.push(Relationship { id, kind, target });
                }
            },
            Event::Eof => break,
            _ => {},
        }
        buf.clear();
    }
    Ok(relationships)
}

/// Sheet names and relationship ids in workbook order.
fn parse_workbook(xml: &[u8]) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut sheets = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"sheet" => {
                let name = attribute(e, b"name")?
                    .ok_or_else(|| Error::InvalidFormat("Sheet without a name".to_string()))?;
                let id = attribute(e, b"id")?.ok_or_else(|| {
                    Error::InvalidFormat(format!("Sheet '{}' has no relationship id", name))
                })?;
                sheets.push((name, id));
            },
            Event::Eof => break,
            _ => {},
        }
        buf.clear();
    }
    Ok(sheets)
}

/// Read a package into a workbook.
///
/// Worksheets come in workbook order; chart sheets and other sheet kinds
/// are skipped. Shared strings and styles are optional parts.
pub(crate) fn read_package<R: Read + Seek>(reader: R) -> Result<Workbook> {
    let mut package = Package {
        archive: ZipArchive::new(reader)?,
    };

    let workbook_part = package
        .relationships("")?
        .into_iter()
        .find(|rel| rel.is("officeDocument"))
        .map_or_else(
            || DEFAULT_WORKBOOK_PART.to_string(),
            |rel| resolve_target("", &rel.target),
        );
    let base = part_dir(&workbook_part).to_string();
    let relationships = package.relationships(&workbook_part)?;
    let sheet_entries = parse_workbook(&package.part(&workbook_part)?)?;

    let strings = match relationships.iter().find(|rel| rel.is("sharedStrings")) {
        Some(rel) => match package.optional_part(&resolve_target(&base, &rel.target))? {
            Some(xml) => parse_shared_strings(&xml)?,
            None => Vec::new(),
        },
        None => Vec::new(),
    };

    let mut workbook = Workbook::new();
    let cell_formats: Vec<(StyleId, bool)> =
        match relationships.iter().find(|rel| rel.is("styles")) {
            Some(rel) => match package.optional_part(&resolve_target(&base, &rel.target))? {
                Some(xml) => parse_styles(&xml)?
                    .into_iter()
                    .map(|style| (workbook.styles_mut().intern(style.description), style.is_date))
                    .collect(),
                None => Vec::new(),
            },
            None => Vec::new(),
        };

    for (name, id) in sheet_entries {
        let rel = relationships.iter().find(|rel| rel.id == id).ok_or_else(|| {
            Error::InvalidFormat(format!("Sheet '{}' refers to unknown relationship '{}'", name, id))
        })?;
        if !rel.is("worksheet") {
            debug!(sheet = %name, kind = %rel.kind, "Skipping non-worksheet sheet");
            continue;
        }
        let xml = package.part(&resolve_target(&base, &rel.target))?;
        let sheet = SheetParser::new(name, &strings, &cell_formats).parse(&xml)?;
        workbook.push_sheet(sheet);
    }

    debug!(
        sheets = workbook.sheet_count(),
        strings = strings.len(),
        styles = workbook.styles().len(),
        "Workbook package read"
    );
    Ok(workbook)
}

/// Which child of a cell is collecting text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    Value,
    Formula,
    Inline,
}

#[derive(Debug, Default)]
struct PendingCell {
    row: usize,
    column: usize,
    kind: Option<String>,
    format: usize,
    value: Option<String>,
    formula: Option<String>,
    inline: Option<String>,
}

struct SheetParser<'a> {
    strings: &'a [String],
    cell_formats: &'a [(StyleId, bool)],
    sheet: Worksheet,
    row: usize,
    next_row: usize,
    next_column: usize,
    cell: Option<PendingCell>,
    capture: Option<Capture>,
    in_inline: bool,
    phonetic_depth: usize,
}

impl<'a> SheetParser<'a> {
    fn new(name: String, strings: &'a [String], cell_formats: &'a [(StyleId, bool)]) -> Self {
        Self {
            strings,
            cell_formats,
            sheet: Worksheet::new(name),
            row: 0,
            next_row: 0,
            next_column: 0,
            cell: None,
            capture: None,
            in_inline: false,
            phonetic_depth: 0,
        }
    }

    fn parse(mut self, xml: &[u8]) -> Result<Worksheet> {
        let mut reader = Reader::from_reader(xml);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => self.open(e, false)?,
                Event::Empty(ref e) => self.open(e, true)?,
                Event::End(ref e) => self.close(e.local_name().as_ref())?,
                Event::Text(ref t) => {
                    let text = String::from_utf8_lossy(t);
                    self.append(&text);
                },
                Event::CData(ref t) => {
                    let text = String::from_utf8_lossy(t);
                    self.append(&text);
                },
                Event::GeneralRef(ref r) => {
                    if let Some(resolved) = resolve_entity(&String::from_utf8_lossy(r)) {
                        self.append(&resolved);
                    }
                },
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }
        Ok(self.sheet)
    }

    fn open(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<()> {
        match e.local_name().as_ref() {
            b"row" => {
                self.row = match attribute(e, b"r")?.and_then(|r| r.trim().parse::<usize>().ok()) {
                    Some(r) if r > 0 => r - 1,
                    _ => self.next_row,
                };
                self.next_row = self.row + 1;
                self.next_column = 0;
            },
            b"c" => {
                let (row, column) = attribute(e, b"r")?
                    .and_then(|r| parse_reference(&r))
                    .unwrap_or((self.row, self.next_column));
                self.next_column = column + 1;
                let cell = PendingCell {
                    row,
                    column,
                    kind: attribute(e, b"t")?,
                    format: attribute(e, b"s")?
                        .and_then(|s| s.trim().parse().ok())
                        .unwrap_or(0),
                    ..PendingCell::default()
                };
                if empty {
                    self.finish_cell(cell)?;
                } else {
                    self.cell = Some(cell);
                }
            },
            b"col" => self.column_width(e)?,
            name if !empty && self.cell.is_some() => match name {
                b"v" => self.capture = Some(Capture::Value),
                b"f" => self.capture = Some(Capture::Formula),
                b"is" => self.in_inline = true,
                b"rPh" => self.phonetic_depth += 1,
                b"t" if self.in_inline && self.phonetic_depth == 0 => {
                    self.capture = Some(Capture::Inline);
                },
                _ => {},
            },
            _ => {},
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) -> Result<()> {
        match name {
            b"v" | b"f" | b"t" => self.capture = None,
            b"is" => self.in_inline = false,
            b"rPh" => self.phonetic_depth = self.phonetic_depth.saturating_sub(1),
            b"c" => {
                if let Some(cell) = self.cell.take() {
                    self.finish_cell(cell)?;
                }
                self.capture = None;
                self.in_inline = false;
            },
            _ => {},
        }
        Ok(())
    }

    fn append(&mut self, text: &str) {
        let (Some(capture), Some(cell)) = (self.capture, self.cell.as_mut()) else {
            return;
        };
        let target = match capture {
            Capture::Value => &mut cell.value,
            Capture::Formula => &mut cell.formula,
            Capture::Inline => &mut cell.inline,
        };
        target.get_or_insert_with(String::new).push_str(text);
    }

    fn column_width(&mut self, e: &BytesStart<'_>) -> Result<()> {
        let custom = attribute(e, b"customWidth")?.is_some_and(|v| v == "1" || v == "true");
        if !custom {
            return Ok(());
        }
        let number = |v: Option<String>| v.and_then(|v| v.trim().parse::<usize>().ok());
        let (Some(min), Some(width)) = (
            number(attribute(e, b"min")?),
            attribute(e, b"width")?.and_then(|w| w.trim().parse::<f64>().ok()),
        ) else {
            return Ok(());
        };
        let max = number(attribute(e, b"max")?).unwrap_or(min);
        for column in min.max(1)..=max {
            self.sheet.set_column_width(column - 1, width);
        }
        Ok(())
    }

    fn finish_cell(&mut self, cell: PendingCell) -> Result<()> {
        let (style, is_date) = self
            .cell_formats
            .get(cell.format)
            .copied()
            .unwrap_or((StyleId::DEFAULT, false));
        let value = self.cell_value(&cell, is_date)?;
        let value = match cell.formula.filter(|f| !f.is_empty()) {
            Some(formula) => CellValue::Formula {
                formula,
                cached: (!value.is_blank()).then(|| Box::new(value)),
            },
            None => value,
        };
        if value.is_blank() && style == StyleId::DEFAULT {
            return Ok(());
        }
        self.sheet.set_cell(cell.row, cell.column, Cell { value, style });
        Ok(())
    }

    fn cell_value(&self, cell: &PendingCell, is_date: bool) -> Result<CellValue> {
        let raw = cell.value.as_deref();
        let value = match cell.kind.as_deref() {
            Some("s") => match raw.map(str::trim).filter(|v| !v.is_empty()) {
                Some(raw) => {
                    let index: usize = raw.parse().map_err(|_| {
                        Error::InvalidFormat(format!("Invalid shared string index '{}'", raw))
                    })?;
                    match self.strings.get(index) {
                        Some(s) => CellValue::String(s.clone()),
                        None => {
                            warn!(index, sheet = %self.sheet.name(), "Shared string index out of range");
                            CellValue::Blank
                        },
                    }
                },
                None => CellValue::Blank,
            },
            Some("b") => raw.map_or(CellValue::Blank, |v| {
                let v = v.trim();
                CellValue::Bool(v == "1" || v.eq_ignore_ascii_case("true"))
            }),
            Some("e") => raw.map_or(CellValue::Blank, |v| CellValue::Error(v.to_string())),
            Some("str") => raw.map_or(CellValue::Blank, |v| CellValue::String(v.to_string())),
            Some("inlineStr") => cell
                .inline
                .as_deref()
                .or(raw)
                .map_or(CellValue::Blank, |v| CellValue::String(v.to_string())),
            Some("d") => match raw.map(str::trim).filter(|v| !v.is_empty()) {
                Some(raw) => CellValue::Date(parse_iso_date(raw)?),
                None => CellValue::Blank,
            },
            _ => match raw.map(str::trim).filter(|v| !v.is_empty()) {
                Some(raw) => {
                    let number: f64 = raw.parse().map_err(|_| {
                        Error::InvalidFormat(format!("Invalid numeric cell value '{}'", raw))
                    })?;
                    match from_serial(number).filter(|_| is_date) {
                        Some(date) => CellValue::Date(date),
                        None => CellValue::Number(number),
                    }
                },
                None => CellValue::Blank,
            },
        };
        Ok(value)
    }
}

/// Date cells (`t="d"`) hold ISO 8601 text.
fn parse_iso_date(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN)))
        .or_else(|_| {
            NaiveTime::parse_from_str(raw, "%H:%M:%S%.f").map(|t| {
                NaiveDate::from_ymd_opt(1899, 12, 30)
                    .unwrap_or_default()
                    .and_time(t)
            })
        })
        .map_err(|_| Error::InvalidFormat(format!("Invalid date cell value '{}'", raw)))
}

/// The declared size comes from the archive and is not trusted beyond a cap.
fn part_reserve(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_PART_RESERVE)).unwrap_or(0)
}
