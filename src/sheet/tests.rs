use super::*;
use crate::common::{Error, InputSource, SharedBuffer};
use crate::reader::{TableReader, read_all};
use crate::types::{Row, Value, text_row};
use crate::writer::TableWriter;
use chrono::{NaiveDate, NaiveDateTime};

fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn write_rows(rows: &[Row], formatter: Option<DefaultCellFormatter>) -> Vec<u8> {
    let buffer = SharedBuffer::new();
    let mut writer = SpreadsheetWriter::new(buffer.sink());
    if let Some(formatter) = formatter {
        writer.set_formatter(formatter);
    }
    for row in rows {
        writer.print_row(row).unwrap();
    }
    writer.close().unwrap();
    buffer.contents()
}

fn reader_for(bytes: Vec<u8>, config: SpreadsheetConfig) -> SpreadsheetReader {
    SpreadsheetReader::from_source_with_config(InputSource::from_bytes(bytes), config)
}

fn sample_rows() -> Vec<Row> {
    vec![
        text_row(["Name", "Age", "Score", "Active", "Joined", "Note"]),
        vec![
            Some(Value::from("Alice")),
            Some(Value::Int(30)),
            Some(Value::Double(1.25)),
            Some(Value::Bool(true)),
            Some(Value::Date(datetime(2024, 2, 29, 9, 30))),
            None,
        ],
        vec![
            Some(Value::from("Bob")),
            Some(Value::Long(29)),
            Some(Value::Float(0.5)),
            Some(Value::Bool(false)),
            None,
            Some(Value::Char('x')),
        ],
    ]
}

#[test]
fn test_round_trip_values() {
    let bytes = write_rows(&sample_rows(), None);
    let mut reader = reader_for(bytes, SpreadsheetConfig::default());

    let header = reader.header_row().unwrap().unwrap();
    assert_eq!(header[0], Some(Value::from("Name")));
    assert_eq!(reader.column_index("joined").unwrap(), Some(4));

    let rows = read_all(&mut reader).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0],
        vec![
            Some(Value::from("Alice")),
            Some(Value::Double(30.0)),
            Some(Value::Double(1.25)),
            Some(Value::Bool(true)),
            Some(Value::Date(datetime(2024, 2, 29, 9, 30))),
        ]
    );
    assert_eq!(
        rows[1],
        vec![
            Some(Value::from("Bob")),
            Some(Value::Double(29.0)),
            Some(Value::Double(0.5)),
            Some(Value::Bool(false)),
            None,
            Some(Value::from("x")),
        ]
    );
    assert_eq!(reader.row_count(), 2);
    assert_eq!(reader.line_count(), 3);
}

#[test]
fn test_column_types_convert_cell_values() {
    let bytes = write_rows(&sample_rows(), None);
    let mut reader = reader_for(bytes, SpreadsheetConfig::default());
    reader.set_column_type(1, "int");
    reader.set_column_type(3, "string");
    let row = reader.next_row().unwrap();
    assert_eq!(row[1], Some(Value::Int(30)));
    assert_eq!(row[3], Some(Value::from("true")));
}

#[test]
fn test_failed_conversion_is_an_error() {
    let bytes = write_rows(&sample_rows(), None);
    let mut reader = reader_for(bytes, SpreadsheetConfig::default());
    reader.set_column_type(0, "int");
    assert!(matches!(reader.next_row(), Err(Error::Conversion { .. })));
}

fn sparse_workbook() -> Workbook {
    let mut workbook = Workbook::new();
    let index = workbook.add_sheet("Data").unwrap();
    let bold = workbook.style(
        StyleDescription::new().with_font(FontDescription::default().with_bold(true)),
    );
    let sheet = workbook.sheet_mut(index).unwrap();
    sheet.set_value(1, 0, "a");
    sheet.set_cell(2, 0, Cell::new(CellValue::Blank).with_style(bold));
    sheet.set_value(4, 1, "b");
    workbook
}

#[test]
fn test_blank_rows_are_skipped() {
    let config = SpreadsheetConfig::default().with_header_row(false);
    let mut reader = SpreadsheetReader::from_workbook(sparse_workbook(), config);
    let rows = read_all(&mut reader).unwrap();
    assert_eq!(rows, vec![text_row(["a"]), vec![None, Some(Value::from("b"))]]);
}

#[test]
fn test_blank_rows_are_kept_on_request() {
    let config = SpreadsheetConfig::default()
        .with_header_row(false)
        .with_skip_blank_rows(false)
        .with_minimum_column_count(2);
    let mut reader = SpreadsheetReader::from_workbook(sparse_workbook(), config);
    let rows = read_all(&mut reader).unwrap();
    // From the first to the last row with cells
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], vec![Some(Value::from("a")), None]);
    assert_eq!(rows[1], vec![None, None]);
    assert_eq!(rows[2], vec![None, None]);
    assert_eq!(rows[3], vec![None, Some(Value::from("b"))]);
}

#[test]
fn test_sheet_selection() {
    let mut workbook = sparse_workbook();
    let other = workbook.add_sheet("Other").unwrap();
    workbook.sheet_mut(other).unwrap().set_value(0, 0, "other");

    let config = SpreadsheetConfig::default()
        .with_header_row(false)
        .with_sheet_name("OTHER");
    let mut reader = SpreadsheetReader::from_workbook(workbook, config);
    assert_eq!(reader.next_row().unwrap(), text_row(["other"]));
    assert!(!reader.has_next().unwrap());

    reader.select_sheet_index(0).unwrap();
    assert_eq!(reader.next_row().unwrap(), text_row(["a"]));
    assert_eq!(reader.compute_max_column_count().unwrap(), 2);
    assert_eq!(reader.values(4).unwrap(), Some(vec![None, Some(Value::from("b"))]));
    assert_eq!(reader.values(3).unwrap(), None);

    assert!(matches!(reader.select_sheet_name("missing"), Err(Error::InvalidFormat(_))));
    assert!(matches!(reader.select_sheet_index(5), Err(Error::InvalidFormat(_))));
}

#[test]
fn test_reset_and_close() {
    let bytes = write_rows(&sample_rows(), None);
    let mut reader = reader_for(bytes, SpreadsheetConfig::default());
    assert_eq!(read_all(&mut reader).unwrap().len(), 2);
    reader.reset().unwrap();
    assert_eq!(reader.row_count(), 0);
    assert_eq!(read_all(&mut reader).unwrap().len(), 2);
    assert!(reader.header_row().unwrap().is_some());

    reader.close().unwrap();
    reader.close().unwrap();
    assert!(matches!(reader.has_next(), Err(Error::IllegalState(_))));
    assert!(matches!(reader.reset(), Err(Error::IllegalState(_))));
}

#[test]
fn test_unbound_and_invalid_input() {
    let mut reader = SpreadsheetReader::new();
    assert!(matches!(reader.has_next(), Err(Error::IllegalState(_))));
    reader.set_input(InputSource::from_text("not a workbook")).unwrap();
    assert!(matches!(reader.set_input(InputSource::from_text("")), Err(Error::AlreadyBound(_))));
    assert!(matches!(reader.has_next(), Err(Error::ZipError(_))));
}

#[test]
fn test_nothing_is_written_before_close() {
    let buffer = SharedBuffer::new();
    let mut writer = SpreadsheetWriter::new(buffer.sink());
    writer.print_row(&text_row(["a", "b"])).unwrap();
    writer.print_comment("dropped").unwrap();
    assert!(buffer.is_empty());
    assert_eq!(writer.row_count(), 1);

    writer.close().unwrap();
    assert!(buffer.contents().starts_with(b"PK"));
    let written = buffer.len();
    writer.close().unwrap();
    assert_eq!(buffer.len(), written);
    assert!(matches!(writer.print_row(&text_row(["c"])), Err(Error::IllegalState(_))));
}

#[test]
fn test_default_formatter_styles() {
    let bytes = write_rows(&sample_rows(), Some(DefaultCellFormatter::new().with_emphasized_first_row(true)));
    let workbook = Workbook::from_bytes(&bytes).unwrap();
    let sheet = workbook.sheet(0).unwrap();
    let style = |row: usize, column: usize| {
        workbook
            .styles()
            .get(sheet.cell(row, column).unwrap().style)
            .cloned()
            .unwrap()
    };

    let header = style(0, 0);
    assert!(header.font.as_ref().is_some_and(|f| f.bold && f.name == "Arial" && f.size == 10));
    assert!(header.wrap_text);
    assert_eq!(style(0, 1), header);

    let name = style(1, 0);
    assert!(name.font.as_ref().is_some_and(|f| !f.bold));
    assert_eq!(style(2, 0), name);
    assert_eq!(style(1, 1).number_format.as_deref(), Some("0"));
    assert_eq!(style(1, 2).number_format.as_deref(), Some("0.00"));
    assert_eq!(style(1, 4).number_format.as_deref(), Some("dd.mm.yyyy hh:mm"));
    assert_eq!(sheet.cell(1, 4).unwrap().value, CellValue::Date(datetime(2024, 2, 29, 9, 30)));

    // The null cell keeps its style
    assert_eq!(sheet.cell(1, 5).unwrap().value, CellValue::Blank);
    // Auto-sized to the longest value of the column
    assert_eq!(sheet.column_width(0), Some(7.0));
}

#[test]
fn test_styles_are_shared() {
    let buffer = SharedBuffer::new();
    let mut writer = SpreadsheetWriter::new(buffer.sink());
    writer.set_formatter(DefaultCellFormatter::new());
    for i in 0..10 {
        writer.print_row(&[Some(Value::from("row")), Some(Value::Int(i))]).unwrap();
    }
    // Default, string and integer
    assert_eq!(writer.workbook().styles().len(), 3);
    writer.close().unwrap();
}

#[test]
fn test_random_access_and_sheets() {
    let mut existing = Workbook::new();
    existing.add_sheet("Keep").unwrap();
    existing.sheet_mut(0).unwrap().set_value(0, 0, "kept");

    let buffer = SharedBuffer::new();
    let mut writer = SpreadsheetWriter::with_workbook(
        buffer.sink(),
        existing,
        SpreadsheetConfig::default().with_sheet_name("Report"),
    );
    writer.print_row(&text_row(["h1", "h2"])).unwrap();
    writer.print_row_at(5, &text_row(["far"])).unwrap();
    writer.set_value(0, 1, None).unwrap();
    writer.set_value(2, 3, Some(&Value::Bytes(vec![1, 2]))).unwrap();
    assert_eq!(writer.column_count(), 4);

    assert_eq!(writer.select_sheet_index(3).unwrap(), 3);
    writer.print_row(&text_row(["fourth"])).unwrap();
    writer.close().unwrap();

    let workbook = Workbook::from_bytes(&buffer.contents()).unwrap();
    let names: Vec<&str> = workbook.sheets().iter().map(Worksheet::name).collect();
    assert_eq!(names, vec!["Keep", "Report", "Sheet3", "Sheet4"]);
    let report = workbook.sheet(1).unwrap();
    assert_eq!(report.cell(0, 0).unwrap().value, CellValue::String("h1".to_string()));
    assert!(report.cell(0, 1).is_none());
    assert_eq!(report.cell(5, 0).unwrap().value, CellValue::String("far".to_string()));
    assert_eq!(report.cell(2, 3).unwrap().value, CellValue::String("AQI=".to_string()));
    assert_eq!(workbook.sheet(0).unwrap().cell(0, 0).unwrap().value, CellValue::String("kept".to_string()));
    assert_eq!(workbook.sheet(3).unwrap().cell(0, 0).unwrap().value, CellValue::String("fourth".to_string()));
}

#[test]
fn test_empty_writer_still_writes_a_workbook() {
    let bytes = write_rows(&[], None);
    let mut reader = reader_for(bytes, SpreadsheetConfig::default());
    assert_eq!(reader.workbook().unwrap().sheet_count(), 1);
    assert!(reader.header_row().unwrap().is_none());
    assert!(!reader.has_next().unwrap());
}
