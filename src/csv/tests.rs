use super::*;
use crate::common::{Error, InputSource, SharedBuffer};
use crate::reader::{Comment, TableReader, read_all};
use crate::types::{Row, Value, row_to_strings, text_row};
use crate::writer::TableWriter;
use chrono::NaiveDate;
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

fn strings(row: &Row) -> Vec<Option<String>> {
    row_to_strings(row)
}

fn some(values: &[&str]) -> Vec<Option<String>> {
    values.iter().map(|v| Some(v.to_string())).collect()
}

fn collect_comments(reader: &mut dyn TableReader) -> Rc<RefCell<Vec<Comment>>> {
    let comments = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&comments);
    reader.register_comment_callback(Box::new(move |c| sink.borrow_mut().push(c.clone())));
    comments
}

#[test]
fn test_header_and_rows() {
    let mut reader = CsvReader::from_text("Name;Age\nAlice;30\nBob;29\n");
    assert_eq!(strings(&reader.header_row().unwrap().unwrap()), some(&["Name", "Age"]));
    assert!(reader.has_next().unwrap());
    assert_eq!(strings(&reader.next_row().unwrap()), some(&["Alice", "30"]));
    assert_eq!(strings(&reader.next_row().unwrap()), some(&["Bob", "29"]));
    assert!(!reader.has_next().unwrap());
    assert_eq!(reader.row_count(), 2);
    assert_eq!(reader.line_count(), 3);
    assert!(matches!(reader.next_row(), Err(Error::NoMoreRows)));
}

#[test]
fn test_next_row_skips_header_without_header_call() {
    let mut reader = CsvReader::from_text("Name;Age\nAlice;30\n");
    assert_eq!(strings(&reader.next_row().unwrap()), some(&["Alice", "30"]));
    assert_eq!(strings(&reader.header_row().unwrap().unwrap()), some(&["Name", "Age"]));
}

#[test]
fn test_doubled_delimiter_scenario() {
    let mut reader = CsvReader::from_text("Name;Note\n\"Hello \"\"World\"\"\";42\n");
    let rows = read_all(&mut reader).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(strings(&rows[0]), some(&["Hello \"World\"", "42"]));
}

#[test]
fn test_comment_scenario() {
    let config = CsvConfig::default().with_header_row(false);
    let mut reader = CsvReader::from_source_with_config(InputSource::from_text("# ignore me\nA;B\n"), config);
    let comments = collect_comments(&mut reader);
    let rows = read_all(&mut reader).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(strings(&rows[0]), some(&["A", "B"]));

    let comments = comments.borrow();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "ignore me");
    assert_eq!(comments[0].row, 1);
    assert_eq!(comments[0].column, None);
}

#[test]
fn test_comments_never_become_rows() {
    let text = "H1;H2\n! first\na;b\n;c\n# last\n";
    let mut reader = CsvReader::from_text(text);
    let comments = collect_comments(&mut reader);
    let rows = read_all(&mut reader).unwrap();
    // a leading separator is an empty first column even though ';' is a comment char
    assert_eq!(rows.len(), 2);
    assert_eq!(strings(&rows[0]), some(&["a", "b"]));
    assert_eq!(strings(&rows[1]), some(&["", "c"]));
    let comments = comments.borrow();
    let texts: Vec<&str> = comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "last"]);
    assert_eq!(comments[0].row, 2);
    assert_eq!(comments[1].row, 5);
}

#[test]
fn test_empty_lines() {
    let text = "a;b\n\nc;d\n";
    let config = CsvConfig::default().with_header_row(false);
    let mut reader = CsvReader::from_source_with_config(InputSource::from_text(text), config.clone());
    assert_eq!(read_all(&mut reader).unwrap().len(), 2);

    let config = config.with_ignore_empty_lines(false).with_minimum_column_count(2);
    let mut reader = CsvReader::from_source_with_config(InputSource::from_text(text), config);
    let rows = read_all(&mut reader).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1], vec![None, None]);
}

#[test]
fn test_minimum_column_count_pads() {
    let config = CsvConfig::default()
        .with_header_row(false)
        .with_minimum_column_count(4);
    let mut reader = CsvReader::from_source_with_config(InputSource::from_text("a\nb;c;d;e;f\n"), config);
    let rows = read_all(&mut reader).unwrap();
    assert_eq!(rows[0].len(), 4);
    assert_eq!(rows[0][1..], [None, None, None]);
    assert_eq!(rows[1].len(), 5);
}

#[test]
fn test_multiline_delimited_value() {
    let config = CsvConfig::default().with_header_row(false);
    let text = "\"line one\nline two\";x\nnext;row\n";
    let mut reader = CsvReader::from_source_with_config(InputSource::from_text(text), config);
    let rows = read_all(&mut reader).unwrap();
    assert_eq!(strings(&rows[0]), some(&["line one\nline two", "x"]));
    assert_eq!(strings(&rows[1]), some(&["next", "row"]));
    assert_eq!(reader.line_count(), 3);
}

#[test]
fn test_crlf_inside_delimited_value_is_kept() {
    let config = CsvConfig::default().with_header_row(false);
    let text = "\"a\r\nb\";x\r\nc;d\r\n";
    let mut reader = CsvReader::from_source_with_config(InputSource::from_text(text), config);
    let rows = read_all(&mut reader).unwrap();
    assert_eq!(strings(&rows[0]), some(&["a\r\nb", "x"]));
    assert_eq!(strings(&rows[1]), some(&["c", "d"]));
}

#[test]
fn test_crlf_value_round_trip() {
    let text = write_rows(CsvConfig::default(), &[text_row(["H"]), text_row(["a\r\nb"])]);
    let mut reader = CsvReader::from_text(&text);
    assert_eq!(reader.next_row().unwrap()[0], Some(Value::from("a\r\nb")));
}

#[test]
fn test_unterminated_value_at_end_of_input() {
    let config = CsvConfig::default().with_header_row(false);
    let mut reader = CsvReader::from_source_with_config(InputSource::from_text("a;\"open"), config);
    let rows = read_all(&mut reader).unwrap();
    assert_eq!(strings(&rows[0]), some(&["a", "open"]));
}

#[test]
fn test_column_types() {
    let mut reader = CsvReader::from_text("name;age;born\nAlice;30;24.12.1990\n");
    reader.set_column_type(1, "i32");
    reader.set_column_type(2, "date");
    let row = reader.next_row().unwrap();
    assert_eq!(row[1], Some(Value::Int(30)));
    let born = NaiveDate::from_ymd_opt(1990, 12, 24).unwrap();
    assert_eq!(row[2], Some(Value::from(born)));
}

#[test]
fn test_column_lookup() {
    let mut reader = CsvReader::from_text("Name;Age\nAlice;30\n");
    assert_eq!(reader.column_index("AGE").unwrap(), Some(1));
    assert_eq!(reader.column_index("height").unwrap(), None);
    let row = reader.next_row().unwrap();
    assert_eq!(reader.get("name", &row).unwrap(), Some(&Value::from("Alice")));
    assert_eq!(reader.get("height", &row).unwrap(), None);

    let config = CsvConfig::default().with_header_row(false);
    let mut headless = CsvReader::from_source_with_config(InputSource::from_text("a\n"), config);
    assert!(matches!(headless.column_index("a"), Err(Error::NoHeaderRow)));
    assert_eq!(headless.header_row().unwrap(), None);
}

#[test]
fn test_reset_rewinds() {
    let mut reader = CsvReader::from_text("h\n1\n2\n");
    assert_eq!(read_all(&mut reader).unwrap().len(), 2);
    reader.reset().unwrap();
    assert_eq!(reader.row_count(), 0);
    assert_eq!(strings(&reader.header_row().unwrap().unwrap()), some(&["h"]));
    assert_eq!(read_all(&mut reader).unwrap().len(), 2);
}

#[test]
fn test_reset_on_stream_fails() {
    let mut reader = CsvReader::from_source(InputSource::from_reader(&b"h\n1\n"[..]));
    assert_eq!(read_all(&mut reader).unwrap().len(), 1);
    match reader.reset() {
        Err(Error::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::Unsupported),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_set_input_twice_fails() {
    let mut reader = CsvReader::new();
    reader.set_input(InputSource::from_text("a\n")).unwrap();
    assert!(matches!(
        reader.set_input(InputSource::from_text("b\n")),
        Err(Error::AlreadyBound(_))
    ));
}

#[test]
fn test_close_is_idempotent() {
    let mut reader = CsvReader::from_text("a\nb\n");
    reader.close().unwrap();
    reader.close().unwrap();
    assert!(matches!(reader.has_next(), Err(Error::IllegalState(_))));
}

#[test]
fn test_unbound_reader_fails() {
    let mut reader = CsvReader::new();
    assert!(matches!(reader.has_next(), Err(Error::IllegalState(_))));
}

fn write_rows(config: CsvConfig, rows: &[Row]) -> String {
    let buffer = SharedBuffer::new();
    let mut writer = CsvWriter::with_config(buffer.sink(), config);
    for row in rows {
        writer.print_row(row).unwrap();
    }
    writer.close().unwrap();
    buffer.to_string_lossy()
}

#[test]
fn test_writer_round_trip_numbers_as_strings() {
    let rows = vec![
        vec![Some(Value::Int(1)), Some(Value::Int(2))],
        vec![Some(Value::Int(3)), Some(Value::Int(4))],
    ];
    let text = write_rows(CsvConfig::default(), &rows);
    assert_eq!(text, "1;2\n3;4\n");

    let config = CsvConfig::default().with_header_row(false);
    let mut reader = CsvReader::from_source_with_config(InputSource::from_text(&text), config);
    let read = read_all(&mut reader).unwrap();
    assert_eq!(
        read.iter().map(strings).collect::<Vec<_>>(),
        vec![some(&["1", "2"]), some(&["3", "4"])]
    );
}

#[test]
fn test_writer_delimiting_rules() {
    let rows = vec![
        text_row(["plain", " padded", "#hash", "semi;colon", "quote\"d", "multi\nline"]),
        vec![None, Some(Value::from("")), Some(Value::from("x"))],
    ];
    let text = write_rows(CsvConfig::default(), &rows);
    assert_eq!(
        text,
        "plain;\" padded\";\"#hash\";\"semi;colon\";\"quote\"\"d\";\"multi\nline\"\n;;x\n"
    );
}

#[test]
fn test_writer_id_quirk() {
    let rows = vec![text_row(["ID", "Name"]), text_row(["ID7", "x"])];
    assert_eq!(
        write_rows(CsvConfig::default(), &rows),
        "\"ID\";Name\nID7;x\n"
    );
    assert_eq!(
        write_rows(CsvConfig::default().with_excel_id_quirk(false), &rows),
        "ID;Name\nID7;x\n"
    );
}

#[test]
fn test_writer_delimiter_required() {
    let rows = vec![vec![Some(Value::from("a")), None, Some(Value::Int(1))]];
    assert_eq!(
        write_rows(CsvConfig::default().with_delimiter_required(true), &rows),
        "\"a\";;\"1\"\n"
    );
}

#[test]
fn test_writer_comments_and_bom() {
    let buffer = SharedBuffer::new();
    let config = CsvConfig::default().with_write_bom(Some(crate::common::BomKind::Utf8));
    let mut writer = CsvWriter::with_config(buffer.sink(), config);
    writer.print_comment("generated\nby test").unwrap();
    writer.print_row(&text_row(["a"])).unwrap();
    writer.close().unwrap();
    let bytes = buffer.contents();
    assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
    assert_eq!(&bytes[3..], b"# generated\n# by test\na\n");
    assert!(matches!(writer.print_row(&text_row(["b"])), Err(Error::IllegalState(_))));
}

#[test]
fn test_writer_dates_use_registry_format() {
    let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    let rows = vec![vec![Some(Value::from(date))]];
    let text = write_rows(CsvConfig::default(), &rows);
    assert_eq!(text, "29/02/2024\n");

    let config = CsvConfig::default().with_header_row(false);
    let mut reader = CsvReader::from_source_with_config(InputSource::from_text(&text), config);
    reader.set_column_type(0, "date");
    assert_eq!(reader.next_row().unwrap(), vec![Some(Value::from(date))]);
}

#[test]
fn test_windows_1252_round_trip() {
    let config = CsvConfig::default()
        .with_header_row(false)
        .with_encoding("windows-1252");
    let buffer = SharedBuffer::new();
    let mut writer = CsvWriter::with_config(buffer.sink(), config.clone());
    writer.print_row(&text_row(["caf\u{e9}"])).unwrap();
    writer.close().unwrap();
    assert_eq!(buffer.contents(), vec![b'c', b'a', b'f', 0xE9, b'\n']);

    let mut reader = CsvReader::from_source_with_config(InputSource::from_bytes(buffer.contents()), config);
    assert_eq!(strings(&reader.next_row().unwrap()), some(&["caf\u{e9}"]));
}

proptest! {
    #[test]
    fn prop_round_trip_preserves_text(
        rows in prop::collection::vec(
            prop::collection::vec("[a-zA-Z0-9 ;\"#!\r\n]{1,12}", 1..5),
            1..6,
        )
    ) {
        let typed: Vec<Row> = rows.iter().map(|r| text_row(r.iter().cloned())).collect();
        let text = write_rows(CsvConfig::default(), &typed);

        let config = CsvConfig::default().with_header_row(false);
        let mut reader = CsvReader::from_source_with_config(InputSource::from_text(&text), config);
        let read = read_all(&mut reader).unwrap();
        let expected: Vec<Vec<Option<String>>> = rows
            .iter()
            .map(|r| r.iter().map(|c| Some(c.clone())).collect())
            .collect();
        prop_assert_eq!(read.iter().map(strings).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn prop_delimiter_doubling(value in "[a-z\"]{0,10}\"[a-z\"]{0,10}") {
        let text = write_rows(CsvConfig::default(), &[text_row([value.clone(), "x".to_string()])]);
        let config = CsvConfig::default().with_header_row(false);
        let mut reader = CsvReader::from_source_with_config(InputSource::from_text(&text), config);
        let row = reader.next_row().unwrap();
        prop_assert_eq!(row[0].clone(), Some(Value::String(value)));
    }
}
