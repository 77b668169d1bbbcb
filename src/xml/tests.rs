use super::*;
use crate::common::{Error, InputSource, SharedBuffer};
use crate::reader::{Comment, TableReader, read_all};
use crate::types::{Row, Value, row_to_strings, text_row};
use crate::writer::TableWriter;
use chrono::NaiveDate;
use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

fn names(row: &Row) -> Vec<Option<String>> {
    row_to_strings(row)
}

fn some(values: &[&str]) -> Vec<Option<String>> {
    values.iter().map(|v| Some(v.to_string())).collect()
}

fn write(config: XmlConfig, column_names: Option<&[&str]>, rows: &[Row]) -> String {
    let buffer = SharedBuffer::new();
    let mut writer = XmlWriter::with_config(buffer.sink(), config);
    if let Some(column_names) = column_names {
        writer.set_column_names(column_names.iter().copied());
    }
    for row in rows {
        writer.print_row(row).unwrap();
    }
    writer.close().unwrap();
    buffer.to_string_lossy()
}

#[test]
fn test_writer_layout() {
    let text = write(
        XmlConfig::default(),
        None,
        &[vec![Some(Value::Int(1)), None, Some(Value::from("a<b"))]],
    );
    assert_eq!(
        text,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <table>\n\
         \t<record>\n\
         \t\t<column name=\"column0\" type=\"i32\">1</column>\n\
         \t\t<column name=\"column1\"/>\n\
         \t\t<column name=\"column2\" type=\"string\">a&lt;b</column>\n\
         \t</record>\n\
         </table>\n"
    );
}

#[test]
fn test_empty_table_still_has_root() {
    let text = write(XmlConfig::default(), None, &[]);
    assert_eq!(
        text,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<table>\n</table>\n"
    );
}

#[test]
fn test_typed_round_trip() {
    let born = NaiveDate::from_ymd_opt(1990, 12, 24).unwrap();
    let rows = vec![
        vec![
            Some(Value::Int(1)),
            Some(Value::from("Alice & Bob")),
            Some(Value::from(born)),
            Some(Value::Bool(true)),
            None,
        ],
        vec![
            Some(Value::Long(2)),
            Some(Value::from("")),
            None,
            Some(Value::Bool(false)),
            Some(Value::Double(1.5)),
        ],
    ];
    let text = write(
        XmlConfig::default(),
        Some(&["id", "name", "born", "active", "score"]),
        &rows,
    );

    let mut reader = XmlReader::from_text(&text);
    assert_eq!(
        names(&reader.header_row().unwrap().unwrap()),
        some(&["id", "name", "born", "active", "score"])
    );
    let read = read_all(&mut reader).unwrap();
    assert_eq!(read, rows);
    reader.close().unwrap();
}

#[test]
fn test_write_header_row_names_columns() {
    let config = XmlConfig::default().with_write_header_row(true);
    let buffer = SharedBuffer::new();
    let mut writer = XmlWriter::with_config(buffer.sink(), config);
    writer.print_row(&text_row(["id", "name"])).unwrap();
    writer.print_row(&vec![Some(Value::Int(7)), Some(Value::from("x"))]).unwrap();
    assert_eq!(writer.row_count(), 1);
    writer.close().unwrap();

    let text = buffer.to_string_lossy();
    assert!(text.contains("<column name=\"id\" type=\"i32\">7</column>"));
    assert!(!text.contains(">id<"));

    let mut reader = XmlReader::from_text(&text);
    assert_eq!(reader.column_index("NAME").unwrap(), Some(1));
    assert_eq!(read_all(&mut reader).unwrap().len(), 1);
}

#[test]
fn test_column_name_tags_round_trip() {
    let config = XmlConfig::default()
        .with_column_name_tags(true)
        .with_row_tag("row")
        .with_root_tag("rows");
    let text = write(
        config.clone(),
        Some(&["first name", "age"]),
        &[vec![Some(Value::from("Ann")), Some(Value::Short(41))]],
    );
    assert!(text.contains("<first_name type=\"string\">Ann</first_name>"));

    let mut reader = XmlReader::from_source_with_config(InputSource::from_text(&text), config);
    let rows = read_all(&mut reader).unwrap();
    assert_eq!(rows, vec![vec![Some(Value::from("Ann")), Some(Value::Short(41))]]);
    assert_eq!(
        names(&reader.header_row().unwrap().unwrap()),
        some(&["first_name", "age"])
    );
}

#[test]
fn test_column_union_in_first_seen_order() {
    let xml = "<table>\
        <record><column name=\"a\">1</column><column name=\"b\">2</column></record>\
        <record><column name=\"c\">4</column><column name=\"b\">3</column></record>\
        </table>";
    let mut reader = XmlReader::from_text(xml);
    assert_eq!(names(&reader.header_row().unwrap().unwrap()), some(&["a", "b"]));
    let rows = read_all(&mut reader).unwrap();
    assert_eq!(names(&rows[0]), some(&["1", "2"]));
    assert_eq!(
        names(&rows[1]),
        vec![None, Some("3".to_string()), Some("4".to_string())]
    );
    assert_eq!(reader.column_names(), ["a", "b", "c"]);
}

#[test]
fn test_untyped_empty_column_is_null() {
    let xml = "<table><record>\
        <column name=\"a\"></column>\
        <column name=\"b\" type=\"string\"></column>\
        <column name=\"c\">  </column>\
        </record></table>";
    let mut reader = XmlReader::from_text(xml);
    let row = reader.next_row().unwrap();
    assert_eq!(
        row,
        vec![None, Some(Value::from("")), Some(Value::from("  "))]
    );
}

#[test]
fn test_column_types_apply_without_type_attribute() {
    let xml = "<table><record><column name=\"n\">5</column></record></table>";
    let mut reader = XmlReader::from_text(xml);
    reader.set_column_type(0, "i32");
    assert_eq!(reader.next_row().unwrap(), vec![Some(Value::Int(5))]);
}

#[test]
fn test_comments_precede_their_row() {
    let xml = "<table><!--before--><record><column name=\"x\">1</column></record>\
        <!--middle--><record><column name=\"x\">2</column></record><!--after--></table>";
    let mut reader = XmlReader::from_text(xml);
    let comments: Rc<RefCell<Vec<Comment>>> = Rc::default();
    let sink = Rc::clone(&comments);
    reader.register_comment_callback(Box::new(move |c| sink.borrow_mut().push(c.clone())));

    reader.next_row().unwrap();
    assert_eq!(comments.borrow().len(), 1);
    assert_eq!(comments.borrow()[0].text, "before");
    assert_eq!(comments.borrow()[0].row, 0);

    reader.next_row().unwrap();
    assert_eq!(comments.borrow().len(), 2);
    assert_eq!(comments.borrow()[1].text, "middle");
    assert_eq!(comments.borrow()[1].row, 1);

    assert!(!reader.has_next().unwrap());
    reader.close().unwrap();
    let comments = comments.borrow();
    assert_eq!(comments.len(), 3);
    assert_eq!(comments[2].text, "after");
    assert!(comments[2].is_end_of_stream());
}

#[test]
fn test_comments_written_as_markup() {
    let buffer = SharedBuffer::new();
    let mut writer = XmlWriter::new(buffer.sink());
    writer.print_comment("made -- here").unwrap();
    writer.close().unwrap();
    let text = buffer.to_string_lossy();
    assert!(text.contains("\t<!--made - - here-->\n"));

    let mut reader = XmlReader::from_text(&text);
    let comments: Rc<RefCell<Vec<String>>> = Rc::default();
    let sink = Rc::clone(&comments);
    reader.register_comment_callback(Box::new(move |c| sink.borrow_mut().push(c.text.clone())));
    assert!(!reader.has_next().unwrap());
    reader.close().unwrap();
    assert_eq!(*comments.borrow(), vec!["made - - here".to_string()]);
}

#[test]
fn test_dash_runs_in_comments_stay_well_formed() {
    let buffer = SharedBuffer::new();
    let mut writer = XmlWriter::new(buffer.sink());
    writer.print_comment("a---b").unwrap();
    writer.close().unwrap();
    let text = buffer.to_string_lossy();
    assert!(text.contains("<!--a- - -b-->"));

    let mut reader = XmlReader::from_text(&text);
    let comments: Rc<RefCell<Vec<String>>> = Rc::default();
    let sink = Rc::clone(&comments);
    reader.register_comment_callback(Box::new(move |c| sink.borrow_mut().push(c.text.clone())));
    assert!(!reader.has_next().unwrap());
    reader.close().unwrap();
    assert_eq!(*comments.borrow(), vec!["a- - -b".to_string()]);
}

#[test]
fn test_parse_error_is_sticky() {
    let mut reader = XmlReader::from_text("<table><record><column name=\"x\">1</record></table>");
    assert!(matches!(reader.has_next(), Err(Error::XmlError(_))));
    assert!(matches!(reader.next_row(), Err(Error::XmlError(_))));
    reader.close().unwrap();
}

#[test]
fn test_no_more_rows() {
    let mut reader = XmlReader::from_text("<table></table>");
    assert!(!reader.has_next().unwrap());
    assert_eq!(reader.header_row().unwrap(), None);
    assert!(matches!(reader.next_row(), Err(Error::NoMoreRows)));
}

#[test]
fn test_without_header_row() {
    let config = XmlConfig::default().with_header_row(false);
    let xml = "<table><record><column name=\"x\">1</column></record></table>";
    let mut reader = XmlReader::from_source_with_config(InputSource::from_text(xml), config);
    assert_eq!(reader.header_row().unwrap(), None);
    assert!(matches!(reader.column_index("x"), Err(Error::NoHeaderRow)));
    assert_eq!(read_all(&mut reader).unwrap().len(), 1);
}

fn large_document(rows: usize) -> String {
    let mut xml = String::from("<table>");
    for i in 0..rows {
        write!(xml, "<record><column name=\"i\" type=\"i64\">{}</column></record>", i).unwrap();
    }
    xml.push_str("</table>");
    xml
}

#[test]
fn test_reset_restarts_parsing() {
    let config = XmlConfig::default().with_queue_capacity(2);
    let xml = large_document(50);
    let mut reader = XmlReader::from_source_with_config(InputSource::from_text(&xml), config);
    for _ in 0..5 {
        reader.next_row().unwrap();
    }
    reader.reset().unwrap();
    assert_eq!(reader.row_count(), 0);
    let rows = read_all(&mut reader).unwrap();
    assert_eq!(rows.len(), 50);
    assert_eq!(rows[0], vec![Some(Value::Long(0))]);
    assert_eq!(rows[49], vec![Some(Value::Long(49))]);
}

#[test]
fn test_close_cancels_blocked_parser() {
    let config = XmlConfig::default().with_queue_capacity(1);
    let xml = large_document(1000);
    let mut reader = XmlReader::from_source_with_config(InputSource::from_text(&xml), config);
    assert_eq!(reader.next_row().unwrap(), vec![Some(Value::Long(0))]);
    reader.close().unwrap();
    reader.close().unwrap();
    assert!(matches!(reader.has_next(), Err(Error::IllegalState(_))));
}

#[test]
fn test_drop_without_close() {
    let config = XmlConfig::default().with_queue_capacity(1);
    let xml = large_document(1000);
    let mut reader = XmlReader::from_source_with_config(InputSource::from_text(&xml), config);
    reader.next_row().unwrap();
    drop(reader);
}

#[test]
fn test_reset_on_stream_fails() {
    let xml = large_document(3);
    let mut reader = XmlReader::from_source(InputSource::from_reader(std::io::Cursor::new(xml.into_bytes())));
    assert_eq!(read_all(&mut reader).unwrap().len(), 3);
    match reader.reset() {
        Err(Error::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::Unsupported),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_set_input_twice_fails() {
    let mut reader = XmlReader::new();
    reader.set_input(InputSource::from_text("<table/>")).unwrap();
    assert!(matches!(
        reader.set_input(InputSource::from_text("<table/>")),
        Err(Error::AlreadyBound(_))
    ));
}
