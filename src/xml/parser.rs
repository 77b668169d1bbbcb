//! Pull parser turning record XML into row and comment events.

use super::config::XmlConfig;
use crate::common::{Error, Result, resolve_entity, unescape_xml};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::io::BufRead;

/// One column element as found in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    pub name: String,
    pub type_name: Option<String>,
    pub text: String,
}

/// What the parser hands to the consuming reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    /// A complete row element, columns in document order.
    Row(Vec<RawColumn>),
    /// A markup comment seen after `before_row` rows were completed.
    Comment { before_row: usize, text: String },
    /// The document could not be parsed. Terminal.
    Failed(String),
    /// End of document. Terminal.
    End,
}

struct OpenColumn {
    column: RawColumn,
    /// Elements nested inside the column element
    depth: usize,
}

/// Parse `source`, handing every event to `emit`.
///
/// `emit` returns `false` when the consumer is gone, which aborts parsing
/// with [`Error::Cancelled`]. A successful parse ends with [`ParseEvent::End`].
pub fn parse_document<R, F>(source: R, config: &XmlConfig, mut emit: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(ParseEvent) -> bool,
{
    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::new();
    let row_tag = config.row_tag.as_bytes();

    let mut columns: Option<Vec<RawColumn>> = None;
    let mut open: Option<OpenColumn> = None;
    let mut rows = 0usize;

    loop {
        let keep_going = match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                if let Some(open) = open.as_mut() {
                    open.depth += 1;
                } else if columns.is_some() {
                    open = Some(OpenColumn {
                        column: start_column(e, config)?,
                        depth: 0,
                    });
                } else if e.local_name().as_ref() == row_tag {
                    columns = Some(Vec::new());
                }
                true
            },
            Event::Empty(ref e) => {
                if open.is_some() {
                    true
                } else if let Some(columns) = columns.as_mut() {
                    columns.push(start_column(e, config)?);
                    true
                } else if e.local_name().as_ref() == row_tag {
                    rows += 1;
                    emit(ParseEvent::Row(Vec::new()))
                } else {
                    true
                }
            },
            Event::End(_) => {
                if let Some(mut current) = open.take() {
                    if current.depth > 0 {
                        current.depth -= 1;
                        open = Some(current);
                    } else if let Some(columns) = columns.as_mut() {
                        columns.push(current.column);
                    }
                    true
                } else if let Some(row) = columns.take() {
                    rows += 1;
                    emit(ParseEvent::Row(row))
                } else {
                    true
                }
            },
            Event::Text(ref t) => {
                if let Some(open) = open.as_mut() {
                    open.column.text.push_str(&String::from_utf8_lossy(t));
                }
                true
            },
            Event::CData(ref t) => {
                if let Some(open) = open.as_mut() {
                    open.column.text.push_str(&String::from_utf8_lossy(t));
                }
                true
            },
            Event::GeneralRef(ref r) => {
                if let Some(open) = open.as_mut() {
                    let name = String::from_utf8_lossy(r);
                    match resolve_entity(&name) {
                        Some(resolved) => open.column.text.push_str(&resolved),
                        None => {
                            open.column.text.push('&');
                            open.column.text.push_str(&name);
                            open.column.text.push(';');
                        },
                    }
                }
                true
            },
            Event::Comment(ref c) => emit(ParseEvent::Comment {
                before_row: rows,
                text: String::from_utf8_lossy(c).into_owned(),
            }),
            Event::Eof => {
                return if emit(ParseEvent::End) {
                    Ok(())
                } else {
                    Err(Error::Cancelled)
                };
            },
            _ => true,
        };
        if !keep_going {
            return Err(Error::Cancelled);
        }
        buf.clear();
    }
}

fn start_column(e: &BytesStart<'_>, config: &XmlConfig) -> Result<RawColumn> {
    let tag = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let mut name = None;
    let mut type_name = None;
    for attr in e.attributes() {
        let attr = attr?;
        let key = attr.key.as_ref();
        if key == config.type_attribute.as_bytes() {
            type_name = Some(unescape_xml(&String::from_utf8_lossy(&attr.value)));
        } else if !config.use_column_name_tags && key == config.name_attribute.as_bytes() {
            name = Some(unescape_xml(&String::from_utf8_lossy(&attr.value)));
        }
    }
    Ok(RawColumn {
        // Without a name attribute the element name identifies the column.
        name: name.unwrap_or(tag),
        type_name,
        text: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str, config: &XmlConfig) -> Result<Vec<ParseEvent>> {
        let mut events = Vec::new();
        parse_document(xml.as_bytes(), config, |e| {
            events.push(e);
            true
        })?;
        Ok(events)
    }

    fn column(name: &str, type_name: Option<&str>, text: &str) -> RawColumn {
        RawColumn {
            name: name.to_string(),
            type_name: type_name.map(str::to_string),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_rows_and_columns() {
        let xml = r#"<?xml version="1.0"?>
<table>
    <record>
        <column name="id" type="i32">1</column>
        <column name="note">a &amp; b</column>
        <column name="empty"/>
    </record>
</table>"#;
        let events = parse(xml, &XmlConfig::default()).unwrap();
        assert_eq!(
            events,
            vec![
                ParseEvent::Row(vec![
                    column("id", Some("i32"), "1"),
                    column("note", None, "a & b"),
                    column("empty", None, ""),
                ]),
                ParseEvent::End,
            ]
        );
    }

    #[test]
    fn test_column_name_tags() {
        let xml = "<t><row><id>7</id><name><![CDATA[<x>]]></name></row></t>";
        let config = XmlConfig::default()
            .with_row_tag("row")
            .with_column_name_tags(true);
        let events = parse(xml, &config).unwrap();
        assert_eq!(
            events[0],
            ParseEvent::Row(vec![column("id", None, "7"), column("name", None, "<x>")])
        );
    }

    #[test]
    fn test_comments_are_keyed_by_completed_rows() {
        let xml = "<table><!--a--><record><column name=\"x\">1</column></record><!--b--></table>";
        let events = parse(xml, &XmlConfig::default()).unwrap();
        assert_eq!(
            events[0],
            ParseEvent::Comment {
                before_row: 0,
                text: "a".to_string()
            }
        );
        assert_eq!(
            events[2],
            ParseEvent::Comment {
                before_row: 1,
                text: "b".to_string()
            }
        );
    }

    #[test]
    fn test_nested_markup_inside_column_keeps_text() {
        let xml = "<table><record><column name=\"x\">a<b>b</b>c</column></record></table>";
        let events = parse(xml, &XmlConfig::default()).unwrap();
        assert_eq!(events[0], ParseEvent::Row(vec![column("x", None, "abc")]));
    }

    #[test]
    fn test_malformed_document_fails() {
        let xml = "<table><record><column name=\"x\">1</record></table>";
        assert!(parse(xml, &XmlConfig::default()).is_err());
    }

    #[test]
    fn test_emit_refusal_cancels() {
        let xml = "<table><record/><record/></table>";
        let result = parse_document(xml.as_bytes(), &XmlConfig::default(), |_| false);
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
