//! Copying tables between readers, writers and in-memory rows.

use crate::bean::{Bean, BeanWriter};
use crate::common::Result;
use crate::reader::{Comment, TableReader};
use crate::types::Value;
use crate::writer::TableWriter;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// Copy every row of `reader` to `writer`, optionally preceded by the header
/// row. Returns the number of data rows copied.
///
/// Comments the reader reports are printed to the writer before the row
/// that follows them. Neither side is closed.
pub fn copy<R, W>(reader: &mut R, writer: &mut W, copy_header: bool) -> Result<usize>
where
    R: TableReader + ?Sized,
    W: TableWriter + ?Sized,
{
    let queue: Rc<RefCell<Vec<Comment>>> = Rc::default();
    let sink = Rc::clone(&queue);
    let id = reader.register_comment_callback(Box::new(move |comment: &Comment| {
        sink.borrow_mut().push(comment.clone());
    }));

    let result = copy_with_comments(reader, writer, copy_header, &queue);
    reader.unregister_comment_callback(id);
    let copied = result?;
    debug!(rows = copied, "Table copied");
    Ok(copied)
}

fn copy_with_comments<R, W>(
    reader: &mut R,
    writer: &mut W,
    copy_header: bool,
    queue: &RefCell<Vec<Comment>>,
) -> Result<usize>
where
    R: TableReader + ?Sized,
    W: TableWriter + ?Sized,
{
    if copy_header && reader.has_header_row() {
        let header = reader.header_row()?;
        flush_comments(queue, writer)?;
        if let Some(header) = header {
            writer.print_row(&header)?;
        }
    }

    let mut copied = 0;
    loop {
        let more = reader.has_next()?;
        flush_comments(queue, writer)?;
        if !more {
            break;
        }
        writer.print_row(&reader.next_row()?)?;
        copied += 1;
    }
    Ok(copied)
}

fn flush_comments<W: TableWriter + ?Sized>(queue: &RefCell<Vec<Comment>>, writer: &mut W) -> Result<()> {
    let comments = std::mem::take(&mut *queue.borrow_mut());
    for comment in comments {
        writer.print_comment_at(&comment.text, comment.row, comment.column)?;
    }
    Ok(())
}

/// Print each row to `writer`; returns how many were printed.
pub fn copy_rows<I, C, W>(rows: I, writer: &mut W) -> Result<usize>
where
    I: IntoIterator<Item = C>,
    C: AsRef<[Option<Value>]>,
    W: TableWriter + ?Sized,
{
    let mut count = 0;
    for row in rows {
        writer.print_row(row.as_ref())?;
        count += 1;
    }
    Ok(count)
}

/// Write `beans` with a header row of attribute names, then close `writer`.
/// Returns the number of beans written.
pub fn copy_beans<'a, T, I, W>(beans: I, writer: W) -> Result<usize>
where
    T: Bean + 'a,
    I: IntoIterator<Item = &'a T>,
    W: TableWriter,
{
    let mut bean_writer = BeanWriter::new(writer, true);
    let written = bean_writer.write_beans(beans);
    let closed = bean_writer.close();
    let count = written?;
    closed?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean::Field;
    use crate::common::SharedBuffer;
    use crate::csv::{CsvReader, CsvWriter};
    use crate::html::HtmlWriter;
    use crate::types::text_row;
    use crate::xml::XmlWriter;

    #[test]
    fn test_copy_with_header() {
        let mut reader = CsvReader::from_text("A;B\n1;2\n3;4\n");
        let buffer = SharedBuffer::new();
        let mut writer = CsvWriter::new(buffer.sink());
        assert_eq!(copy(&mut reader, &mut writer, true).unwrap(), 2);
        writer.close().unwrap();
        assert_eq!(buffer.to_string_lossy(), "A;B\n1;2\n3;4\n");
    }

    #[test]
    fn test_copy_without_header() {
        let mut reader = CsvReader::from_text("A;B\n1;2\n");
        let buffer = SharedBuffer::new();
        let mut writer = CsvWriter::new(buffer.sink());
        copy(&mut reader, &mut writer, false).unwrap();
        writer.close().unwrap();
        assert_eq!(buffer.to_string_lossy(), "1;2\n");
    }

    #[test]
    fn test_comments_precede_their_row() {
        let mut reader = CsvReader::from_text("# first\nA\n1\n# second\n2\n");
        let buffer = SharedBuffer::new();
        let mut writer = CsvWriter::new(buffer.sink());
        copy(&mut reader, &mut writer, true).unwrap();
        writer.close().unwrap();
        assert_eq!(buffer.to_string_lossy(), "# first\nA\n1\n# second\n2\n");
        // The callback is gone once the copy is done.
        assert!(reader.core_mut().comments_mut().is_empty());
    }

    #[test]
    fn test_comments_to_writer_without_comment_support() {
        let mut reader = CsvReader::from_text("A\n# note\n1\n");
        let buffer = SharedBuffer::new();
        let mut writer = HtmlWriter::new(buffer.sink());
        assert_eq!(copy(&mut reader, &mut writer, true).unwrap(), 1);
        writer.close().unwrap();
        assert!(!buffer.to_string_lossy().contains("note"));
    }

    #[test]
    fn test_copy_rows() {
        let buffer = SharedBuffer::new();
        let mut writer = CsvWriter::new(buffer.sink());
        let rows = vec![text_row(["a", "b"]), vec![None, Some(Value::Int(1))]];
        assert_eq!(copy_rows(&rows, &mut writer).unwrap(), 2);
        writer.close().unwrap();
        assert_eq!(buffer.to_string_lossy(), "a;b\n;1\n");
    }

    struct Point {
        x: i64,
        y: i64,
    }

    impl Bean for Point {
        fn fields() -> Vec<Field<Self>> {
            vec![
                Field::<Self>::new("x", |p| Some(Value::Long(p.x)), |p, v| {
                    p.x = crate::bean::parse_i64("x", v)?.unwrap_or_default();
                    Ok(())
                }),
                Field::<Self>::new("y", |p| Some(Value::Long(p.y)), |p, v| {
                    p.y = crate::bean::parse_i64("y", v)?.unwrap_or_default();
                    Ok(())
                }),
            ]
        }
    }

    #[test]
    fn test_copy_beans_closes_writer() {
        let buffer = SharedBuffer::new();
        let points = [Point { x: 1, y: 2 }, Point { x: -3, y: 0 }];
        assert_eq!(copy_beans(&points, XmlWriter::new(buffer.sink())).unwrap(), 2);
        let xml = buffer.to_string_lossy();
        assert!(xml.trim_end().ends_with('>'));
        assert!(xml.contains("-3"));
    }
}
