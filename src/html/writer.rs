//! HTML table writer.

use super::templates::{HtmlTemplates, footer, header};
use crate::common::{Error, OutputSink, Result, escape_html};
use crate::types::{ConversionRegistry, Value};
use crate::writer::{TableWriter, WriterCore};
use std::io::Write;
use tracing::{debug, warn};

const KIND: &str = "HTML writer";

/// Content of an empty cell.
const EMPTY_CELL: &str = "&nbsp;";

/// Renders rows as an HTML table purely by template substitution.
///
/// The first printed row becomes the `<thead>` when the writer has a header
/// row. Each row is flushed on return; the body and table footers are
/// written on `close()`. Comments are not rendered.
#[derive(Debug)]
pub struct HtmlWriter {
    core: WriterCore,
    templates: HtmlTemplates,
    has_header_row: bool,
    sink: Option<OutputSink>,
    table_started: bool,
    body_started: bool,
    data_rows: usize,
}

impl HtmlWriter {
    pub fn new(sink: OutputSink) -> Self {
        Self::with_templates(sink, HtmlTemplates::default())
    }

    pub fn with_templates(sink: OutputSink, templates: HtmlTemplates) -> Self {
        Self {
            core: WriterCore::new(KIND),
            templates,
            has_header_row: true,
            sink: Some(sink),
            table_started: false,
            body_started: false,
            data_rows: 0,
        }
    }

    pub fn templates(&self) -> &HtmlTemplates {
        &self.templates
    }

    pub fn has_header_row(&self) -> bool {
        self.has_header_row
    }

    /// Whether the first printed row goes into `<thead>`.
    pub fn set_has_header_row(&mut self, has_header_row: bool) {
        self.has_header_row = has_header_row;
    }

    /// Data rows printed so far, the header row excluded.
    pub fn data_row_count(&self) -> usize {
        self.data_rows
    }

    fn emit(&mut self, text: &str) -> Result<()> {
        let sink = self.sink.as_mut().ok_or_else(|| Error::closed(KIND))?;
        sink.write_all(text.as_bytes())?;
        sink.flush()?;
        Ok(())
    }

    fn push_content(&self, out: &mut String, value: Option<&Value>) {
        let text = self.core.format(value).map(|s| escape_html(&s));
        match text.as_deref() {
            Some(text) if !text.is_empty() => out.push_str(text),
            _ => out.push_str(EMPTY_CELL),
        }
    }

    fn render_header_row(&self, out: &mut String, columns: &[Option<Value>]) {
        let t = &self.templates;
        out.push_str(header(&t.thead));
        out.push_str(header(&t.thead_tr));
        for (i, column) in columns.iter().enumerate() {
            out.push_str(header(t.header_cell(i)));
            self.push_content(out, column.as_ref());
            out.push_str(footer(t.header_cell(i)));
        }
        out.push_str(footer(&t.thead_tr));
        out.push_str(footer(&t.thead));
    }

    fn render_data_row(&self, out: &mut String, columns: &[Option<Value>], row: usize) {
        let t = &self.templates;
        out.push_str(header(t.body_row(row)));
        for (i, column) in columns.iter().enumerate() {
            out.push_str(header(t.body_cell(i)));
            self.push_content(out, column.as_ref());
            out.push_str(footer(t.body_cell(i)));
        }
        out.push_str(footer(t.body_row(row)));
    }
}

impl TableWriter for HtmlWriter {
    fn print_row(&mut self, columns: &[Option<Value>]) -> Result<()> {
        self.core.ensure_open()?;
        let mut out = String::with_capacity(128 + columns.len() * 32);
        if !self.table_started {
            out.push_str(header(&self.templates.table));
            self.table_started = true;
        }
        if self.core.row_count() == 0 && self.has_header_row {
            self.render_header_row(&mut out, columns);
        } else {
            if !self.body_started {
                out.push_str(header(&self.templates.tbody));
                self.body_started = true;
            }
            self.render_data_row(&mut out, columns, self.data_rows);
            self.data_rows += 1;
        }
        self.emit(&out)?;
        self.core.add_row();
        Ok(())
    }

    fn row_count(&self) -> usize {
        self.core.row_count()
    }

    fn registry_mut(&mut self) -> &mut ConversionRegistry {
        self.core.registry_mut()
    }

    fn close(&mut self) -> Result<()> {
        if !self.core.mark_closed() {
            return Ok(());
        }
        let mut out = String::new();
        if self.body_started {
            out.push_str(footer(&self.templates.tbody));
        }
        if self.table_started {
            out.push_str(footer(&self.templates.table));
        }
        let Some(mut sink) = self.sink.take() else {
            return Ok(());
        };
        let written = sink
            .write_all(out.as_bytes())
            .and_then(|_| sink.flush())
            .map_err(Error::from);
        if let Err(e) = &written {
            warn!(error = %e, sink = ?sink.name(), "Closing HTML output failed");
        }
        debug!(rows = self.core.row_count(), "HTML writer closed");
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::SharedBuffer;
    use crate::types::text_row;

    #[test]
    fn test_default_table() {
        let buffer = SharedBuffer::new();
        let mut writer = HtmlWriter::new(buffer.sink());
        writer.print_row(&text_row(["Name", "Note"])).unwrap();
        writer
            .print_row(&[Some(Value::from("<b>Tom</b> & Jerry")), None])
            .unwrap();
        writer.print_row(&[Some(Value::Int(2)), Some(Value::from(""))]).unwrap();
        writer.close().unwrap();

        let expected = "<table>\n\
            \t<thead>\n\
            \t\t<tr>\n\
            \t\t\t<th class=\"even\">Name</th>\n\
            \t\t\t<th class=\"odd\">Note</th>\n\
            \t\t</tr>\n\
            \t</thead>\n\
            \t<tbody>\n\
            \t\t<tr class=\"even\">\n\
            \t\t\t<td class=\"even\">&lt;b&gt;Tom&lt;/b&gt; &amp; Jerry</td>\n\
            \t\t\t<td class=\"odd\">&nbsp;</td>\n\
            \t\t</tr>\n\
            \t\t<tr class=\"odd\">\n\
            \t\t\t<td class=\"even\">2</td>\n\
            \t\t\t<td class=\"odd\">&nbsp;</td>\n\
            \t\t</tr>\n\
            \t</tbody>\n\
            </table>\n";
        assert_eq!(buffer.to_string_lossy(), expected);
        assert_eq!(writer.row_count(), 3);
        assert_eq!(writer.data_row_count(), 2);
    }

    #[test]
    fn test_rows_are_flushed_and_footers_wait_for_close() {
        let buffer = SharedBuffer::new();
        let templates = HtmlTemplates::new()
            .with_table("[|]")
            .with_tbody("{|}")
            .with_tbody_tr("<|>", "(|)")
            .with_tbody_td("a|;", "b|;");
        let mut writer = HtmlWriter::with_templates(buffer.sink(), templates);
        writer.set_has_header_row(false);
        writer.print_row(&text_row(["1", "2"])).unwrap();
        assert_eq!(buffer.to_string_lossy(), "[{<a1;b2;>");
        writer.print_row(&text_row(["3"])).unwrap();
        writer.close().unwrap();
        writer.close().unwrap();
        assert_eq!(buffer.to_string_lossy(), "[{<a1;b2;>(a3;)}]");
    }

    #[test]
    fn test_empty_table_writes_nothing() {
        let buffer = SharedBuffer::new();
        let mut writer = HtmlWriter::new(buffer.sink());
        writer.close().unwrap();
        assert!(buffer.is_empty());
        assert!(matches!(writer.print_row(&text_row(["x"])), Err(Error::IllegalState(_))));
    }
}
