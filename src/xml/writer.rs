//! Record XML writer.

use super::config::XmlConfig;
use crate::common::{Error, OutputSink, Result, escape_xml};
use crate::types::{ConversionRegistry, Value};
use crate::writer::{TableWriter, WriterCore};
use encoding_rs::Encoding;
use std::io::Write;
use tracing::{debug, warn};

const KIND: &str = "XML writer";

/// Writes rows as record XML, one flushed element per row.
///
/// The declaration and root element are written on the first row (or on
/// `close()` for an empty table). Every non-null column carries its value's
/// type name so that [`super::XmlReader`] restores the type.
#[derive(Debug)]
pub struct XmlWriter {
    core: WriterCore,
    config: XmlConfig,
    encoding: &'static Encoding,
    sink: Option<OutputSink>,
    started: bool,
    column_names: Option<Vec<String>>,
}

impl XmlWriter {
    pub fn new(sink: OutputSink) -> Self {
        Self::with_config(sink, XmlConfig::default())
    }

    pub fn with_config(sink: OutputSink, config: XmlConfig) -> Self {
        let encoding = match Encoding::for_label(config.encoding.as_bytes()) {
            Some(encoding) => encoding.output_encoding(),
            None => {
                warn!("Unknown encoding '{}'; writing UTF-8", config.encoding);
                encoding_rs::UTF_8
            },
        };
        Self {
            core: WriterCore::new(KIND),
            config,
            encoding,
            sink: Some(sink),
            started: false,
            column_names: None,
        }
    }

    pub fn config(&self) -> &XmlConfig {
        &self.config
    }

    /// Name the columns explicitly; unnamed columns fall back to `column<i>`.
    pub fn set_column_names<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.column_names = Some(names.into_iter().map(Into::into).collect());
    }

    pub fn column_name(&self, index: usize) -> String {
        self.column_names
            .as_ref()
            .and_then(|names| names.get(index))
            .cloned()
            .unwrap_or_else(|| format!("column{}", index))
    }

    fn emit(&mut self, text: &str) -> Result<()> {
        let sink = self.sink.as_mut().ok_or_else(|| Error::closed(KIND))?;
        // Unmappable characters become numeric character references.
        let (bytes, _, _) = self.encoding.encode(text);
        sink.write_all(&bytes)?;
        sink.flush()?;
        Ok(())
    }

    fn ensure_started(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        let prolog = format!(
            "<?xml version=\"1.0\" encoding=\"{}\"?>\n<{}>\n",
            escape_xml(&self.config.encoding),
            self.config.root_tag
        );
        self.emit(&prolog)
    }

    fn render_row(&self, columns: &[Option<Value>]) -> String {
        let row_tag = &self.config.row_tag;
        let mut out = String::with_capacity(64 + columns.len() * 48);
        out.push_str("\t<");
        out.push_str(row_tag);
        out.push_str(">\n");
        for (i, column) in columns.iter().enumerate() {
            let name = self.column_name(i);
            let tag = if self.config.use_column_name_tags {
                element_name(&name)
            } else {
                self.config.column_tag.clone()
            };
            out.push_str("\t\t<");
            out.push_str(&tag);
            if !self.config.use_column_name_tags {
                push_attribute(&mut out, &self.config.name_attribute, &name);
            }
            match column {
                Some(value) => {
                    push_attribute(&mut out, &self.config.type_attribute, value.type_name());
                    out.push('>');
                    out.push_str(&escape_xml(&self.core.registry().format(value)));
                    out.push_str("</");
                    out.push_str(&tag);
                    out.push_str(">\n");
                },
                None => out.push_str("/>\n"),
            }
        }
        out.push_str("\t</");
        out.push_str(row_tag);
        out.push_str(">\n");
        out
    }
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_xml(value));
    out.push('"');
}

/// Turn a column name into a valid element name.
fn element_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 1);
    for (i, c) in name.chars().enumerate() {
        let valid = c.is_alphanumeric() || c == '_' || (i > 0 && matches!(c, '-' | '.'));
        if i == 0 && (c.is_numeric() || !valid) {
            out.push('_');
            if c.is_numeric() {
                out.push(c);
            }
        } else if valid {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}

impl TableWriter for XmlWriter {
    fn print_row(&mut self, columns: &[Option<Value>]) -> Result<()> {
        self.core.ensure_open()?;
        self.ensure_started()?;
        if self.config.write_header_row && self.column_names.is_none() {
            let names: Vec<String> = columns
                .iter()
                .enumerate()
                .map(|(i, c)| match c {
                    Some(value) => value.to_string(),
                    None => format!("column{}", i),
                })
                .collect();
            self.column_names = Some(names);
            return Ok(());
        }
        let text = self.render_row(columns);
        self.emit(&text)?;
        self.core.add_row();
        Ok(())
    }

    /// Writes `<!--text-->`. A `--` inside the text is broken up.
    fn print_comment(&mut self, text: &str) -> Result<()> {
        self.core.ensure_open()?;
        self.ensure_started()?;
        self.emit(&format!("\t<!--{}-->\n", comment_body(text)))
    }

    fn row_count(&self) -> usize {
        self.core.row_count()
    }

    fn registry_mut(&mut self) -> &mut ConversionRegistry {
        self.core.registry_mut()
    }

    fn close(&mut self) -> Result<()> {
        if self.core.is_closed() {
            return Ok(());
        }
        let footer = format!("</{}>\n", self.config.root_tag);
        let result = self.ensure_started().and_then(|()| self.emit(&footer));
        self.core.mark_closed();
        self.sink = None;
        debug!(rows = self.core.row_count(), "XML writer closed");
        result
    }
}

/// Comment text that cannot contain `--` or end in `-`.
fn comment_body(text: &str) -> String {
    let mut body = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '-' && body.ends_with('-') {
            body.push(' ');
        }
        body.push(c);
    }
    if body.ends_with('-') {
        body.push(' ');
    }
    body
}
