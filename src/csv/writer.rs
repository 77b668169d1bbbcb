//! Delimited text writer.

use super::config::CsvConfig;
use crate::common::{Error, OutputSink, Result, write_bom};
use crate::types::{ConversionRegistry, Value};
use crate::writer::{TableWriter, WriterCore};
use encoding_rs::Encoding;
use std::io::Write;
use tracing::{debug, warn};

const KIND: &str = "CSV writer";

/// Writes rows as delimited text, one flushed line per row.
#[derive(Debug)]
pub struct CsvWriter {
    core: WriterCore,
    config: CsvConfig,
    encoding: &'static Encoding,
    sink: Option<OutputSink>,
    started: bool,
    column_count: usize,
}

impl CsvWriter {
    pub fn new(sink: OutputSink) -> Self {
        Self::with_config(sink, CsvConfig::default())
    }

    pub fn with_config(sink: OutputSink, config: CsvConfig) -> Self {
        let encoding = config.resolve_encoding().unwrap_or_else(|e| {
            warn!("{}; writing UTF-8", e);
            encoding_rs::UTF_8
        });
        Self {
            core: WriterCore::new(KIND),
            config,
            encoding: encoding.output_encoding(),
            sink: Some(sink),
            started: false,
            column_count: 0,
        }
    }

    pub fn config(&self) -> &CsvConfig {
        &self.config
    }

    /// Widest row written so far.
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Whether `text` must be wrapped in delimiters.
    fn needs_delimiting(&self, text: &str) -> bool {
        self.config.delimiter_required
            || text.trim() != text
            || text.starts_with(self.config.comment_char())
            || self.config.comment_chars.chars().any(|c| text.starts_with(c))
            || text.contains('\n')
            || text.contains(self.config.separator)
            || text.contains(self.config.delimiter)
            || (self.config.excel_id_quirk && self.core.row_count() == 0 && text.starts_with("ID"))
    }

    fn push_column(&self, line: &mut String, text: &str) {
        if !self.needs_delimiting(text) {
            line.push_str(text);
            return;
        }
        let delimiter = self.config.delimiter;
        line.push(delimiter);
        for c in text.chars() {
            if c == delimiter {
                line.push(delimiter);
            }
            line.push(c);
        }
        line.push(delimiter);
    }

    fn emit(&mut self, text: &str) -> Result<()> {
        let sink = self.sink.as_mut().ok_or_else(|| Error::closed(KIND))?;
        if !self.started {
            self.started = true;
            if let Some(bom) = self.config.write_bom {
                write_bom(sink, bom)?;
            }
        }
        let (bytes, _, had_errors) = self.encoding.encode(text);
        if had_errors {
            warn!(
                "Characters not representable in {} were replaced",
                self.encoding.name()
            );
        }
        sink.write_all(&bytes)?;
        sink.flush()?;
        Ok(())
    }
}

impl TableWriter for CsvWriter {
    fn print_row(&mut self, columns: &[Option<Value>]) -> Result<()> {
        self.core.ensure_open()?;
        let mut line = String::new();
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                line.push(self.config.separator);
            }
            if let Some(text) = self.core.format(column.as_ref()) {
                if text.is_empty() && columns.len() == 1 {
                    // a bare empty line would be skipped on reading
                    line.push(self.config.delimiter);
                    line.push(self.config.delimiter);
                } else {
                    self.push_column(&mut line, &text);
                }
            }
        }
        line.push('\n');
        self.emit(&line)?;
        self.column_count = self.column_count.max(columns.len());
        self.core.add_row();
        Ok(())
    }

    /// Writes `<comment char> text`, one comment line per line of `text`.
    fn print_comment(&mut self, text: &str) -> Result<()> {
        self.core.ensure_open()?;
        let marker = self.config.comment_char();
        let mut out = String::new();
        for line in text.lines() {
            out.push(marker);
            out.push(' ');
            out.push_str(line);
            out.push('\n');
        }
        if out.is_empty() {
            out.push(marker);
            out.push('\n');
        }
        self.emit(&out)
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
        if let Some(mut sink) = self.sink.take() {
            sink.flush()?;
        }
        debug!(rows = self.core.row_count(), "CSV writer closed");
        Ok(())
    }
}
