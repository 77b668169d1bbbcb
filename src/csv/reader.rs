//! Delimited text reader.

use super::config::CsvConfig;
use super::lines::LineReader;
use super::tokenizer::{Outcome, Tokenizer};
use crate::common::{Error, InputSource, Result};
use crate::reader::{Comment, Lifecycle, ReaderCore, TableReader};
use crate::types::Row;
use tracing::debug;

const KIND: &str = "CSV reader";

/// Reads rows from delimited text.
///
/// Comment lines are routed to the registered comment callbacks with the
/// physical line number as row index.
#[derive(Debug)]
pub struct CsvReader {
    core: ReaderCore,
    config: CsvConfig,
    tokenizer: Tokenizer,
    lines: Option<LineReader>,
    pending: Option<Row>,
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvReader {
    /// Unbound reader with the default dialect; bind input with [`Self::set_input`].
    pub fn new() -> Self {
        Self::with_config(CsvConfig::default())
    }

    pub fn with_config(config: CsvConfig) -> Self {
        let mut core = ReaderCore::new(KIND, config.has_header_row);
        core.set_minimum_column_count(config.minimum_column_count);
        Self {
            core,
            tokenizer: Tokenizer::new(&config),
            config,
            lines: None,
            pending: None,
        }
    }

    pub fn from_source(source: InputSource) -> Self {
        Self::from_source_with_config(source, CsvConfig::default())
    }

    pub fn from_source_with_config(source: InputSource, config: CsvConfig) -> Self {
        let mut reader = Self::with_config(config);
        reader.bind(source);
        reader
    }

    /// Reader over UTF-8 text with the default dialect.
    pub fn from_text(text: &str) -> Self {
        Self::from_source(InputSource::from_text(text))
    }

    /// Bind the input medium. Fails if one is already bound.
    pub fn set_input(&mut self, source: InputSource) -> Result<()> {
        if self.lines.is_some() || self.core.is_closed() {
            return Err(Error::AlreadyBound(KIND));
        }
        self.bind(source);
        Ok(())
    }

    pub fn config(&self) -> &CsvConfig {
        &self.config
    }

    fn bind(&mut self, source: InputSource) {
        // An unknown label falls back to UTF-8 rather than failing at bind time.
        let encoding = self.config.resolve_encoding().unwrap_or_else(|e| {
            tracing::warn!("{}; reading as UTF-8", e);
            encoding_rs::UTF_8
        });
        debug!(source = ?source.name(), encoding = encoding.name(), "CSV input bound");
        self.lines = Some(LineReader::new(source, encoding, self.config.strip_bom));
    }

    /// Tokenize the next logical row, dispatching comments on the way.
    fn read_raw_row(&mut self) -> Result<Option<Vec<Option<String>>>> {
        let lines = self.lines.as_mut().ok_or_else(|| Error::unbound(KIND))?;
        let mut buffer = String::new();
        loop {
            let Some(line) = lines.next_line()? else {
                if buffer.is_empty() {
                    return Ok(None);
                }
                // Unterminated delimited value at end of input: close it.
                buffer.pop();
                if buffer.ends_with('\r') {
                    buffer.pop();
                }
                buffer.push(self.tokenizer.delimiter());
                buffer.push('\n');
                return Ok(match self.tokenizer.tokenize(&buffer) {
                    Outcome::Row(columns) => Some(columns),
                    _ => None,
                });
            };
            self.core.counters_mut().add_line();
            buffer.push_str(&line.text);
            buffer.push('\n');

            match self.tokenizer.tokenize(&buffer) {
                Outcome::Row(columns) => return Ok(Some(columns)),
                Outcome::EmptyRow => return Ok(Some(Vec::new())),
                Outcome::Comment(text) => {
                    let row = self.core.counters().lines();
                    self.core.notify_comment(Comment::new(text, row, None));
                    buffer.clear();
                },
                Outcome::Skip => buffer.clear(),
                Outcome::Incomplete => {
                    // The terminator belongs to the open value.
                    if line.crlf {
                        buffer.pop();
                        buffer.push_str("\r\n");
                    }
                },
            }
        }
    }

    fn ensure_header(&mut self) -> Result<()> {
        if !self.core.has_header_row() || !self.core.header().is_pending() {
            return Ok(());
        }
        let header = self
            .read_raw_row()?
            .map(|raw| self.core.header_from_text(raw));
        self.core.header_mut().store(header);
        Ok(())
    }
}

impl TableReader for CsvReader {
    fn core(&self) -> &ReaderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ReaderCore {
        &mut self.core
    }

    fn open(&mut self) -> Result<()> {
        self.core.restart()?;
        self.pending = None;
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        if self.core.is_closed() {
            return Err(Error::closed(KIND));
        }
        self.lines
            .as_mut()
            .ok_or_else(|| Error::unbound(KIND))?
            .rewind()?;
        self.open()
    }

    fn has_next(&mut self) -> Result<bool> {
        self.core.ensure_open()?;
        if self.pending.is_some() {
            return Ok(true);
        }
        if self.core.state() == Lifecycle::Exhausted {
            return Ok(false);
        }
        self.ensure_header()?;
        match self.read_raw_row()? {
            Some(raw) => {
                self.pending = Some(self.core.convert_row(raw)?);
                Ok(true)
            },
            None => {
                self.core.set_state(Lifecycle::Exhausted);
                Ok(false)
            },
        }
    }

    fn next_row(&mut self) -> Result<Row> {
        if !self.has_next()? {
            return Err(Error::NoMoreRows);
        }
        let row = self.pending.take().ok_or(Error::NoMoreRows)?;
        self.core.counters_mut().add_row();
        Ok(row)
    }

    fn header_row(&mut self) -> Result<Option<Row>> {
        self.core.ensure_open()?;
        if !self.core.has_header_row() {
            return Ok(None);
        }
        self.ensure_header()?;
        Ok(self.core.header().row().cloned())
    }

    fn close(&mut self) -> Result<()> {
        if self.core.is_closed() {
            return Ok(());
        }
        self.lines = None;
        self.pending = None;
        self.core.set_state(Lifecycle::Closed);
        debug!(rows = self.core.counters().rows(), "CSV reader closed");
        Ok(())
    }
}
