//! State shared by every reader implementation.
//!
//! Format readers embed a [`ReaderCore`] instead of inheriting behavior: it
//! owns the counters, header bookkeeping, comment callbacks, conversion
//! registry and per-column type assignment.

use super::comment::{Comment, CommentDispatcher};
use crate::common::{Error, Result};
use crate::types::{ConversionRegistry, Row, Value};
use std::collections::HashMap;

/// Raw line and delivered row counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    lines: usize,
    rows: usize,
}

impl Counters {
    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn add_line(&mut self) {
        self.lines += 1;
    }

    pub fn add_row(&mut self) {
        self.rows += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Whether the header has been consumed, and what it was.
#[derive(Debug, Default, Clone)]
pub struct HeaderState {
    consumed: bool,
    row: Option<Row>,
}

impl HeaderState {
    pub fn is_pending(&self) -> bool {
        !self.consumed
    }

    pub fn store(&mut self, row: Option<Row>) {
        self.consumed = true;
        self.row = row;
    }

    pub fn row(&self) -> Option<&Row> {
        self.row.as_ref()
    }

    pub fn clear(&mut self) {
        self.consumed = false;
        self.row = None;
    }
}

/// Reader lifecycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    #[default]
    Unopened,
    Open,
    Exhausted,
    Closed,
}

#[derive(Debug)]
pub struct ReaderCore {
    kind: &'static str,
    has_header_row: bool,
    minimum_column_count: usize,
    counters: Counters,
    header: HeaderState,
    comments: CommentDispatcher,
    registry: ConversionRegistry,
    column_types: HashMap<usize, String>,
    state: Lifecycle,
}

impl ReaderCore {
    /// `kind` names the reader in error and log messages.
    pub fn new(kind: &'static str, has_header_row: bool) -> Self {
        Self {
            kind,
            has_header_row,
            minimum_column_count: 0,
            counters: Counters::default(),
            header: HeaderState::default(),
            comments: CommentDispatcher::new(),
            registry: ConversionRegistry::with_defaults(),
            column_types: HashMap::new(),
            state: Lifecycle::Unopened,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn has_header_row(&self) -> bool {
        self.has_header_row
    }

    pub fn set_has_header_row(&mut self, has_header_row: bool) {
        self.has_header_row = has_header_row;
    }

    pub fn minimum_column_count(&self) -> usize {
        self.minimum_column_count
    }

    pub fn set_minimum_column_count(&mut self, count: usize) {
        self.minimum_column_count = count;
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn counters_mut(&mut self) -> &mut Counters {
        &mut self.counters
    }

    pub fn header(&self) -> &HeaderState {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut HeaderState {
        &mut self.header
    }

    pub fn comments_mut(&mut self) -> &mut CommentDispatcher {
        &mut self.comments
    }

    pub fn notify_comment(&mut self, comment: Comment) {
        self.comments.notify(&comment);
    }

    pub fn registry(&self) -> &ConversionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ConversionRegistry {
        &mut self.registry
    }

    /// Assign a type name to a column; values in it are parsed with that handler.
    pub fn set_column_type(&mut self, column: usize, type_name: impl Into<String>) {
        self.column_types.insert(column, type_name.into());
    }

    pub fn clear_column_type(&mut self, column: usize) {
        self.column_types.remove(&column);
    }

    /// Type assigned to `column`; `None` means plain strings.
    pub fn column_type(&self, column: usize) -> Option<&str> {
        self.column_types.get(&column).map(String::as_str)
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    pub fn set_state(&mut self, state: Lifecycle) {
        self.state = state;
    }

    pub fn is_closed(&self) -> bool {
        self.state == Lifecycle::Closed
    }

    /// Fail if the reader was closed; otherwise mark it open.
    pub fn ensure_open(&mut self) -> Result<()> {
        match self.state {
            Lifecycle::Closed => Err(Error::closed(self.kind)),
            Lifecycle::Unopened => {
                self.state = Lifecycle::Open;
                Ok(())
            },
            Lifecycle::Open | Lifecycle::Exhausted => Ok(()),
        }
    }

    /// Zero the counters and forget the header.
    pub fn restart(&mut self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::closed(self.kind));
        }
        self.counters.reset();
        self.header.clear();
        self.state = Lifecycle::Open;
        Ok(())
    }

    /// Parse raw text of `column`, preferring an explicit type over the
    /// column's assigned type.
    pub fn convert_value(
        &self,
        column: usize,
        explicit_type: Option<&str>,
        text: &str,
    ) -> Result<Value> {
        self.registry
            .parse(explicit_type.or_else(|| self.column_type(column)), text)
    }

    /// Convert a row of raw text into typed values and pad it.
    pub fn convert_row(&self, raw: Vec<Option<String>>) -> Result<Row> {
        let mut row = raw
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                text.map(|t| self.convert_value(i, None, &t))
                    .transpose()
            })
            .collect::<Result<Row>>()?;
        self.pad(&mut row);
        Ok(row)
    }

    /// Re-type already typed values: strings in a typed column are parsed.
    pub fn retype_row(&self, row: Row) -> Result<Row> {
        let mut row = row
            .into_iter()
            .enumerate()
            .map(|(i, value)| match value {
                Some(Value::String(s)) if self.column_type(i).is_some() => {
                    self.convert_value(i, None, &s).map(Some)
                },
                other => Ok(other),
            })
            .collect::<Result<Row>>()?;
        self.pad(&mut row);
        Ok(row)
    }

    /// Header text as string values, padded.
    pub fn header_from_text(&self, raw: Vec<Option<String>>) -> Row {
        let mut row: Row = raw.into_iter().map(|c| c.map(Value::String)).collect();
        self.pad(&mut row);
        row
    }

    /// Pad `row` with nulls up to the minimum column count.
    pub fn pad(&self, row: &mut Row) {
        if row.len() < self.minimum_column_count {
            row.resize(self.minimum_column_count, None);
        }
    }
}
