//! Tables behind a forward cursor, the way query results arrive.

use crate::common::{Error, Result};
use crate::reader::{Lifecycle, ReaderCore, TableReader};
use crate::types::Row;
use tracing::{debug, warn};

const KIND: &str = "Result set reader";

/// A scrollable query result.
///
/// The cursor starts before the first row; [`ResultCursor::advance`] moves it
/// onto the next one and [`ResultCursor::values`] reads the row it is on.
pub trait ResultCursor {
    /// Names of the result columns, in column order.
    fn column_names(&self) -> Result<Vec<String>>;

    /// Move to the next row. `false` once past the last row.
    fn advance(&mut self) -> Result<bool>;

    /// Values of the current row.
    fn values(&self) -> Result<Row>;

    /// Move back before the first row.
    fn rewind(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()>;

    fn is_closed(&self) -> bool;
}

/// A result set held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryResultSet {
    columns: Vec<String>,
    rows: Vec<Row>,
    position: Option<usize>,
    closed: bool,
}

impl MemoryResultSet {
    pub fn new<I, S>(columns: I, rows: Vec<Row>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows,
            position: None,
            closed: false,
        }
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::IllegalState("Result set is closed".to_string()))
        } else {
            Ok(())
        }
    }
}

impl ResultCursor for MemoryResultSet {
    fn column_names(&self) -> Result<Vec<String>> {
        self.ensure_open()?;
        Ok(self.columns.clone())
    }

    fn advance(&mut self) -> Result<bool> {
        self.ensure_open()?;
        let next = self.position.map_or(0, |p| p + 1);
        // Park one past the end so further calls stay false.
        self.position = Some(next.min(self.rows.len()));
        Ok(next < self.rows.len())
    }

    fn values(&self) -> Result<Row> {
        self.ensure_open()?;
        let row = self
            .position
            .and_then(|p| self.rows.get(p))
            .ok_or_else(|| Error::IllegalState("Cursor is not on a row".to_string()))?;
        let mut values = row.clone();
        values.resize(self.columns.len().max(row.len()), None);
        Ok(values)
    }

    fn rewind(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.position = None;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Reads the rows of a [`ResultCursor`].
///
/// The header row is taken from the column names and never consumes a data
/// row. Closing the reader leaves the cursor open unless
/// [`Self::set_close_cursor`] asked otherwise.
#[derive(Debug)]
pub struct ResultSetReader<C: ResultCursor> {
    core: ReaderCore,
    cursor: C,
    close_cursor: bool,
    pending: Option<Row>,
}

impl<C: ResultCursor> ResultSetReader<C> {
    pub fn new(cursor: C) -> Self {
        Self {
            core: ReaderCore::new(KIND, true),
            cursor,
            close_cursor: false,
            pending: None,
        }
    }

    pub fn cursor(&self) -> &C {
        &self.cursor
    }

    pub fn into_cursor(self) -> C {
        self.cursor
    }

    pub fn close_cursor(&self) -> bool {
        self.close_cursor
    }

    pub fn set_close_cursor(&mut self, close_cursor: bool) {
        self.close_cursor = close_cursor;
    }

    /// Number of result columns.
    pub fn column_count(&self) -> Result<usize> {
        Ok(self.cursor.column_names()?.len())
    }

    fn ensure_header(&mut self) -> Result<()> {
        if !self.core.has_header_row() || !self.core.header().is_pending() {
            return Ok(());
        }
        let names = self.cursor.column_names()?;
        let header = self.core.header_from_text(names.into_iter().map(Some).collect());
        self.core.header_mut().store(Some(header));
        Ok(())
    }
}

impl<C: ResultCursor> TableReader for ResultSetReader<C> {
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
        self.cursor.rewind()?;
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
        if !self.cursor.advance()? {
            self.core.set_state(Lifecycle::Exhausted);
            return Ok(false);
        }
        self.core.counters_mut().add_line();
        let row = self.core.retype_row(self.cursor.values()?)?;
        self.pending = Some(row);
        Ok(true)
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
        self.pending = None;
        self.core.set_state(Lifecycle::Closed);
        let mut result = Ok(());
        if self.close_cursor && !self.cursor.is_closed() {
            result = self.cursor.close();
            if let Err(e) = &result {
                warn!(error = %e, "Result set could not be closed");
            }
        }
        debug!(rows = self.core.counters().rows(), "Result set reader closed");
        result
    }
}
