//! Row selection.

use crate::common::{Error, Result};
use crate::reader::{ReaderCore, TableReader};
use crate::types::{Row, Value};

const KIND: &str = "Row filter";

/// Decides which upstream rows a [`RowFilter`] passes on.
pub trait RowPredicate {
    /// Whether to keep `row`, the `raw_index`-th data row of the upstream reader.
    fn accept(&mut self, raw_index: usize, row: &[Option<Value>]) -> bool;

    /// `false` once no later row can be accepted; stops pulling upstream rows.
    fn more_rows_expected(&self) -> bool {
        true
    }

    /// Forget state when the filter starts over.
    fn reset(&mut self) {}
}

/// Accepts the rows at a fixed set of upstream indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRowFilter {
    indices: Vec<usize>,
    next: usize,
}

impl IndexRowFilter {
    pub fn new(indices: impl IntoIterator<Item = usize>) -> Self {
        let mut indices: Vec<usize> = indices.into_iter().collect();
        indices.sort_unstable();
        indices.dedup();
        Self { indices, next: 0 }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

impl RowPredicate for IndexRowFilter {
    fn accept(&mut self, raw_index: usize, _row: &[Option<Value>]) -> bool {
        if self.indices.get(self.next) == Some(&raw_index) {
            self.next += 1;
            true
        } else {
            false
        }
    }

    fn more_rows_expected(&self) -> bool {
        self.next < self.indices.len()
    }

    fn reset(&mut self) {
        self.next = 0;
    }
}

/// Predicate backed by a closure. Build it with [`RowFilter::from_fn`].
#[derive(Debug, Clone)]
pub struct PredicateFn<F>(pub F);

impl<F> RowPredicate for PredicateFn<F>
where
    F: FnMut(usize, &[Option<Value>]) -> bool,
{
    fn accept(&mut self, raw_index: usize, row: &[Option<Value>]) -> bool {
        (self.0)(raw_index, row)
    }
}

/// Reader decorator that skips rows its predicate rejects.
///
/// One accepted row is held back so that `has_next` can answer without
/// losing it. The header row passes through unfiltered, and `row_count`
/// counts delivered rows only.
#[derive(Debug)]
pub struct RowFilter<R, P> {
    reader: R,
    predicate: P,
    pending: Option<Row>,
    raw_index: usize,
    row_index: usize,
}

impl<R: TableReader, P: RowPredicate> RowFilter<R, P> {
    pub fn new(reader: R, predicate: P) -> Self {
        Self {
            reader,
            predicate,
            pending: None,
            raw_index: 0,
            row_index: 0,
        }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn predicate(&self) -> &P {
        &self.predicate
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Upstream rows examined so far.
    pub fn raw_index(&self) -> usize {
        self.raw_index
    }

    fn restart(&mut self) {
        self.pending = None;
        self.raw_index = 0;
        self.row_index = 0;
        self.predicate.reset();
    }
}

impl<R, F> RowFilter<R, PredicateFn<F>>
where
    R: TableReader,
    F: FnMut(usize, &[Option<Value>]) -> bool,
{
    pub fn from_fn(reader: R, predicate: F) -> Self {
        Self::new(reader, PredicateFn(predicate))
    }
}

impl<R: TableReader, P: RowPredicate> TableReader for RowFilter<R, P> {
    fn core(&self) -> &ReaderCore {
        self.reader.core()
    }

    fn core_mut(&mut self) -> &mut ReaderCore {
        self.reader.core_mut()
    }

    fn open(&mut self) -> Result<()> {
        self.reader.open()?;
        self.restart();
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.reader.reset()?;
        self.restart();
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool> {
        if self.reader.core().is_closed() {
            return Err(Error::closed(KIND));
        }
        while self.pending.is_none() && self.predicate.more_rows_expected() && self.reader.has_next()? {
            let row = self.reader.next_row()?;
            if self.predicate.accept(self.raw_index, &row) {
                self.pending = Some(row);
            }
            self.raw_index += 1;
        }
        Ok(self.pending.is_some())
    }

    fn next_row(&mut self) -> Result<Row> {
        if !self.has_next()? {
            return Err(Error::NoMoreRows);
        }
        let row = self.pending.take().ok_or(Error::NoMoreRows)?;
        self.row_index += 1;
        Ok(row)
    }

    fn header_row(&mut self) -> Result<Option<Row>> {
        self.reader.header_row()
    }

    fn close(&mut self) -> Result<()> {
        self.pending = None;
        self.reader.close()
    }

    fn line_count(&self) -> usize {
        self.reader.line_count()
    }

    fn row_count(&self) -> usize {
        self.row_index
    }

    fn column_index(&mut self, name: &str) -> Result<Option<usize>> {
        self.reader.column_index(name)
    }
}
