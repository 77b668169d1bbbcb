//! Column reordering and projection.

use crate::common::Result;
use crate::reader::{ReaderCore, TableReader};
use crate::types::Row;

/// Where each upstream column lands in a filtered row.
pub trait ColumnMapping {
    /// Filtered position of the upstream column `original`; `None` drops it.
    fn filtered_index(&self, original: usize) -> Option<usize>;

    /// Width of a filtered row built from an upstream row of `original_width` columns.
    fn filtered_width(&self, original_width: usize) -> usize {
        original_width
    }
}

/// Mapping given as the list of upstream columns in their new order.
///
/// `[2, 0]` yields rows holding the third upstream column followed by the
/// first. Listing a column that does not exist upstream yields a null in
/// its place, so a view can be wider than its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOrder {
    order: Vec<usize>,
}

impl IndexOrder {
    pub fn new(order: impl Into<Vec<usize>>) -> Self {
        Self {
            order: order.into(),
        }
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }
}

impl ColumnMapping for IndexOrder {
    fn filtered_index(&self, original: usize) -> Option<usize> {
        self.order.iter().position(|&index| index == original)
    }

    fn filtered_width(&self, _original_width: usize) -> usize {
        self.order.len()
    }
}

/// Reader decorator that rearranges the columns of every row.
///
/// Header and data rows are remapped alike; everything else goes straight to
/// the wrapped reader. Column types and comment callbacks therefore address
/// upstream column positions.
#[derive(Debug)]
pub struct ColumnFilter<R, M> {
    reader: R,
    mapping: M,
    row_index: usize,
}

impl<R: TableReader, M: ColumnMapping> ColumnFilter<R, M> {
    pub fn new(reader: R, mapping: M) -> Self {
        Self {
            reader,
            mapping,
            row_index: 0,
        }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn mapping(&self) -> &M {
        &self.mapping
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Rows delivered since the last open or reset.
    pub fn row_index(&self) -> usize {
        self.row_index
    }

    /// Remapped row, padded to the minimum column count like any other row.
    fn filter(&self, row: Row) -> Row {
        let width = self
            .mapping
            .filtered_width(row.len())
            .max(self.reader.minimum_column_count());
        let mut filtered = vec![None; width];
        for (original, value) in row.into_iter().enumerate() {
            if let Some(index) = self.mapping.filtered_index(original)
                && let Some(slot) = filtered.get_mut(index)
            {
                *slot = value;
            }
        }
        filtered
    }
}

impl<R: TableReader, M: ColumnMapping> TableReader for ColumnFilter<R, M> {
    fn core(&self) -> &ReaderCore {
        self.reader.core()
    }

    fn core_mut(&mut self) -> &mut ReaderCore {
        self.reader.core_mut()
    }

    fn open(&mut self) -> Result<()> {
        self.reader.open()?;
        self.row_index = 0;
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.reader.reset()?;
        self.row_index = 0;
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool> {
        self.reader.has_next()
    }

    fn next_row(&mut self) -> Result<Row> {
        let row = self.reader.next_row()?;
        self.row_index += 1;
        Ok(self.filter(row))
    }

    fn header_row(&mut self) -> Result<Option<Row>> {
        Ok(self.reader.header_row()?.map(|row| self.filter(row)))
    }

    fn close(&mut self) -> Result<()> {
        self.reader.close()
    }

    fn line_count(&self) -> usize {
        self.reader.line_count()
    }

    fn row_count(&self) -> usize {
        self.reader.row_count()
    }

    fn column_index(&mut self, name: &str) -> Result<Option<usize>> {
        Ok(self
            .reader
            .column_index(name)?
            .and_then(|index| self.mapping.filtered_index(index)))
    }
}
