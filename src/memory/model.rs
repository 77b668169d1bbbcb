//! Grid-shaped tables with an optional row selection.

use crate::common::{Error, Result};
use crate::reader::{Lifecycle, ReaderCore, TableReader};
use crate::types::{Row, Value};
use tracing::debug;

const KIND: &str = "Table model reader";

/// Random access to a grid of values, as held by a table view.
pub trait TableModel {
    fn row_count(&self) -> usize;

    fn column_count(&self) -> usize;

    fn value_at(&self, row: usize, column: usize) -> Option<Value>;

    /// Heading of `column`; `None` when the column has none.
    fn column_name(&self, column: usize) -> Option<String>;

    /// Indices of the selected rows in ascending order.
    fn selected_rows(&self) -> Vec<usize> {
        Vec::new()
    }
}

impl<M: TableModel + ?Sized> TableModel for &M {
    fn row_count(&self) -> usize {
        (**self).row_count()
    }

    fn column_count(&self) -> usize {
        (**self).column_count()
    }

    fn value_at(&self, row: usize, column: usize) -> Option<Value> {
        (**self).value_at(row, column)
    }

    fn column_name(&self, column: usize) -> Option<String> {
        (**self).column_name(column)
    }

    fn selected_rows(&self) -> Vec<usize> {
        (**self).selected_rows()
    }
}

/// [`TableModel`] over owned rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VecTableModel {
    columns: Vec<Option<String>>,
    rows: Vec<Row>,
    selection: Vec<usize>,
}

impl VecTableModel {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(|c| Some(c.into())).collect(),
            rows: Vec::new(),
            selection: Vec::new(),
        }
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn set_column_name(&mut self, column: usize, name: Option<String>) {
        if column >= self.columns.len() {
            self.columns.resize(column + 1, None);
        }
        self.columns[column] = name;
    }

    /// Replace the selection. Indices past the last row are dropped.
    pub fn select(&mut self, rows: impl IntoIterator<Item = usize>) {
        let count = self.rows.len();
        self.selection = rows.into_iter().filter(|&r| r < count).collect();
        self.selection.sort_unstable();
        self.selection.dedup();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }
}

impl TableModel for VecTableModel {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn value_at(&self, row: usize, column: usize) -> Option<Value> {
        self.rows.get(row)?.get(column)?.clone()
    }

    fn column_name(&self, column: usize) -> Option<String> {
        self.columns.get(column).cloned().flatten()
    }

    fn selected_rows(&self) -> Vec<usize> {
        self.selection.clone()
    }
}

/// Reads the rows of a [`TableModel`].
///
/// With `selected_only` set (the default) only the selected rows are read,
/// unless nothing is selected, in which case every row is. The header comes
/// from the column names.
#[derive(Debug)]
pub struct TableModelReader<M: TableModel> {
    core: ReaderCore,
    model: M,
    selected_only: bool,
    indices: Vec<usize>,
    position: usize,
}

impl<M: TableModel> TableModelReader<M> {
    pub fn new(model: M) -> Self {
        Self::with_selected_only(model, true)
    }

    pub fn with_selected_only(model: M, selected_only: bool) -> Self {
        let mut reader = Self {
            core: ReaderCore::new(KIND, true),
            model,
            selected_only,
            indices: Vec::new(),
            position: 0,
        };
        reader.collect_indices();
        reader
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn selected_only(&self) -> bool {
        self.selected_only
    }

    /// Rows of the model this reader walks through.
    pub fn row_indices(&self) -> &[usize] {
        &self.indices
    }

    fn collect_indices(&mut self) {
        let selected = if self.selected_only {
            self.model.selected_rows()
        } else {
            Vec::new()
        };
        self.indices = if selected.is_empty() {
            (0..self.model.row_count()).collect()
        } else {
            selected
        };
        self.position = 0;
    }

    fn ensure_header(&mut self) {
        if !self.core.has_header_row() || !self.core.header().is_pending() {
            return;
        }
        let names = (0..self.model.column_count())
            .map(|column| self.model.column_name(column))
            .collect();
        let header = self.core.header_from_text(names);
        self.core.header_mut().store(Some(header));
    }
}

impl<M: TableModel> TableReader for TableModelReader<M> {
    fn core(&self) -> &ReaderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ReaderCore {
        &mut self.core
    }

    fn open(&mut self) -> Result<()> {
        self.core.restart()
    }

    /// Start over, picking up changes to the model and its selection.
    fn reset(&mut self) -> Result<()> {
        self.open()?;
        self.collect_indices();
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool> {
        self.core.ensure_open()?;
        let more = self.position < self.indices.len();
        if !more {
            self.core.set_state(Lifecycle::Exhausted);
        }
        Ok(more)
    }

    fn next_row(&mut self) -> Result<Row> {
        if !self.has_next()? {
            return Err(Error::NoMoreRows);
        }
        self.ensure_header();
        let index = self.indices[self.position];
        self.position += 1;
        let values = (0..self.model.column_count())
            .map(|column| self.model.value_at(index, column))
            .collect();
        let row = self.core.retype_row(values)?;
        self.core.counters_mut().add_line();
        self.core.counters_mut().add_row();
        Ok(row)
    }

    fn header_row(&mut self) -> Result<Option<Row>> {
        self.core.ensure_open()?;
        if !self.core.has_header_row() {
            return Ok(None);
        }
        self.ensure_header();
        Ok(self.core.header().row().cloned())
    }

    fn close(&mut self) -> Result<()> {
        if self.core.is_closed() {
            return Ok(());
        }
        self.core.set_state(Lifecycle::Closed);
        debug!(rows = self.core.counters().rows(), "Table model reader closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_all;

    fn model() -> VecTableModel {
        VecTableModel::new(["Name", "Score"]).with_rows(vec![
            vec![Some(Value::from("a")), Some(Value::Int(1))],
            vec![Some(Value::from("b")), Some(Value::Int(2))],
            vec![Some(Value::from("c"))],
        ])
    }

    fn names(rows: &[Row]) -> Vec<String> {
        rows.iter()
            .map(|row| row[0].as_ref().map(|v| v.to_string()).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_all_rows_without_selection() {
        let mut reader = TableModelReader::new(model());
        let rows = read_all(&mut reader).unwrap();
        assert_eq!(names(&rows), ["a", "b", "c"]);
        assert_eq!(rows[2], vec![Some(Value::from("c")), None]);
        assert_eq!(reader.row_count(), 3);
    }

    #[test]
    fn test_selected_rows_only() {
        let mut model = model();
        model.select([2, 0, 7]);
        let mut reader = TableModelReader::new(&model);
        assert_eq!(reader.row_indices(), [0, 2]);
        assert_eq!(names(&read_all(&mut reader).unwrap()), ["a", "c"]);

        let mut reader = TableModelReader::with_selected_only(&model, false);
        assert_eq!(read_all(&mut reader).unwrap().len(), 3);
    }

    #[test]
    fn test_header_and_lookup() {
        let mut reader = TableModelReader::new(model());
        assert_eq!(
            reader.header_row().unwrap(),
            Some(vec![Some(Value::from("Name")), Some(Value::from("Score"))])
        );
        let row = reader.next_row().unwrap();
        assert_eq!(reader.get("score", &row).unwrap(), Some(&Value::Int(1)));
    }

    #[test]
    fn test_reset_and_close() {
        let mut reader = TableModelReader::new(model());
        read_all(&mut reader).unwrap();
        assert!(matches!(reader.next_row(), Err(Error::NoMoreRows)));
        reader.reset().unwrap();
        assert_eq!(reader.next_row().unwrap()[0], Some(Value::from("a")));

        reader.close().unwrap();
        assert!(reader.has_next().is_err());
        assert!(reader.reset().is_err());
    }
}
