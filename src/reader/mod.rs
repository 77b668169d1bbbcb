//! The pull-model table reader abstraction.
//!
//! Every source (delimited text, XML records, workbooks, result sets,
//! in-memory tables, filters) implements [`TableReader`]. Shared state lives
//! in an embedded [`ReaderCore`], exposed through [`TableReader::core`] so the
//! provided methods work for every implementation.
//!
//! # Example
//!
//! ```
//! use tabula::csv::CsvReader;
//! use tabula::reader::TableReader;
//!
//! # fn main() -> tabula::Result<()> {
//! let mut reader = CsvReader::from_text("Name;Age\nAlice;30\n");
//! assert_eq!(reader.column_index("age")?, Some(1));
//! while reader.has_next()? {
//!     let row = reader.next_row()?;
//!     println!("{:?}", row);
//! }
//! reader.close()?;
//! # Ok(())
//! # }
//! ```

pub mod comment;
pub mod state;

pub use comment::{CallbackId, Comment, CommentCallback, CommentDispatcher};
pub use state::{Counters, HeaderState, Lifecycle, ReaderCore};

use crate::common::{Error, Result};
use crate::types::{ConversionRegistry, Row, Value};

/// Iterator-style access to a table's rows.
pub trait TableReader {
    fn core(&self) -> &ReaderCore;

    fn core_mut(&mut self) -> &mut ReaderCore;

    /// Re-initialize counters and header state without rewinding the medium.
    fn open(&mut self) -> Result<()>;

    /// Rewind the medium and start over.
    ///
    /// Fails with an I/O error of kind `Unsupported` when the medium cannot
    /// be rewound.
    fn reset(&mut self) -> Result<()>;

    /// Whether another data row is available.
    fn has_next(&mut self) -> Result<bool>;

    /// The next data row. Fails with [`Error::NoMoreRows`] once exhausted.
    ///
    /// Never returns the header row.
    fn next_row(&mut self) -> Result<Row>;

    /// The header row, parsed on first access; `None` without a header row.
    fn header_row(&mut self) -> Result<Option<Row>>;

    /// Release the medium. Safe to call repeatedly.
    fn close(&mut self) -> Result<()>;

    fn has_header_row(&self) -> bool {
        self.core().has_header_row()
    }

    fn set_has_header_row(&mut self, has_header_row: bool) {
        self.core_mut().set_has_header_row(has_header_row);
    }

    fn minimum_column_count(&self) -> usize {
        self.core().minimum_column_count()
    }

    /// Every returned row is padded with nulls to at least `count` columns.
    fn set_minimum_column_count(&mut self, count: usize) {
        self.core_mut().set_minimum_column_count(count);
    }

    fn line_count(&self) -> usize {
        self.core().counters().lines()
    }

    fn row_count(&self) -> usize {
        self.core().counters().rows()
    }

    fn register_comment_callback(&mut self, callback: CommentCallback) -> CallbackId {
        self.core_mut().comments_mut().register(callback)
    }

    fn unregister_comment_callback(&mut self, id: CallbackId) -> bool {
        self.core_mut().comments_mut().unregister(id)
    }

    fn registry_mut(&mut self) -> &mut ConversionRegistry {
        self.core_mut().registry_mut()
    }

    /// Parse values of `column` with the handler registered for `type_name`.
    fn set_column_type(&mut self, column: usize, type_name: &str) {
        self.core_mut().set_column_type(column, type_name);
    }

    /// Case-insensitive position of `name` in the header row.
    fn column_index(&mut self, name: &str) -> Result<Option<usize>> {
        if !self.has_header_row() {
            return Err(Error::NoHeaderRow);
        }
        let Some(header) = self.header_row()? else {
            return Ok(None);
        };
        let wanted = name.to_lowercase();
        Ok(header.iter().position(|column| {
            column
                .as_ref()
                .is_some_and(|v| v.to_string().to_lowercase() == wanted)
        }))
    }

    /// The value of the column called `name` in `row`.
    fn get<'r>(&mut self, name: &str, row: &'r [Option<Value>]) -> Result<Option<&'r Value>> {
        Ok(self
            .column_index(name)?
            .and_then(|index| row.get(index))
            .and_then(Option::as_ref))
    }

    /// Borrowing iterator over the remaining rows.
    fn rows(&mut self) -> Rows<'_, Self>
    where
        Self: Sized,
    {
        Rows::new(self)
    }
}

impl<R: TableReader + ?Sized> TableReader for Box<R> {
    fn core(&self) -> &ReaderCore {
        (**self).core()
    }

    fn core_mut(&mut self) -> &mut ReaderCore {
        (**self).core_mut()
    }

    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }

    fn has_next(&mut self) -> Result<bool> {
        (**self).has_next()
    }

    fn next_row(&mut self) -> Result<Row> {
        (**self).next_row()
    }

    fn header_row(&mut self) -> Result<Option<Row>> {
        (**self).header_row()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn line_count(&self) -> usize {
        (**self).line_count()
    }

    fn row_count(&self) -> usize {
        (**self).row_count()
    }

    fn column_index(&mut self, name: &str) -> Result<Option<usize>> {
        (**self).column_index(name)
    }
}

/// Iterator over a reader's remaining rows.
///
/// Stops after the first error.
pub struct Rows<'a, R: TableReader + ?Sized> {
    reader: &'a mut R,
    failed: bool,
}

impl<'a, R: TableReader + ?Sized> Rows<'a, R> {
    pub fn new(reader: &'a mut R) -> Self {
        Self {
            reader,
            failed: false,
        }
    }
}

impl<R: TableReader + ?Sized> Iterator for Rows<'_, R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let next = match self.reader.has_next() {
            Ok(true) => self.reader.next_row(),
            Ok(false) => return None,
            Err(e) => Err(e),
        };
        self.failed = next.is_err();
        Some(next)
    }
}

/// Drain every remaining row of `reader`.
pub fn read_all<R: TableReader + ?Sized>(reader: &mut R) -> Result<Vec<Row>> {
    Rows::new(reader).collect()
}
