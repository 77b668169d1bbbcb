//! Reader decorators that reshape a table on the fly.
//!
//! [`ColumnFilter`] rearranges or drops columns, [`RowFilter`] drops rows.
//! Both wrap any [`TableReader`](crate::reader::TableReader) and are readers
//! themselves, so they stack.
//!
//! ```
//! use tabula::csv::CsvReader;
//! use tabula::filter::{ColumnFilter, IndexOrder, IndexRowFilter, RowFilter};
//! use tabula::reader::{TableReader, read_all};
//!
//! # fn main() -> tabula::Result<()> {
//! let csv = CsvReader::from_text("A;B;C\n1;2;3\n4;5;6\n7;8;9\n");
//! let rows = RowFilter::new(csv, IndexRowFilter::new([0, 2]));
//! let mut reader = ColumnFilter::new(rows, IndexOrder::new([2, 0]));
//! assert_eq!(reader.column_index("a")?, Some(1));
//! assert_eq!(read_all(&mut reader)?.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod column;
pub mod row;


pub use column::{ColumnFilter, ColumnMapping, IndexOrder};
pub use row::{IndexRowFilter, PredicateFn, RowFilter, RowPredicate};
