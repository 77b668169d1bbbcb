//! XLSX workbooks as tables.
//!
//! [`SpreadsheetReader`] reads the rows of one worksheet; [`SpreadsheetWriter`]
//! fills a worksheet of an in-memory [`Workbook`] and saves it on close. Both
//! work on the same model, which can also be used directly.
//!
//! ```
//! use tabula::common::{InputSource, SharedBuffer};
//! use tabula::reader::TableReader;
//! use tabula::sheet::{DefaultCellFormatter, SpreadsheetReader, SpreadsheetWriter};
//! use tabula::types::Value;
//! use tabula::writer::TableWriter;
//!
//! # fn main() -> tabula::Result<()> {
//! let buffer = SharedBuffer::new();
//! let mut writer = SpreadsheetWriter::new(buffer.sink());
//! writer.set_formatter(DefaultCellFormatter::new().with_emphasized_first_row(true));
//! writer.print_row(&[Some(Value::from("Name")), Some(Value::from("Age"))])?;
//! writer.print_row(&[Some(Value::from("Alice")), Some(Value::Int(30))])?;
//! writer.close()?;
//!
//! let mut reader = SpreadsheetReader::from_source(InputSource::from_bytes(buffer.contents()));
//! assert_eq!(reader.column_index("age")?, Some(1));
//! let row = reader.next_row()?;
//! assert_eq!(row[1], Some(Value::Double(30.0)));
//! # Ok(())
//! # }
//! ```

pub mod cell;
pub mod config;
pub mod formatter;
pub mod reader;
pub mod style;
pub mod workbook;
pub mod writer;
mod xlsx;

#[cfg(test)]
mod tests;

pub use cell::{Cell, CellValue, cell_reference, column_letters, from_serial, parse_reference, to_serial};
pub use config::{SheetSelector, SpreadsheetConfig};
pub use formatter::{CellContext, CellFormatter, DefaultCellFormatter};
pub use reader::SpreadsheetReader;
pub use style::{
    Border, BorderLine, BorderStyle, Color, FillPattern, FontDescription, HorizontalAlignment,
    StyleDescription, StyleId, StyleTable,
};
pub use workbook::{Workbook, Worksheet};
pub use writer::SpreadsheetWriter;
