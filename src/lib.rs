//! Tabula - streaming readers and writers for tabular data
//!
//! Every table source is read through the same pull-model [`TableReader`]
//! and every sink is written through the same [`TableWriter`], so rows can
//! be moved between formats without format-specific code.
//!
//! # Features
//!
//! - **Delimited text**: configurable separator, delimiter and comment characters,
//!   multi-line values, charsets and byte order marks
//! - **XML records**: rows parsed on a background worker, handed over through a
//!   bounded queue
//! - **XLSX workbooks**: sheet selection, typed cells, de-duplicated cell styles
//! - **HTML tables**: output built from header/footer templates
//! - **In-memory tables**: query-style result sets and selectable table models
//! - **Filters**: column reordering and row selection as reader decorators
//! - **Records**: typed structs written to and read from any format
//!
//! # Example - Converting between formats
//!
//! ```
//! use tabula::common::SharedBuffer;
//! use tabula::csv::CsvReader;
//! use tabula::writer::TableWriter;
//! use tabula::xml::XmlWriter;
//!
//! # fn main() -> tabula::Result<()> {
//! let mut reader = CsvReader::from_text("Name;Age\nAlice;30\nBob;25\n");
//! let buffer = SharedBuffer::new();
//! let mut writer = XmlWriter::new(buffer.sink());
//! let rows = tabula::util::copy(&mut reader, &mut writer, true)?;
//! writer.close()?;
//! assert_eq!(rows, 2);
//! assert!(buffer.to_string_lossy().contains("Alice"));
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Typed columns
//!
//! ```
//! use tabula::csv::CsvReader;
//! use tabula::reader::TableReader;
//! use tabula::types::Value;
//!
//! # fn main() -> tabula::Result<()> {
//! let mut reader = CsvReader::from_text("Item;Qty\nbolt;12\n");
//! reader.set_column_type(1, "int");
//! let row = reader.next_row()?;
//! assert_eq!(row[1], Some(Value::Int(12)));
//! # Ok(())
//! # }
//! ```

/// Errors, I/O media and escaping shared by all formats
pub mod common;

/// Column values and their text conversion
pub mod types;

pub mod reader;
pub mod writer;

/// Delimited text
pub mod csv;

/// XML records
pub mod xml;

/// XLSX workbooks
pub mod sheet;

/// HTML tables
pub mod html;

pub mod memory;
pub mod filter;
pub mod bean;
pub mod factory;
pub mod util;

// Re-export commonly used types for convenience
pub use common::{Error, InputSource, OutputSink, Result};
pub use reader::TableReader;
pub use types::{Row, Value};
pub use writer::TableWriter;
