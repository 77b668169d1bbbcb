//! Delimited text (CSV dialect) reading and writing.
//!
//! The dialect defaults to `;` separators, `"` delimiters, `\n` row
//! separators and `#`, `;`, `!` as comment characters at the start of a line.
//! Delimited values may span lines; a doubled delimiter is a literal one.
//!
//! ```
//! use tabula::common::SharedBuffer;
//! use tabula::csv::{CsvReader, CsvWriter};
//! use tabula::reader::TableReader;
//! use tabula::types::text_row;
//! use tabula::writer::TableWriter;
//!
//! # fn main() -> tabula::Result<()> {
//! let buffer = SharedBuffer::new();
//! let mut writer = CsvWriter::new(buffer.sink());
//! writer.print_row(&text_row(["Name", "Note"]))?;
//! writer.print_row(&text_row(["Alice", "says \"hi\"; bye"]))?;
//! writer.close()?;
//!
//! let mut reader = CsvReader::from_text(&buffer.to_string_lossy());
//! let row = reader.next_row()?;
//! assert_eq!(row[1].as_ref().map(|v| v.to_string()).as_deref(), Some("says \"hi\"; bye"));
//! # Ok(())
//! # }
//! ```

pub mod config;
mod lines;
pub mod reader;
mod tokenizer;
pub mod writer;

#[cfg(test)]
mod tests;

pub use config::CsvConfig;
pub use reader::CsvReader;
pub use writer::CsvWriter;
