//! Rows as typed records.
//!
//! A record type describes its attributes once through [`Bean::fields`]: a
//! name, a getter producing the column value and a setter consuming it.
//! [`BeanWriter`] turns records into rows and [`BeanReader`] turns rows back
//! into records.
//!
//! ```
//! use tabula::bean::{Bean, BeanReader, BeanWriter, Field};
//! use tabula::common::{InputSource, SharedBuffer};
//! use tabula::csv::{CsvReader, CsvWriter};
//! use tabula::types::Value;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Person {
//!     name: String,
//!     age: i64,
//! }
//!
//! impl Bean for Person {
//!     fn fields() -> Vec<Field<Self>> {
//!         vec![
//!             Field::<Self>::new("name", |p| Some(Value::from(p.name.as_str())), |p, v| {
//!                 p.name = v.map(|v| v.to_string()).unwrap_or_default();
//!                 Ok(())
//!             }),
//!             Field::<Self>::new("age", |p| Some(Value::Long(p.age)), |p, v| {
//!                 p.age = tabula::bean::parse_i64("age", v)?.unwrap_or_default();
//!                 Ok(())
//!             }),
//!         ]
//!     }
//! }
//!
//! # fn main() -> tabula::Result<()> {
//! let buffer = SharedBuffer::new();
//! let mut writer = BeanWriter::new(CsvWriter::new(buffer.sink()), true);
//! writer.write_beans(&[Person { name: "Alice".into(), age: 30 }])?;
//! writer.close()?;
//! assert_eq!(buffer.to_string_lossy(), "name;age\nAlice;30\n");
//!
//! let csv = CsvReader::from_source(InputSource::from_bytes(buffer.contents()));
//! let people = BeanReader::<Person, _>::new(csv).collect::<tabula::Result<Vec<_>>>()?;
//! assert_eq!(people, [Person { name: "Alice".into(), age: 30 }]);
//! # Ok(())
//! # }
//! ```

pub mod reader;
pub mod writer;

pub use reader::BeanReader;
pub use writer::BeanWriter;

use crate::common::{Error, Result};
use crate::types::Value;
use std::fmt;

/// Reads an attribute of a record as a column value.
pub type Getter<T> = fn(&T) -> Option<Value>;

/// Stores a column value into an attribute of a record.
pub type Setter<T> = fn(&mut T, Option<Value>) -> Result<()>;

/// Descriptor of one record attribute.
pub struct Field<T> {
    pub name: &'static str,
    pub get: Getter<T>,
    pub set: Setter<T>,
}

impl<T> Field<T> {
    pub fn new(name: &'static str, get: Getter<T>, set: Setter<T>) -> Self {
        Self { name, get, set }
    }

    /// Whether the column called `name` addresses this attribute.
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Field<T> {}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field").field("name", &self.name).finish_non_exhaustive()
    }
}

/// A record type that can be written to and read from tables.
pub trait Bean: Sized {
    /// Attribute descriptors, in the default column order.
    fn fields() -> Vec<Field<Self>>;
}

/// Index of the field called `name`, ignoring case.
pub(crate) fn find_field<T>(fields: &[Field<T>], name: &str) -> Option<usize> {
    fields.iter().position(|field| field.matches(name))
}

/// Integer value of a column, parsing text when the reader delivered strings.
pub fn parse_i64(attribute: &str, value: Option<Value>) -> Result<Option<i64>> {
    match value {
        None => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|e| Error::Bean(format!("{}: '{}' is not an integer ({})", attribute, text, e))),
        Some(other) => other
            .as_i64()
            .map(Some)
            .ok_or_else(|| Error::Bean(format!("{}: {} is not an integer", attribute, other.type_name()))),
    }
}

/// Real value of a column, parsing text when the reader delivered strings.
pub fn parse_f64(attribute: &str, value: Option<Value>) -> Result<Option<f64>> {
    match value {
        None => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| Error::Bean(format!("{}: '{}' is not a number ({})", attribute, text, e))),
        Some(other) => other
            .as_f64()
            .map(Some)
            .ok_or_else(|| Error::Bean(format!("{}: {} is not a number", attribute, other.type_name()))),
    }
}

/// Boolean value of a column; text is read the way the `bool` handler reads it.
pub fn parse_bool(attribute: &str, value: Option<Value>) -> Result<Option<bool>> {
    match value {
        None => Ok(None),
        Some(value) => value
            .as_bool()
            .map(Some)
            .ok_or_else(|| Error::Bean(format!("{}: '{}' is not a boolean", attribute, value))),
    }
}
