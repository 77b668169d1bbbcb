//! Typed column values.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

/// Canonical type names, used as conversion registry keys.
pub mod type_names {
    pub const STRING: &str = "string";
    pub const BOOL: &str = "bool";
    pub const BYTE: &str = "i8";
    pub const CHAR: &str = "char";
    pub const SHORT: &str = "i16";
    pub const INT: &str = "i32";
    pub const LONG: &str = "i64";
    pub const FLOAT: &str = "f32";
    pub const DOUBLE: &str = "f64";
    pub const DATE: &str = "date";
    pub const BYTES: &str = "bytes";
}

/// Display format used for dates when no handler is registered.
pub const DEFAULT_DATE_DISPLAY: &str = "%Y-%m-%d %H:%M:%S";

/// A single non-null column value.
///
/// Null is represented by `None` in a [`Row`] slot, never by a variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Bool(bool),
    Byte(i8),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Date(NaiveDateTime),
    /// Raw, untyped content such as a binary result set column.
    Bytes(Vec<u8>),
}

/// One row of column values; `None` is a null column.
pub type Row = Vec<Option<Value>>;

impl Value {
    /// The canonical type name selecting this value's conversion handler.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => type_names::STRING,
            Value::Bool(_) => type_names::BOOL,
            Value::Byte(_) => type_names::BYTE,
            Value::Char(_) => type_names::CHAR,
            Value::Short(_) => type_names::SHORT,
            Value::Int(_) => type_names::INT,
            Value::Long(_) => type_names::LONG,
            Value::Float(_) => type_names::FLOAT,
            Value::Double(_) => type_names::DOUBLE,
            Value::Date(_) => type_names::DATE,
            Value::Bytes(_) => type_names::BYTES,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Value::Byte(_) | Value::Short(_) | Value::Int(_) | Value::Long(_)
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, Value::Float(_) | Value::Double(_))
    }

    /// Integer view of the value. Strings are parsed after trimming.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(i64::from(*v)),
            Value::Short(v) => Some(i64::from(*v)),
            Value::Int(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Floating point view of the value. Strings are parsed after trimming.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            Value::String(s) => s.trim().parse().ok(),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Char(c) => write!(f, "{}", c),
            Value::Short(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Date(d) => write!(f, "{}", d.format(DEFAULT_DATE_DISPLAY)),
            Value::Bytes(b) => f.write_str(&STANDARD.encode(b)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::Byte(v)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Short(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(d: NaiveDateTime) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d.and_time(chrono::NaiveTime::MIN))
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

/// Build a row of non-null string values.
///
/// ```
/// use tabula::types::{text_row, Value};
/// assert_eq!(text_row(["a", "b"]), vec![Some(Value::from("a")), Some(Value::from("b"))]);
/// ```
pub fn text_row<I, S>(columns: I) -> Row
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    columns
        .into_iter()
        .map(|c| Some(Value::String(c.into())))
        .collect()
}

/// Render a row's values with `Display`, nulls as `None`.
pub fn row_to_strings(row: &[Option<Value>]) -> Vec<Option<String>> {
    row.iter()
        .map(|c| c.as_ref().map(ToString::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Value::from(1i32).type_name(), "i32");
        assert_eq!(Value::from("x").type_name(), "string");
        assert_eq!(Value::Bytes(vec![1]).type_name(), "bytes");
    }

    #[test]
    fn test_display() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(Value::Date(date).to_string(), "2024-03-01 08:30:00");
        assert_eq!(Value::Bytes(b"hi".to_vec()).to_string(), "aGk=");
        assert_eq!(Value::Double(2.5).to_string(), "2.5");
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(Value::from(" 42 ").as_i64(), Some(42));
        assert_eq!(Value::Short(7).as_f64(), Some(7.0));
        assert_eq!(Value::from("TRUE").as_bool(), Some(true));
        assert!(Value::Long(1).is_integer());
        assert!(!Value::from("1").is_numeric());
    }
}
