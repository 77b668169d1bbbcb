//! Cell values, A1 references and Excel serial dates.

use super::style::StyleId;
use crate::types::Value;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Content of a single worksheet cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Blank,
    String(String),
    Number(f64),
    Bool(bool),
    /// A number shown with a date format.
    Date(NaiveDateTime),
    /// An error literal such as `#DIV/0!`.
    Error(String),
    /// A formula and the result last computed by the application that saved it.
    Formula {
        formula: String,
        cached: Option<Box<CellValue>>,
    },
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Blank)
    }

    /// The table value of this cell.
    ///
    /// Formulas are not evaluated: the cached result is used, or the formula
    /// text when nothing was cached.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            CellValue::Blank => None,
            CellValue::String(s) => Some(Value::String(s.clone())),
            CellValue::Number(n) => Some(Value::Double(*n)),
            CellValue::Bool(b) => Some(Value::Bool(*b)),
            CellValue::Date(d) => Some(Value::Date(*d)),
            CellValue::Error(e) => Some(Value::String(e.clone())),
            CellValue::Formula { formula, cached } => match cached.as_deref() {
                Some(cached) => cached.to_value(),
                None => Some(Value::String(formula.clone())),
            },
        }
    }
}

impl From<&Value> for CellValue {
    /// Native cell types where the workbook has one, text otherwise.
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => CellValue::String(s.clone()),
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Byte(v) => CellValue::Number(f64::from(*v)),
            Value::Short(v) => CellValue::Number(f64::from(*v)),
            Value::Int(v) => CellValue::Number(f64::from(*v)),
            Value::Long(v) => CellValue::Number(*v as f64),
            Value::Float(v) => CellValue::Number(f64::from(*v)),
            Value::Double(v) => CellValue::Number(*v),
            Value::Date(d) => CellValue::Date(*d),
            Value::Char(_) | Value::Bytes(_) => CellValue::String(value.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(d: NaiveDateTime) -> Self {
        CellValue::Date(d)
    }
}

/// A cell: its value and the workbook style it is displayed with.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: CellValue,
    pub style: StyleId,
}

impl Cell {
    pub fn new(value: impl Into<CellValue>) -> Self {
        Self {
            value: value.into(),
            style: StyleId::DEFAULT,
        }
    }

    pub fn with_style(mut self, style: StyleId) -> Self {
        self.style = style;
        self
    }
}

/// Letters of a zero-based column index (`0` is `A`, `26` is `AA`).
pub fn column_letters(column: usize) -> String {
    let mut letters = Vec::new();
    let mut n = column + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// A1-style reference of zero-based coordinates.
pub fn cell_reference(row: usize, column: usize) -> String {
    let mut reference = column_letters(column);
    let mut buffer = itoa::Buffer::new();
    reference.push_str(buffer.format(row + 1));
    reference
}

/// Zero-based `(row, column)` of an A1-style reference. `$` markers are ignored.
pub fn parse_reference(reference: &str) -> Option<(usize, usize)> {
    let reference = reference.trim().replace('$', "");
    let split = reference
        .find(|c: char| c.is_ascii_digit())
        .filter(|&i| i > 0)?;
    let (letters, digits) = reference.split_at(split);

    let mut column = 0usize;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        column = column
            .checked_mul(26)?
            .checked_add((c.to_ascii_uppercase() as u8 - b'A') as usize + 1)?;
    }
    let row: usize = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, column - 1))
}

fn serial_epoch() -> NaiveDateTime {
    // Day 0 sits one day before 1899-12-31 so that serial 60 is the
    // non-existent 1900-02-29 that Excel keeps for Lotus compatibility.
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN)
}

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Excel serial number (1900 date system) of a date-time.
pub fn to_serial(date: NaiveDateTime) -> f64 {
    let elapsed = date - serial_epoch();
    elapsed.num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// Date-time of an Excel serial number, rounded to the millisecond.
pub fn from_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let millis = (serial * MILLIS_PER_DAY).round() as i64;
    serial_epoch().checked_add_signed(Duration::milliseconds(millis))
}

/// Shortest text of a number as stored in a worksheet part.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        let mut buffer = itoa::Buffer::new();
        buffer.format(n as i64).to_string()
    } else {
        let mut buffer = ryu::Buffer::new();
        buffer.format(n).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn test_references() {
        assert_eq!(cell_reference(0, 0), "A1");
        assert_eq!(cell_reference(9, 27), "AB10");
        assert_eq!(parse_reference("A1"), Some((0, 0)));
        assert_eq!(parse_reference("ab10"), Some((9, 27)));
        assert_eq!(parse_reference("$C$3"), Some((2, 2)));
        assert_eq!(parse_reference("12"), None);
        assert_eq!(parse_reference("A0"), None);
        assert_eq!(parse_reference("A-1"), None);
    }

    #[test]
    fn test_serial_dates() {
        assert_eq!(to_serial(datetime(1900, 3, 1, 0, 0)), 61.0);
        assert_eq!(to_serial(datetime(2024, 2, 29, 0, 0)), 45351.0);
        assert_eq!(to_serial(datetime(2024, 2, 29, 12, 0)), 45351.5);
        assert_eq!(from_serial(45351.5), Some(datetime(2024, 2, 29, 12, 0)));
        assert_eq!(from_serial(-1.0), None);
        assert_eq!(from_serial(f64::NAN), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(0.25), "0.25");
    }

    #[test]
    fn test_formula_value_uses_cache() {
        let cell = CellValue::Formula {
            formula: "A1+1".to_string(),
            cached: Some(Box::new(CellValue::Number(3.0))),
        };
        assert_eq!(cell.to_value(), Some(Value::Double(3.0)));
        let uncached = CellValue::Formula {
            formula: "A1+1".to_string(),
            cached: None,
        };
        assert_eq!(uncached.to_value(), Some(Value::from("A1+1")));
        assert!(!uncached.is_blank());
    }
}
