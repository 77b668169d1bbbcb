//! Date conversion with shape-checked multi-pattern parsing.

use super::handlers::TypeConversionHandler;
use super::value::{DEFAULT_DATE_DISPLAY, Value, type_names};
use crate::common::Result;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt::Write;

/// Patterns tried, in order, when parsing dates.
pub const DEFAULT_PARSE_PATTERNS: [&str; 6] = [
    "%d/%m/%Y", "%d.%m.%Y", "%d/%m/%y", "%d.%m.%y", "%Y/%m/%d", "%Y.%m.%d",
];

#[derive(Debug, Clone)]
struct Pattern {
    format: String,
    /// The pattern rendered for a reference date with two-digit fields.
    shape: Vec<char>,
}

impl Pattern {
    fn new(format: &str) -> Option<Self> {
        let reference = NaiveDate::from_ymd_opt(2000, 11, 22)?.and_hms_opt(10, 11, 12)?;
        let mut rendered = String::new();
        write!(rendered, "{}", reference.format(format)).ok()?;
        Some(Self {
            format: format.to_string(),
            shape: rendered.chars().collect(),
        })
    }

    /// Same length, and every separator sits where the pattern puts one.
    fn fits(&self, text: &str) -> bool {
        let mut count = 0;
        for (expected, actual) in self.shape.iter().zip(text.chars()) {
            count += 1;
            if expected.is_alphanumeric() {
                if !actual.is_alphanumeric() {
                    return false;
                }
            } else if *expected != actual {
                return false;
            }
        }
        count == self.shape.len() && text.chars().count() == count
    }

    fn parse(&self, text: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(text, &self.format)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(text, &self.format)
                    .ok()
                    .map(|d| d.and_time(NaiveTime::MIN))
            })
    }
}

/// Converts between text and [`Value::Date`].
///
/// Parsing never fails: text matching no pattern comes back as a trimmed
/// [`Value::String`].
#[derive(Debug, Clone)]
pub struct DateHandler {
    patterns: Vec<Pattern>,
    print_format: String,
}

impl Default for DateHandler {
    fn default() -> Self {
        Self::with_patterns(DEFAULT_PARSE_PATTERNS)
    }
}

impl DateHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom chrono format strings. The first one also becomes the
    /// print format. Invalid format strings are dropped.
    pub fn with_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<Pattern> = patterns
            .into_iter()
            .filter_map(|p| Pattern::new(p.as_ref()))
            .collect();
        let print_format = patterns
            .first()
            .map(|p| p.format.clone())
            .unwrap_or_else(|| DEFAULT_DATE_DISPLAY.to_string());
        Self {
            patterns,
            print_format,
        }
    }

    /// Override the print format.
    pub fn with_print_format(mut self, format: impl Into<String>) -> Self {
        self.print_format = format.into();
        self
    }

    pub fn print_format(&self) -> &str {
        &self.print_format
    }

    pub fn parse_date(&self, text: &str) -> Option<NaiveDateTime> {
        let text = text.trim();
        self.patterns
            .iter()
            .filter(|p| p.fits(text))
            .find_map(|p| p.parse(text))
    }
}

impl TypeConversionHandler for DateHandler {
    fn type_names(&self) -> &[&'static str] {
        &[type_names::DATE, "datetime"]
    }

    fn parse(&self, text: &str) -> Result<Value> {
        Ok(match self.parse_date(text) {
            Some(date) => Value::Date(date),
            None => Value::String(text.trim().to_string()),
        })
    }

    fn format(&self, value: &Value) -> String {
        match value {
            Value::Date(date) => {
                let mut out = String::new();
                match write!(out, "{}", date.format(&self.print_format)) {
                    Ok(()) => out,
                    Err(_) => value.to_string(),
                }
            },
            other => other.to_string(),
        }
    }
}
