//! Delimited text dialect configuration.

use crate::common::{BomKind, Error, Result};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

/// Configuration shared by [`super::CsvReader`] and [`super::CsvWriter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvConfig {
    /// Column separator character
    pub separator: char,
    /// Character wrapping values that contain separators or newlines
    pub delimiter: char,
    /// Characters starting a comment line when found in column 0
    pub comment_chars: String,
    /// Skip empty lines instead of returning all-null rows
    pub ignore_empty_lines: bool,
    /// Whether the first row holds column names
    pub has_header_row: bool,
    /// Rows are padded with nulls to this width
    pub minimum_column_count: usize,
    /// Encoding label understood by `encoding_rs` (e.g. "UTF-8", "windows-1252")
    pub encoding: String,
    /// Skip a leading byte order mark when reading
    pub strip_bom: bool,
    /// Byte order mark written before the first output byte
    pub write_bom: Option<BomKind>,
    /// Writer: wrap every non-null column in delimiters
    pub delimiter_required: bool,
    /// Writer: delimit values starting with "ID" in the first row, which
    /// spreadsheet applications would otherwise sniff as a SYLK file
    pub excel_id_quirk: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            separator: ';',
            delimiter: '"',
            comment_chars: "#;!".to_string(),
            ignore_empty_lines: true,
            has_header_row: true,
            minimum_column_count: 0,
            encoding: "UTF-8".to_string(),
            strip_bom: true,
            write_bom: None,
            delimiter_required: false,
            excel_id_quirk: true,
        }
    }
}

impl CsvConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Comma separated, `#` comments only.
    pub fn comma() -> Self {
        Self::new().with_separator(',').with_comment_chars("#")
    }

    /// Tab separated, `#` comments only.
    pub fn tsv() -> Self {
        Self::new().with_separator('\t').with_comment_chars("#")
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set comment characters; an empty string disables comments.
    pub fn with_comment_chars(mut self, chars: impl Into<String>) -> Self {
        self.comment_chars = chars.into();
        self
    }

    pub fn with_ignore_empty_lines(mut self, ignore: bool) -> Self {
        self.ignore_empty_lines = ignore;
        self
    }

    pub fn with_header_row(mut self, has_header_row: bool) -> Self {
        self.has_header_row = has_header_row;
        self
    }

    pub fn with_minimum_column_count(mut self, count: usize) -> Self {
        self.minimum_column_count = count;
        self
    }

    pub fn with_encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = label.into();
        self
    }

    pub fn with_strip_bom(mut self, strip: bool) -> Self {
        self.strip_bom = strip;
        self
    }

    pub fn with_write_bom(mut self, bom: Option<BomKind>) -> Self {
        self.write_bom = bom;
        self
    }

    pub fn with_delimiter_required(mut self, required: bool) -> Self {
        self.delimiter_required = required;
        self
    }

    pub fn with_excel_id_quirk(mut self, enabled: bool) -> Self {
        self.excel_id_quirk = enabled;
        self
    }

    /// Character used when writing comments; the first comment character or `#`.
    pub fn comment_char(&self) -> char {
        self.comment_chars.chars().next().unwrap_or('#')
    }

    /// Resolve the configured encoding label.
    pub fn resolve_encoding(&self) -> Result<&'static Encoding> {
        Encoding::for_label(self.encoding.trim().as_bytes())
            .ok_or_else(|| Error::InvalidFormat(format!("Unknown encoding '{}'", self.encoding)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CsvConfig::default();
        assert_eq!(config.separator, ';');
        assert_eq!(config.delimiter, '"');
        assert_eq!(config.comment_chars, "#;!");
        assert!(config.ignore_empty_lines);
        assert!(config.excel_id_quirk);
        assert_eq!(config.comment_char(), '#');
    }

    #[test]
    fn test_resolve_encoding() {
        let config = CsvConfig::new().with_encoding("latin1");
        assert_eq!(config.resolve_encoding().unwrap(), encoding_rs::WINDOWS_1252);
        assert!(CsvConfig::new().with_encoding("nope").resolve_encoding().is_err());
    }
}
