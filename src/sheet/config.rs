//! Spreadsheet reader and writer configuration.

use serde::{Deserialize, Serialize};

/// Which worksheet a reader or writer works on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SheetSelector {
    /// Zero-based position in the workbook
    Index(usize),
    /// Sheet name, compared ignoring case
    Name(String),
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::Index(0)
    }
}

/// Configuration shared by [`super::SpreadsheetReader`] and [`super::SpreadsheetWriter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadsheetConfig {
    pub sheet: SheetSelector,
    /// Reader: the first row holds column names
    pub has_header_row: bool,
    /// Reader: rows are padded with nulls to this width
    pub minimum_column_count: usize,
    /// Reader: skip rows without any non-blank cell
    pub skip_blank_rows: bool,
}

impl Default for SpreadsheetConfig {
    fn default() -> Self {
        Self {
            sheet: SheetSelector::default(),
            has_header_row: true,
            minimum_column_count: 0,
            skip_blank_rows: true,
        }
    }
}

impl SpreadsheetConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet_index(mut self, index: usize) -> Self {
        self.sheet = SheetSelector::Index(index);
        self
    }

    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet = SheetSelector::Name(name.into());
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

    pub fn with_skip_blank_rows(mut self, skip: bool) -> Self {
        self.skip_blank_rows = skip;
        self
    }
}
