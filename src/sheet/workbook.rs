//! In-memory workbook model.

use super::cell::{Cell, CellValue, format_number};
use super::style::{StyleDescription, StyleId, StyleTable};
use super::xlsx;
use crate::common::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{Cursor, Read, Seek, Write};

/// Widest column Excel accepts, in characters.
const MAX_COLUMN_WIDTH: f64 = 255.0;

/// Sparse grid of cells, keyed by zero-based row and column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Worksheet {
    name: String,
    rows: BTreeMap<usize, BTreeMap<usize, Cell>>,
    column_widths: BTreeMap<usize, f64>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(&row).and_then(|cells| cells.get(&column))
    }

    pub fn cell_mut(&mut self, row: usize, column: usize) -> &mut Cell {
        self.rows.entry(row).or_default().entry(column).or_default()
    }

    pub fn set_cell(&mut self, row: usize, column: usize, cell: Cell) {
        self.rows.entry(row).or_default().insert(column, cell);
    }

    /// Replace the value of a cell, keeping its style.
    pub fn set_value(&mut self, row: usize, column: usize, value: impl Into<CellValue>) {
        self.cell_mut(row, column).value = value.into();
    }

    pub fn set_style(&mut self, row: usize, column: usize, style: StyleId) {
        self.cell_mut(row, column).style = style;
    }

    pub fn remove_cell(&mut self, row: usize, column: usize) -> Option<Cell> {
        let cells = self.rows.get_mut(&row)?;
        let removed = cells.remove(&column);
        if cells.is_empty() {
            self.rows.remove(&row);
        }
        removed
    }

    /// Cells of a row in column order; `None` when the row has none.
    pub fn row(&self, row: usize) -> Option<&BTreeMap<usize, Cell>> {
        self.rows.get(&row)
    }

    pub fn rows(&self) -> impl Iterator<Item = (usize, &BTreeMap<usize, Cell>)> {
        self.rows.iter().map(|(&index, cells)| (index, cells))
    }

    pub fn first_row(&self) -> Option<usize> {
        self.rows.keys().next().copied()
    }

    pub fn last_row(&self) -> Option<usize> {
        self.rows.keys().next_back().copied()
    }

    /// One past the last cell of `row`.
    pub fn row_width(&self, row: usize) -> usize {
        self.rows
            .get(&row)
            .and_then(|cells| cells.keys().next_back())
            .map_or(0, |&last| last + 1)
    }

    /// Widest row of the sheet.
    pub fn max_column_count(&self) -> usize {
        self.rows
            .values()
            .filter_map(|cells| cells.keys().next_back())
            .map(|&last| last + 1)
            .max()
            .unwrap_or(0)
    }

    /// Whether `row` is missing or holds only blank cells.
    pub fn is_blank_row(&self, row: usize) -> bool {
        self.rows
            .get(&row)
            .is_none_or(|cells| cells.values().all(|cell| cell.value.is_blank()))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Width of a column in characters.
    pub fn set_column_width(&mut self, column: usize, width: f64) {
        self.column_widths
            .insert(column, width.clamp(0.0, MAX_COLUMN_WIDTH));
    }

    pub fn column_width(&self, column: usize) -> Option<f64> {
        self.column_widths.get(&column).copied()
    }

    pub fn column_widths(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.column_widths.iter().map(|(&c, &w)| (c, w))
    }

    /// Fit a column to the longest text it displays.
    pub fn auto_size_column(&mut self, column: usize) {
        let longest = self
            .rows
            .values()
            .filter_map(|cells| cells.get(&column))
            .map(|cell| display_width(&cell.value))
            .max()
            .unwrap_or(0);
        if longest > 0 {
            self.set_column_width(column, longest as f64 + 2.0);
        }
    }
}

/// Approximate displayed width of a value, in characters.
fn display_width(value: &CellValue) -> usize {
    match value {
        CellValue::Blank => 0,
        CellValue::String(s) => s.lines().map(|l| l.chars().count()).max().unwrap_or(0),
        CellValue::Number(n) => format_number(*n).len(),
        CellValue::Bool(b) => if *b { 4 } else { 5 },
        CellValue::Date(_) => 16,
        CellValue::Error(e) => e.chars().count(),
        CellValue::Formula { cached, .. } => cached.as_deref().map_or(0, display_width),
    }
}

/// Sheets plus the styles their cells refer to.
#[derive(Clone, Default)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
    styles: StyleTable,
}

impl fmt::Debug for Workbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workbook")
            .field("sheets", &self.sheets.iter().map(Worksheet::name).collect::<Vec<_>>())
            .field("styles", &self.styles.len())
            .finish()
    }
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet and return its index. Sheet names are unique, ignoring case.
    pub fn add_sheet(&mut self, name: impl Into<String>) -> Result<usize> {
        let name = name.into();
        if name.is_empty() || name.chars().count() > 31 {
            return Err(Error::InvalidFormat(format!("Invalid sheet name '{}'", name)));
        }
        if self.sheet_index(&name).is_some() {
            return Err(Error::InvalidFormat(format!("Duplicate sheet name '{}'", name)));
        }
        self.sheets.push(Worksheet::new(name));
        Ok(self.sheets.len() - 1)
    }

    /// Append a sheet called `Sheet<n>` with the first free `n`.
    pub fn add_default_sheet(&mut self) -> usize {
        let mut n = self.sheets.len() + 1;
        while self.sheet_index(&format!("Sheet{}", n)).is_some() {
            n += 1;
        }
        self.sheets.push(Worksheet::new(format!("Sheet{}", n)));
        self.sheets.len() - 1
    }

    pub(crate) fn push_sheet(&mut self, sheet: Worksheet) {
        self.sheets.push(sheet);
    }

    pub fn sheet(&self, index: usize) -> Option<&Worksheet> {
        self.sheets.get(index)
    }

    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.sheets.get_mut(index)
    }

    /// Index of the sheet called `name`, ignoring case.
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets
            .iter()
            .position(|sheet| sheet.name.eq_ignore_ascii_case(name))
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.sheet_index(name).and_then(|i| self.sheets.get(i))
    }

    pub fn sheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    pub fn styles_mut(&mut self) -> &mut StyleTable {
        &mut self.styles
    }

    /// Shorthand for interning a style in this workbook's table.
    pub fn style(&mut self, description: StyleDescription) -> StyleId {
        self.styles.intern(description)
    }

    /// Write the workbook as an XLSX package.
    pub fn save<W: Write + Seek>(&self, writer: W) -> Result<W> {
        xlsx::write_package(self, writer)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.save(Cursor::new(Vec::new()))?.into_inner())
    }

    /// Read an XLSX package.
    pub fn load<R: Read + Seek>(reader: R) -> Result<Self> {
        xlsx::read_package(reader)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::load(Cursor::new(bytes))
    }
}
