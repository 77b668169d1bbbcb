//! Worksheet reader.

use super::config::{SheetSelector, SpreadsheetConfig};
use super::workbook::{Workbook, Worksheet};
use crate::common::{Error, InputSource, Result};
use crate::reader::{Lifecycle, ReaderCore, TableReader};
use crate::types::Row;
use tracing::debug;

const KIND: &str = "Spreadsheet reader";

/// Reads the rows of one worksheet of an XLSX workbook.
///
/// The package is loaded into memory on first access. Rows run from the
/// first to the last row holding cells; blank rows are skipped unless
/// [`SpreadsheetConfig::skip_blank_rows`] is off, in which case missing rows
/// come back as empty rows. Numbers read as `f64` and date-formatted numbers
/// as dates; columns with an assigned type are converted through the text
/// form of the cell value.
#[derive(Debug)]
pub struct SpreadsheetReader {
    core: ReaderCore,
    config: SpreadsheetConfig,
    source: Option<InputSource>,
    workbook: Option<Workbook>,
    sheet: Option<usize>,
    next_index: usize,
    pending: Option<Row>,
}

impl Default for SpreadsheetReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SpreadsheetReader {
    /// Unbound reader; bind input with [`Self::set_input`].
    pub fn new() -> Self {
        Self::with_config(SpreadsheetConfig::default())
    }

    pub fn with_config(config: SpreadsheetConfig) -> Self {
        let mut core = ReaderCore::new(KIND, config.has_header_row);
        core.set_minimum_column_count(config.minimum_column_count);
        Self {
            core,
            config,
            source: None,
            workbook: None,
            sheet: None,
            next_index: 0,
            pending: None,
        }
    }

    pub fn from_source(source: InputSource) -> Self {
        Self::from_source_with_config(source, SpreadsheetConfig::default())
    }

    pub fn from_source_with_config(source: InputSource, config: SpreadsheetConfig) -> Self {
        let mut reader = Self::with_config(config);
        reader.source = Some(source);
        reader
    }

    /// Read rows of a workbook that is already in memory.
    pub fn from_workbook(workbook: Workbook, config: SpreadsheetConfig) -> Self {
        let mut reader = Self::with_config(config);
        reader.workbook = Some(workbook);
        reader
    }

    /// Bind the input medium. Fails if one is already bound.
    pub fn set_input(&mut self, source: InputSource) -> Result<()> {
        if self.source.is_some() || self.workbook.is_some() || self.core.is_closed() {
            return Err(Error::AlreadyBound(KIND));
        }
        self.source = Some(source);
        Ok(())
    }

    pub fn config(&self) -> &SpreadsheetConfig {
        &self.config
    }

    /// The loaded workbook.
    pub fn workbook(&mut self) -> Result<&Workbook> {
        self.ensure_loaded()?;
        self.workbook.as_ref().ok_or_else(|| Error::unbound(KIND))
    }

    /// The worksheet rows are read from.
    pub fn sheet(&mut self) -> Result<&Worksheet> {
        self.ensure_loaded()?;
        match (&self.workbook, self.sheet) {
            (Some(workbook), Some(index)) => workbook
                .sheet(index)
                .ok_or_else(|| Error::InvalidFormat(format!("No sheet at index {}", index))),
            _ => Err(Error::unbound(KIND)),
        }
    }

    /// Read from the sheet at `index` and start over at its first row.
    pub fn select_sheet_index(&mut self, index: usize) -> Result<()> {
        self.select(SheetSelector::Index(index))
    }

    /// Read from the sheet called `name` (ignoring case) and start over at its first row.
    pub fn select_sheet_name(&mut self, name: &str) -> Result<()> {
        self.select(SheetSelector::Name(name.to_string()))
    }

    pub fn skip_blank_rows(&self) -> bool {
        self.config.skip_blank_rows
    }

    pub fn set_skip_blank_rows(&mut self, skip: bool) {
        self.config.skip_blank_rows = skip;
    }

    /// Widest row of the current sheet.
    pub fn compute_max_column_count(&mut self) -> Result<usize> {
        Ok(self.sheet()?.max_column_count())
    }

    /// Unconverted values of a row of the current sheet; `None` when it holds no cells.
    pub fn values(&mut self, row: usize) -> Result<Option<Row>> {
        let sheet = self.sheet()?;
        Ok(sheet.row(row).map(|_| sheet_values(sheet, row)))
    }

    fn select(&mut self, selector: SheetSelector) -> Result<()> {
        self.core.ensure_open()?;
        self.config.sheet = selector;
        self.sheet = None;
        if self.source.is_some() || self.workbook.is_some() {
            self.ensure_loaded()?;
        }
        Ok(())
    }

    fn ensure_loaded(&mut self) -> Result<()> {
        if self.workbook.is_none() {
            let source = self.source.as_mut().ok_or_else(|| Error::unbound(KIND))?;
            let bytes = source.read_all()?;
            let workbook = Workbook::from_bytes(&bytes)?;
            debug!(source = ?source.name(), sheets = workbook.sheet_count(), "Workbook loaded");
            self.workbook = Some(workbook);
        }
        if self.sheet.is_none() {
            self.resolve_sheet()?;
        }
        Ok(())
    }

    fn resolve_sheet(&mut self) -> Result<()> {
        let workbook = self.workbook.as_ref().ok_or_else(|| Error::unbound(KIND))?;
        let index = match &self.config.sheet {
            SheetSelector::Index(index) if *index < workbook.sheet_count() => *index,
            SheetSelector::Index(index) => {
                return Err(Error::InvalidFormat(format!(
                    "Workbook has {} sheets, no sheet at index {}",
                    workbook.sheet_count(),
                    index
                )));
            },
            SheetSelector::Name(name) => workbook
                .sheet_index(name)
                .ok_or_else(|| Error::InvalidFormat(format!("No sheet named '{}'", name)))?,
        };
        self.sheet = Some(index);
        self.rewind_rows();
        debug!(sheet = index, "Sheet selected");
        Ok(())
    }

    /// Back to the first row of the current sheet, header included.
    fn rewind_rows(&mut self) {
        self.next_index = self
            .workbook
            .as_ref()
            .zip(self.sheet)
            .and_then(|(workbook, index)| workbook.sheet(index))
            .and_then(Worksheet::first_row)
            .unwrap_or(0);
        self.pending = None;
        self.core.header_mut().clear();
        if self.core.state() == Lifecycle::Exhausted {
            self.core.set_state(Lifecycle::Open);
        }
    }

    /// Values of the next row that is not skipped.
    fn read_raw_row(&mut self) -> Result<Option<Row>> {
        self.ensure_loaded()?;
        let (Some(workbook), Some(index)) = (&self.workbook, self.sheet) else {
            return Ok(None);
        };
        let Some(sheet) = workbook.sheet(index) else {
            return Ok(None);
        };
        let Some(last) = sheet.last_row() else {
            return Ok(None);
        };
        while self.next_index <= last {
            let row = self.next_index;
            self.next_index += 1;
            if self.config.skip_blank_rows && sheet.is_blank_row(row) {
                continue;
            }
            self.core.counters_mut().add_line();
            return Ok(Some(sheet_values(sheet, row)));
        }
        Ok(None)
    }

    /// Convert typed columns through their text form and pad.
    fn convert(&self, row: Row) -> Result<Row> {
        let mut row = row
            .into_iter()
            .enumerate()
            .map(|(i, value)| match value {
                Some(value) if self.core.column_type(i).is_some() => {
                    let text = self.core.registry().format(&value);
                    self.core.convert_value(i, None, &text).map(Some)
                },
                other => Ok(other),
            })
            .collect::<Result<Row>>()?;
        self.core.pad(&mut row);
        Ok(row)
    }

    fn ensure_header(&mut self) -> Result<()> {
        if !self.core.has_header_row() || !self.core.header().is_pending() {
            return Ok(());
        }
        let header = self.read_raw_row()?.map(|mut row| {
            self.core.pad(&mut row);
            row
        });
        self.core.header_mut().store(header);
        Ok(())
    }
}

/// Values of every column up to the last cell of `row`.
fn sheet_values(sheet: &Worksheet, row: usize) -> Row {
    (0..sheet.row_width(row))
        .map(|column| sheet.cell(row, column).and_then(|cell| cell.value.to_value()))
        .collect()
}

impl TableReader for SpreadsheetReader {
    fn core(&self) -> &ReaderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ReaderCore {
        &mut self.core
    }

    fn open(&mut self) -> Result<()> {
        self.core.restart()?;
        self.pending = None;
        Ok(())
    }

    /// Start over at the first row. The workbook stays in memory, so any
    /// bound medium can be reset.
    fn reset(&mut self) -> Result<()> {
        if self.core.is_closed() {
            return Err(Error::closed(KIND));
        }
        if self.source.is_none() && self.workbook.is_none() {
            return Err(Error::unbound(KIND));
        }
        self.open()?;
        self.rewind_rows();
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool> {
        self.core.ensure_open()?;
        if self.pending.is_some() {
            return Ok(true);
        }
        if self.core.state() == Lifecycle::Exhausted {
            return Ok(false);
        }
        self.ensure_header()?;
        match self.read_raw_row()? {
            Some(raw) => {
                self.pending = Some(self.convert(raw)?);
                Ok(true)
            },
            None => {
                self.core.set_state(Lifecycle::Exhausted);
                Ok(false)
            },
        }
    }

    fn next_row(&mut self) -> Result<Row> {
        if !self.has_next()? {
            return Err(Error::NoMoreRows);
        }
        let row = self.pending.take().ok_or(Error::NoMoreRows)?;
        self.core.counters_mut().add_row();
        Ok(row)
    }

    fn header_row(&mut self) -> Result<Option<Row>> {
        self.core.ensure_open()?;
        if !self.core.has_header_row() {
            return Ok(None);
        }
        self.ensure_header()?;
        Ok(self.core.header().row().cloned())
    }

    fn close(&mut self) -> Result<()> {
        if self.core.is_closed() {
            return Ok(());
        }
        self.source = None;
        self.workbook = None;
        self.sheet = None;
        self.pending = None;
        self.core.set_state(Lifecycle::Closed);
        debug!(rows = self.core.counters().rows(), "Spreadsheet reader closed");
        Ok(())
    }
}
