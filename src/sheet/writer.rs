//! Worksheet writer.

use super::cell::{Cell, CellValue};
use super::config::{SheetSelector, SpreadsheetConfig};
use super::formatter::{CellContext, CellFormatter};
use super::style::StyleId;
use super::workbook::Workbook;
use crate::common::{Error, OutputSink, Result};
use crate::types::{ConversionRegistry, Value};
use crate::writer::{TableWriter, WriterCore};
use std::fmt;
use std::io::Write;
use tracing::{debug, warn};

const KIND: &str = "Spreadsheet writer";

/// Writes rows into a worksheet of an in-memory workbook.
///
/// Nothing reaches the sink before [`TableWriter::close`], which runs the
/// formatter's `finalize` step and saves the workbook as XLSX. Numbers,
/// booleans and dates become native cells; characters and raw bytes are
/// written as text formatted by the registry. Comments are not supported
/// and are silently dropped.
pub struct SpreadsheetWriter {
    core: WriterCore,
    config: SpreadsheetConfig,
    workbook: Workbook,
    sheet: Option<usize>,
    next_row: usize,
    column_count: usize,
    formatter: Option<Box<dyn CellFormatter>>,
    sink: Option<OutputSink>,
}

impl fmt::Debug for SpreadsheetWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpreadsheetWriter")
            .field("workbook", &self.workbook)
            .field("sheet", &self.sheet)
            .field("next_row", &self.next_row)
            .field("formatter", &self.formatter.is_some())
            .field("sink", &self.sink)
            .finish()
    }
}

impl SpreadsheetWriter {
    pub fn new(sink: OutputSink) -> Self {
        Self::with_config(sink, SpreadsheetConfig::default())
    }

    pub fn with_config(sink: OutputSink, config: SpreadsheetConfig) -> Self {
        Self::with_workbook(sink, Workbook::new(), config)
    }

    /// Write into an existing workbook, keeping its other sheets and styles.
    pub fn with_workbook(sink: OutputSink, workbook: Workbook, config: SpreadsheetConfig) -> Self {
        Self {
            core: WriterCore::new(KIND),
            config,
            workbook,
            sheet: None,
            next_row: 0,
            column_count: 0,
            formatter: None,
            sink: Some(sink),
        }
    }

    pub fn set_formatter(&mut self, formatter: impl CellFormatter + 'static) {
        self.formatter = Some(Box::new(formatter));
    }

    pub fn clear_formatter(&mut self) {
        self.formatter = None;
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn workbook_mut(&mut self) -> &mut Workbook {
        &mut self.workbook
    }

    /// Widest row written to the current sheet.
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Write to the sheet at `index`, adding sheets up to it when missing.
    /// Printing restarts at row 0.
    pub fn select_sheet_index(&mut self, index: usize) -> Result<usize> {
        self.select(SheetSelector::Index(index))
    }

    /// Write to the sheet called `name`, adding it when missing.
    /// Printing restarts at row 0.
    pub fn select_sheet_name(&mut self, name: &str) -> Result<usize> {
        self.select(SheetSelector::Name(name.to_string()))
    }

    fn select(&mut self, selector: SheetSelector) -> Result<usize> {
        self.core.ensure_open()?;
        self.config.sheet = selector;
        self.sheet = None;
        self.next_row = 0;
        self.column_count = 0;
        self.current_sheet()
    }

    fn current_sheet(&mut self) -> Result<usize> {
        if let Some(index) = self.sheet {
            return Ok(index);
        }
        let index = match &self.config.sheet {
            SheetSelector::Index(index) => {
                while self.workbook.sheet_count() <= *index {
                    self.workbook.add_default_sheet();
                }
                *index
            },
            SheetSelector::Name(name) => match self.workbook.sheet_index(name) {
                Some(index) => index,
                None => self.workbook.add_sheet(name.clone())?,
            },
        };
        debug!(sheet = index, "Sheet selected for writing");
        self.sheet = Some(index);
        Ok(index)
    }

    /// Print `columns` into `row` without moving the row cursor.
    pub fn print_row_at(&mut self, row: usize, columns: &[Option<Value>]) -> Result<()> {
        for (column, value) in columns.iter().enumerate() {
            self.set_value(row, column, value.as_ref())?;
        }
        Ok(())
    }

    /// Set a single cell of the current sheet. A null value clears the cell
    /// but keeps the formatter's style.
    pub fn set_value(&mut self, row: usize, column: usize, value: Option<&Value>) -> Result<()> {
        self.core.ensure_open()?;
        let index = self.current_sheet()?;

        let cell_value = match value {
            None => CellValue::Blank,
            Some(v @ (Value::Char(_) | Value::Bytes(_))) => {
                CellValue::String(self.core.registry().format(v))
            },
            Some(v) => CellValue::from(v),
        };
        if value.is_some() {
            self.column_count = self.column_count.max(column + 1);
        }

        let style = match self.formatter.as_mut() {
            Some(formatter) => {
                let description = formatter.style(&CellContext { row, column, value });
                if description.is_default() {
                    StyleId::DEFAULT
                } else {
                    self.workbook.style(description)
                }
            },
            None => StyleId::DEFAULT,
        };

        let sheet = self
            .workbook
            .sheet_mut(index)
            .ok_or_else(|| Error::IllegalState(format!("Sheet {} disappeared", index)))?;
        if cell_value.is_blank() && style == StyleId::DEFAULT {
            sheet.remove_cell(row, column);
        } else {
            sheet.set_cell(row, column, Cell {
                value: cell_value,
                style,
            });
        }
        Ok(())
    }

    /// Run the formatter's finalize step and serialize the workbook.
    fn finish(&mut self) -> Result<Vec<u8>> {
        if let (Some(formatter), Some(index)) = (self.formatter.as_mut(), self.sheet)
            && let Some(sheet) = self.workbook.sheet_mut(index)
        {
            let rows = sheet.last_row().map_or(0, |last| last + 1);
            formatter.finalize(sheet, rows, self.column_count);
        }
        self.workbook.to_bytes()
    }
}

impl TableWriter for SpreadsheetWriter {
    fn print_row(&mut self, columns: &[Option<Value>]) -> Result<()> {
        self.core.ensure_open()?;
        self.print_row_at(self.next_row, columns)?;
        self.next_row += 1;
        self.core.add_row();
        Ok(())
    }

    fn row_count(&self) -> usize {
        self.core.row_count()
    }

    fn registry_mut(&mut self) -> &mut ConversionRegistry {
        self.core.registry_mut()
    }

    fn close(&mut self) -> Result<()> {
        if !self.core.mark_closed() {
            return Ok(());
        }
        let Some(mut sink) = self.sink.take() else {
            return Ok(());
        };
        let written = self.finish().and_then(|bytes| {
            sink.write_all(&bytes)?;
            sink.flush()?;
            Ok(())
        });
        if let Err(e) = &written {
            warn!(error = %e, sink = ?sink.name(), "Workbook could not be written");
        }
        debug!(rows = self.core.row_count(), sheets = self.workbook.sheet_count(), "Spreadsheet writer closed");
        written
    }
}
