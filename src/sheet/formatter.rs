//! Cell styling hooks of the spreadsheet writer.

use super::style::{
    Border, BorderLine, BorderStyle, Color, FontDescription, HorizontalAlignment, StyleDescription,
};
use super::workbook::Worksheet;
use crate::types::Value;

/// Position and value of a cell being written.
#[derive(Debug, Clone, Copy)]
pub struct CellContext<'a> {
    pub row: usize,
    pub column: usize,
    /// `None` for a null column
    pub value: Option<&'a Value>,
}

/// Decides the style of every written cell.
///
/// The writer interns the returned descriptions, so equal descriptions share
/// one cell format in the saved workbook.
pub trait CellFormatter {
    fn style(&mut self, cell: &CellContext<'_>) -> StyleDescription;

    /// Called once before the workbook is saved, with the number of rows
    /// written and the width of the widest row.
    fn finalize(&mut self, _sheet: &mut Worksheet, _row_count: usize, _column_count: usize) {}
}

impl<F> CellFormatter for F
where
    F: FnMut(&CellContext<'_>) -> StyleDescription,
{
    fn style(&mut self, cell: &CellContext<'_>) -> StyleDescription {
        self(cell)
    }
}

pub const DEFAULT_FONT_NAME: &str = "Arial";
pub const DEFAULT_FONT_SIZE: u16 = 10;
pub const DEFAULT_DATE_FORMAT: &str = "dd.mm.yyyy hh:mm";
pub const DEFAULT_INTEGER_FORMAT: &str = "0";
pub const DEFAULT_REAL_FORMAT: &str = "0.00";

/// Plain formatting for tabular output.
///
/// Dates, integers and reals get their number formats, strings wrap, and
/// the first row can be set in bold. Columns are auto-sized at the end.
#[derive(Debug, Clone)]
pub struct DefaultCellFormatter {
    pub emphasize_first_row: bool,
    pub font: FontDescription,
    pub date_format: String,
    pub integer_format: String,
    pub real_format: String,
    /// Border drawn around every cell
    pub border: Option<BorderLine>,
    pub alignment: Option<HorizontalAlignment>,
    pub auto_size_columns: bool,
}

impl Default for DefaultCellFormatter {
    fn default() -> Self {
        Self {
            emphasize_first_row: false,
            font: FontDescription::new(DEFAULT_FONT_NAME, DEFAULT_FONT_SIZE).with_color(Color::BLACK),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            integer_format: DEFAULT_INTEGER_FORMAT.to_string(),
            real_format: DEFAULT_REAL_FORMAT.to_string(),
            border: None,
            alignment: None,
            auto_size_columns: true,
        }
    }
}

impl DefaultCellFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_emphasized_first_row(mut self, emphasize: bool) -> Self {
        self.emphasize_first_row = emphasize;
        self
    }

    pub fn with_font(mut self, font: FontDescription) -> Self {
        self.font = font;
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    pub fn with_integer_format(mut self, format: impl Into<String>) -> Self {
        self.integer_format = format.into();
        self
    }

    pub fn with_real_format(mut self, format: impl Into<String>) -> Self {
        self.real_format = format.into();
        self
    }

    /// Thin border in `color` around every cell.
    pub fn with_border(mut self, color: Color) -> Self {
        self.border = Some(BorderLine::new(BorderStyle::Thin).with_color(color));
        self
    }

    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    pub fn with_auto_size_columns(mut self, auto_size: bool) -> Self {
        self.auto_size_columns = auto_size;
        self
    }

    fn number_format(&self, value: Option<&Value>) -> Option<&str> {
        match value? {
            Value::Date(_) => Some(self.date_format.as_str()),
            Value::Byte(_) | Value::Short(_) | Value::Int(_) | Value::Long(_) => {
                Some(self.integer_format.as_str())
            },
            Value::Float(_) | Value::Double(_) => Some(self.real_format.as_str()),
            _ => None,
        }
    }
}

impl CellFormatter for DefaultCellFormatter {
    fn style(&mut self, cell: &CellContext<'_>) -> StyleDescription {
        let bold = self.emphasize_first_row && cell.row == 0;
        let mut style = StyleDescription::new()
            .with_font(self.font.clone().with_bold(bold))
            .with_wrap_text(matches!(cell.value, Some(Value::String(_))));
        if let Some(format) = self.number_format(cell.value) {
            style = style.with_number_format(format);
        }
        if let Some(line) = &self.border {
            style = style.with_border(Border::uniform(*line));
        }
        if let Some(alignment) = self.alignment {
            style = style.with_alignment(alignment);
        }
        style
    }

    fn finalize(&mut self, sheet: &mut Worksheet, _row_count: usize, column_count: usize) {
        if self.auto_size_columns {
            for column in 0..column_count {
                sheet.auto_size_column(column);
            }
        }
    }
}
