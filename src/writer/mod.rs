//! The table writer abstraction.
//!
//! Stream writers make each row visible before `print_row` returns. The
//! spreadsheet writer is the exception: its workbook is serialized to the
//! sink only on `close()`.

use crate::common::{Error, Result};
use crate::types::{ConversionRegistry, Value};

/// Row sink for one output format.
pub trait TableWriter {
    /// Render one row.
    fn print_row(&mut self, columns: &[Option<Value>]) -> Result<()>;

    /// Render a comment. No-op unless the format supports comments.
    fn print_comment(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    /// Render a comment attached to a position; defaults to [`Self::print_comment`].
    fn print_comment_at(&mut self, text: &str, _row: usize, _column: Option<usize>) -> Result<()> {
        self.print_comment(text)
    }

    /// Rows printed so far.
    fn row_count(&self) -> usize;

    fn registry_mut(&mut self) -> &mut ConversionRegistry;

    /// Flush and release the sink. Safe to call repeatedly.
    fn close(&mut self) -> Result<()>;
}

impl<W: TableWriter + ?Sized> TableWriter for Box<W> {
    fn print_row(&mut self, columns: &[Option<Value>]) -> Result<()> {
        (**self).print_row(columns)
    }

    fn print_comment(&mut self, text: &str) -> Result<()> {
        (**self).print_comment(text)
    }

    fn print_comment_at(&mut self, text: &str, row: usize, column: Option<usize>) -> Result<()> {
        (**self).print_comment_at(text, row, column)
    }

    fn row_count(&self) -> usize {
        (**self).row_count()
    }

    fn registry_mut(&mut self) -> &mut ConversionRegistry {
        (**self).registry_mut()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Row counter, registry and closed flag shared by writer implementations.
#[derive(Debug)]
pub struct WriterCore {
    kind: &'static str,
    rows: usize,
    registry: ConversionRegistry,
    closed: bool,
}

impl WriterCore {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            rows: 0,
            registry: ConversionRegistry::with_defaults(),
            closed: false,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn add_row(&mut self) {
        self.rows += 1;
    }

    pub fn registry(&self) -> &ConversionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ConversionRegistry {
        &mut self.registry
    }

    /// Wire text of a column; `None` for nulls.
    pub fn format(&self, value: Option<&Value>) -> Option<String> {
        value.map(|v| self.registry.format(v))
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::closed(self.kind))
        } else {
            Ok(())
        }
    }

    /// Mark closed. Returns `false` if it already was.
    pub fn mark_closed(&mut self) -> bool {
        !std::mem::replace(&mut self.closed, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_core_close_once() {
        let mut core = WriterCore::new("test writer");
        assert!(core.ensure_open().is_ok());
        assert!(core.mark_closed());
        assert!(!core.mark_closed());
        assert!(matches!(core.ensure_open(), Err(Error::IllegalState(_))));
    }

    #[test]
    fn test_format_uses_registry() {
        let core = WriterCore::new("test writer");
        assert_eq!(core.format(Some(&Value::Int(3))).as_deref(), Some("3"));
        assert_eq!(core.format(None), None);
    }
}
