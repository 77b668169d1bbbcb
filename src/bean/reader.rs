//! Rows to records.

use super::{Bean, Field, find_field};
use crate::common::{Error, Result};
use crate::reader::TableReader;
use crate::types::{Row, row_to_strings};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Builds a record from every row of a [`TableReader`].
///
/// Column `i` is stored into the attribute named by the `i`-th attribute
/// name, taken from the reader's header row or from an explicit list.
/// Columns without a name and names without a matching attribute are
/// skipped.
pub struct BeanReader<T, R> {
    reader: R,
    evaluate_header_row: bool,
    attributes: Option<Vec<Option<String>>>,
    fields: Vec<Field<T>>,
    resolved: HashMap<String, Option<usize>>,
    failed: bool,
}

impl<T, R: fmt::Debug> fmt::Debug for BeanReader<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanReader")
            .field("reader", &self.reader)
            .field("attributes", &self.attributes)
            .field("fields", &self.fields)
            .finish()
    }
}

impl<T: Bean + Default, R: TableReader> BeanReader<T, R> {
    /// Attribute names come from the reader's header row.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            evaluate_header_row: true,
            attributes: None,
            fields: T::fields(),
            resolved: HashMap::new(),
            failed: false,
        }
    }

    /// Attribute names are given explicitly, one per column.
    pub fn with_attributes<I, S>(reader: R, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut bean_reader = Self::new(reader);
        bean_reader.evaluate_header_row = false;
        bean_reader.attributes = Some(attributes.into_iter().map(|a| Some(a.into())).collect());
        bean_reader
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn reader_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Attribute names per column; `None` until the header row was read.
    pub fn attributes(&self) -> Option<&[Option<String>]> {
        self.attributes.as_deref()
    }

    /// Take the attribute names from the reader's header row.
    pub fn read_header_row(&mut self) -> Result<()> {
        if self.reader.has_header_row() {
            let header = self.reader.header_row()?.unwrap_or_default();
            self.attributes = Some(row_to_strings(&header));
        }
        Ok(())
    }

    pub fn has_next(&mut self) -> Result<bool> {
        if self.evaluate_header_row && self.attributes.is_none() {
            self.read_header_row()?;
        }
        self.reader.has_next()
    }

    /// The next record; `None` once the reader is exhausted.
    pub fn next_bean(&mut self) -> Result<Option<T>> {
        if !self.has_next()? {
            return Ok(None);
        }
        let row = self.reader.next_row()?;
        self.convert_to_bean(row).map(Some)
    }

    /// Store the columns of `row` into a fresh record.
    pub fn convert_to_bean(&mut self, row: Row) -> Result<T> {
        let mut bean = T::default();
        for (column, value) in row.into_iter().enumerate() {
            let Some(field) = self.field_for(column) else {
                continue;
            };
            (field.set)(&mut bean, value).map_err(|e| {
                Error::Bean(format!("Cannot set attribute {}: {}", field.name, e))
            })?;
        }
        Ok(bean)
    }

    /// Descriptor for `column`, resolved once per attribute name.
    fn field_for(&mut self, column: usize) -> Option<Field<T>> {
        let name = self.attributes.as_ref()?.get(column)?.as_deref()?;
        let index = match self.resolved.get(name) {
            Some(index) => *index,
            None => {
                let index = find_field(&self.fields, name);
                if index.is_none() {
                    debug!(attribute = name, "Unknown attribute skipped");
                }
                self.resolved.insert(name.to_string(), index);
                index
            },
        };
        index.map(|i| self.fields[i])
    }

    pub fn reset(&mut self) -> Result<()> {
        self.failed = false;
        self.reader.reset()
    }

    pub fn close(&mut self) -> Result<()> {
        self.reader.close()
    }
}

impl<T: Bean + Default, R: TableReader> Iterator for BeanReader<T, R> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let next = self.next_bean().transpose();
        self.failed = matches!(next, Some(Err(_)));
        next
    }
}
