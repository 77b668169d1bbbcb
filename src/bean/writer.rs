//! Records to rows.

use super::{Bean, Field, Getter, find_field};
use crate::common::{Error, Result};
use crate::types::{Row, Value};
use crate::writer::TableWriter;
use std::fmt;
use tracing::debug;

/// Writes records as rows of a [`TableWriter`].
///
/// The columns are the record's attributes in descriptor order, unless an
/// explicit attribute list was given. The attribute names can be printed as
/// a header row before the first record.
pub struct BeanWriter<T, W> {
    writer: W,
    attributes: Option<Vec<String>>,
    getters: Option<Vec<Getter<T>>>,
    write_header_row: bool,
    header_written: bool,
}

impl<T, W: fmt::Debug> fmt::Debug for BeanWriter<T, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanWriter")
            .field("writer", &self.writer)
            .field("attributes", &self.attributes)
            .field("write_header_row", &self.write_header_row)
            .field("header_written", &self.header_written)
            .finish()
    }
}

impl<T: Bean, W: TableWriter> BeanWriter<T, W> {
    pub fn new(writer: W, write_header_row: bool) -> Self {
        Self {
            writer,
            attributes: None,
            getters: None,
            write_header_row,
            header_written: false,
        }
    }

    /// Write only the named attributes, in this order.
    pub fn with_attributes<I, S>(writer: W, attributes: I, write_header_row: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut bean_writer = Self::new(writer, write_header_row);
        bean_writer.attributes = Some(attributes.into_iter().map(Into::into).collect());
        bean_writer
    }

    pub fn write_header_row(&self) -> bool {
        self.write_header_row
    }

    /// Attribute names in column order; `None` until resolved by the first write.
    pub fn attributes(&self) -> Option<&[String]> {
        self.attributes.as_deref()
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Resolve the getters once, from the explicit list or the descriptors.
    fn getters(&mut self) -> Result<&[Getter<T>]> {
        if self.getters.is_none() {
            let fields = T::fields();
            let getters = match &self.attributes {
                Some(names) => names
                    .iter()
                    .map(|name| {
                        find_field(&fields, name)
                            .map(|index| fields[index].get)
                            .ok_or_else(|| Error::Bean(format!("No such attribute: {}", name)))
                    })
                    .collect::<Result<Vec<_>>>()?,
                None => {
                    self.attributes = Some(fields.iter().map(|f| f.name.to_string()).collect());
                    fields.iter().map(|f: &Field<T>| f.get).collect()
                },
            };
            debug!(columns = getters.len(), "Bean attributes resolved");
            self.getters = Some(getters);
        }
        Ok(self.getters.as_deref().unwrap_or_default())
    }

    /// Column values of `bean`.
    pub fn convert_to_columns(&mut self, bean: &T) -> Result<Row> {
        Ok(self.getters()?.iter().map(|get| get(bean)).collect())
    }

    pub fn write_bean(&mut self, bean: &T) -> Result<()> {
        let row = self.convert_to_columns(bean)?;
        if self.write_header_row && !self.header_written {
            let header: Row = self
                .attributes
                .iter()
                .flatten()
                .map(|name| Some(Value::from(name.as_str())))
                .collect();
            self.writer.print_row(&header)?;
            self.header_written = true;
        }
        self.writer.print_row(&row)
    }

    /// Write every bean; returns how many were written.
    pub fn write_beans<'a, I>(&mut self, beans: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let mut count = 0;
        for bean in beans {
            self.write_bean(bean)?;
            count += 1;
        }
        Ok(count)
    }

    pub fn close(&mut self) -> Result<()> {
        self.writer.close()
    }
}
