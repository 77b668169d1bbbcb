//! Readers and writers chosen by MIME type.
//!
//! A [`FormatRegistry`] maps MIME types to reader and writer constructors.
//! The MIME type of a file is guessed from its name, so
//! `registry.open_reader("data.csv")` yields a delimited-text reader bound
//! to that file.
//!
//! ```no_run
//! use tabula::factory::FormatRegistry;
//!
//! # fn main() -> tabula::Result<()> {
//! let registry = FormatRegistry::with_defaults();
//! let mut reader = registry.open_reader("report.xlsx")?;
//! let mut writer = registry.create_writer("report.csv")?;
//! tabula::util::copy(&mut reader, &mut writer, true)?;
//! writer.close()?;
//! # Ok(())
//! # }
//! ```

use crate::common::{Error, InputSource, OutputSink, Result};
use crate::csv::{CsvReader, CsvWriter};
use crate::html::HtmlWriter;
use crate::reader::TableReader;
use crate::sheet::{SpreadsheetReader, SpreadsheetWriter};
use crate::writer::TableWriter;
use crate::xml::{XmlConfig, XmlReader, XmlWriter};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Builds a reader bound to an input medium.
pub type ReaderConstructor = fn(InputSource) -> Box<dyn TableReader>;

/// Builds a writer bound to an output medium.
pub type WriterConstructor = fn(OutputSink) -> Box<dyn TableWriter>;

pub const CSV_MIME_TYPES: &[&str] = &["text/csv", "text/comma-separated-values"];

pub const EXCEL_MIME_TYPES: &[&str] = &[
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/excel",
    "application/x-excel",
    "application/x-msexcel",
    "application/vnd.ms-excel",
];

pub const XML_MIME_TYPES: &[&str] = &["text/xml", "application/xml"];

pub const HTML_MIME_TYPES: &[&str] = &["text/html"];

/// The MIME types one format answers to, with its constructors.
#[derive(Clone)]
pub struct MimeTypeInfo {
    pub mime_types: Vec<String>,
    pub reader: Option<ReaderConstructor>,
    pub writer: Option<WriterConstructor>,
}

impl fmt::Debug for MimeTypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MimeTypeInfo")
            .field("mime_types", &self.mime_types)
            .field("reader", &self.reader.is_some())
            .field("writer", &self.writer.is_some())
            .finish()
    }
}

impl MimeTypeInfo {
    pub fn new(
        mime_types: &[&str],
        reader: Option<ReaderConstructor>,
        writer: Option<WriterConstructor>,
    ) -> Self {
        Self {
            mime_types: mime_types.iter().map(|m| m.to_string()).collect(),
            reader,
            writer,
        }
    }

    pub fn csv() -> Self {
        Self::new(
            CSV_MIME_TYPES,
            Some(|source| Box::new(CsvReader::from_source(source))),
            Some(|sink| Box::new(CsvWriter::new(sink))),
        )
    }

    pub fn excel() -> Self {
        Self::new(
            EXCEL_MIME_TYPES,
            Some(|source| Box::new(SpreadsheetReader::from_source(source))),
            Some(|sink| Box::new(SpreadsheetWriter::new(sink))),
        )
    }

    pub fn xml() -> Self {
        Self::new(
            XML_MIME_TYPES,
            Some(|source| Box::new(XmlReader::from_source(source))),
            // The reader takes its header from the first record, so the
            // writer turns the first printed row into column names.
            Some(|sink| {
                Box::new(XmlWriter::with_config(
                    sink,
                    XmlConfig::default().with_write_header_row(true),
                ))
            }),
        )
    }

    pub fn html() -> Self {
        Self::new(HTML_MIME_TYPES, None, Some(|sink| Box::new(HtmlWriter::new(sink))))
    }
}

/// MIME type to constructor lookup.
#[derive(Clone, Default)]
pub struct FormatRegistry {
    readers: HashMap<String, ReaderConstructor>,
    writers: HashMap<String, WriterConstructor>,
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut readers: Vec<_> = self.readers.keys().collect();
        let mut writers: Vec<_> = self.writers.keys().collect();
        readers.sort();
        writers.sort();
        f.debug_struct("FormatRegistry")
            .field("readers", &readers)
            .field("writers", &writers)
            .finish()
    }
}

impl FormatRegistry {
    /// Registry without any format.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delimited text, XLSX and XML both ways, HTML for writing.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(MimeTypeInfo::csv());
        registry.register(MimeTypeInfo::excel());
        registry.register(MimeTypeInfo::xml());
        registry.register(MimeTypeInfo::html());
        registry
    }

    /// Register a format. Constructors already registered for one of its
    /// MIME types are replaced.
    pub fn register(&mut self, info: MimeTypeInfo) {
        for mime_type in &info.mime_types {
            let key = normalize(mime_type);
            if let Some(reader) = info.reader {
                self.readers.insert(key.clone(), reader);
            }
            if let Some(writer) = info.writer {
                self.writers.insert(key, writer);
            }
        }
    }

    pub fn has_reader(&self, mime_type: &str) -> bool {
        self.readers.contains_key(&normalize(mime_type))
    }

    pub fn has_writer(&self, mime_type: &str) -> bool {
        self.writers.contains_key(&normalize(mime_type))
    }

    /// MIME type guessed from the file name.
    pub fn mime_type<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        let path = path.as_ref();
        mime_guess::from_path(path)
            .first_raw()
            .map(str::to_string)
            .ok_or_else(|| Error::UnknownMimeType(path.display().to_string()))
    }

    /// Reader for `mime_type`, bound to `source`.
    pub fn reader_for(&self, mime_type: &str, source: InputSource) -> Result<Box<dyn TableReader>> {
        let constructor = self
            .readers
            .get(&normalize(mime_type))
            .ok_or_else(|| Error::UnsupportedMimeType(mime_type.to_string()))?;
        Ok(constructor(source))
    }

    /// Writer for `mime_type`, bound to `sink`.
    pub fn writer_for(&self, mime_type: &str, sink: OutputSink) -> Result<Box<dyn TableWriter>> {
        let constructor = self
            .writers
            .get(&normalize(mime_type))
            .ok_or_else(|| Error::UnsupportedMimeType(mime_type.to_string()))?;
        Ok(constructor(sink))
    }

    /// Open `path` with the reader registered for its MIME type.
    pub fn open_reader<P: AsRef<Path>>(&self, path: P) -> Result<Box<dyn TableReader>> {
        let path = path.as_ref();
        let mime_type = self.mime_type(path)?;
        if !self.has_reader(&mime_type) {
            return Err(Error::UnsupportedMimeType(mime_type));
        }
        debug!(path = %path.display(), mime_type = %mime_type, "Opening table reader");
        self.reader_for(&mime_type, InputSource::open(path)?)
    }

    /// Create `path` and write it with the writer registered for its MIME type.
    ///
    /// The MIME type is checked before the file is created.
    pub fn create_writer<P: AsRef<Path>>(&self, path: P) -> Result<Box<dyn TableWriter>> {
        let path = path.as_ref();
        let mime_type = self.mime_type(path)?;
        if !self.has_writer(&mime_type) {
            return Err(Error::UnsupportedMimeType(mime_type));
        }
        debug!(path = %path.display(), mime_type = %mime_type, "Creating table writer");
        self.writer_for(&mime_type, OutputSink::create(path)?)
    }
}

/// MIME types compare without parameters and ignoring case.
fn normalize(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
