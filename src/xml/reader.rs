//! Record XML reader backed by a parser thread.

use super::config::XmlConfig;
use super::parser::{ParseEvent, RawColumn, parse_document};
use super::queue::BoundedQueue;
use crate::common::{Error, InputSource, Result};
use crate::reader::{Comment, Lifecycle, ReaderCore, TableReader};
use crate::types::{Row, Value};
use std::collections::{BTreeMap, HashMap};
use std::io::BufReader;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

const KIND: &str = "XML reader";

/// The parser thread owns the input while it runs and hands it back on join.
#[derive(Debug)]
struct Worker {
    queue: Arc<BoundedQueue<ParseEvent>>,
    handle: JoinHandle<InputSource>,
}

impl Worker {
    fn spawn(source: InputSource, config: XmlConfig) -> Result<Self> {
        let queue = Arc::new(BoundedQueue::new(config.queue_capacity));
        let producer = Arc::clone(&queue);
        let handle = thread::Builder::new()
            .name("tabula-xml-parser".to_string())
            .spawn(move || {
                let mut input = BufReader::new(source);
                match parse_document(&mut input, &config, |event| producer.push(event)) {
                    Ok(()) => debug!("XML parser finished"),
                    Err(Error::Cancelled) => debug!("XML parser cancelled"),
                    Err(e) => {
                        warn!("XML parsing failed: {}", e);
                        producer.push(ParseEvent::Failed(e.to_string()));
                    },
                }
                input.into_inner()
            })?;
        Ok(Self { queue, handle })
    }

    /// Cancel the parser and take the input back.
    fn stop(self) -> Result<InputSource> {
        self.queue.cancel();
        self.handle
            .join()
            .map_err(|_| Error::Other("XML parser thread panicked".to_string()))
    }
}

/// Reads rows from record XML.
///
/// Parsing runs on a separate thread that feeds a bounded queue; rows are
/// pulled from it on demand. The header row is the list of column names
/// known once the first row was parsed. Later rows may add columns, which
/// are appended in first-seen order.
///
/// Comments are delivered right before the row that follows them. Comments
/// after the last row are delivered on `close()` with row index
/// [`Comment::END_OF_STREAM`].
#[derive(Debug)]
pub struct XmlReader {
    core: ReaderCore,
    config: XmlConfig,
    source: Option<InputSource>,
    worker: Option<Worker>,
    columns: Vec<String>,
    column_indices: HashMap<String, usize>,
    comments: BTreeMap<usize, Vec<String>>,
    pending: Option<Row>,
    failure: Option<String>,
    finished: bool,
}

impl Default for XmlReader {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlReader {
    pub fn new() -> Self {
        Self::with_config(XmlConfig::default())
    }

    pub fn with_config(config: XmlConfig) -> Self {
        Self {
            core: ReaderCore::new(KIND, config.has_header_row),
            config,
            source: None,
            worker: None,
            columns: Vec::new(),
            column_indices: HashMap::new(),
            comments: BTreeMap::new(),
            pending: None,
            failure: None,
            finished: false,
        }
    }

    pub fn from_source(source: InputSource) -> Self {
        Self::from_source_with_config(source, XmlConfig::default())
    }

    pub fn from_source_with_config(source: InputSource, config: XmlConfig) -> Self {
        let mut reader = Self::with_config(config);
        reader.source = Some(source);
        reader
    }

    pub fn from_text(text: &str) -> Self {
        Self::from_source(InputSource::from_text(text))
    }

    /// Bind the input medium. Fails if one is already bound.
    pub fn set_input(&mut self, source: InputSource) -> Result<()> {
        if self.source.is_some() || self.worker.is_some() || self.core.is_closed() {
            return Err(Error::AlreadyBound(KIND));
        }
        self.source = Some(source);
        Ok(())
    }

    pub fn config(&self) -> &XmlConfig {
        &self.config
    }

    /// Column names seen so far.
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn start_worker(&mut self) -> Result<()> {
        if self.worker.is_some() || self.finished {
            return Ok(());
        }
        let source = self.source.take().ok_or_else(|| Error::unbound(KIND))?;
        debug!(source = ?source.name(), "Starting XML parser thread");
        self.worker = Some(Worker::spawn(source, self.config.clone())?);
        Ok(())
    }

    /// Stop a running parser and keep its input for a later rewind.
    fn stop_worker(&mut self) -> Result<()> {
        if let Some(worker) = self.worker.take() {
            self.source = Some(worker.stop()?);
        }
        Ok(())
    }

    /// Pull events until the next row is available, buffering comments.
    fn fetch(&mut self) -> Result<Option<Row>> {
        if let Some(message) = &self.failure {
            return Err(Error::XmlError(message.clone()));
        }
        if self.finished {
            return Ok(None);
        }
        self.start_worker()?;
        loop {
            let event = match &self.worker {
                Some(worker) => worker.queue.pop(),
                None => None,
            };
            match event {
                Some(ParseEvent::Row(raw)) => return self.build_row(raw).map(Some),
                Some(ParseEvent::Comment { before_row, text }) => {
                    self.comments.entry(before_row).or_default().push(text);
                },
                Some(ParseEvent::Failed(message)) => {
                    self.failure = Some(message.clone());
                    return Err(Error::XmlError(message));
                },
                Some(ParseEvent::End) | None => {
                    self.finished = true;
                    return Ok(None);
                },
            }
        }
    }

    fn build_row(&mut self, raw: Vec<RawColumn>) -> Result<Row> {
        for column in &raw {
            if !self.column_indices.contains_key(&column.name) {
                self.column_indices
                    .insert(column.name.clone(), self.columns.len());
                self.columns.push(column.name.clone());
            }
        }
        let mut row: Row = vec![None; self.columns.len()];
        for column in raw {
            let index = self.column_indices[&column.name];
            row[index] = if column.type_name.is_none() && column.text.is_empty() {
                None
            } else {
                Some(self.core.convert_value(
                    index,
                    column.type_name.as_deref(),
                    &column.text,
                )?)
            };
        }
        self.core.pad(&mut row);
        Ok(row)
    }

    fn ensure_header(&mut self) -> Result<()> {
        if !self.core.has_header_row() || !self.core.header().is_pending() {
            return Ok(());
        }
        if self.pending.is_none() && self.columns.is_empty() {
            self.pending = self.fetch()?;
        }
        let header = if self.columns.is_empty() {
            None
        } else {
            let mut row: Row = self
                .columns
                .iter()
                .map(|name| Some(Value::String(name.clone())))
                .collect();
            self.core.pad(&mut row);
            Some(row)
        };
        self.core.header_mut().store(header);
        Ok(())
    }

    /// Deliver buffered comments keyed at or before `row`.
    fn deliver_comments(&mut self, row: usize) {
        let later = self.comments.split_off(&(row + 1));
        let due = std::mem::replace(&mut self.comments, later);
        for text in due.into_values().flatten() {
            self.core.notify_comment(Comment::new(text, row, None));
        }
    }

    fn clear_parse_state(&mut self) {
        self.columns.clear();
        self.column_indices.clear();
        self.comments.clear();
        self.pending = None;
        self.failure = None;
        self.finished = false;
    }
}

impl TableReader for XmlReader {
    fn core(&self) -> &ReaderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ReaderCore {
        &mut self.core
    }

    fn open(&mut self) -> Result<()> {
        self.core.restart()
    }

    fn reset(&mut self) -> Result<()> {
        if self.core.is_closed() {
            return Err(Error::closed(KIND));
        }
        self.stop_worker()?;
        self.source
            .as_mut()
            .ok_or_else(|| Error::unbound(KIND))?
            .rewind()?;
        self.clear_parse_state();
        self.open()
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
        if self.pending.is_none() {
            self.pending = self.fetch()?;
        }
        if self.pending.is_none() {
            self.core.set_state(Lifecycle::Exhausted);
        }
        Ok(self.pending.is_some())
    }

    fn next_row(&mut self) -> Result<Row> {
        if !self.has_next()? {
            return Err(Error::NoMoreRows);
        }
        let mut row = self.pending.take().ok_or(Error::NoMoreRows)?;
        // Rows parsed before a column first appeared are shorter.
        if row.len() < self.columns.len() {
            row.resize(self.columns.len(), None);
        }
        let index = self.core.counters().rows();
        self.deliver_comments(index);
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
        // Comments the parser already queued still belong to this document.
        if let Some(worker) = &self.worker {
            while let Some(event) = worker.queue.try_pop() {
                if let ParseEvent::Comment { before_row, text } = event {
                    self.comments.entry(before_row).or_default().push(text);
                }
            }
        }
        let remaining = std::mem::take(&mut self.comments);
        for text in remaining.into_values().flatten() {
            self.core
                .notify_comment(Comment::new(text, Comment::END_OF_STREAM, None));
        }
        if let Err(e) = self.stop_worker() {
            warn!("Failed to stop XML parser: {}", e);
        }
        self.source = None;
        self.pending = None;
        self.core.set_state(Lifecycle::Closed);
        debug!(rows = self.core.counters().rows(), "XML reader closed");
        Ok(())
    }
}

impl Drop for XmlReader {
    fn drop(&mut self) {
        // Unblock the parser; it exits at its next push.
        if let Some(worker) = &self.worker {
            worker.queue.cancel();
        }
    }
}
