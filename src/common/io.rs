//! Input and output media shared by all readers and writers.
//!
//! [`InputSource`] erases the concrete reader type while remembering whether
//! the medium can be rewound, which is what `reset()` needs. [`OutputSink`]
//! does the same for writers.

use crate::common::Result;
use parking_lot::Mutex;
use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

trait SeekRead: Read + Seek + Send {}

impl<T: Read + Seek + Send> SeekRead for T {}

enum Medium {
    Seekable(Box<dyn SeekRead>),
    Stream(Box<dyn Read + Send>),
}

/// A readable medium backing a table reader.
pub struct InputSource {
    medium: Medium,
    name: Option<String>,
}

impl InputSource {
    /// Wrap an in-memory buffer. Always rewindable.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::from_seekable(Cursor::new(bytes.into()))
    }

    /// Wrap UTF-8 text. Always rewindable.
    pub fn from_text(text: &str) -> Self {
        Self::from_bytes(text.as_bytes().to_vec())
    }

    /// Wrap a reader that supports seeking.
    pub fn from_seekable<R: Read + Seek + Send + 'static>(reader: R) -> Self {
        Self {
            medium: Medium::Seekable(Box::new(reader)),
            name: None,
        }
    }

    /// Wrap a forward-only stream. `rewind` will fail on this source.
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self {
            medium: Medium::Stream(Box::new(reader)),
            name: None,
        }
    }

    /// Open a file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(Self::from_seekable(file).with_name(path.display().to_string()))
    }

    /// Attach a descriptive name, used in log messages and for MIME lookups.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_rewindable(&self) -> bool {
        matches!(self.medium, Medium::Seekable(_))
    }

    /// Reposition the medium at its start.
    pub fn rewind(&mut self) -> Result<()> {
        match &mut self.medium {
            Medium::Seekable(reader) => {
                reader.seek(SeekFrom::Start(0))?;
                Ok(())
            },
            Medium::Stream(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "input stream cannot be rewound",
            )
            .into()),
        }
    }

    /// Read everything that is left in the medium.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

impl Read for InputSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.medium {
            Medium::Seekable(reader) => reader.read(buf),
            Medium::Stream(reader) => reader.read(buf),
        }
    }
}

impl fmt::Debug for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputSource")
            .field("name", &self.name)
            .field("rewindable", &self.is_rewindable())
            .finish()
    }
}

/// A writable medium backing a table writer.
pub struct OutputSink {
    inner: Box<dyn Write + Send>,
    name: Option<String>,
}

impl OutputSink {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            inner: Box::new(writer),
            name: None,
        }
    }

    /// Create (or truncate) a file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        Ok(Self {
            inner: Box::new(io::BufWriter::new(file)),
            name: Some(path.display().to_string()),
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSink").field("name", &self.name).finish()
    }
}

/// A clonable in-memory byte sink.
///
/// Handy when the writer takes ownership of its sink but the caller still
/// wants to inspect the output.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.bytes.lock().clone()
    }

    /// Everything written so far, decoded as UTF-8 (lossy).
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    pub fn len(&self) -> usize {
        self.bytes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.lock().is_empty()
    }

    /// A sink writing into this buffer.
    pub fn sink(&self) -> OutputSink {
        OutputSink::new(self.clone())
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
