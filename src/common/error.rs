//! Unified error type for tabula.
//!
//! Every reader, writer and registry in the crate reports failures through
//! this single enum, so callers can mix formats without juggling error types.
use thiserror::Error;

/// Main error type for tabula operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing error
    #[error("XML error: {0}")]
    XmlError(String),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// Invalid or malformed input
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// An input or output medium was bound twice
    #[error("{0} is already bound to a medium")]
    AlreadyBound(&'static str),

    /// `next_row` was called on an exhausted reader
    #[error("No more rows available")]
    NoMoreRows,

    /// Header lookup on a reader without a header row
    #[error("Reader is not configured with a header row")]
    NoHeaderRow,

    /// Operation not valid in the current lifecycle state
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// A type conversion handler rejected its input
    #[error("Cannot convert '{value}' to {type_name}: {reason}")]
    Conversion {
        type_name: String,
        value: String,
        reason: String,
    },

    /// No reader or writer registered for a MIME type
    #[error("Unsupported MIME type: {0}")]
    UnsupportedMimeType(String),

    /// The MIME type of a file could not be determined
    #[error("Cannot determine MIME type of '{0}'")]
    UnknownMimeType(String),

    /// Bean marshalling failure
    #[error("Bean error: {0}")]
    Bean(String),

    /// Background parsing was cancelled
    #[error("Parsing cancelled")]
    Cancelled,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a conversion error for `value` rejected by the `type_name` handler.
    pub fn conversion(
        type_name: impl Into<String>,
        value: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Error::Conversion {
            type_name: type_name.into(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    /// Illegal state error for a closed reader or writer.
    pub(crate) fn closed(what: &str) -> Self {
        Error::IllegalState(format!("{} is closed", what))
    }

    /// Illegal state error for a reader or writer without a medium.
    pub(crate) fn unbound(what: &str) -> Self {
        Error::IllegalState(format!("{} has no medium bound", what))
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlError(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlError(err.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipError(err.to_string())
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Error::Other(format!("Formatting error: {}", err))
    }
}

/// Result type for tabula operations.
pub type Result<T> = std::result::Result<T, Error>;
