//! Common types and utilities shared across formats.

// Submodule declarations
pub mod bom;
pub mod error;
pub mod escape;
pub mod io;

// Re-exports for convenience
pub use bom::{BomKind, detect_bom, strip_bom, write_bom};
pub use error::{Error, Result};
pub use escape::{escape_html, escape_xml, resolve_entity, unescape_xml};
pub use io::{InputSource, OutputSink, SharedBuffer};
