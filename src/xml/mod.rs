//! Record XML reading and writing.
//!
//! Every row is an element (default `record`) whose children are the
//! columns. Column names come either from a name attribute or from the
//! element name itself, and an optional type attribute selects the
//! conversion handler used for the text content.
//!
//! Reading happens on a dedicated parser thread that hands rows over
//! through a [`queue::BoundedQueue`], so large documents are never held in
//! memory as a whole.

pub mod config;
pub mod parser;
pub mod queue;
pub mod reader;
pub mod writer;

#[cfg(test)]
mod tests;

pub use config::XmlConfig;
pub use reader::XmlReader;
pub use writer::XmlWriter;
