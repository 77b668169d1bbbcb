//! Template-driven HTML table output.

pub mod templates;
pub mod writer;

pub use templates::HtmlTemplates;
pub use writer::HtmlWriter;
