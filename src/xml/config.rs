//! Tag and attribute names of the record XML layout.

use serde::{Deserialize, Serialize};

/// Layout shared by [`super::XmlReader`] and [`super::XmlWriter`].
///
/// The default layout looks like this:
///
/// ```xml
/// <table>
///     <record>
///         <column name="id" type="i32">1</column>
///         <column name="note"/>
///     </record>
/// </table>
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlConfig {
    /// Root element written by the writer. The reader accepts any root.
    pub root_tag: String,
    pub row_tag: String,
    /// Column element name when column names are carried in an attribute
    pub column_tag: String,
    pub name_attribute: String,
    pub type_attribute: String,
    /// Use the column name as element name instead of `column_tag` + name attribute
    pub use_column_name_tags: bool,
    /// Reader: expose the column names as header row
    pub has_header_row: bool,
    /// Writer: the first printed row carries the column names
    pub write_header_row: bool,
    /// Encoding name written into the XML declaration
    pub encoding: String,
    /// Rows buffered between the parser thread and the consumer
    pub queue_capacity: usize,
}

impl Default for XmlConfig {
    fn default() -> Self {
        Self {
            root_tag: "table".to_string(),
            row_tag: "record".to_string(),
            column_tag: "column".to_string(),
            name_attribute: "name".to_string(),
            type_attribute: "type".to_string(),
            use_column_name_tags: false,
            has_header_row: true,
            write_header_row: false,
            encoding: "UTF-8".to_string(),
            queue_capacity: 20,
        }
    }
}

impl XmlConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root_tag(mut self, tag: impl Into<String>) -> Self {
        self.root_tag = tag.into();
        self
    }

    pub fn with_row_tag(mut self, tag: impl Into<String>) -> Self {
        self.row_tag = tag.into();
        self
    }

    pub fn with_column_tag(mut self, tag: impl Into<String>) -> Self {
        self.column_tag = tag.into();
        self
    }

    pub fn with_name_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.name_attribute = attribute.into();
        self
    }

    pub fn with_type_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.type_attribute = attribute.into();
        self
    }

    pub fn with_column_name_tags(mut self, enabled: bool) -> Self {
        self.use_column_name_tags = enabled;
        self
    }

    pub fn with_header_row(mut self, has_header_row: bool) -> Self {
        self.has_header_row = has_header_row;
        self
    }

    pub fn with_write_header_row(mut self, enabled: bool) -> Self {
        self.write_header_row = enabled;
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }
}
