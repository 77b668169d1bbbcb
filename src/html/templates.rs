//! Template set of the HTML table writer.

use serde::{Deserialize, Serialize};

/// Character separating the opening and closing half of a template.
pub const TEMPLATE_SEPARATOR: char = '|';

pub const DEFAULT_TABLE_TEMPLATE: &str = "<table>\n|</table>\n";
pub const DEFAULT_THEAD_TEMPLATE: &str = "\t<thead>\n|\t</thead>\n";
pub const DEFAULT_THEAD_TR_TEMPLATE: &str = "\t\t<tr>\n|\t\t</tr>\n";
pub const DEFAULT_THEAD_TH_TEMPLATE: &str = "\t\t\t<th class=\"even\">|</th>\n";
pub const DEFAULT_THEAD_TH_ODD_TEMPLATE: &str = "\t\t\t<th class=\"odd\">|</th>\n";
pub const DEFAULT_TBODY_TEMPLATE: &str = "\t<tbody>\n|\t</tbody>\n";
pub const DEFAULT_TBODY_TR_TEMPLATE: &str = "\t\t<tr class=\"even\">\n|\t\t</tr>\n";
pub const DEFAULT_TBODY_TR_ODD_TEMPLATE: &str = "\t\t<tr class=\"odd\">\n|\t\t</tr>\n";
pub const DEFAULT_TBODY_TD_TEMPLATE: &str = "\t\t\t<td class=\"even\">|</td>\n";
pub const DEFAULT_TBODY_TD_ODD_TEMPLATE: &str = "\t\t\t<td class=\"odd\">|</td>\n";

/// Header/footer templates for every part of the table.
///
/// Each template is split at the first `|`: the text before it opens the
/// part, the text after it closes the part. A template without `|` has an
/// empty footer. Body rows alternate between the even and odd row templates
/// by data row index; header and body cells alternate by column index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlTemplates {
    pub table: String,
    pub thead: String,
    pub thead_tr: String,
    pub thead_th: String,
    pub thead_th_odd: String,
    pub tbody: String,
    pub tbody_tr: String,
    pub tbody_tr_odd: String,
    pub tbody_td: String,
    pub tbody_td_odd: String,
}

impl Default for HtmlTemplates {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE_TEMPLATE.to_string(),
            thead: DEFAULT_THEAD_TEMPLATE.to_string(),
            thead_tr: DEFAULT_THEAD_TR_TEMPLATE.to_string(),
            thead_th: DEFAULT_THEAD_TH_TEMPLATE.to_string(),
            thead_th_odd: DEFAULT_THEAD_TH_ODD_TEMPLATE.to_string(),
            tbody: DEFAULT_TBODY_TEMPLATE.to_string(),
            tbody_tr: DEFAULT_TBODY_TR_TEMPLATE.to_string(),
            tbody_tr_odd: DEFAULT_TBODY_TR_ODD_TEMPLATE.to_string(),
            tbody_td: DEFAULT_TBODY_TD_TEMPLATE.to_string(),
            tbody_td_odd: DEFAULT_TBODY_TD_ODD_TEMPLATE.to_string(),
        }
    }
}

impl HtmlTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, template: impl Into<String>) -> Self {
        self.table = template.into();
        self
    }

    pub fn with_thead(mut self, template: impl Into<String>) -> Self {
        self.thead = template.into();
        self
    }

    pub fn with_thead_tr(mut self, template: impl Into<String>) -> Self {
        self.thead_tr = template.into();
        self
    }

    /// Header cell templates for even and odd columns.
    pub fn with_thead_th(mut self, even: impl Into<String>, odd: impl Into<String>) -> Self {
        self.thead_th = even.into();
        self.thead_th_odd = odd.into();
        self
    }

    pub fn with_tbody(mut self, template: impl Into<String>) -> Self {
        self.tbody = template.into();
        self
    }

    /// Body row templates for even and odd data rows.
    pub fn with_tbody_tr(mut self, even: impl Into<String>, odd: impl Into<String>) -> Self {
        self.tbody_tr = even.into();
        self.tbody_tr_odd = odd.into();
        self
    }

    /// Body cell templates for even and odd columns.
    pub fn with_tbody_td(mut self, even: impl Into<String>, odd: impl Into<String>) -> Self {
        self.tbody_td = even.into();
        self.tbody_td_odd = odd.into();
        self
    }

    pub(crate) fn header_cell(&self, column: usize) -> &str {
        if column % 2 == 0 { &self.thead_th } else { &self.thead_th_odd }
    }

    pub(crate) fn body_row(&self, row: usize) -> &str {
        if row % 2 == 0 { &self.tbody_tr } else { &self.tbody_tr_odd }
    }

    pub(crate) fn body_cell(&self, column: usize) -> &str {
        if column % 2 == 0 { &self.tbody_td } else { &self.tbody_td_odd }
    }
}

/// Opening half of a template.
pub fn header(template: &str) -> &str {
    split(template).0
}

/// Closing half of a template; empty without a separator.
pub fn footer(template: &str) -> &str {
    split(template).1
}

fn split(template: &str) -> (&str, &str) {
    template
        .split_once(TEMPLATE_SEPARATOR)
        .unwrap_or((template, ""))
}
