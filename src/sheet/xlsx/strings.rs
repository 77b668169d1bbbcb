//! The shared string table part.

use super::{NS_MAIN, XML_DECLARATION};
use crate::common::{Result, escape_xml, resolve_entity};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::fmt::Write as _;

/// Collects the distinct strings of a workbook while its sheets are written.
#[derive(Debug, Default)]
pub(crate) struct SharedStrings {
    strings: Vec<String>,
    index: HashMap<String, usize>,
    /// Total references, duplicates included
    count: usize,
}

impl SharedStrings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `s` in the table, adding it on first use.
    pub fn add(&mut self, s: &str) -> usize {
        self.count += 1;
        if let Some(&index) = self.index.get(s) {
            return index;
        }
        let index = self.strings.len();
        self.strings.push(s.to_string());
        self.index.insert(s.to_string(), index);
        index
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(128 + self.strings.len() * 32);
        xml.push_str(XML_DECLARATION);
        write!(
            xml,
            r#"<sst xmlns="{}" count="{}" uniqueCount="{}">"#,
            NS_MAIN,
            self.count,
            self.strings.len()
        )?;
        for s in &self.strings {
            if s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) {
                write!(xml, r#"<si><t xml:space="preserve">{}</t></si>"#, escape_xml(s))?;
            } else {
                write!(xml, "<si><t>{}</t></si>", escape_xml(s))?;
            }
        }
        xml.push_str("</sst>");
        Ok(xml)
    }
}

/// Read the strings of a shared string part in index order.
///
/// Rich text runs are concatenated; phonetic hints are skipped.
pub(crate) fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut phonetic_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" if phonetic_depth == 0 => in_text = true,
                b"rPh" => phonetic_depth += 1,
                _ => {},
            },
            Event::Empty(ref e) => {
                if e.local_name().as_ref() == b"si" {
                    strings.push(String::new());
                }
            },
            Event::End(ref e) => match e.local_name().as_ref() {
                b"si" => strings.push(current.take().unwrap_or_default()),
                b"t" => in_text = false,
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                _ => {},
            },
            Event::Text(ref t) => {
                if in_text && let Some(current) = current.as_mut() {
                    current.push_str(&String::from_utf8_lossy(t));
                }
            },
            Event::CData(ref t) => {
                if in_text && let Some(current) = current.as_mut() {
                    current.push_str(&String::from_utf8_lossy(t));
                }
            },
            Event::GeneralRef(ref r) => {
                if in_text && let Some(current) = current.as_mut() {
                    let name = String::from_utf8_lossy(r);
                    if let Some(resolved) = resolve_entity(&name) {
                        current.push_str(&resolved);
                    }
                }
            },
            Event::Eof => break,
            _ => {},
        }
        buf.clear();
    }
    Ok(strings)
}
