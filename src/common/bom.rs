//! Byte Order Mark (BOM) helpers for text streams.
//!
//! Detection works on buffered readers so it can run on streams that cannot
//! seek; the BOM bytes are consumed only when one is found.

use crate::common::Result;
use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

/// Supported BOM encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BomKind {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl BomKind {
    /// Returns the byte representation of the BOM.
    #[inline]
    pub const fn as_bytes(&self) -> &'static [u8] {
        match self {
            BomKind::Utf8 => &UTF8_BOM,
            BomKind::Utf16Le => &UTF16_LE_BOM,
            BomKind::Utf16Be => &UTF16_BE_BOM,
        }
    }

    /// Returns the length in bytes of the BOM.
    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// The text encoding announced by this BOM.
    pub fn encoding(&self) -> &'static Encoding {
        match self {
            BomKind::Utf8 => UTF_8,
            BomKind::Utf16Le => UTF_16LE,
            BomKind::Utf16Be => UTF_16BE,
        }
    }
}

/// UTF-8 BOM bytes.
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
/// UTF-16 little-endian BOM bytes.
pub const UTF16_LE_BOM: [u8; 2] = [0xFF, 0xFE];
/// UTF-16 big-endian BOM bytes.
pub const UTF16_BE_BOM: [u8; 2] = [0xFE, 0xFF];

/// Detects a BOM at the start of `bytes`.
pub fn detect_bom(bytes: &[u8]) -> Option<BomKind> {
    if bytes.starts_with(&UTF8_BOM) {
        Some(BomKind::Utf8)
    } else if bytes.starts_with(&UTF16_LE_BOM) {
        Some(BomKind::Utf16Le)
    } else if bytes.starts_with(&UTF16_BE_BOM) {
        Some(BomKind::Utf16Be)
    } else {
        None
    }
}

/// Detects and consumes a BOM if present.
///
/// Leaves the reader untouched when no BOM is found.
pub fn strip_bom<R: BufRead>(reader: &mut R) -> Result<Option<BomKind>> {
    let kind = detect_bom(reader.fill_buf()?);
    if let Some(kind) = kind {
        reader.consume(kind.len());
    }
    Ok(kind)
}

/// Writes the requested BOM to the writer.
pub fn write_bom<W: Write>(writer: &mut W, kind: BomKind) -> Result<()> {
    writer.write_all(kind.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Read};

    #[test]
    fn test_strip_utf8_bom() {
        let data = [0xEF, 0xBB, 0xBF, b'a', b'b'];
        let mut reader = BufReader::new(&data[..]);
        assert_eq!(strip_bom(&mut reader).unwrap(), Some(BomKind::Utf8));
        let mut rest = String::new();
        reader.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "ab");
    }

    #[test]
    fn test_no_bom_leaves_input() {
        let mut reader = BufReader::new(&b"abc"[..]);
        assert_eq!(strip_bom(&mut reader).unwrap(), None);
        let mut rest = String::new();
        reader.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "abc");
    }

    #[test]
    fn test_write_bom() {
        let mut out = Vec::new();
        write_bom(&mut out, BomKind::Utf16Le).unwrap();
        assert_eq!(out, UTF16_LE_BOM);
        assert_eq!(BomKind::Utf16Le.encoding(), UTF_16LE);
    }
}
