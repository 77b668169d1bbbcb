//! Physical line source with charset decoding.

use crate::common::{InputSource, Result, strip_bom};
use encoding_rs::{Encoding, UTF_8};
use std::io::{BufRead, BufReader};

/// One physical line without its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Line {
    pub(crate) text: String,
    /// The line ended in `\r\n` rather than a bare `\n`.
    pub(crate) crlf: bool,
}

impl Line {
    fn new(text: &str, crlf: bool) -> Self {
        Self {
            text: text.to_string(),
            crlf,
        }
    }
}

/// Reads physical lines from an input source.
///
/// UTF-8 input is streamed line by line; other encodings are decoded in one
/// go on first read since `encoding_rs` works on complete buffers here.
#[derive(Debug)]
pub(crate) struct LineReader {
    source: BufReader<InputSource>,
    encoding: &'static Encoding,
    strip_bom: bool,
    started: bool,
    decoded: Option<(String, usize)>,
}

impl LineReader {
    pub(crate) fn new(source: InputSource, encoding: &'static Encoding, strip_bom: bool) -> Self {
        Self {
            source: BufReader::new(source),
            encoding,
            strip_bom,
            started: false,
            decoded: None,
        }
    }

    pub(crate) fn next_line(&mut self) -> Result<Option<Line>> {
        if !self.started {
            self.start()?;
        }
        if let Some((text, pos)) = &mut self.decoded {
            return Ok(next_decoded_line(text, pos));
        }

        let mut bytes = Vec::new();
        if self.source.read_until(b'\n', &mut bytes)? == 0 {
            return Ok(None);
        }
        let crlf = trim_line_end(&mut bytes);
        Ok(Some(Line {
            text: String::from_utf8_lossy(&bytes).into_owned(),
            crlf,
        }))
    }

    /// Rewind the underlying medium and drop buffered data.
    pub(crate) fn rewind(&mut self) -> Result<()> {
        self.source.get_mut().rewind()?;
        let buffered = self.source.buffer().len();
        self.source.consume(buffered);
        self.started = false;
        self.decoded = None;
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.started = true;
        let mut encoding = self.encoding;
        if self.strip_bom
            && let Some(bom) = strip_bom(&mut self.source)?
        {
            encoding = bom.encoding();
        }
        if encoding != UTF_8 {
            let mut bytes = Vec::new();
            std::io::Read::read_to_end(&mut self.source, &mut bytes)?;
            let (text, had_errors) = encoding.decode_without_bom_handling(&bytes);
            if had_errors {
                tracing::warn!(
                    "Malformed {} input replaced while decoding",
                    encoding.name()
                );
            }
            self.decoded = Some((text.into_owned(), 0));
        }
        Ok(())
    }
}

/// Drop the terminator; reports whether it was `\r\n`.
fn trim_line_end(bytes: &mut Vec<u8>) -> bool {
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
            return true;
        }
    }
    false
}

fn next_decoded_line(text: &str, pos: &mut usize) -> Option<Line> {
    if *pos >= text.len() {
        return None;
    }
    let rest = &text[*pos..];
    let Some(end) = memchr::memchr(b'\n', rest.as_bytes()) else {
        *pos = text.len();
        return Some(Line::new(rest, false));
    };
    *pos += end + 1;
    let line = &rest[..end];
    Some(match line.strip_suffix('\r') {
        Some(line) => Line::new(line, true),
        None => Line::new(line, false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(reader: &mut LineReader) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(line) = reader.next_line().unwrap() {
            out.push(line.text);
        }
        out
    }

    #[test]
    fn test_utf8_lines_with_crlf_and_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"a;b\r\nc\n\nd");
        let mut reader = LineReader::new(InputSource::from_bytes(bytes), UTF_8, true);
        assert_eq!(lines(&mut reader), vec!["a;b", "c", "", "d"]);
    }

    #[test]
    fn test_line_endings_are_reported() {
        let mut reader = LineReader::new(InputSource::from_text("a\r\nb\nc"), UTF_8, false);
        assert_eq!(reader.next_line().unwrap(), Some(Line::new("a", true)));
        assert_eq!(reader.next_line().unwrap(), Some(Line::new("b", false)));
        assert_eq!(reader.next_line().unwrap(), Some(Line::new("c", false)));
        assert_eq!(reader.next_line().unwrap(), None);

        let decoded = String::from("x\r\ny");
        let mut pos = 0;
        assert_eq!(next_decoded_line(&decoded, &mut pos), Some(Line::new("x", true)));
        assert_eq!(next_decoded_line(&decoded, &mut pos), Some(Line::new("y", false)));
    }

    #[test]
    fn test_rewind() {
        let mut reader = LineReader::new(InputSource::from_text("x\ny\n"), UTF_8, true);
        assert_eq!(reader.next_line().unwrap().map(|l| l.text).as_deref(), Some("x"));
        reader.rewind().unwrap();
        assert_eq!(lines(&mut reader), vec!["x", "y"]);
    }

    #[test]
    fn test_single_byte_encoding() {
        let bytes = vec![b'c', b'a', b'f', 0xE9, b'\n', b'z'];
        let mut reader = LineReader::new(
            InputSource::from_bytes(bytes),
            encoding_rs::WINDOWS_1252,
            false,
        );
        assert_eq!(lines(&mut reader), vec!["caf\u{e9}", "z"]);
    }

    #[test]
    fn test_utf16_bom_switches_encoding() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "a;b\nc".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let mut reader = LineReader::new(InputSource::from_bytes(bytes), UTF_8, true);
        assert_eq!(lines(&mut reader), vec!["a;b", "c"]);
    }
}
