//! Character level tokenizer for one logical CSV row.
//!
//! The tokenizer is fed the text buffered so far (always ending in `\n`) and
//! either produces a row or reports that a delimited value is still open, in
//! which case the caller appends the next physical line and tries again.

use super::config::CsvConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Before a column's content
    PreDelimiter,
    /// Inside a delimited value
    InDelimited,
    /// Inside an undelimited value
    InUndelimited,
    /// After the closing delimiter, before the separator
    PostDelimiter,
    /// Comment text up to the end of the line
    Comment,
}

/// Result of tokenizing a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// A complete row; `None` marks a missing trailing column.
    Row(Vec<Option<String>>),
    /// A comment line with trimmed text.
    Comment(String),
    /// An empty line while empty lines are ignored.
    Skip,
    /// An empty line while empty lines are significant.
    EmptyRow,
    /// A delimited value spans past the buffer.
    Incomplete,
}

#[derive(Debug, Clone)]
pub(crate) struct Tokenizer {
    separator: char,
    delimiter: char,
    comment_chars: Vec<char>,
    ignore_empty_lines: bool,
}

impl Tokenizer {
    pub(crate) fn new(config: &CsvConfig) -> Self {
        Self {
            separator: config.separator,
            delimiter: config.delimiter,
            comment_chars: config.comment_chars.chars().collect(),
            ignore_empty_lines: config.ignore_empty_lines,
        }
    }

    pub(crate) fn delimiter(&self) -> char {
        self.delimiter
    }

    pub(crate) fn tokenize(&self, buffer: &str) -> Outcome {
        let mut mode = Mode::PreDelimiter;
        let mut columns: Vec<Option<String>> = Vec::new();
        let mut current = String::new();
        let mut chars = buffer.chars().enumerate().peekable();

        while let Some((i, c)) = chars.next() {
            match mode {
                Mode::PreDelimiter => {
                    if c == self.separator {
                        columns.push(Some(std::mem::take(&mut current)));
                    } else if c == self.delimiter {
                        mode = Mode::InDelimited;
                    } else if c == ' ' {
                        // leading blanks never belong to a value
                    } else if i == 0 && self.comment_chars.contains(&c) {
                        mode = Mode::Comment;
                    } else if c == '\n' {
                        if i == 0 {
                            return if self.ignore_empty_lines {
                                Outcome::Skip
                            } else {
                                Outcome::EmptyRow
                            };
                        }
                        columns.push(None);
                        return Outcome::Row(columns);
                    } else {
                        current.push(c);
                        mode = Mode::InUndelimited;
                    }
                },
                Mode::InDelimited => {
                    if c == self.delimiter {
                        if chars.next_if(|&(_, next)| next == self.delimiter).is_some() {
                            current.push(c);
                        } else {
                            mode = Mode::PostDelimiter;
                        }
                    } else {
                        current.push(c);
                    }
                },
                Mode::PostDelimiter => {
                    if c == self.separator {
                        columns.push(Some(std::mem::take(&mut current)));
                        mode = Mode::PreDelimiter;
                    } else if c == '\n' {
                        columns.push(Some(current));
                        return Outcome::Row(columns);
                    }
                },
                Mode::InUndelimited => {
                    if c == self.separator {
                        columns.push(Some(current.trim().to_string()));
                        current.clear();
                        mode = Mode::PreDelimiter;
                    } else if c == '\n' {
                        columns.push(Some(current.trim().to_string()));
                        return Outcome::Row(columns);
                    } else {
                        current.push(c);
                    }
                },
                Mode::Comment => {
                    if c == '\n' {
                        return Outcome::Comment(current.trim().to_string());
                    }
                    current.push(c);
                },
            }
        }

        // Every buffer ends in a newline, so only an open delimited value gets here.
        Outcome::Incomplete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> Tokenizer {
        Tokenizer::new(&CsvConfig::default())
    }

    fn row(cols: &[Option<&str>]) -> Outcome {
        Outcome::Row(cols.iter().map(|c| c.map(str::to_string)).collect())
    }

    #[test]
    fn test_simple_row() {
        assert_eq!(
            tokenizer().tokenize("Alice;30\n"),
            row(&[Some("Alice"), Some("30")])
        );
    }

    #[test]
    fn test_undelimited_values_are_trimmed() {
        assert_eq!(
            tokenizer().tokenize("  a b  ;c \n"),
            row(&[Some("a b"), Some("c")])
        );
    }

    #[test]
    fn test_delimited_values_keep_whitespace_and_separators() {
        assert_eq!(
            tokenizer().tokenize("\" a;b \";x\n"),
            row(&[Some(" a;b "), Some("x")])
        );
    }

    #[test]
    fn test_doubled_delimiter() {
        assert_eq!(
            tokenizer().tokenize("\"Hello \"\"World\"\"\";42\n"),
            row(&[Some("Hello \"World\""), Some("42")])
        );
    }

    #[test]
    fn test_empty_and_trailing_columns() {
        assert_eq!(
            tokenizer().tokenize(";b;\n"),
            row(&[Some(""), Some("b"), None])
        );
    }

    #[test]
    fn test_comment_only_at_line_start() {
        assert_eq!(
            tokenizer().tokenize("# ignore me \n"),
            Outcome::Comment("ignore me".to_string())
        );
        assert_eq!(
            tokenizer().tokenize("a#b;!c\n"),
            row(&[Some("a#b"), Some("!c")])
        );
        assert_eq!(tokenizer().tokenize(" #x\n"), row(&[Some("#x")]));
    }

    #[test]
    fn test_empty_line() {
        assert_eq!(tokenizer().tokenize("\n"), Outcome::Skip);
        let strict = Tokenizer::new(&CsvConfig::default().with_ignore_empty_lines(false));
        assert_eq!(strict.tokenize("\n"), Outcome::EmptyRow);
    }

    #[test]
    fn test_incomplete_multiline_value() {
        assert_eq!(tokenizer().tokenize("\"first\n"), Outcome::Incomplete);
        assert_eq!(
            tokenizer().tokenize("\"first\nsecond\";x\n"),
            row(&[Some("first\nsecond"), Some("x")])
        );
    }

    #[test]
    fn test_text_after_closing_delimiter_is_ignored() {
        assert_eq!(
            tokenizer().tokenize("\"a\" junk;b\n"),
            row(&[Some("a"), Some("b")])
        );
    }
}
