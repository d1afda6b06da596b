//! Line-buffer storage
//!
//! The engine never touches source text directly. It reads and replaces whole
//! line ranges through [`LineBuffer`], which keeps it independent of where the
//! text lives (a file on disk, an editor buffer, a test fixture).
//!
//! Rows are 0-indexed and ranges are end-exclusive, so `set_lines(3, 3, ..)`
//! inserts before row 3 and `set_lines(3, 5, vec![])` deletes rows 3 and 4.

use crate::error::BufferError;

/// Row-indexed line storage with fallible range access
pub trait LineBuffer {
    /// Declared language of the buffer contents, if known
    fn language(&self) -> Option<&str>;

    /// Number of lines in the buffer
    fn line_count(&self) -> usize;

    /// Read rows `start..end`
    fn get_lines(&self, start: usize, end: usize) -> Result<Vec<String>, BufferError>;

    /// Replace rows `start..end` with `lines`
    fn set_lines(&mut self, start: usize, end: usize, lines: Vec<String>) -> Result<(), BufferError>;

    /// Whole buffer joined with `\n`, suitable for handing to a parser
    fn text(&self) -> Result<String, BufferError> {
        let mut text = self.get_lines(0, self.line_count())?.join("\n");
        text.push('\n');
        Ok(text)
    }
}

/// In-memory [`LineBuffer`] backed by a vector of lines
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffer {
    lines: Vec<String>,
    language: Option<String>,
    crlf: bool,
    trailing_newline: bool,
    read_only: bool,
}

impl MemoryBuffer {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines,
            trailing_newline: true,
            ..Default::default()
        }
    }

    /// Split source text into lines, remembering its line ending style
    pub fn from_source(source: &str) -> Self {
        let crlf = source.contains("\r\n");
        let trailing_newline = source.ends_with('\n');

        let body = source.strip_suffix('\n').unwrap_or(source);
        let lines = if source.is_empty() {
            Vec::new()
        } else {
            body.split('\n')
                .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
                .collect()
        };

        Self {
            lines,
            language: None,
            crlf,
            trailing_newline,
            read_only: false,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Join the buffer back into source text using the original line ending
    pub fn to_source(&self) -> String {
        let ending = if self.crlf { "\r\n" } else { "\n" };
        let mut out = self.lines.join(ending);
        if self.trailing_newline && !self.lines.is_empty() {
            out.push_str(ending);
        }
        out
    }

    fn check_range(&self, start: usize, end: usize) -> Result<(), BufferError> {
        if start > end || end > self.lines.len() {
            return Err(BufferError::OutOfBounds {
                start,
                end,
                len: self.lines.len(),
            });
        }
        Ok(())
    }
}

impl LineBuffer for MemoryBuffer {
    fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn get_lines(&self, start: usize, end: usize) -> Result<Vec<String>, BufferError> {
        self.check_range(start, end)?;
        Ok(self.lines[start..end].to_vec())
    }

    fn set_lines(&mut self, start: usize, end: usize, lines: Vec<String>) -> Result<(), BufferError> {
        if self.read_only {
            return Err(BufferError::ReadOnly);
        }
        self.check_range(start, end)?;
        self.lines.splice(start..end, lines);
        Ok(())
    }
}

/// Whether a line holds nothing but whitespace
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_preserves_trailing_newline() {
        let buffer = MemoryBuffer::from_source("<?php\n\nuse A;\n");
        assert_eq!(buffer.line_count(), 3);
        assert_eq!(buffer.to_source(), "<?php\n\nuse A;\n");

        let buffer = MemoryBuffer::from_source("<?php\nuse A;");
        assert_eq!(buffer.to_source(), "<?php\nuse A;");
    }

    #[test]
    fn test_crlf_lines_are_stripped_and_restored() {
        let buffer = MemoryBuffer::from_source("<?php\r\nuse A;\r\n");
        assert_eq!(buffer.lines(), &["<?php".to_string(), "use A;".to_string()]);
        assert_eq!(buffer.to_source(), "<?php\r\nuse A;\r\n");
    }

    #[test]
    fn test_set_lines_replaces_and_deletes() {
        let mut buffer = MemoryBuffer::from_source("a\nb\nc\nd\n");
        buffer.set_lines(1, 3, vec!["x".to_string()]).unwrap();
        assert_eq!(buffer.to_source(), "a\nx\nd\n");

        buffer.set_lines(0, 1, vec![]).unwrap();
        assert_eq!(buffer.to_source(), "x\nd\n");
    }

    #[test]
    fn test_out_of_bounds() {
        let mut buffer = MemoryBuffer::from_source("a\nb\n");
        assert!(matches!(
            buffer.get_lines(1, 5),
            Err(BufferError::OutOfBounds { len: 2, .. })
        ));
        assert!(buffer.set_lines(3, 3, vec![]).is_err());
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let mut buffer = MemoryBuffer::from_source("a\n").read_only();
        assert_eq!(buffer.set_lines(0, 1, vec![]), Err(BufferError::ReadOnly));
        assert_eq!(buffer.get_lines(0, 1).unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn test_text_joins_lines() {
        let buffer = MemoryBuffer::from_source("<?php\r\nuse A;\r\n");
        assert_eq!(buffer.text().unwrap(), "<?php\nuse A;\n");
    }
}
