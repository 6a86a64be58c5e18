//! Source acquisition: a named chunk of microcode text plus a
//! forward-only character cursor with line/column tracking.

use std::fs::File;
use std::io::Read;
use std::iter::Peekable;
use std::str::CharIndices;

use mcode::Pos;

use crate::error::Error;

/// A compilation unit's raw text. The whole file is buffered up front;
/// all tokens borrow from this buffer for the compiler's lifetime.
#[derive(Debug, Clone)]
pub struct Source {
    name: String,
    text: String,
}

impl Source {
    /// Open and fully read a file.
    pub fn open(path: &str) -> Result<Self, Error> {
        let mut file =
            File::open(path).map_err(|e| Error::SourceNotFound(path.to_string(), e))?;
        let mut text = String::new();
        file.read_to_string(&mut text)
            .map_err(|e| Error::SourceRead(path.to_string(), e))?;
        Ok(Source {
            name: path.to_string(),
            text,
        })
    }

    /// Wrap an in-memory buffer, for embedding and tests.
    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Source {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The `line`-th source line (1-based), for diagnostics.
    pub fn line(&self, line: u32) -> Option<&str> {
        self.text.lines().nth(line.saturating_sub(1) as usize)
    }

    pub fn cursor(&self) -> Cursor<'_> {
        Cursor {
            text: &self.text,
            iter: self.text.char_indices().peekable(),
            line: 1,
            col: 1,
        }
    }
}

/// Read-once character cursor over a [`Source`].
pub struct Cursor<'a> {
    text: &'a str,
    iter: Peekable<CharIndices<'a>>,
    line: u32,
    col: u32,
}

impl<'a> Cursor<'a> {
    /// Position of the character `peek` would return.
    pub fn pos(&self) -> Pos {
        Pos::new(self.line, self.col)
    }

    pub fn peek(&mut self) -> Option<char> {
        self.iter.peek().map(|&(_, c)| c)
    }

    /// Consume and return the next character with its byte offset.
    pub fn bump(&mut self) -> Option<(usize, char)> {
        let (idx, c) = self.iter.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some((idx, c))
    }

    /// Byte offset just past the last consumed character.
    pub fn offset(&mut self) -> usize {
        self.iter
            .peek()
            .map(|&(idx, _)| idx)
            .unwrap_or(self.text.len())
    }

    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.text[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_file_fails() {
        let err = Source::open("/no/such/dir/missing.uc").unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(..)));
    }

    #[test]
    fn cursor_tracks_lines_and_columns() {
        let src = Source::from_text("t", "ab\nc");
        let mut cur = src.cursor();
        assert_eq!(cur.pos(), Pos::new(1, 1));
        assert_eq!(cur.bump(), Some((0, 'a')));
        assert_eq!(cur.pos(), Pos::new(1, 2));
        cur.bump();
        cur.bump(); // newline
        assert_eq!(cur.pos(), Pos::new(2, 1));
        assert_eq!(cur.bump(), Some((3, 'c')));
        assert_eq!(cur.bump(), None);
    }

    #[test]
    fn line_lookup() {
        let src = Source::from_text("t", "first\nsecond\n");
        assert_eq!(src.line(1), Some("first"));
        assert_eq!(src.line(2), Some("second"));
        assert_eq!(src.line(3), None);
    }
}
