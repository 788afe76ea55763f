//! Immutable text snapshot with line/character addressing.
//!
//! Offsets are character offsets into the document. Positions are
//! `(line, character)` pairs whose column counts UTF-16 code units, the LSP
//! default encoding. Line breaks come from the rope's own line table; nothing
//! else in the crate splits lines.

use std::ops::Range as OffsetRange;

use ropey::Rope;
use tower_lsp::lsp_types::{Position, Range};

/// Characters the rope treats as line breaks (`\r\n` counts as one).
pub(crate) fn is_line_break(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}')
}

#[derive(Debug, Clone, Default)]
pub struct TextDocument {
    text: Rope,
}

impl TextDocument {
    pub fn new(text: &str) -> Self {
        Self { text: Rope::from_str(text) }
    }

    pub fn from_rope(text: Rope) -> Self {
        Self { text }
    }

    pub fn rope(&self) -> &Rope {
        &self.text
    }

    pub fn len_chars(&self) -> usize {
        self.text.len_chars()
    }

    pub fn len_lines(&self) -> usize {
        self.text.len_lines()
    }

    /// Whole text, or the text covered by `range`.
    pub fn text(&self, range: Option<Range>) -> String {
        match range {
            Some(range) => {
                let bounds = self.offset_range(range);
                self.text.slice(bounds).to_string()
            }
            None => self.text.to_string(),
        }
    }

    /// The document as characters, indexable by offset.
    pub fn chars(&self) -> Vec<char> {
        self.text.chars().collect()
    }

    /// Character offset of the first character of `line`, clamped to the end.
    pub fn line_start(&self, line: usize) -> usize {
        if line >= self.text.len_lines() {
            self.text.len_chars()
        } else {
            self.text.line_to_char(line)
        }
    }

    /// Number of characters on `line`, not counting its line break.
    fn line_len(&self, line: usize) -> usize {
        let slice = self.text.line(line);
        let mut len = slice.len_chars();
        if len > 0 && slice.char(len - 1) == '\n' {
            len -= 1;
        }
        if len > 0 && is_line_break(slice.char(len - 1)) {
            len -= 1;
        }
        len
    }

    /// UTF-16 code units on `line`, not counting its line break.
    fn line_len_utf16(&self, line: usize) -> usize {
        let start = self.text.line_to_char(line);
        let end = start + self.line_len(line);
        self.text.char_to_utf16_cu(end) - self.text.char_to_utf16_cu(start)
    }

    /// Converts a position to a character offset. Lines past the end map to the
    /// end of the document, columns past the end of a line to its line break.
    /// A column inside a surrogate pair maps to the character it splits.
    pub fn offset_at(&self, position: Position) -> usize {
        let line = position.line as usize;
        if line >= self.text.len_lines() {
            return self.text.len_chars();
        }
        let start = self.text.line_to_char(line);
        let column = (position.character as usize).min(self.line_len_utf16(line));
        self.text.utf16_cu_to_char(self.text.char_to_utf16_cu(start) + column)
    }

    /// Converts a character offset to a position, clamping to the document end.
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len_chars());
        let line = self.text.char_to_line(offset);
        let start = self.text.line_to_char(line);
        let character = self.text.char_to_utf16_cu(offset) - self.text.char_to_utf16_cu(start);
        Position::new(line as u32, character as u32)
    }

    /// Width of the characters in `range`, in UTF-16 code units.
    pub fn utf16_len(&self, range: OffsetRange<usize>) -> usize {
        let end = range.end.min(self.text.len_chars());
        let start = range.start.min(end);
        self.text.char_to_utf16_cu(end) - self.text.char_to_utf16_cu(start)
    }

    pub fn offset_range(&self, range: Range) -> OffsetRange<usize> {
        let start = self.offset_at(range.start);
        let end = self.offset_at(range.end).max(start);
        start..end
    }
}

impl From<&str> for TextDocument {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}
