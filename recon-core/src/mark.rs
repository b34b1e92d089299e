//! Source positions for diagnostics.

use std::fmt;

/// A position within an input stream.
///
/// `offset` counts bytes from the start of the stream; `line` and `column`
/// are 1-based, with the column counted in chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Mark {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    /// Optional annotation, e.g. the stream id.
    pub note: Option<String>,
}

impl Mark {
    /// Position of the first char of a stream.
    pub const fn start() -> Self {
        Self { offset: 0, line: 1, column: 1, note: None }
    }

    #[inline]
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self { offset, line, column, note: None }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Compute the mark for a byte offset into `text`.
    ///
    /// Offsets past the end clamp to the end; offsets inside a multi-byte
    /// char resolve to the start of that char.
    pub fn locate(text: &str, offset: usize) -> Self {
        let mut offset = offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        let prefix = &text.as_bytes()[..offset];
        let line = 1 + memchr::memchr_iter(b'\n', prefix).count();
        let line_start = memchr::memrchr(b'\n', prefix).map_or(0, |i| i + 1);
        let column = 1 + text[line_start..offset].chars().count();
        Self::new(offset, line, column)
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)?;
        if let Some(note) = &self.note {
            write!(f, " ({})", note)?;
        }
        Ok(())
    }
}
