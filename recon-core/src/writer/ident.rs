//! Identifier and string writers.

use super::{ready, WriteStep, Writer};
use crate::error::WriteError;
use crate::grammar::{is_ident_char, is_ident_start, is_markup_special};
use crate::output::Output;

/// Writes a bare identifier, validating each char against the identifier
/// tables as it goes.
#[derive(Debug, Clone)]
pub struct IdentWriter<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> IdentWriter<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl Writer for IdentWriter<'_> {
    fn pull<O: Output + ?Sized>(mut self, output: &mut O) -> WriteStep<Self> {
        if self.text.is_empty() {
            return WriteStep::Error(WriteError::Unwritable("empty identifier".into()));
        }
        while let Some(c) = self.text[self.pos..].chars().next() {
            let valid = if self.pos == 0 { is_ident_start(c) } else { is_ident_char(c) };
            if !valid {
                return WriteStep::Error(WriteError::InvalidIdent(c));
            }
            match ready(output) {
                Ok(true) => {}
                Ok(false) => return WriteStep::Cont(self),
                Err(error) => return WriteStep::Error(error),
            }
            if let Err(error) = output.write(c) {
                return WriteStep::Error(error.into());
            }
            self.pos += c.len_utf8();
        }
        WriteStep::Done
    }
}

#[derive(Debug, Clone, Copy)]
enum StringStep {
    Open,
    Body,
    Escape { chars: [char; 6], len: u8, at: u8 },
    Close,
}

/// Writes text either double-quoted with escapes, or as markup text with
/// the markup specials backslash-escaped.
#[derive(Debug, Clone)]
pub struct StringWriter<'a> {
    text: &'a str,
    pos: usize,
    quoted: bool,
    step: StringStep,
}

impl<'a> StringWriter<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0, quoted: true, step: StringStep::Open }
    }

    /// Text inside `[...]`, without quotes.
    pub fn markup(text: &'a str) -> Self {
        Self { text, pos: 0, quoted: false, step: StringStep::Body }
    }

    fn escape(&self, c: char) -> Option<([char; 6], u8)> {
        if !self.quoted {
            return is_markup_special(c).then_some((['\\', c, '\0', '\0', '\0', '\0'], 2));
        }
        let short = match c {
            '"' => '"',
            '\\' => '\\',
            '\n' => 'n',
            '\r' => 'r',
            '\t' => 't',
            '\u{8}' => 'b',
            '\u{C}' => 'f',
            c if c < ' ' || c == '\u{7F}' => {
                let hex = |shift: u32| char::from_digit((c as u32 >> shift) & 0xF, 16).unwrap_or('0');
                return Some((['\\', 'u', '0', '0', hex(4), hex(0)], 6));
            }
            _ => return None,
        };
        Some((['\\', short, '\0', '\0', '\0', '\0'], 2))
    }
}

impl Writer for StringWriter<'_> {
    fn pull<O: Output + ?Sized>(mut self, output: &mut O) -> WriteStep<Self> {
        loop {
            let c = match self.step {
                StringStep::Open | StringStep::Close => '"',
                StringStep::Escape { chars, at, .. } => chars[at as usize],
                StringStep::Body => match self.text[self.pos..].chars().next() {
                    Some(c) => {
                        if let Some((chars, len)) = self.escape(c) {
                            self.pos += c.len_utf8();
                            self.step = StringStep::Escape { chars, len, at: 0 };
                            continue;
                        }
                        c
                    }
                    None if self.quoted => {
                        self.step = StringStep::Close;
                        continue;
                    }
                    None => return WriteStep::Done,
                },
            };
            match ready(output) {
                Ok(true) => {}
                Ok(false) => return WriteStep::Cont(self),
                Err(error) => return WriteStep::Error(error),
            }
            if let Err(error) = output.write(c) {
                return WriteStep::Error(error.into());
            }
            self.step = match self.step {
                StringStep::Open => StringStep::Body,
                StringStep::Close => return WriteStep::Done,
                StringStep::Escape { chars, len, at } if at + 1 < len => StringStep::Escape { chars, len, at: at + 1 },
                StringStep::Escape { .. } => StringStep::Body,
                StringStep::Body => {
                    self.pos += c.len_utf8();
                    StringStep::Body
                }
            };
        }
    }
}
