//! Bare identifiers.

use std::mem;

use super::{peek, ParseStep, Parser, Peek};
use crate::error::ParseError;
use crate::grammar::{is_ident_char, is_ident_start, keyword};
use crate::input::Input;
use crate::value::Value;

/// Parses an identifier into its text.
#[derive(Debug, Default)]
pub struct IdentParser {
    text: String,
}

impl IdentParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Parser for IdentParser {
    type Output = String;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> ParseStep<Self, String> {
        loop {
            match peek(input) {
                Peek::Char(c) if self.text.is_empty() && is_ident_start(c) => {
                    self.text.push(c);
                    input.step();
                }
                Peek::Char(c) if !self.text.is_empty() && is_ident_char(c) => {
                    self.text.push(c);
                    input.step();
                }
                Peek::Char(c) if self.text.is_empty() => {
                    return ParseStep::Error(ParseError::unexpected(c, input.mark()));
                }
                Peek::Done if self.text.is_empty() => {
                    return ParseStep::Error(ParseError::unexpected_end("identifier", input.mark()));
                }
                Peek::Empty => return ParseStep::Cont(self),
                Peek::Error(error) => return ParseStep::Error(error),
                Peek::Char(_) | Peek::Done => return ParseStep::Done(mem::take(&mut self.text)),
            }
        }
    }
}

/// The value a bare word denotes: a keyword's boolean, otherwise text.
pub(crate) fn ident_value(text: String) -> Value {
    match keyword(&text) {
        Some(b) => Value::Bool(b),
        None => Value::Text(text),
    }
}
