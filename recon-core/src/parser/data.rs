//! `%` base-64 data literals.

use super::{peek, ParseStep, Parser, Peek};
use crate::error::{ParseError, ParseErrorCode};
use crate::grammar::is_base64_char;
use crate::input::Input;
use crate::value::Data;

#[derive(Debug, Default)]
pub struct DataParser {
    text: String,
    opened: bool,
}

impl DataParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn finish<I: Input + ?Sized>(&self, input: &I) -> ParseStep<Self, Data> {
        match Data::from_base64(&self.text) {
            Ok(data) => ParseStep::Done(data),
            Err(err) => ParseStep::Error(ParseError::new(ParseErrorCode::InvalidData, err.to_string(), input.mark())),
        }
    }
}

impl Parser for DataParser {
    type Output = Data;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> ParseStep<Self, Data> {
        loop {
            match peek(input) {
                Peek::Char('%') if !self.opened => {
                    self.opened = true;
                    input.step();
                }
                Peek::Char(c) if !self.opened => {
                    return ParseStep::Error(ParseError::expected('%', Some(c), input.mark()));
                }
                Peek::Done if !self.opened => {
                    return ParseStep::Error(ParseError::expected('%', None, input.mark()));
                }
                Peek::Char(c) if is_base64_char(c) => {
                    self.text.push(c);
                    input.step();
                }
                Peek::Empty => return ParseStep::Cont(self),
                Peek::Error(error) => return ParseStep::Error(error),
                Peek::Char(_) | Peek::Done => return self.finish(input),
            }
        }
    }
}
