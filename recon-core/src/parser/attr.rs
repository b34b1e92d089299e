//! Attributes: `@name` with an optional adjacent `(params)`.

use std::mem;

use super::{bind_items, peek, skip_while, BlockParser, IdentParser, Nesting, ParseStep, Parser, Peek, StringParser};
use crate::error::ParseError;
use crate::grammar::{is_ident_start, is_whitespace};
use crate::input::Input;
use crate::value::{Field, Value};

enum AttrState {
    At,
    Name,
    Ident(Box<IdentParser>),
    Quoted(Box<StringParser>),
    AfterName,
    Params(Box<BlockParser>),
    ParamsClose,
}

/// Parses an attribute into a [`Field::Attr`].
///
/// Without parameters the value is `Extant`; `@a(1)` has value `1` and
/// `@a(x:1, y:2)` a record of the parameter items.
pub struct AttrParser {
    nesting: Nesting,
    key: String,
    value: Value,
    state: AttrState,
}

impl AttrParser {
    pub fn new() -> Self {
        Self::nested(Nesting::default())
    }

    pub(crate) fn nested(nesting: Nesting) -> Self {
        Self { nesting, key: String::new(), value: Value::Extant, state: AttrState::At }
    }

    fn finish(&mut self) -> ParseStep<Self, Field> {
        let key = mem::take(&mut self.key);
        let value = mem::replace(&mut self.value, Value::Extant);
        ParseStep::Done(Field::Attr { key, value })
    }
}

impl Default for AttrParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for AttrParser {
    type Output = Field;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> ParseStep<Self, Field> {
        loop {
            match mem::replace(&mut self.state, AttrState::At) {
                AttrState::At => match peek(input) {
                    Peek::Char('@') => {
                        input.step();
                        self.state = AttrState::Name;
                    }
                    Peek::Char(c) => return ParseStep::Error(ParseError::expected('@', Some(c), input.mark())),
                    Peek::Done => return ParseStep::Error(ParseError::expected('@', None, input.mark())),
                    Peek::Empty => return ParseStep::Cont(self),
                    Peek::Error(error) => return ParseStep::Error(error),
                },
                AttrState::Name => match peek(input) {
                    Peek::Char('"' | '\'' | '`') => self.state = AttrState::Quoted(Box::default()),
                    Peek::Char(c) if is_ident_start(c) => self.state = AttrState::Ident(Box::default()),
                    Peek::Char(c) => return ParseStep::Error(ParseError::unexpected(c, input.mark())),
                    Peek::Done => return ParseStep::Error(ParseError::unexpected_end("attribute name", input.mark())),
                    Peek::Empty => {
                        self.state = AttrState::Name;
                        return ParseStep::Cont(self);
                    }
                    Peek::Error(error) => return ParseStep::Error(error),
                },
                AttrState::Ident(parser) => {
                    self.key = feed_sub!(self, parser, input, AttrState::Ident);
                    self.state = AttrState::AfterName;
                }
                AttrState::Quoted(parser) => {
                    self.key = feed_sub!(self, parser, input, AttrState::Quoted);
                    self.state = AttrState::AfterName;
                }
                AttrState::AfterName => match peek(input) {
                    Peek::Char('(') => {
                        let nesting = match self.nesting.enter(input.mark()) {
                            Ok(nesting) => nesting,
                            Err(error) => return ParseStep::Error(error),
                        };
                        input.step();
                        self.state = AttrState::Params(Box::new(BlockParser::nested(nesting)));
                    }
                    Peek::Empty => {
                        self.state = AttrState::AfterName;
                        return ParseStep::Cont(self);
                    }
                    Peek::Error(error) => return ParseStep::Error(error),
                    Peek::Char(_) | Peek::Done => return self.finish(),
                },
                AttrState::Params(parser) => {
                    let items = feed_sub!(self, parser, input, AttrState::Params);
                    self.value = bind_items(items, Value::Extant);
                    self.state = AttrState::ParamsClose;
                }
                AttrState::ParamsClose => match skip_while(input, is_whitespace) {
                    Peek::Char(')') => {
                        input.step();
                        return self.finish();
                    }
                    Peek::Char(c) => return ParseStep::Error(ParseError::expected(')', Some(c), input.mark())),
                    Peek::Done => return ParseStep::Error(ParseError::expected(')', None, input.mark())),
                    Peek::Empty => {
                        self.state = AttrState::ParamsClose;
                        return ParseStep::Cont(self);
                    }
                    Peek::Error(error) => return ParseStep::Error(error),
                },
            }
        }
    }
}
