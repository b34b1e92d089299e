//! Primaries: dispatch on the first char of a literal.

use std::mem;

use super::{
    bind_items, ident::ident_value, skip_while, AttrParser, BlockParser, DataParser, IdentParser,
    MarkupParser, Nesting, NumberParser, ParseStep, Parser, Peek, RecordParser, SelectorParser, StringParser,
};
use crate::error::{ParseError, ParseErrorCode};
use crate::grammar::{is_digit, is_ident_start, is_space, is_whitespace};
use crate::input::Input;
use crate::value::{Item, Record, Value};

enum LiteralState {
    Start,
    Attr(Box<AttrParser>),
    AfterAttr,
    Ident(Box<IdentParser>),
    String(Box<StringParser>),
    Number(Box<NumberParser>),
    Data(Box<DataParser>),
    Selector(Box<SelectorParser>),
    Record(Box<RecordParser>),
    Markup(Box<MarkupParser>),
    Group(Box<BlockParser>),
    GroupClose,
}

/// Parses one literal: a scalar, selector, record, markup or group,
/// optionally prefixed by attributes.
///
/// Attributes start a record builder; whatever follows them is merged
/// into (records and markup) or appended to (scalars and groups) that
/// record. Without attributes a scalar or group yields its bare value.
pub struct LiteralParser {
    nesting: Nesting,
    builder: Option<Vec<Item>>,
    group: Value,
    state: LiteralState,
}

impl LiteralParser {
    pub fn new() -> Self {
        Self::nested(Nesting::default())
    }

    pub(crate) fn nested(nesting: Nesting) -> Self {
        Self { nesting, builder: None, group: Value::Absent, state: LiteralState::Start }
    }

    /// Continue after attributes that were already parsed.
    pub(crate) fn with_attrs(nesting: Nesting, attrs: Vec<Item>) -> Self {
        Self { nesting, builder: Some(attrs), group: Value::Absent, state: LiteralState::AfterAttr }
    }

    /// Continue a numeric literal whose `-` was already consumed.
    pub(crate) fn negative_number(nesting: Nesting) -> Self {
        let state = LiteralState::Number(Box::new(NumberParser::negative()));
        Self { nesting, builder: None, group: Value::Absent, state }
    }

    /// The final value: the builder's record when attributes were seen,
    /// else `value` itself, else `Extant`.
    fn finish(&mut self, value: Option<Value>) -> ParseStep<Self, Value> {
        match (self.builder.take(), value) {
            (Some(mut items), value) => {
                items.extend(value.map(Item::Value));
                ParseStep::Done(Value::Record(Record::from_items(items)))
            }
            (None, value) => ParseStep::Done(value.unwrap_or(Value::Extant)),
        }
    }

    /// The state that parses a literal starting with `c`, if any.
    fn dispatch<I: Input + ?Sized>(&mut self, c: char, input: &mut I) -> Result<Option<LiteralState>, ParseError> {
        let state = match c {
            '@' => LiteralState::Attr(Box::new(AttrParser::nested(self.nesting))),
            '{' => {
                let items = self.builder.take().unwrap_or_default();
                LiteralState::Record(Box::new(RecordParser::with_builder(self.nesting, items)))
            }
            '[' => {
                let items = self.builder.take().unwrap_or_default();
                LiteralState::Markup(Box::new(MarkupParser::with_builder(self.nesting, items)))
            }
            '(' => {
                let nesting = self.nesting.enter(input.mark())?;
                input.step();
                LiteralState::Group(Box::new(BlockParser::nested(nesting)))
            }
            '"' | '\'' | '`' => LiteralState::String(Box::default()),
            '%' => LiteralState::Data(Box::default()),
            '$' => LiteralState::Selector(Box::new(SelectorParser::nested(self.nesting))),
            c if is_ident_start(c) => LiteralState::Ident(Box::default()),
            c if is_digit(c) => LiteralState::Number(Box::default()),
            _ => return Ok(None),
        };
        Ok(Some(state))
    }
}

impl Default for LiteralParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for LiteralParser {
    type Output = Value;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> ParseStep<Self, Value> {
        loop {
            match mem::replace(&mut self.state, LiteralState::Start) {
                LiteralState::Start => match skip_while(input, is_space) {
                    Peek::Char(')') => return ParseStep::Error(ParseError::unexpected(')', input.mark())),
                    Peek::Char('-') => self.state = LiteralState::Number(Box::default()),
                    Peek::Char(c) => match self.dispatch(c, input) {
                        Ok(Some(state)) => self.state = state,
                        Ok(None) => return self.finish(None),
                        Err(error) => return ParseStep::Error(error),
                    },
                    Peek::Done => return self.finish(None),
                    Peek::Empty => return ParseStep::Cont(self),
                    Peek::Error(error) => return ParseStep::Error(error),
                },
                LiteralState::Attr(parser) => {
                    let field = feed_sub!(self, parser, input, LiteralState::Attr);
                    self.builder.get_or_insert_with(Vec::new).push(Item::Field(field));
                    self.state = LiteralState::AfterAttr;
                }
                LiteralState::AfterAttr => match skip_while(input, is_space) {
                    Peek::Char(c) if c != '-' => match self.dispatch(c, input) {
                        Ok(Some(state)) => self.state = state,
                        Ok(None) => return self.finish(None),
                        Err(error) => return ParseStep::Error(error),
                    },
                    Peek::Empty => {
                        self.state = LiteralState::AfterAttr;
                        return ParseStep::Cont(self);
                    }
                    Peek::Error(error) => return ParseStep::Error(error),
                    Peek::Char(_) | Peek::Done => return self.finish(None),
                },
                LiteralState::Ident(parser) => {
                    let text = feed_sub!(self, parser, input, LiteralState::Ident);
                    return self.finish(Some(ident_value(text)));
                }
                LiteralState::String(parser) => {
                    let text = feed_sub!(self, parser, input, LiteralState::String);
                    return self.finish(Some(Value::Text(text)));
                }
                LiteralState::Number(parser) => {
                    let num = feed_sub!(self, parser, input, LiteralState::Number);
                    return self.finish(Some(Value::Num(num)));
                }
                LiteralState::Data(parser) => {
                    let data = feed_sub!(self, parser, input, LiteralState::Data);
                    return self.finish(Some(Value::Data(data)));
                }
                LiteralState::Selector(parser) => {
                    let selector = feed_sub!(self, parser, input, LiteralState::Selector);
                    return self.finish(Some(Value::Selector(selector)));
                }
                LiteralState::Record(parser) => {
                    let record = feed_sub!(self, parser, input, LiteralState::Record);
                    return ParseStep::Done(Value::Record(record));
                }
                LiteralState::Markup(parser) => {
                    let record = feed_sub!(self, parser, input, LiteralState::Markup);
                    return ParseStep::Done(Value::Record(record));
                }
                LiteralState::Group(parser) => {
                    let items = feed_sub!(self, parser, input, LiteralState::Group);
                    if items.is_empty() {
                        return ParseStep::Error(ParseError::new(
                            ParseErrorCode::EmptyGroup,
                            ParseErrorCode::EmptyGroup.message(),
                            input.mark(),
                        ));
                    }
                    self.group = bind_items(items, Value::Extant);
                    self.state = LiteralState::GroupClose;
                }
                LiteralState::GroupClose => match skip_while(input, is_whitespace) {
                    Peek::Char(')') => {
                        input.step();
                        let group = mem::replace(&mut self.group, Value::Absent);
                        return self.finish(Some(group));
                    }
                    Peek::Char(c) => return ParseStep::Error(ParseError::expected(')', Some(c), input.mark())),
                    Peek::Done => return ParseStep::Error(ParseError::expected(')', None, input.mark())),
                    Peek::Empty => {
                        self.state = LiteralState::GroupClose;
                        return ParseStep::Cont(self);
                    }
                    Peek::Error(error) => return ParseStep::Error(error),
                },
            }
        }
    }
}
