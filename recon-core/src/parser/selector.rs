//! `$` selector paths.
//!
//! After the leading `$` comes at most one head step written without a
//! dot (`$key`, `$@attr`, `$#0`, `$*`, `$**`, `$*:`, `$:*`, `$[pred]`,
//! `$(value)`), then `.step`, `#index` or `[pred]` steps. Each further
//! step counts as a level of nesting.

use std::mem;

use super::{
    bind_items, peek, skip_while, BlockParser, ExprParser, IdentParser, Nesting, ParseStep, Parser, Peek,
    StringParser,
};
use crate::error::{ParseError, ParseErrorCode};
use crate::grammar::{is_digit, is_ident_start, is_whitespace};
use crate::input::Input;
use crate::value::{Selector, Value};

enum SelectorState {
    Dollar,
    Head,
    Steps,
    Dot,
    Key(Box<IdentParser>),
    QuotedKey(Box<StringParser>),
    AttrName,
    AttrKey(Box<IdentParser>),
    AttrQuoted(Box<StringParser>),
    Index { value: usize, digits: usize },
    Star,
    Colon,
    Predicate(Box<ExprParser>),
    PredicateClose,
    Literal(Box<BlockParser>),
    LiteralClose,
}

pub struct SelectorParser {
    nesting: Nesting,
    selector: Selector,
    operand: Value,
    state: SelectorState,
}

impl SelectorParser {
    pub fn new() -> Self {
        Self::nested(Nesting::default())
    }

    pub(crate) fn nested(nesting: Nesting) -> Self {
        Self { nesting, selector: Selector::Identity, operand: Value::Absent, state: SelectorState::Dollar }
    }

    fn push(&mut self, step: impl FnOnce(Selector) -> Selector) {
        let selector = mem::replace(&mut self.selector, Selector::Identity);
        self.selector = step(selector);
        self.state = SelectorState::Steps;
    }

    fn take_operand(&mut self) -> Value {
        mem::replace(&mut self.operand, Value::Absent)
    }

    /// Dispatch on a step that can follow either `$` or `.`.
    fn key_step<I: Input + ?Sized>(&mut self, c: char, input: &mut I) -> Option<ParseError> {
        self.state = match c {
            c if is_ident_start(c) => SelectorState::Key(Box::default()),
            '"' | '\'' | '`' => SelectorState::QuotedKey(Box::default()),
            '@' => {
                input.step();
                SelectorState::AttrName
            }
            '*' => {
                input.step();
                SelectorState::Star
            }
            ':' => {
                input.step();
                SelectorState::Colon
            }
            '(' => match self.nesting.enter(input.mark()) {
                Ok(nesting) => {
                    input.step();
                    SelectorState::Literal(Box::new(BlockParser::nested(nesting)))
                }
                Err(error) => return Some(error),
            },
            c => return Some(ParseError::unexpected(c, input.mark())),
        };
        None
    }

    fn filter_step<I: Input + ?Sized>(&mut self, input: &mut I) -> Option<ParseError> {
        match self.nesting.enter(input.mark()) {
            Ok(nesting) => {
                input.step();
                self.state = SelectorState::Predicate(Box::new(ExprParser::nested(nesting)));
                None
            }
            Err(error) => Some(error),
        }
    }
}

impl Default for SelectorParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for SelectorParser {
    type Output = Selector;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> ParseStep<Self, Selector> {
        loop {
            let state = mem::replace(&mut self.state, SelectorState::Steps);
            match state {
                SelectorState::Key(parser) => {
                    let key = feed_sub!(self, parser, input, SelectorState::Key);
                    self.push(|s| s.get(key));
                    continue;
                }
                SelectorState::QuotedKey(parser) => {
                    let key = feed_sub!(self, parser, input, SelectorState::QuotedKey);
                    self.push(|s| s.get(key));
                    continue;
                }
                SelectorState::AttrKey(parser) => {
                    let key = feed_sub!(self, parser, input, SelectorState::AttrKey);
                    self.push(|s| s.get_attr(key));
                    continue;
                }
                SelectorState::AttrQuoted(parser) => {
                    let key = feed_sub!(self, parser, input, SelectorState::AttrQuoted);
                    self.push(|s| s.get_attr(key));
                    continue;
                }
                SelectorState::Predicate(parser) => {
                    self.operand = feed_sub!(self, parser, input, SelectorState::Predicate);
                    self.state = SelectorState::PredicateClose;
                    continue;
                }
                SelectorState::Literal(parser) => {
                    let items = feed_sub!(self, parser, input, SelectorState::Literal);
                    if items.is_empty() {
                        return ParseStep::Error(ParseError::new(
                            ParseErrorCode::EmptyGroup,
                            "empty selector literal",
                            input.mark(),
                        ));
                    }
                    self.operand = bind_items(items, Value::Extant);
                    self.state = SelectorState::LiteralClose;
                    continue;
                }
                _ => {}
            }

            let peeked = match state {
                SelectorState::PredicateClose | SelectorState::LiteralClose => skip_while(input, is_whitespace),
                _ => peek(input),
            };
            let c = match peeked {
                Peek::Char(c) => Some(c),
                Peek::Done => None,
                Peek::Empty => {
                    self.state = state;
                    return ParseStep::Cont(self);
                }
                Peek::Error(error) => return ParseStep::Error(error),
            };

            if matches!(state, SelectorState::Steps) && matches!(c, Some('.' | '#' | '[')) {
                match self.nesting.enter(input.mark()) {
                    Ok(nesting) => self.nesting = nesting,
                    Err(error) => return ParseStep::Error(error),
                }
            }

            match (state, c) {
                (SelectorState::Dollar, Some('$')) => {
                    input.step();
                    self.state = SelectorState::Head;
                }
                (SelectorState::Dollar, found) => {
                    return ParseStep::Error(ParseError::expected('$', found, input.mark()));
                }
                (SelectorState::Head, Some('#')) | (SelectorState::Steps, Some('#')) => {
                    input.step();
                    self.state = SelectorState::Index { value: 0, digits: 0 };
                }
                (SelectorState::Head, Some('[')) | (SelectorState::Steps, Some('[')) => {
                    if let Some(error) = self.filter_step(input) {
                        return ParseStep::Error(error);
                    }
                }
                (SelectorState::Head, Some(c))
                    if is_ident_start(c) || matches!(c, '"' | '\'' | '`' | '@' | '*' | ':' | '(') =>
                {
                    if let Some(error) = self.key_step(c, input) {
                        return ParseStep::Error(error);
                    }
                }
                (SelectorState::Steps, Some('.')) => {
                    input.step();
                    self.state = SelectorState::Dot;
                }
                (SelectorState::Head | SelectorState::Steps, _) => {
                    return ParseStep::Done(mem::replace(&mut self.selector, Selector::Identity));
                }
                (SelectorState::Dot, Some(c)) => {
                    if let Some(error) = self.key_step(c, input) {
                        return ParseStep::Error(error);
                    }
                }
                (SelectorState::Dot, None) => {
                    return ParseStep::Error(ParseError::unexpected_end("selector", input.mark()));
                }
                (SelectorState::AttrName, Some('"' | '\'' | '`')) => {
                    self.state = SelectorState::AttrQuoted(Box::default());
                }
                (SelectorState::AttrName, Some(c)) if is_ident_start(c) => {
                    self.state = SelectorState::AttrKey(Box::default());
                }
                (SelectorState::AttrName, Some(c)) => return ParseStep::Error(ParseError::unexpected(c, input.mark())),
                (SelectorState::AttrName, None) => {
                    return ParseStep::Error(ParseError::unexpected_end("attribute name", input.mark()));
                }
                (SelectorState::Index { value, digits }, Some(c)) if is_digit(c) => {
                    let digit = c as usize - '0' as usize;
                    let Some(value) = value.checked_mul(10).and_then(|v| v.checked_add(digit)) else {
                        return ParseStep::Error(ParseError::new(
                            ParseErrorCode::InvalidNumber,
                            "selector index out of range",
                            input.mark(),
                        ));
                    };
                    input.step();
                    self.state = SelectorState::Index { value, digits: digits + 1 };
                }
                (SelectorState::Index { digits: 0, .. }, _) => {
                    return ParseStep::Error(ParseError::new(
                        ParseErrorCode::InvalidNumber,
                        "expected index digits after '#'",
                        input.mark(),
                    ));
                }
                (SelectorState::Index { value, .. }, _) => self.push(|s| s.get_item(value)),
                (SelectorState::Star, Some('*')) => {
                    input.step();
                    self.push(Selector::descendants);
                }
                (SelectorState::Star, Some(':')) => {
                    input.step();
                    self.push(Selector::keys);
                }
                (SelectorState::Star, _) => self.push(Selector::children),
                (SelectorState::Colon, Some('*')) => {
                    input.step();
                    self.push(Selector::values);
                }
                (SelectorState::Colon, found) => {
                    return ParseStep::Error(ParseError::expected('*', found, input.mark()));
                }
                (SelectorState::PredicateClose, Some(']')) => {
                    input.step();
                    let predicate = self.take_operand();
                    self.push(|s| s.filter(predicate));
                }
                (SelectorState::PredicateClose, found) => {
                    return ParseStep::Error(ParseError::expected(']', found, input.mark()));
                }
                (SelectorState::LiteralClose, Some(')')) => {
                    input.step();
                    let item = self.take_operand();
                    self.push(|s| s.literal(item));
                }
                (SelectorState::LiteralClose, found) => {
                    return ParseStep::Error(ParseError::expected(')', found, input.mark()));
                }
                (
                    SelectorState::Key(_)
                    | SelectorState::QuotedKey(_)
                    | SelectorState::AttrKey(_)
                    | SelectorState::AttrQuoted(_)
                    | SelectorState::Predicate(_)
                    | SelectorState::Literal(_),
                    _,
                ) => unreachable!("sub-parser states are driven above"),
            }
        }
    }
}
