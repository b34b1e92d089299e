//! Resumable Recon parsers.
//!
//! Every parser is a state machine value. [`Parser::feed`] consumes chars
//! while progress is possible and hands back one of:
//!
//! - `Cont(parser)` - the input went empty; feed the returned parser again
//!   once more text is available
//! - `Done(output)` - the production is complete
//! - `Error(err)` - the input cannot be parsed
//!
//! Partially parsed sub-values live inside the returned parser, so suspending
//! and resuming never re-reads input.
//!
//! # Architecture
//!
//! - **document.rs** - `DocumentParser`, the public entry point
//! - **block.rs** - items separated by `,` `;` or newlines, `key:value` slots
//! - **expr.rs** - operator precedence (shunting-yard with explicit stacks)
//! - **literal.rs** - dispatch on the first char of a primary
//! - **record.rs / markup.rs / attr.rs / selector.rs** - nested structures
//! - **ident.rs / string.rs / number.rs / data.rs** - scalars

use crate::error::{ParseError, ParseErrorCode};
use crate::grammar::{is_digit, is_ident_start, is_separator};
use crate::input::Input;
use crate::mark::Mark;
use crate::settings::ParserSettings;
use crate::value::{Field, Func, Item, Operator, Record, Selector, Value};

/// Feed a boxed sub-parser. Evaluates to its output when done; otherwise
/// stores the suspended sub-parser in `$this.state` and returns from the
/// enclosing `feed`.
macro_rules! feed_sub {
    ($this:ident, $sub:expr, $input:expr, $state:path) => {
        match $sub.feed($input) {
            $crate::parser::ParseStep::Done(output) => output,
            $crate::parser::ParseStep::Cont(sub) => {
                $this.state = $state(Box::new(sub));
                return $crate::parser::ParseStep::Cont($this);
            }
            $crate::parser::ParseStep::Error(error) => {
                return $crate::parser::ParseStep::Error(error);
            }
        }
    };
}

mod attr;
mod block;
mod data;
mod document;
mod expr;
mod ident;
mod literal;
mod markup;
mod number;
mod record;
mod selector;
mod string;

pub use attr::AttrParser;
pub use block::{BlockItemParser, BlockParser};
pub use data::DataParser;
pub use document::DocumentParser;
pub use expr::ExprParser;
pub use ident::IdentParser;
pub use literal::LiteralParser;
pub use markup::MarkupParser;
pub use number::NumberParser;
pub use record::RecordParser;
pub use selector::SelectorParser;
pub use string::StringParser;

/// Outcome of feeding a parser.
#[derive(Debug)]
pub enum ParseStep<P, T> {
    /// Input ran dry; resume with the contained parser.
    Cont(P),
    Done(T),
    Error(ParseError),
}

impl<P, T> ParseStep<P, T> {
    pub fn is_cont(&self) -> bool {
        matches!(self, ParseStep::Cont(_))
    }

    pub fn is_done(&self) -> bool {
        matches!(self, ParseStep::Done(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ParseStep::Error(_))
    }

    /// The output of a finished parse.
    pub fn done(self) -> Option<T> {
        match self {
            ParseStep::Done(output) => Some(output),
            _ => None,
        }
    }

    pub fn error(self) -> Option<ParseError> {
        match self {
            ParseStep::Error(error) => Some(error),
            _ => None,
        }
    }
}

/// A resumable parser.
pub trait Parser: Sized {
    type Output;

    fn feed<I: Input + ?Sized>(self, input: &mut I) -> ParseStep<Self, Self::Output>;
}

/// The lookahead state of an input.
pub(crate) enum Peek {
    Char(char),
    Empty,
    Done,
    Error(ParseError),
}

pub(crate) fn peek<I: Input + ?Sized>(input: &I) -> Peek {
    if input.is_cont() {
        match input.try_head() {
            Ok(c) => Peek::Char(c),
            Err(err) => Peek::Error(ParseError::input(&err, input.mark())),
        }
    } else if input.is_empty() {
        Peek::Empty
    } else if input.is_error() {
        let mark = input.mark();
        Peek::Error(match input.trap() {
            Some(err) => ParseError::input(err, mark),
            None => ParseError::new(ParseErrorCode::Input, ParseErrorCode::Input.message(), mark),
        })
    } else {
        Peek::Done
    }
}

/// Step over chars matching `skip`, then peek.
pub(crate) fn skip_while<I: Input + ?Sized>(input: &mut I, skip: impl Fn(char) -> bool) -> Peek {
    loop {
        match peek(input) {
            Peek::Char(c) if skip(c) => input.step(),
            other => return other,
        }
    }
}

/// Nesting depth of the production being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Nesting {
    depth: usize,
    max: usize,
}

impl Nesting {
    pub(crate) fn root(settings: &ParserSettings) -> Self {
        Self { depth: 0, max: settings.max_depth }
    }

    /// One level deeper, or `DepthExceeded`.
    pub(crate) fn enter(self, mark: Mark) -> Result<Nesting, ParseError> {
        self.admit(1, || mark)?;
        Ok(Self { depth: self.depth + 1, max: self.max })
    }

    /// Check that a value `depth` levels deep fits below this level.
    pub(crate) fn admit(self, depth: usize, mark: impl FnOnce() -> Mark) -> Result<(), ParseError> {
        if self.depth.saturating_add(depth) > self.max {
            return Err(ParseError::new(
                ParseErrorCode::DepthExceeded,
                format!("nesting deeper than {}", self.max),
                mark(),
            ));
        }
        Ok(())
    }
}

/// Levels of records, operators and functions below `value`. A selector
/// adds a level only through its predicates and literals.
pub(crate) fn value_depth(value: &Value) -> usize {
    match value {
        Value::Record(record) => {
            1 + record
                .items()
                .iter()
                .map(|item| match item {
                    Item::Value(value) | Item::Field(Field::Attr { value, .. }) => value_depth(value),
                    Item::Field(Field::Slot { key, value }) => value_depth(key).max(value_depth(value)),
                })
                .max()
                .unwrap_or(0)
        }
        Value::Operator(operator) => {
            1 + match operator {
                Operator::Binary { lhs, rhs, .. } => value_depth(lhs).max(value_depth(rhs)),
                Operator::Unary { operand, .. } => value_depth(operand),
                Operator::Conditional { cond, then, otherwise } => {
                    value_depth(cond).max(value_depth(then)).max(value_depth(otherwise))
                }
                Operator::Invoke { func, args } => value_depth(func).max(value_depth(args)),
            }
        }
        Value::Func(Func::Lambda { bindings, template }) => 1 + value_depth(bindings).max(value_depth(template)),
        Value::Selector(selector) => {
            let mut depth = 0;
            let mut step = selector;
            while let Some(next) = step.next() {
                if let Selector::Filter { predicate: inner, .. } | Selector::Literal { item: inner, .. } = step {
                    depth = depth.max(1 + value_depth(inner));
                }
                step = next;
            }
            depth
        }
        _ => 0,
    }
}

impl Default for Nesting {
    fn default() -> Self {
        Self::root(&ParserSettings::default())
    }
}

/// Chars that can begin a literal.
pub(crate) fn is_literal_start(c: char) -> bool {
    matches!(c, '{' | '[' | '(' | '@' | '$' | '%' | '"' | '\'' | '`') || is_digit(c) || is_ident_start(c)
}

/// Chars that can begin a block item.
pub(crate) fn is_item_start(c: char) -> bool {
    is_literal_start(c) || matches!(c, ':' | '!' | '~' | '-' | '+')
}

/// Chars that end a lone attribute item.
pub(crate) fn is_item_end(c: char) -> bool {
    is_separator(c) || matches!(c, '}' | ')' | ']')
}

/// Collapse parsed block items into one value: nothing gives `empty`, a
/// single bare value gives itself, anything else a record.
pub(crate) fn bind_items(items: Vec<Item>, empty: Value) -> Value {
    match <[Item; 1]>::try_from(items) {
        Ok([Item::Value(value)]) => value,
        Ok([field]) => Value::Record(Record::of([field])),
        Err(items) if items.is_empty() => empty,
        Err(items) => Value::Record(Record::from_items(items)),
    }
}
