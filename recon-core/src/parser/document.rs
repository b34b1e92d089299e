//! Whole documents.

use std::mem;

use tracing::trace;

use super::{bind_items, skip_while, BlockParser, Nesting, ParseStep, Parser, Peek};
use crate::error::ParseError;
use crate::grammar::is_whitespace;
use crate::input::Input;
use crate::settings::ParserSettings;
use crate::value::Value;

enum DocumentState {
    Block(Box<BlockParser>),
    Trailing,
}

/// Parses a complete Recon document into a single value.
///
/// A document holding one bare value yields that value, an empty
/// document yields `Absent`, and anything else a record of its items.
/// Text left over after the top-level block is an error.
///
/// ```
/// use recon_core::input::StringInput;
/// use recon_core::parser::{DocumentParser, ParseStep, Parser};
/// use recon_core::value::{Item, Record, Value};
///
/// let mut input = StringInput::streaming();
/// input.push_str("a: 1, b: ");
/// let parser = match DocumentParser::new().feed(&mut input) {
///     ParseStep::Cont(parser) => parser,
///     _ => unreachable!(),
/// };
/// input.push_str("2");
/// input.finish();
/// let value = parser.feed(&mut input).done().unwrap();
/// assert_eq!(value, Value::Record(Record::of([Item::slot("a", 1), Item::slot("b", 2)])));
/// ```
pub struct DocumentParser {
    value: Value,
    state: DocumentState,
}

impl DocumentParser {
    pub fn new() -> Self {
        Self::with_settings(&ParserSettings::default())
    }

    pub fn with_settings(settings: &ParserSettings) -> Self {
        let block = BlockParser::nested(Nesting::root(settings));
        Self { value: Value::Absent, state: DocumentState::Block(Box::new(block)) }
    }
}

impl Default for DocumentParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for DocumentParser {
    type Output = Value;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> ParseStep<Self, Value> {
        loop {
            match mem::replace(&mut self.state, DocumentState::Trailing) {
                DocumentState::Block(parser) => match parser.feed(input) {
                    ParseStep::Done(items) => {
                        self.value = bind_items(items, Value::Absent);
                    }
                    ParseStep::Cont(parser) => {
                        trace!(mark = %input.mark(), "document parser suspended");
                        self.state = DocumentState::Block(Box::new(parser));
                        return ParseStep::Cont(self);
                    }
                    ParseStep::Error(error) => return ParseStep::Error(error),
                },
                DocumentState::Trailing => match skip_while(input, is_whitespace) {
                    Peek::Done => return ParseStep::Done(mem::replace(&mut self.value, Value::Absent)),
                    Peek::Char(c) => return ParseStep::Error(ParseError::unexpected(c, input.mark())),
                    Peek::Empty => {
                        trace!(mark = %input.mark(), "document parser suspended");
                        return ParseStep::Cont(self);
                    }
                    Peek::Error(error) => return ParseStep::Error(error),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorCode;
    use crate::parser::test_support::{run, run_chars};
    use crate::value::{Item, Record};
    use pretty_assertions::assert_eq;

    fn document(text: &str) -> Value {
        let value = run(DocumentParser::new(), text).unwrap();
        assert_eq!(run_chars(DocumentParser::new(), text).unwrap(), value, "chunked parse of {:?}", text);
        value
    }

    #[test]
    fn test_empty_document_is_absent() {
        assert_eq!(document(""), Value::Absent);
        assert_eq!(document(" \n\t "), Value::Absent);
    }

    #[test]
    fn test_single_value() {
        assert_eq!(document("  42\n"), Value::from(42));
        assert_eq!(document("{}"), Value::Record(Record::new()));
    }

    #[test]
    fn test_mixed_items() {
        assert_eq!(
            document("a:1,b:@foo,c:3,@bar"),
            Value::Record(Record::of([
                Item::slot("a", 1),
                Item::slot("b", Record::of([Item::attr("foo")])),
                Item::slot("c", 3),
                Item::attr("bar"),
            ]))
        );
    }

    #[test]
    fn test_trailing_garbage() {
        let err = run(DocumentParser::new(), "a}").unwrap_err();
        assert_eq!(err.code, ParseErrorCode::UnexpectedChar);
        assert_eq!(err.mark.offset, 1);
    }

    #[test]
    fn test_max_depth() {
        let settings = ParserSettings::default().with_max_depth(3);
        assert!(run(DocumentParser::with_settings(&settings), "{{{}}}").is_ok());
        let err = run(DocumentParser::with_settings(&settings), "{{{{}}}}").unwrap_err();
        assert_eq!(err.code, ParseErrorCode::DepthExceeded);
    }
}
