//! Braced records: `{ items }`.

use std::mem;

use super::{peek, skip_while, BlockParser, Nesting, ParseStep, Parser, Peek};
use crate::error::ParseError;
use crate::grammar::is_whitespace;
use crate::input::Input;
use crate::value::{Item, Record};

enum RecordState {
    Open,
    Block(Box<BlockParser>),
    Close,
}

/// Parses `{...}` into a [`Record`], appending to any items already
/// collected (the attributes of `@tag{...}`).
pub struct RecordParser {
    nesting: Nesting,
    items: Vec<Item>,
    state: RecordState,
}

impl RecordParser {
    pub fn new() -> Self {
        Self::nested(Nesting::default())
    }

    pub(crate) fn nested(nesting: Nesting) -> Self {
        Self::with_builder(nesting, Vec::new())
    }

    pub(crate) fn with_builder(nesting: Nesting, items: Vec<Item>) -> Self {
        Self { nesting, items, state: RecordState::Open }
    }
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for RecordParser {
    type Output = Record;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> ParseStep<Self, Record> {
        loop {
            match mem::replace(&mut self.state, RecordState::Open) {
                RecordState::Open => match peek(input) {
                    Peek::Char('{') => {
                        let nesting = match self.nesting.enter(input.mark()) {
                            Ok(nesting) => nesting,
                            Err(error) => return ParseStep::Error(error),
                        };
                        input.step();
                        self.state = RecordState::Block(Box::new(BlockParser::nested(nesting)));
                    }
                    Peek::Char(c) => return ParseStep::Error(ParseError::expected('{', Some(c), input.mark())),
                    Peek::Done => return ParseStep::Error(ParseError::expected('{', None, input.mark())),
                    Peek::Empty => return ParseStep::Cont(self),
                    Peek::Error(error) => return ParseStep::Error(error),
                },
                RecordState::Block(parser) => {
                    let items = feed_sub!(self, parser, input, RecordState::Block);
                    self.items.extend(items);
                    self.state = RecordState::Close;
                }
                RecordState::Close => match skip_while(input, is_whitespace) {
                    Peek::Char('}') => {
                        input.step();
                        return ParseStep::Done(Record::from_items(mem::take(&mut self.items)));
                    }
                    Peek::Char(c) => return ParseStep::Error(ParseError::expected('}', Some(c), input.mark())),
                    Peek::Done => return ParseStep::Error(ParseError::expected('}', None, input.mark())),
                    Peek::Empty => {
                        self.state = RecordState::Close;
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
    use crate::settings::ParserSettings;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn record(text: &str) -> Record {
        let record = run(RecordParser::new(), text).unwrap();
        assert_eq!(run_chars(RecordParser::new(), text).unwrap(), record);
        record
    }

    #[test]
    fn test_records() {
        assert!(record("{}").is_empty());
        assert!(record("{ \n }").is_empty());
        assert_eq!(record("{1,2,3}"), Record::of([1, 2, 3]));
        assert_eq!(
            record("{\n  name: recon\n  version: 2\n}"),
            Record::of([Item::slot("name", "recon"), Item::slot("version", 2)])
        );
    }

    #[test]
    fn test_nested_records() {
        let inner = Record::of([Item::slot("b", 1)]);
        assert_eq!(record("{a:{b:1}}"), Record::of([Item::slot("a", inner)]));
        assert_eq!(record("{{}}"), Record::of([Value::Record(Record::new())]));
    }

    #[test]
    fn test_builder_prefix() {
        let parser = RecordParser::with_builder(Nesting::default(), vec![Item::attr("point")]);
        let record = run(parser, "{x:1,y:2}").unwrap();
        assert_eq!(record, Record::of([Item::attr("point"), Item::slot("x", 1), Item::slot("y", 2)]));
        assert_eq!(record.tag(), Some("point"));
    }

    #[test]
    fn test_unclosed() {
        assert_eq!(run(RecordParser::new(), "{a:1").unwrap_err().code, ParseErrorCode::Expected);
        assert_eq!(run(RecordParser::new(), "{a:1)").unwrap_err().code, ParseErrorCode::Expected);
    }

    #[test]
    fn test_depth_limit() {
        let nesting = Nesting::root(&ParserSettings::default().with_max_depth(2));
        assert!(run(RecordParser::nested(nesting), "{{}}").is_ok());
        let err = run(RecordParser::nested(nesting), "{{{}}}").unwrap_err();
        assert_eq!(err.code, ParseErrorCode::DepthExceeded);
    }
}
