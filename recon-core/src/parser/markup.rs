//! Markup: `[text @element[...] {items} [nested]]`.
//!
//! Text runs become `Text` items; `@` starts an element, a record whose
//! leading attributes may be followed by an adjacent `{...}` or `[...]`
//! body; `{...}` splices its items in place; a nested `[...]` becomes a
//! record item.

use std::mem;

use super::{peek, skip_while, AttrParser, BlockParser, Nesting, ParseStep, Parser, Peek, RecordParser};
use crate::error::{ParseError, ParseErrorCode};
use crate::grammar::is_whitespace;
use crate::input::Input;
use crate::value::{Item, Record, Value};

enum MarkupState {
    Open,
    Text,
    Escape,
    Element(Box<ElementParser>),
    Embedded(Box<BlockParser>),
    EmbeddedClose,
    Nested(Box<MarkupParser>),
}

/// Parses `[...]` into a [`Record`].
pub struct MarkupParser {
    nesting: Nesting,
    items: Vec<Item>,
    text: String,
    state: MarkupState,
}

impl MarkupParser {
    pub fn new() -> Self {
        Self::nested(Nesting::default())
    }

    pub(crate) fn nested(nesting: Nesting) -> Self {
        Self::with_builder(nesting, Vec::new())
    }

    pub(crate) fn with_builder(nesting: Nesting, items: Vec<Item>) -> Self {
        Self { nesting, items, text: String::new(), state: MarkupState::Open }
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            self.items.push(Item::Value(Value::Text(mem::take(&mut self.text))));
        }
    }

    /// Step over an opening bracket, one nesting level deeper.
    fn enter<I: Input + ?Sized>(&mut self, input: &mut I) -> Result<Nesting, ParseError> {
        let nesting = self.nesting.enter(input.mark())?;
        input.step();
        Ok(nesting)
    }
}

impl Default for MarkupParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for MarkupParser {
    type Output = Record;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> ParseStep<Self, Record> {
        loop {
            match mem::replace(&mut self.state, MarkupState::Text) {
                MarkupState::Open => match peek(input) {
                    Peek::Char('[') => match self.enter(input) {
                        Ok(nesting) => self.nesting = nesting,
                        Err(error) => return ParseStep::Error(error),
                    },
                    Peek::Char(c) => return ParseStep::Error(ParseError::expected('[', Some(c), input.mark())),
                    Peek::Done => return ParseStep::Error(ParseError::expected('[', None, input.mark())),
                    Peek::Empty => {
                        self.state = MarkupState::Open;
                        return ParseStep::Cont(self);
                    }
                    Peek::Error(error) => return ParseStep::Error(error),
                },
                MarkupState::Text => match peek(input) {
                    Peek::Char(']') => {
                        input.step();
                        self.flush_text();
                        return ParseStep::Done(Record::from_items(mem::take(&mut self.items)));
                    }
                    Peek::Char('\\') => {
                        input.step();
                        self.state = MarkupState::Escape;
                    }
                    Peek::Char('@') => {
                        self.flush_text();
                        self.state = MarkupState::Element(Box::new(ElementParser::nested(self.nesting)));
                    }
                    Peek::Char('{') => {
                        self.flush_text();
                        match self.enter(input) {
                            Ok(nesting) => self.state = MarkupState::Embedded(Box::new(BlockParser::nested(nesting))),
                            Err(error) => return ParseStep::Error(error),
                        }
                    }
                    Peek::Char('[') => {
                        self.flush_text();
                        self.state = MarkupState::Nested(Box::new(MarkupParser::nested(self.nesting)));
                    }
                    Peek::Char(c) => {
                        self.text.push(c);
                        input.step();
                    }
                    Peek::Done => return ParseStep::Error(ParseError::expected(']', None, input.mark())),
                    Peek::Empty => return ParseStep::Cont(self),
                    Peek::Error(error) => return ParseStep::Error(error),
                },
                MarkupState::Escape => match peek(input) {
                    Peek::Char(c) => {
                        let unescaped = match c {
                            '\\' | '[' | ']' | '{' | '}' | '@' => c,
                            'n' => '\n',
                            't' => '\t',
                            'r' => '\r',
                            'b' => '\u{8}',
                            'f' => '\u{C}',
                            c => {
                                return ParseStep::Error(ParseError::new(
                                    ParseErrorCode::InvalidEscape,
                                    format!("invalid markup escape \\{}", c),
                                    input.mark(),
                                ));
                            }
                        };
                        self.text.push(unescaped);
                        input.step();
                    }
                    Peek::Done => return ParseStep::Error(ParseError::unexpected_end("markup escape", input.mark())),
                    Peek::Empty => {
                        self.state = MarkupState::Escape;
                        return ParseStep::Cont(self);
                    }
                    Peek::Error(error) => return ParseStep::Error(error),
                },
                MarkupState::Element(parser) => {
                    let element = feed_sub!(self, parser, input, MarkupState::Element);
                    self.items.push(Item::Value(Value::Record(element)));
                }
                MarkupState::Embedded(parser) => {
                    let items = feed_sub!(self, parser, input, MarkupState::Embedded);
                    self.items.extend(items);
                    self.state = MarkupState::EmbeddedClose;
                }
                MarkupState::EmbeddedClose => match skip_while(input, is_whitespace) {
                    Peek::Char('}') => input.step(),
                    Peek::Char(c) => return ParseStep::Error(ParseError::expected('}', Some(c), input.mark())),
                    Peek::Done => return ParseStep::Error(ParseError::expected('}', None, input.mark())),
                    Peek::Empty => {
                        self.state = MarkupState::EmbeddedClose;
                        return ParseStep::Cont(self);
                    }
                    Peek::Error(error) => return ParseStep::Error(error),
                },
                MarkupState::Nested(parser) => {
                    let nested = feed_sub!(self, parser, input, MarkupState::Nested);
                    self.items.push(Item::Value(Value::Record(nested)));
                }
            }
        }
    }
}

enum ElementState {
    Attr(Box<AttrParser>),
    AfterAttr,
    Record(Box<RecordParser>),
    Markup(Box<MarkupParser>),
}

/// An element inside markup: adjacent attributes, then an optional
/// adjacent body. No spaces are skipped, since they belong to the text.
struct ElementParser {
    nesting: Nesting,
    items: Vec<Item>,
    state: ElementState,
}

impl ElementParser {
    fn nested(nesting: Nesting) -> Self {
        Self { nesting, items: Vec::new(), state: ElementState::Attr(Box::new(AttrParser::nested(nesting))) }
    }
}

impl Parser for ElementParser {
    type Output = Record;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> ParseStep<Self, Record> {
        loop {
            match mem::replace(&mut self.state, ElementState::AfterAttr) {
                ElementState::Attr(parser) => {
                    let field = feed_sub!(self, parser, input, ElementState::Attr);
                    self.items.push(Item::Field(field));
                }
                ElementState::AfterAttr => match peek(input) {
                    Peek::Char('@') => {
                        self.state = ElementState::Attr(Box::new(AttrParser::nested(self.nesting)));
                    }
                    Peek::Char('{') => {
                        let items = mem::take(&mut self.items);
                        self.state = ElementState::Record(Box::new(RecordParser::with_builder(self.nesting, items)));
                    }
                    Peek::Char('[') => {
                        let items = mem::take(&mut self.items);
                        self.state = ElementState::Markup(Box::new(MarkupParser::with_builder(self.nesting, items)));
                    }
                    Peek::Empty => return ParseStep::Cont(self),
                    Peek::Error(error) => return ParseStep::Error(error),
                    Peek::Char(_) | Peek::Done => {
                        return ParseStep::Done(Record::from_items(mem::take(&mut self.items)));
                    }
                },
                ElementState::Record(parser) => {
                    return ParseStep::Done(feed_sub!(self, parser, input, ElementState::Record));
                }
                ElementState::Markup(parser) => {
                    return ParseStep::Done(feed_sub!(self, parser, input, ElementState::Markup));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::test_support::{run, run_chars};
    use pretty_assertions::assert_eq;

    fn markup(text: &str) -> Record {
        let record = run(MarkupParser::new(), text).unwrap();
        assert_eq!(run_chars(MarkupParser::new(), text).unwrap(), record, "chunked parse of {:?}", text);
        record
    }

    fn element(items: impl IntoIterator<Item = Item>) -> Item {
        Item::Value(Value::Record(Record::of(items)))
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(markup("[hello, world]"), Record::of(["hello, world"]));
        assert!(markup("[]").is_empty());
    }

    #[test]
    fn test_escapes() {
        assert_eq!(markup(r"[a\[b\]\{c\}\@d\\e\n]"), Record::of(["a[b]{c}@d\\e\n"]));
        assert!(run(MarkupParser::new(), r"[\q]").is_err());
    }

    #[test]
    fn test_elements() {
        assert_eq!(
            markup("[Hello, @em[world]!]"),
            Record::of([
                Item::from("Hello, "),
                element([Item::attr("em"), Item::from("world")]),
                Item::from("!"),
            ])
        );
        assert_eq!(
            markup("[@a(href:x)[link] @br @img{src:y}]"),
            Record::of([
                element([Item::attr_with("a", Record::of([Item::slot("href", "x")])), Item::from("link")]),
                Item::from(" "),
                element([Item::attr("br")]),
                Item::from(" "),
                element([Item::attr("img"), Item::slot("src", "y")]),
            ])
        );
    }

    #[test]
    fn test_adjacent_attrs_form_one_element() {
        assert_eq!(markup("[@a@b x]"), Record::of([element([Item::attr("a"), Item::attr("b")]), Item::from(" x")]));
    }

    #[test]
    fn test_embedded_block_splices() {
        assert_eq!(markup("[a{1, 2}b]"), Record::of([Item::from("a"), Item::from(1), Item::from(2), Item::from("b")]));
    }

    #[test]
    fn test_nested_markup() {
        assert_eq!(markup("[a[b]]"), Record::of([Item::from("a"), Item::from(Record::of(["b"]))]));
    }

    #[test]
    fn test_builder_prefix() {
        let parser = MarkupParser::with_builder(Nesting::default(), vec![Item::attr("p")]);
        assert_eq!(run(parser, "[text]").unwrap(), Record::of([Item::attr("p"), Item::from("text")]));
    }

    #[test]
    fn test_unclosed() {
        let err = run(MarkupParser::new(), "[abc").unwrap_err();
        assert_eq!(err.code, ParseErrorCode::Expected);
    }
}
