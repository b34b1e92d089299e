//! Blocks: sequences of items separated by `,`, `;` or newlines.

use std::mem;

use super::{
    is_item_end, is_item_start, peek, skip_while, AttrParser, ExprParser, LiteralParser, Nesting, ParseStep,
    Parser, Peek,
};
use crate::grammar::{is_newline, is_space, is_whitespace};
use crate::input::Input;
use crate::value::{Field, Item, Value};

enum BlockState {
    ItemStart,
    Item(Box<BlockItemParser>),
    AfterItem { newline: bool },
}

/// Parses items until a char that cannot continue the block, which is
/// left unconsumed for the enclosing production.
///
/// A separator with nothing before it contributes an `Extant` item; a
/// trailing separator contributes nothing.
pub struct BlockParser {
    nesting: Nesting,
    items: Vec<Item>,
    state: BlockState,
}

impl BlockParser {
    pub fn new() -> Self {
        Self::nested(Nesting::default())
    }

    pub(crate) fn nested(nesting: Nesting) -> Self {
        Self { nesting, items: Vec::new(), state: BlockState::ItemStart }
    }
}

impl Default for BlockParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for BlockParser {
    type Output = Vec<Item>;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> ParseStep<Self, Vec<Item>> {
        loop {
            match mem::replace(&mut self.state, BlockState::ItemStart) {
                BlockState::ItemStart => match skip_while(input, is_whitespace) {
                    Peek::Char(',' | ';') => {
                        self.items.push(Item::Value(Value::Extant));
                        input.step();
                    }
                    Peek::Char(c) if is_item_start(c) => {
                        self.state = BlockState::Item(Box::new(BlockItemParser::nested(self.nesting)));
                    }
                    Peek::Empty => return ParseStep::Cont(self),
                    Peek::Error(error) => return ParseStep::Error(error),
                    Peek::Char(_) | Peek::Done => return ParseStep::Done(mem::take(&mut self.items)),
                },
                BlockState::Item(parser) => {
                    let item = feed_sub!(self, parser, input, BlockState::Item);
                    self.items.push(item);
                    self.state = BlockState::AfterItem { newline: false };
                }
                BlockState::AfterItem { mut newline } => {
                    let peeked = loop {
                        match peek(input) {
                            Peek::Char(c) if is_space(c) => input.step(),
                            Peek::Char(c) if is_newline(c) => {
                                newline = true;
                                input.step();
                            }
                            other => break other,
                        }
                    };
                    match peeked {
                        Peek::Char(',' | ';') => input.step(),
                        Peek::Char(c) if newline && is_item_start(c) => {}
                        Peek::Empty => {
                            self.state = BlockState::AfterItem { newline };
                            return ParseStep::Cont(self);
                        }
                        Peek::Error(error) => return ParseStep::Error(error),
                        Peek::Char(_) | Peek::Done => return ParseStep::Done(mem::take(&mut self.items)),
                    }
                }
            }
        }
    }
}

enum ItemState {
    Start,
    Attr(Box<AttrParser>),
    AfterAttr,
    Key(Box<ExprParser>),
    AfterKey,
    Value(Box<ExprParser>),
}

/// Parses one block item: a lone attribute, a `key:value` slot or a value.
pub struct BlockItemParser {
    nesting: Nesting,
    attr: Option<Field>,
    key: Value,
    state: ItemState,
}

impl BlockItemParser {
    pub fn new() -> Self {
        Self::nested(Nesting::default())
    }

    pub(crate) fn nested(nesting: Nesting) -> Self {
        Self { nesting, attr: None, key: Value::Extant, state: ItemState::Start }
    }
}

impl Default for BlockItemParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for BlockItemParser {
    type Output = Item;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> ParseStep<Self, Item> {
        loop {
            match mem::replace(&mut self.state, ItemState::Start) {
                ItemState::Start => match peek(input) {
                    Peek::Char('@') => {
                        self.state = ItemState::Attr(Box::new(AttrParser::nested(self.nesting)));
                    }
                    Peek::Empty => return ParseStep::Cont(self),
                    Peek::Error(error) => return ParseStep::Error(error),
                    Peek::Char(_) | Peek::Done => {
                        self.state = ItemState::Key(Box::new(ExprParser::nested(self.nesting)));
                    }
                },
                ItemState::Attr(parser) => {
                    let field = feed_sub!(self, parser, input, ItemState::Attr);
                    self.attr = Some(field);
                    self.state = ItemState::AfterAttr;
                }
                ItemState::AfterAttr => match skip_while(input, is_space) {
                    Peek::Char(c) if is_item_end(c) => return self.lone_attr(),
                    Peek::Done => return self.lone_attr(),
                    Peek::Empty => {
                        self.state = ItemState::AfterAttr;
                        return ParseStep::Cont(self);
                    }
                    Peek::Error(error) => return ParseStep::Error(error),
                    Peek::Char(_) => {
                        let builder = self.attr.take().into_iter().map(Item::Field).collect();
                        let literal = LiteralParser::with_attrs(self.nesting, builder);
                        self.state = ItemState::Key(Box::new(ExprParser::with_literal(self.nesting, literal)));
                    }
                },
                ItemState::Key(parser) => {
                    self.key = feed_sub!(self, parser, input, ItemState::Key);
                    self.state = ItemState::AfterKey;
                }
                ItemState::AfterKey => match peek(input) {
                    Peek::Char(':') => {
                        input.step();
                        self.state = ItemState::Value(Box::new(ExprParser::nested(self.nesting)));
                    }
                    Peek::Empty => {
                        self.state = ItemState::AfterKey;
                        return ParseStep::Cont(self);
                    }
                    Peek::Error(error) => return ParseStep::Error(error),
                    Peek::Char(_) | Peek::Done => {
                        return ParseStep::Done(Item::Value(mem::replace(&mut self.key, Value::Extant)));
                    }
                },
                ItemState::Value(parser) => {
                    let value = feed_sub!(self, parser, input, ItemState::Value);
                    let key = mem::replace(&mut self.key, Value::Extant);
                    return ParseStep::Done(Item::Field(Field::Slot { key, value }));
                }
            }
        }
    }
}

impl BlockItemParser {
    fn lone_attr(&mut self) -> ParseStep<Self, Item> {
        match self.attr.take() {
            Some(field) => ParseStep::Done(Item::Field(field)),
            None => ParseStep::Done(Item::Value(Value::Extant)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::test_support::{run, run_chars};
    use crate::value::Record;
    use pretty_assertions::assert_eq;

    fn block(text: &str) -> Vec<Item> {
        let items = run(BlockParser::new(), text).unwrap();
        assert_eq!(run_chars(BlockParser::new(), text).unwrap(), items, "chunked parse of {:?}", text);
        items
    }

    #[test]
    fn test_separators() {
        let expected = vec![Item::from("a"), Item::from("b"), Item::from("c")];
        assert_eq!(block("a,b;c"), expected);
        assert_eq!(block("a\nb\r\nc"), expected);
        assert_eq!(block("a,\n\n b ;\tc,"), expected);
    }

    #[test]
    fn test_empty_items_are_extant() {
        assert_eq!(block(",a"), vec![Item::Value(Value::Extant), Item::from("a")]);
        assert_eq!(block("a,,"), vec![Item::from("a"), Item::Value(Value::Extant)]);
        assert_eq!(block(","), vec![Item::Value(Value::Extant)]);
        assert!(block("").is_empty());
    }

    #[test]
    fn test_slots() {
        assert_eq!(
            block("a:1, b : two, c:"),
            vec![Item::slot("a", 1), Item::slot("b", "two"), Item::slot("c", Value::Extant)]
        );
        assert_eq!(block(":x"), vec![Item::slot(Value::Extant, "x")]);
    }

    #[test]
    fn test_lone_attributes() {
        assert_eq!(block("@a, @b(1)"), vec![Item::attr("a"), Item::attr_with("b", 1)]);
        assert_eq!(block("@a\n@b"), vec![Item::attr("a"), Item::attr("b")]);
    }

    #[test]
    fn test_attributed_values() {
        assert_eq!(block("@a x"), vec![Item::from(Record::of([Item::attr("a"), Item::from("x")]))]);
        assert_eq!(block("@a{}"), vec![Item::from(Record::of([Item::attr("a")]))]);
        assert_eq!(block("@a:1"), vec![Item::slot(Record::of([Item::attr("a")]), 1)]);
    }

    #[test]
    fn test_stops_at_closing_bracket() {
        let mut input = crate::input::StringInput::new("a, b} rest");
        let items = BlockParser::new().feed(&mut input).done().unwrap();
        assert_eq!(items, vec![Item::from("a"), Item::from("b")]);
        assert_eq!(input.head(), '}');
    }
}
