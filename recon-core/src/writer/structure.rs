//! The structure writer: values to Recon text.
//!
//! [`ReconWriter`] keeps an explicit stack of pieces still to be written.
//! Compound pieces (values, blocks, markup bodies, selector chains) expand
//! into smaller pieces when they reach the top of the stack; leaf pieces
//! remember how far they got, so a full output suspends the writer
//! mid-token without losing anything.
//!
//! Operators are parenthesized by precedence: a left operand binding
//! looser than its operator is wrapped, as is a right operand binding
//! looser or equally tight, which keeps binary operators left-associative
//! on the way back in.

use tracing::trace;

use super::{write_from, IdentWriter, StringWriter, WriteStep, Writer};
use crate::error::WriteError;
use crate::grammar::{is_bare_text, is_ident, is_ident_char};
use crate::output::Output;
use crate::value::operator::{CONDITIONAL_PRECEDENCE, UNARY_PRECEDENCE};
use crate::value::{func::LAMBDA_PRECEDENCE, Field, Func, Item, Num, Operator, Record, Selector, UnaryOp, Value};

/// Where a value is being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    /// A bare value item of a block, or the document itself.
    Item,
    /// Anywhere inside an expression, slot or parameter list.
    Value,
    /// An element inside markup; `separate` when the next markup item
    /// would otherwise run into a bodiless element.
    Element { separate: bool },
    /// An unparenthesized operator operand. A bodiless record keeps its
    /// braces so the operator after it is not read as another attribute value.
    Operand,
}

#[derive(Debug)]
enum Piece<'a> {
    Str(&'static str, usize),
    Owned(String, usize),
    Ident(IdentWriter<'a>),
    Text(StringWriter<'a>),
    Value(&'a Value, Context),
    Item(&'a Item),
    /// Items from `index` on, comma separated.
    Block(&'a [Item], usize),
    /// Markup items from `index` on.
    Markup(&'a [Item], usize),
    /// The steps of a selector chain; `head` for the step right after `$`.
    Selector(&'a Selector, bool),
}

fn text<'a>(s: &'static str) -> Piece<'a> {
    Piece::Str(s, 0)
}

fn owned<'a>(s: String) -> Piece<'a> {
    Piece::Owned(s, 0)
}

/// Text as a bare word when it reads back as the same text.
fn text_piece(s: &str) -> Piece<'_> {
    if is_bare_text(s) {
        Piece::Ident(IdentWriter::new(s))
    } else {
        Piece::Text(StringWriter::new(s))
    }
}

/// Attribute names and selector keys are never keywords.
fn key_piece(s: &str) -> Piece<'_> {
    if is_ident(s) {
        Piece::Ident(IdentWriter::new(s))
    } else {
        Piece::Text(StringWriter::new(s))
    }
}

/// Whether the items after a record's leading attributes can be written
/// as `[...]` markup and read back unchanged.
fn is_markup_body(items: &[Item]) -> bool {
    let mut has_text = false;
    let mut after_text = false;
    for item in items {
        match item {
            Item::Value(Value::Text(s)) => {
                if s.is_empty() || after_text {
                    return false;
                }
                has_text = true;
                after_text = true;
            }
            Item::Value(Value::Record(record)) if is_element(record) => after_text = false,
            _ => return false,
        }
    }
    has_text
}

fn is_element(record: &Record) -> bool {
    record.items().first().is_some_and(Item::is_attr)
}

/// Whether a bodiless element followed by `next` needs an explicit `{}`.
fn needs_separation(next: Option<&Item>) -> bool {
    match next {
        Some(Item::Value(Value::Record(record))) => is_element(record),
        Some(Item::Value(Value::Text(s))) => s.chars().next().is_some_and(|c| is_ident_char(c) || c == '('),
        _ => false,
    }
}

/// Whether the written form of `value` starts with a digit.
fn starts_with_digit(value: &Value) -> bool {
    match value {
        Value::Num(Num::Int(n)) => *n >= 0,
        Value::Num(Num::Float(n)) => n.is_sign_positive(),
        Value::Num(Num::Uint(_)) => true,
        Value::Operator(Operator::Invoke { func, .. }) => starts_with_digit(func),
        _ => false,
    }
}

fn symbol_piece<'a>(symbol: &'static str) -> [Piece<'a>; 3] {
    [text(" "), text(symbol), text(" ")]
}

/// Writes one value as Recon text.
///
/// ```
/// use recon_core::output::StringOutput;
/// use recon_core::value::{Item, Record, Value};
/// use recon_core::writer::{ReconWriter, WriteStep, Writer};
///
/// let value = Value::Record(Record::of([Item::attr("point"), Item::slot("x", 1), Item::slot("y", 2)]));
/// let mut output = StringOutput::with_limit(8);
/// let mut text = String::new();
/// let mut writer = ReconWriter::new(&value);
/// loop {
///     let step = writer.pull(&mut output);
///     text.push_str(&output.drain());
///     match step {
///         WriteStep::Cont(next) => writer = next,
///         WriteStep::Done => break,
///         WriteStep::Error(err) => panic!("{}", err),
///     }
/// }
/// assert_eq!(text, "@point{x:1,y:2}");
/// ```
#[derive(Debug)]
pub struct ReconWriter<'a> {
    stack: Vec<Piece<'a>>,
}

impl<'a> ReconWriter<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { stack: vec![Piece::Value(value, Context::Item)] }
    }

    /// Writes `record` as a document: its items, without enclosing braces.
    pub fn block(record: &'a Record) -> Self {
        Self { stack: vec![Piece::Block(record.items(), 0)] }
    }

    fn push<I>(&mut self, pieces: I)
    where
        I: IntoIterator<Item = Piece<'a>>,
        I::IntoIter: DoubleEndedIterator,
    {
        self.stack.extend(pieces.into_iter().rev());
    }

    /// Emit or expand one piece. `Ok(false)` when the output filled up.
    fn step<O: Output + ?Sized>(&mut self, piece: Piece<'a>, output: &mut O) -> Result<bool, WriteError> {
        match piece {
            Piece::Str(s, mut pos) => {
                let finished = write_from(s, &mut pos, output)?;
                if !finished {
                    self.stack.push(Piece::Str(s, pos));
                }
                Ok(finished)
            }
            Piece::Owned(s, mut pos) => {
                let finished = write_from(&s, &mut pos, output)?;
                if !finished {
                    self.stack.push(Piece::Owned(s, pos));
                }
                Ok(finished)
            }
            Piece::Ident(writer) => match writer.pull(output) {
                WriteStep::Done => Ok(true),
                WriteStep::Cont(writer) => {
                    self.stack.push(Piece::Ident(writer));
                    Ok(false)
                }
                WriteStep::Error(error) => Err(error),
            },
            Piece::Text(writer) => match writer.pull(output) {
                WriteStep::Done => Ok(true),
                WriteStep::Cont(writer) => {
                    self.stack.push(Piece::Text(writer));
                    Ok(false)
                }
                WriteStep::Error(error) => Err(error),
            },
            Piece::Value(value, context) => self.expand_value(value, context).map(|()| true),
            Piece::Item(item) => self.expand_item(item).map(|()| true),
            Piece::Block(items, index) => {
                let Some(item) = items.get(index) else { return Ok(true) };
                let last = index + 1 == items.len();
                self.stack.push(Piece::Block(items, index + 1));
                if last && matches!(item, Item::Value(Value::Extant)) {
                    self.stack.push(text(","));
                }
                self.stack.push(Piece::Item(item));
                if index > 0 {
                    self.stack.push(text(","));
                }
                Ok(true)
            }
            Piece::Markup(items, index) => {
                let Some(item) = items.get(index) else { return Ok(true) };
                self.stack.push(Piece::Markup(items, index + 1));
                match item {
                    Item::Value(Value::Text(s)) => self.stack.push(Piece::Text(StringWriter::markup(s))),
                    Item::Value(value) => {
                        let separate = needs_separation(items.get(index + 1));
                        self.stack.push(Piece::Value(value, Context::Element { separate }));
                    }
                    Item::Field(_) => return Err(WriteError::Unwritable("field inside markup".into())),
                }
                Ok(true)
            }
            Piece::Selector(selector, head) => self.expand_selector(selector, head).map(|()| true),
        }
    }

    fn expand_value(&mut self, value: &'a Value, context: Context) -> Result<(), WriteError> {
        match value {
            Value::Record(record) => self.expand_record(record, context)?,
            Value::Data(data) => self.push([text("%"), owned(data.to_base64())]),
            Value::Text(s) => self.stack.push(text_piece(s)),
            Value::Num(num) => {
                if !num.is_finite() {
                    return Err(WriteError::Unwritable(format!("non-finite number {}", num)));
                }
                self.stack.push(owned(num.to_string()));
            }
            Value::Bool(b) => self.stack.push(text(if *b { "true" } else { "false" })),
            Value::Extant | Value::Absent => {}
            Value::Selector(selector) => self.push([text("$"), Piece::Selector(selector, true)]),
            Value::Operator(operator) => self.expand_operator(operator)?,
            Value::Func(Func::Lambda { bindings, template }) => {
                let bindings = operand(bindings, bindings.precedence() <= LAMBDA_PRECEDENCE)?;
                let template = operand(template, false)?;
                self.push(template);
                self.push(symbol_piece(">>"));
                self.push(bindings);
            }
            Value::Func(Func::Bridge { name, .. }) => {
                return Err(WriteError::Unwritable(format!("bridge function {}", name)));
            }
        }
        Ok(())
    }

    fn expand_record(&mut self, record: &'a Record, context: Context) -> Result<(), WriteError> {
        let items = record.items();
        if items.is_empty() {
            self.stack.push(text("{}"));
            return Ok(());
        }
        let split = items.iter().take_while(|item| item.is_attr()).count();
        let (attrs, body) = items.split_at(split);

        let mut pieces = Vec::new();
        for attr in attrs {
            if let Item::Field(Field::Attr { key, value }) = attr {
                pieces.push(text("@"));
                pieces.push(key_piece(key));
                pieces.extend(params(value, false)?);
            }
        }
        if body.is_empty() {
            let braces = match context {
                Context::Item => attrs.len() == 1,
                Context::Element { separate } => separate,
                Context::Operand => true,
                Context::Value => false,
            };
            if braces {
                pieces.push(text("{}"));
            }
        } else if is_markup_body(body) {
            pieces.extend([text("["), Piece::Markup(body, 0), text("]")]);
        } else {
            pieces.extend([text("{"), Piece::Block(body, 0), text("}")]);
        }
        self.push(pieces);
        Ok(())
    }

    fn expand_item(&mut self, item: &'a Item) -> Result<(), WriteError> {
        match item {
            Item::Field(Field::Attr { key, value }) => {
                let params = params(value, false)?;
                self.push(params);
                self.push([text("@"), key_piece(key)]);
            }
            Item::Field(Field::Slot { key, value }) => {
                let wrap = match key {
                    Value::Operator(_) | Value::Func(_) => true,
                    Value::Selector(selector) => {
                        matches!(selector.last(), Selector::Identity | Selector::Children { .. })
                    }
                    _ => false,
                };
                self.stack.push(Piece::Value(value, Context::Value));
                self.stack.push(text(":"));
                if wrap {
                    self.push([text("("), Piece::Value(key, Context::Value), text(")")]);
                } else {
                    self.stack.push(Piece::Value(key, Context::Value));
                }
            }
            Item::Value(value) => self.stack.push(Piece::Value(value, Context::Item)),
        }
        Ok(())
    }

    fn expand_operator(&mut self, operator: &'a Operator) -> Result<(), WriteError> {
        match operator {
            Operator::Binary { op, lhs, rhs } => {
                let p = op.precedence();
                let lhs = operand(lhs, lhs.precedence() < p)?;
                let rhs = operand(rhs, rhs.precedence() <= p)?;
                self.push(rhs);
                self.push(symbol_piece(op.symbol()));
                self.push(lhs);
            }
            Operator::Unary { op, operand: value } => {
                let wrap = value.precedence() < UNARY_PRECEDENCE || (*op == UnaryOp::Negative && starts_with_digit(value));
                let value = operand(value, wrap)?;
                self.push(value);
                self.stack.push(text(op.symbol()));
            }
            Operator::Conditional { cond, then, otherwise } => {
                let cond = operand(cond, cond.precedence() <= CONDITIONAL_PRECEDENCE)?;
                let then = operand(then, then.precedence() < CONDITIONAL_PRECEDENCE)?;
                let otherwise = operand(otherwise, otherwise.precedence() < CONDITIONAL_PRECEDENCE)?;
                self.push(otherwise);
                self.push(symbol_piece(":"));
                self.push(then);
                self.push(symbol_piece("?"));
                self.push(cond);
            }
            Operator::Invoke { func, args } => {
                let direct = match func.as_ref() {
                    Value::Selector(selector) => !selector.is_identity(),
                    Value::Text(_) | Value::Num(_) | Value::Bool(_) | Value::Data(_) => true,
                    Value::Operator(Operator::Invoke { .. }) => true,
                    _ => false,
                };
                let func = operand(func, !direct)?;
                let args = params(args, true)?;
                self.push(args);
                self.push(func);
            }
        }
        Ok(())
    }

    fn expand_selector(&mut self, selector: &'a Selector, head: bool) -> Result<(), WriteError> {
        let dot = if head { None } else { Some(text(".")) };
        let (step, then): (Vec<Piece<'a>>, &'a Selector) = match selector {
            Selector::Identity => return Ok(()),
            Selector::Get { key, then } => (dot.into_iter().chain([key_piece(key)]).collect(), then.as_ref()),
            Selector::GetAttr { key, then } => (dot.into_iter().chain([text("@"), key_piece(key)]).collect(), then.as_ref()),
            Selector::GetItem { index, then } => (vec![owned(format!("#{}", index))], then.as_ref()),
            Selector::Keys { then } => (dot.into_iter().chain([text("*:")]).collect(), then.as_ref()),
            Selector::Values { then } => (dot.into_iter().chain([text(":*")]).collect(), then.as_ref()),
            Selector::Children { then } => (dot.into_iter().chain([text("*")]).collect(), then.as_ref()),
            Selector::Descendants { then } => (dot.into_iter().chain([text("**")]).collect(), then.as_ref()),
            Selector::Filter { predicate, then } => {
                (vec![text("["), Piece::Value(predicate, Context::Value), text("]")], then.as_ref())
            }
            Selector::Literal { item, then } => {
                if matches!(item.as_ref(), Value::Extant | Value::Absent) {
                    return Err(WriteError::Unwritable("empty selector literal".into()));
                }
                let mut pieces: Vec<Piece<'a>> = dot.into_iter().collect();
                pieces.extend(params(item, true)?);
                (pieces, then.as_ref())
            }
        };
        self.stack.push(Piece::Selector(then, false));
        self.push(step);
        Ok(())
    }
}

/// An operator operand, parenthesized when `wrap`.
fn operand(value: &Value, wrap: bool) -> Result<Vec<Piece<'_>>, WriteError> {
    if matches!(value, Value::Extant | Value::Absent) {
        return Err(WriteError::Unwritable("empty operand".into()));
    }
    Ok(if wrap {
        vec![text("("), Piece::Value(value, Context::Value), text(")")]
    } else {
        vec![Piece::Value(value, Context::Operand)]
    })
}

/// Attribute parameters or invocation arguments. A record of several
/// items, or of a single field, is written as the block inside the
/// parentheses; `Extant` writes no parentheses unless `always`.
fn params(value: &Value, always: bool) -> Result<Vec<Piece<'_>>, WriteError> {
    let inner = match value {
        Value::Extant | Value::Absent if always => vec![],
        Value::Extant | Value::Absent => return Ok(vec![]),
        Value::Record(record) if record.is_empty() => vec![text("{}")],
        Value::Record(record) if record.len() >= 2 || matches!(record.items(), [Item::Field(_)]) => {
            vec![Piece::Block(record.items(), 0)]
        }
        value => vec![Piece::Value(value, Context::Value)],
    };
    let mut pieces = Vec::with_capacity(inner.len() + 2);
    pieces.push(text("("));
    pieces.extend(inner);
    pieces.push(text(")"));
    Ok(pieces)
}

impl Writer for ReconWriter<'_> {
    fn pull<O: Output + ?Sized>(mut self, output: &mut O) -> WriteStep<Self> {
        while let Some(piece) = self.stack.pop() {
            match self.step(piece, output) {
                Ok(true) => {}
                Ok(false) => {
                    trace!(depth = self.stack.len(), "writer suspended on full output");
                    return WriteStep::Cont(self);
                }
                Err(error) => return WriteStep::Error(error),
            }
        }
        WriteStep::Done
    }
}
