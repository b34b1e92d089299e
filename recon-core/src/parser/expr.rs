//! Operator expressions.
//!
//! A shunting-yard parser whose operand and operator stacks are plain
//! fields, so a suspended expression is just data. Binary operators are
//! left-associative; `? :` and `>>` are right-associative.

use std::mem;

use super::{
    bind_items, is_literal_start, peek, skip_while, value_depth, BlockParser, LiteralParser, Nesting, ParseStep,
    Parser, Peek,
};
use crate::error::ParseError;
use crate::grammar::{is_digit, is_space, is_whitespace};
use crate::input::Input;
use crate::mark::Mark;
use crate::value::operator::{CONDITIONAL_PRECEDENCE, UNARY_PRECEDENCE};
use crate::value::{func::LAMBDA_PRECEDENCE, BinaryOp, Func, Operator, UnaryOp, Value};

/// An operator waiting for its right operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Binary(BinaryOp),
    Unary(UnaryOp),
    /// `?` seen; blocks reduction until its `:`.
    Cond,
    /// `:` of a conditional seen.
    CondElse,
    Lambda,
}

impl Pending {
    fn precedence(self) -> u8 {
        match self {
            Pending::Binary(op) => op.precedence(),
            Pending::Unary(_) => UNARY_PRECEDENCE,
            Pending::Cond => 0,
            Pending::CondElse => CONDITIONAL_PRECEDENCE,
            Pending::Lambda => LAMBDA_PRECEDENCE,
        }
    }
}

enum ExprState {
    Operand,
    MinusPending,
    Literal(Box<LiteralParser>),
    Postfix,
    Args(Box<BlockParser>),
    ArgsClose,
    Operator,
    OpChar(char),
}

/// Parses an expression, stopping before the first char that cannot
/// continue it (a separator, closing bracket, or `:` outside a
/// conditional). An empty expression is `Extant`.
///
/// Operator nesting counts against `max_depth` like brackets do.
pub struct ExprParser {
    nesting: Nesting,
    operands: Vec<Value>,
    /// `value_depth` of each operand.
    depths: Vec<usize>,
    ops: Vec<Pending>,
    args: Value,
    state: ExprState,
}

impl ExprParser {
    pub fn new() -> Self {
        Self::nested(Nesting::default())
    }

    pub(crate) fn nested(nesting: Nesting) -> Self {
        Self {
            nesting,
            operands: Vec::new(),
            depths: Vec::new(),
            ops: Vec::new(),
            args: Value::Extant,
            state: ExprState::Operand,
        }
    }

    /// Continue with a literal parser that has already started.
    pub(crate) fn with_literal(nesting: Nesting, literal: LiteralParser) -> Self {
        Self { state: ExprState::Literal(Box::new(literal)), ..Self::nested(nesting) }
    }

    fn pop_operand(&mut self) -> (Value, usize) {
        (self.operands.pop().unwrap_or_default(), self.depths.pop().unwrap_or(0))
    }

    fn push_operand(&mut self, value: Value, depth: usize, mark: &Mark) -> Result<(), ParseError> {
        self.nesting.admit(depth, || mark.clone())?;
        self.operands.push(value);
        self.depths.push(depth);
        Ok(())
    }

    /// Every pending operator ends up above the operand that follows it,
    /// so a long run of prefix operators fails before it is reduced.
    fn push_op(&mut self, op: Pending, mark: &Mark) -> Result<(), ParseError> {
        self.nesting.admit(self.ops.len() + 1, || mark.clone())?;
        self.ops.push(op);
        Ok(())
    }

    /// Apply the operator on top of the stack to its operands.
    fn reduce(&mut self, mark: &Mark) -> Result<(), ParseError> {
        let Some(op) = self.ops.pop() else { return Ok(()) };
        let (value, depth) = match op {
            Pending::Binary(op) => {
                let (rhs, r) = self.pop_operand();
                let (lhs, l) = self.pop_operand();
                (Value::Operator(Operator::binary(op, lhs, rhs)), l.max(r))
            }
            Pending::Unary(op) => {
                let (operand, d) = self.pop_operand();
                (Value::Operator(Operator::unary(op, operand)), d)
            }
            Pending::CondElse => {
                let (otherwise, o) = self.pop_operand();
                let (then, t) = self.pop_operand();
                let (cond, c) = self.pop_operand();
                (Value::Operator(Operator::conditional(cond, then, otherwise)), c.max(t).max(o))
            }
            Pending::Lambda => {
                let (template, t) = self.pop_operand();
                let (bindings, b) = self.pop_operand();
                (Value::Func(Func::lambda(bindings, template)), b.max(t))
            }
            Pending::Cond => return Ok(()),
        };
        self.push_operand(value, depth + 1, mark)
    }

    /// Reduce while the pending operator binds tighter than `precedence`
    /// (or as tight, for left-associative operators).
    fn reduce_above(&mut self, precedence: u8, inclusive: bool, mark: &Mark) -> Result<(), ParseError> {
        while let Some(&top) = self.ops.last() {
            let p = top.precedence();
            if top == Pending::Cond || p < precedence || (p == precedence && !inclusive) {
                break;
            }
            self.reduce(mark)?;
        }
        Ok(())
    }

    fn push_binary(&mut self, op: BinaryOp, mark: &Mark) -> Result<(), ParseError> {
        self.reduce_above(op.precedence(), true, mark)?;
        self.push_op(Pending::Binary(op), mark)?;
        self.state = ExprState::Operand;
        Ok(())
    }

    fn finish<I: Input + ?Sized>(&mut self, input: &I) -> ParseStep<Self, Value> {
        let mark = input.mark();
        while let Some(&top) = self.ops.last() {
            if top == Pending::Cond {
                let found = match peek(input) {
                    Peek::Char(c) => Some(c),
                    _ => None,
                };
                return ParseStep::Error(ParseError::expected(':', found, mark));
            }
            if let Err(error) = self.reduce(&mark) {
                return ParseStep::Error(error);
            }
        }
        ParseStep::Done(self.pop_operand().0)
    }
}

impl Default for ExprParser {
    fn default() -> Self {
        Self::new()
    }
}

/// The binary operator spelled by `c` followed by `d`.
fn binary_pair(c: char, d: char) -> Option<BinaryOp> {
    let mut buf = [0u8; 8];
    let len = c.encode_utf8(&mut buf).len();
    let len = len + d.encode_utf8(&mut buf[len..]).len();
    std::str::from_utf8(&buf[..len]).ok().and_then(BinaryOp::from_symbol)
}

fn binary_single(c: char) -> Option<BinaryOp> {
    BinaryOp::from_symbol(c.encode_utf8(&mut [0; 4]))
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '|' | '&' | '^' | '<' | '>' | '=' | '!' | '+' | '-' | '*' | '/' | '%')
}

impl Parser for ExprParser {
    type Output = Value;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> ParseStep<Self, Value> {
        loop {
            match mem::replace(&mut self.state, ExprState::Operand) {
                ExprState::Operand => {
                    let skip = if self.ops.is_empty() { is_space } else { is_whitespace };
                    match skip_while(input, skip) {
                        Peek::Char('-') => {
                            input.step();
                            self.state = ExprState::MinusPending;
                        }
                        Peek::Char(c @ ('!' | '~' | '+')) => {
                            if let Some(op) = UnaryOp::from_char(c) {
                                if let Err(error) = self.push_op(Pending::Unary(op), &input.mark()) {
                                    return ParseStep::Error(error);
                                }
                            }
                            input.step();
                        }
                        Peek::Char(c) if is_literal_start(c) => {
                            self.state = ExprState::Literal(Box::new(LiteralParser::nested(self.nesting)));
                        }
                        Peek::Empty => return ParseStep::Cont(self),
                        Peek::Error(error) => return ParseStep::Error(error),
                        Peek::Char(_) | Peek::Done if self.ops.is_empty() => return ParseStep::Done(Value::Extant),
                        Peek::Char(c) => return ParseStep::Error(ParseError::unexpected(c, input.mark())),
                        Peek::Done => return ParseStep::Error(ParseError::unexpected_end("expression", input.mark())),
                    }
                }
                ExprState::MinusPending => match peek(input) {
                    Peek::Char(c) if is_digit(c) => {
                        let literal = LiteralParser::negative_number(self.nesting);
                        self.state = ExprState::Literal(Box::new(literal));
                    }
                    Peek::Empty => {
                        self.state = ExprState::MinusPending;
                        return ParseStep::Cont(self);
                    }
                    Peek::Error(error) => return ParseStep::Error(error),
                    Peek::Char(_) | Peek::Done => {
                        if let Err(error) = self.push_op(Pending::Unary(UnaryOp::Negative), &input.mark()) {
                            return ParseStep::Error(error);
                        }
                    }
                },
                ExprState::Literal(parser) => {
                    let value = feed_sub!(self, parser, input, ExprState::Literal);
                    let depth = value_depth(&value);
                    if let Err(error) = self.push_operand(value, depth, &input.mark()) {
                        return ParseStep::Error(error);
                    }
                    self.state = ExprState::Postfix;
                }
                ExprState::Postfix => match peek(input) {
                    Peek::Char('(') => {
                        let nesting = match self.nesting.enter(input.mark()) {
                            Ok(nesting) => nesting,
                            Err(error) => return ParseStep::Error(error),
                        };
                        input.step();
                        self.state = ExprState::Args(Box::new(BlockParser::nested(nesting)));
                    }
                    Peek::Empty => {
                        self.state = ExprState::Postfix;
                        return ParseStep::Cont(self);
                    }
                    Peek::Error(error) => return ParseStep::Error(error),
                    Peek::Char(_) | Peek::Done => self.state = ExprState::Operator,
                },
                ExprState::Args(parser) => {
                    let items = feed_sub!(self, parser, input, ExprState::Args);
                    self.args = bind_items(items, Value::Extant);
                    self.state = ExprState::ArgsClose;
                }
                ExprState::ArgsClose => match skip_while(input, is_whitespace) {
                    Peek::Char(')') => {
                        input.step();
                        let (func, depth) = self.pop_operand();
                        let args = mem::replace(&mut self.args, Value::Extant);
                        let depth = depth.max(value_depth(&args)) + 1;
                        let invoke = Value::Operator(Operator::invoke(func, args));
                        if let Err(error) = self.push_operand(invoke, depth, &input.mark()) {
                            return ParseStep::Error(error);
                        }
                        self.state = ExprState::Postfix;
                    }
                    Peek::Char(c) => return ParseStep::Error(ParseError::expected(')', Some(c), input.mark())),
                    Peek::Done => return ParseStep::Error(ParseError::expected(')', None, input.mark())),
                    Peek::Empty => {
                        self.state = ExprState::ArgsClose;
                        return ParseStep::Cont(self);
                    }
                    Peek::Error(error) => return ParseStep::Error(error),
                },
                ExprState::Operator => match skip_while(input, is_space) {
                    Peek::Char(':') if self.ops.contains(&Pending::Cond) => {
                        let mark = input.mark();
                        while self.ops.last().is_some_and(|&top| top != Pending::Cond) {
                            if let Err(error) = self.reduce(&mark) {
                                return ParseStep::Error(error);
                            }
                        }
                        self.ops.pop();
                        self.ops.push(Pending::CondElse);
                        input.step();
                    }
                    Peek::Char('?') => {
                        let mark = input.mark();
                        let pushed = self
                            .reduce_above(CONDITIONAL_PRECEDENCE, false, &mark)
                            .and_then(|()| self.push_op(Pending::Cond, &mark));
                        if let Err(error) = pushed {
                            return ParseStep::Error(error);
                        }
                        input.step();
                    }
                    Peek::Char(c) if is_operator_char(c) => {
                        input.step();
                        self.state = ExprState::OpChar(c);
                    }
                    Peek::Empty => {
                        self.state = ExprState::Operator;
                        return ParseStep::Cont(self);
                    }
                    Peek::Error(error) => return ParseStep::Error(error),
                    Peek::Char(_) | Peek::Done => return self.finish(input),
                },
                ExprState::OpChar(c) => {
                    let next = match peek(input) {
                        Peek::Char(d) => Some(d),
                        Peek::Done => None,
                        Peek::Empty => {
                            self.state = ExprState::OpChar(c);
                            return ParseStep::Cont(self);
                        }
                        Peek::Error(error) => return ParseStep::Error(error),
                    };
                    let mark = input.mark();
                    let pushed = if c == '>' && next == Some('>') {
                        input.step();
                        self.reduce_above(LAMBDA_PRECEDENCE, false, &mark)
                            .and_then(|()| self.push_op(Pending::Lambda, &mark))
                    } else if let Some(op) = next.and_then(|d| binary_pair(c, d)) {
                        input.step();
                        self.push_binary(op, &mark)
                    } else if let Some(op) = binary_single(c) {
                        self.push_binary(op, &mark)
                    } else {
                        Err(ParseError::unexpected(c, mark))
                    };
                    if let Err(error) = pushed {
                        return ParseStep::Error(error);
                    }
                }
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
    use crate::value::{Num, Record, Selector};
    use pretty_assertions::assert_eq;

    fn expr(text: &str) -> Value {
        let value = run(ExprParser::new(), text).unwrap();
        assert_eq!(run_chars(ExprParser::new(), text).unwrap(), value, "chunked parse of {:?}", text);
        value
    }

    fn sel(key: &str) -> Value {
        Value::Selector(Selector::identity().get(key))
    }

    #[test]
    fn test_empty_expression() {
        assert_eq!(expr(""), Value::Extant);
        assert_eq!(expr("  "), Value::Extant);
    }

    #[test]
    fn test_left_associative() {
        assert_eq!(expr("1 - 2 - 3"), Value::from(1).minus(2).minus(3));
        assert_eq!(expr("a/b*c"), Value::from("a").divide("b").times("c"));
    }

    #[test]
    fn test_precedence() {
        assert_eq!(expr("1 + 2 * 3"), Value::from(1).plus(Value::from(2).times(3)));
        assert_eq!(expr("1 * 2 + 3"), Value::from(1).times(2).plus(3));
        assert_eq!(expr("$a || $b && $c"), sel("a").or(sel("b").and(sel("c"))));
        let (a, b, c) = (Value::from("a"), Value::from("b"), Value::from("c"));
        assert_eq!(expr("a | b ^ c & d"), a.bit_or(b.bit_xor(c.bit_and("d"))));
        assert_eq!(expr("1 + 2 < 3 == true"), Value::from(1).plus(2).lt(3).equal(true));
    }

    #[test]
    fn test_groups_override_precedence() {
        assert_eq!(
            expr("$a && ($b || $c) && $d"),
            sel("a").and(sel("b").or(sel("c"))).and(sel("d"))
        );
        assert_eq!(expr("(1 + 2) * 3"), Value::from(1).plus(2).times(3));
    }

    #[test]
    fn test_two_char_operators() {
        assert_eq!(expr("a<=b"), Value::from("a").le("b"));
        assert_eq!(expr("a>=b"), Value::from("a").ge("b"));
        assert_eq!(expr("a!=b"), Value::from("a").not_equal("b"));
        assert_eq!(expr("a<-1"), Value::from("a").lt(-1));
        assert_eq!(expr("a||b"), Value::from("a").or("b"));
    }

    #[test]
    fn test_unary() {
        assert_eq!(expr("!a"), Value::from("a").not());
        assert_eq!(expr("~~a"), Value::from("a").bit_not().bit_not());
        assert_eq!(expr("-$x"), sel("x").negative());
        assert_eq!(expr("- 5"), Value::from(5).negative());
        assert_eq!(expr("+5"), Value::from(5).positive());
        assert_eq!(expr("-5"), Value::from(-5));
        assert_eq!(expr("-a * b"), Value::from("a").negative().times("b"));
        assert_eq!(expr("1 - -2"), Value::from(1).minus(-2));
    }

    #[test]
    fn test_conditional() {
        assert_eq!(expr("a ? b : c"), Value::from("a").conditional("b", "c"));
        assert_eq!(
            expr("a ? b : c ? d : e"),
            Value::from("a").conditional("b", Value::from("c").conditional("d", "e"))
        );
        assert_eq!(
            expr("a ? b ? c : d : e"),
            Value::from("a").conditional(Value::from("b").conditional("c", "d"), "e")
        );
        assert_eq!(expr("a || b ? 1 : 2"), Value::from("a").or("b").conditional(1, 2));
        assert_eq!(run(ExprParser::new(), "a ? b").unwrap_err().code, ParseErrorCode::Expected);
    }

    #[test]
    fn test_colon_ends_expression_outside_conditional() {
        let mut input = crate::input::StringInput::new("a + 1: 2");
        assert_eq!(ExprParser::new().feed(&mut input).done(), Some(Value::from("a").plus(1)));
        assert_eq!(input.head(), ':');
    }

    #[test]
    fn test_lambda() {
        assert_eq!(expr("x >> x + 1"), Value::from("x").lambda(Value::from("x").plus(1)));
        assert_eq!(expr("x >> y >> 1"), Value::from("x").lambda(Value::from("y").lambda(1)));
        assert_eq!(
            expr("(x, y) >> $x"),
            Value::Record(Record::of(["x", "y"])).lambda(sel("x"))
        );
    }

    #[test]
    fn test_invocation() {
        assert_eq!(expr("f(1)"), Value::from("f").invoke(1));
        assert_eq!(expr("$f()"), Value::Selector(Selector::identity().get("f")).invoke(Value::Extant));
        assert_eq!(expr("f(1, 2)(3)"), Value::from("f").invoke(Record::of([1, 2])).invoke(3));
        assert_eq!(expr("-f(x)"), Value::from("f").invoke("x").negative());
    }

    #[test]
    fn test_invocation_requires_adjacent_paren() {
        let mut input = crate::input::StringInput::new("f (1)");
        assert_eq!(ExprParser::new().feed(&mut input).done(), Some(Value::from("f")));
        assert_eq!(input.head(), '(');
    }

    #[test]
    fn test_newlines_after_operators() {
        assert_eq!(expr("1 +\n  2"), Value::from(1).plus(2));
        let mut input = crate::input::StringInput::new("1\n+ 2");
        assert_eq!(ExprParser::new().feed(&mut input).done(), Some(Value::from(1)));
    }

    #[test]
    fn test_dangling_operator() {
        assert_eq!(run(ExprParser::new(), "1 +").unwrap_err().code, ParseErrorCode::UnexpectedEnd);
        assert_eq!(run(ExprParser::new(), "1 + )").unwrap_err().code, ParseErrorCode::UnexpectedChar);
        assert_eq!(run(ExprParser::new(), "1 = 2").unwrap_err().code, ParseErrorCode::UnexpectedChar);
    }

    #[test]
    fn test_operator_nesting_limit() {
        let nesting = Nesting::root(&ParserSettings::default().with_max_depth(2));
        assert_eq!(run(ExprParser::nested(nesting), "1 + 2 + 3").unwrap(), Value::from(1).plus(2).plus(3));
        assert_eq!(run(ExprParser::nested(nesting), "!!a").unwrap(), Value::from("a").not().not());
        for text in ["1 + 2 + 3 + 4", "!!!a", "-(1 + 2 + 3)", "f(1)(2)(3)", "{a: !!b}"] {
            let err = run(ExprParser::nested(nesting), text).unwrap_err();
            assert_eq!(err.code, ParseErrorCode::DepthExceeded, "{:?}", text);
        }
    }

    #[test]
    fn test_long_chains_fail_cleanly() {
        let prefix = format!("{}a", "!".repeat(100_000));
        assert_eq!(run(ExprParser::new(), &prefix).unwrap_err().code, ParseErrorCode::DepthExceeded);
        let sum = vec!["a"; 100_000].join("+");
        assert_eq!(run(ExprParser::new(), &sum).unwrap_err().code, ParseErrorCode::DepthExceeded);
        let calls = format!("f{}", "()".repeat(100_000));
        assert_eq!(run(ExprParser::new(), &calls).unwrap_err().code, ParseErrorCode::DepthExceeded);
        let lambdas = vec!["x"; 100_000].join(" >> ");
        assert_eq!(run(ExprParser::new(), &lambdas).unwrap_err().code, ParseErrorCode::DepthExceeded);
    }

    #[test]
    fn test_float_operands() {
        assert_eq!(expr("1.5 * 2"), Value::Num(Num::Float(1.5)).times(2));
    }
}
