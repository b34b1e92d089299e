//! Numeric literals.
//!
//! Decimal integers parse as `Int`, falling back to `Float` when they do
//! not fit in an `i64`; a fraction or exponent makes a `Float`; `0x`
//! followed by up to 16 hex digits makes a `Uint`.

use super::{peek, ParseStep, Parser, Peek};
use crate::error::{ParseError, ParseErrorCode};
use crate::input::Input;
use crate::mark::Mark;
use crate::value::Num;

const MAX_HEX_DIGITS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberState {
    Sign,
    Leading,
    Zero,
    Integer,
    HexStart,
    Hex,
    FractionStart,
    Fraction,
    ExponentStart,
    ExponentSign,
    Exponent,
}

#[derive(Debug)]
pub struct NumberParser {
    text: String,
    state: NumberState,
}

impl NumberParser {
    pub fn new() -> Self {
        Self { text: String::new(), state: NumberState::Sign }
    }

    /// A parser whose leading `-` was already consumed.
    pub fn negative() -> Self {
        Self { text: String::from("-"), state: NumberState::Leading }
    }

    fn is_negative(&self) -> bool {
        self.text.starts_with('-')
    }

    fn finish(&self, mark: Mark) -> ParseStep<Self, Num> {
        let parsed = match self.state {
            NumberState::Zero | NumberState::Integer => match self.text.parse::<i64>() {
                Ok(n) => Ok(Num::Int(n)),
                Err(_) => self.text.parse::<f64>().map(Num::Float).map_err(|_| ()),
            },
            NumberState::Fraction | NumberState::Exponent => {
                self.text.parse::<f64>().map(Num::Float).map_err(|_| ())
            }
            NumberState::Hex => u64::from_str_radix(&self.text, 16).map(Num::Uint).map_err(|_| ()),
            _ => Err(()),
        };
        match parsed {
            Ok(num) => ParseStep::Done(num),
            Err(()) => ParseStep::Error(invalid(format!("invalid number {:?}", self.text), mark)),
        }
    }
}

impl Default for NumberParser {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(message: impl Into<String>, mark: Mark) -> ParseError {
    ParseError::new(ParseErrorCode::InvalidNumber, message, mark)
}

impl Parser for NumberParser {
    type Output = Num;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> ParseStep<Self, Num> {
        use NumberState::*;
        loop {
            let c = match peek(input) {
                Peek::Char(c) => c,
                Peek::Empty => return ParseStep::Cont(self),
                Peek::Error(error) => return ParseStep::Error(error),
                Peek::Done => {
                    return match self.state {
                        Sign | Leading | HexStart | FractionStart | ExponentStart | ExponentSign => {
                            ParseStep::Error(ParseError::unexpected_end("number", input.mark()))
                        }
                        _ => self.finish(input.mark()),
                    };
                }
            };
            let next = match (self.state, c) {
                (Sign, '-') => Leading,
                (Sign, _) => {
                    self.state = Leading;
                    continue;
                }
                (Leading, '0') => Zero,
                (Leading, '1'..='9') => Integer,
                (Leading, c) => return ParseStep::Error(invalid(format!("expected digit, but found {:?}", c), input.mark())),
                (Zero, 'x') if self.is_negative() => {
                    return ParseStep::Error(invalid("negative hexadecimal literal", input.mark()));
                }
                (Zero, 'x') => {
                    self.text.clear();
                    input.step();
                    self.state = HexStart;
                    continue;
                }
                (Zero | Integer, '0'..='9') => Integer,
                (Zero | Integer | Fraction, 'e' | 'E') => ExponentStart,
                (Zero | Integer, '.') => FractionStart,
                (FractionStart | Fraction, '0'..='9') => Fraction,
                (ExponentStart, '+' | '-') => ExponentSign,
                (ExponentStart | ExponentSign | Exponent, '0'..='9') => Exponent,
                (HexStart | Hex, c) if c.is_ascii_hexdigit() => {
                    if self.text.len() == MAX_HEX_DIGITS {
                        return ParseStep::Error(invalid("hexadecimal literal too long", input.mark()));
                    }
                    Hex
                }
                (Zero | Integer | Fraction | Exponent | Hex, _) => return self.finish(input.mark()),
                (state, c) => {
                    let what = match state {
                        HexStart => "hex digit",
                        _ => "digit",
                    };
                    return ParseStep::Error(invalid(format!("expected {}, but found {:?}", what, c), input.mark()));
                }
            };
            self.text.push(c);
            self.state = next;
            input.step();
        }
    }
}
