//! Quoted strings.
//!
//! `"..."` and `'...'` support the escapes `\" \' \\ \/ \` \b \f \n \r \t`
//! and `\uXXXX`; back-quoted strings are raw.

use std::mem;

use super::{peek, ParseStep, Parser, Peek};
use crate::error::{ParseError, ParseErrorCode};
use crate::input::Input;

#[derive(Debug, Clone, Copy)]
enum StringState {
    Open,
    Body { quote: char },
    Escape { quote: char },
    Unicode { quote: char, code: u32, digits: u8 },
}

/// Parses a quoted string into its unescaped text.
#[derive(Debug)]
pub struct StringParser {
    text: String,
    state: StringState,
}

impl StringParser {
    pub fn new() -> Self {
        Self { text: String::new(), state: StringState::Open }
    }
}

impl Default for StringParser {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid_escape<I: Input + ?Sized>(c: char, input: &I) -> ParseError {
    ParseError::new(ParseErrorCode::InvalidEscape, format!("invalid escape \\{}", c), input.mark())
}

impl Parser for StringParser {
    type Output = String;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> ParseStep<Self, String> {
        loop {
            let c = match peek(input) {
                Peek::Char(c) => c,
                Peek::Empty => return ParseStep::Cont(self),
                Peek::Error(error) => return ParseStep::Error(error),
                Peek::Done => {
                    return ParseStep::Error(match self.state {
                        StringState::Open => ParseError::expected('"', None, input.mark()),
                        _ => ParseError::unexpected_end("string", input.mark()),
                    });
                }
            };
            self.state = match self.state {
                StringState::Open => match c {
                    '"' | '\'' | '`' => StringState::Body { quote: c },
                    c => return ParseStep::Error(ParseError::expected('"', Some(c), input.mark())),
                },
                StringState::Body { quote } if c == quote => {
                    input.step();
                    return ParseStep::Done(mem::take(&mut self.text));
                }
                StringState::Body { quote } if c == '\\' && quote != '`' => StringState::Escape { quote },
                StringState::Body { quote } => {
                    self.text.push(c);
                    StringState::Body { quote }
                }
                StringState::Escape { quote } => {
                    let unescaped = match c {
                        '"' | '\'' | '\\' | '/' | '`' => c,
                        'b' => '\u{8}',
                        'f' => '\u{C}',
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        'u' => {
                            input.step();
                            self.state = StringState::Unicode { quote, code: 0, digits: 0 };
                            continue;
                        }
                        c => return ParseStep::Error(invalid_escape(c, input)),
                    };
                    self.text.push(unescaped);
                    StringState::Body { quote }
                }
                StringState::Unicode { quote, code, digits } => {
                    let Some(digit) = c.to_digit(16) else {
                        return ParseStep::Error(invalid_escape(c, input));
                    };
                    let code = code << 4 | digit;
                    if digits < 3 {
                        StringState::Unicode { quote, code, digits: digits + 1 }
                    } else {
                        match char::from_u32(code) {
                            Some(unescaped) => self.text.push(unescaped),
                            None => {
                                return ParseStep::Error(ParseError::new(
                                    ParseErrorCode::InvalidEscape,
                                    format!("invalid code point \\u{:04X}", code),
                                    input.mark(),
                                ));
                            }
                        }
                        StringState::Body { quote }
                    }
                }
            };
            input.step();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::test_support::{run, run_chars};

    #[test]
    fn test_quotes() {
        assert_eq!(run(StringParser::new(), r#""hello""#).unwrap(), "hello");
        assert_eq!(run(StringParser::new(), "'it''s'").unwrap(), "it");
        assert_eq!(run(StringParser::new(), r#""""#).unwrap(), "");
    }

    #[test]
    fn test_escapes() {
        let text = r#""a\"b\\c\nd\u00e9\t""#;
        assert_eq!(run(StringParser::new(), text).unwrap(), "a\"b\\c\nd\u{e9}\t");
        assert_eq!(run_chars(StringParser::new(), text).unwrap(), "a\"b\\c\nd\u{e9}\t");
    }

    #[test]
    fn test_raw_backquote() {
        assert_eq!(run(StringParser::new(), r"`C:\dir\n`").unwrap(), r"C:\dir\n");
    }

    #[test]
    fn test_errors() {
        let err = run(StringParser::new(), r#""abc"#).unwrap_err();
        assert_eq!(err.code, ParseErrorCode::UnexpectedEnd);
        let err = run(StringParser::new(), r#""\q""#).unwrap_err();
        assert_eq!(err.code, ParseErrorCode::InvalidEscape);
        let err = run(StringParser::new(), r#""\uD800""#).unwrap_err();
        assert_eq!(err.code, ParseErrorCode::InvalidEscape);
        let err = run(StringParser::new(), "abc").unwrap_err();
        assert_eq!(err.code, ParseErrorCode::Expected);
    }
}
