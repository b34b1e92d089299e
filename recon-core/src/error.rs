//! Error types for inputs, parsers, writers and values.

use thiserror::Error;

use crate::mark::Mark;

/// Errors raised by token sources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// `head()` or `step()` called on an input that is not in the continue state.
    #[error("input not ready")]
    NotReady,
    /// The input does not support the requested capability.
    #[error("unsupported input operation: {0}")]
    Unsupported(&'static str),
    /// `seek` to a position the input no longer (or never) held.
    #[error("seek out of range: {0}")]
    SeekOutOfRange(Mark),
    /// An error trapped by the input itself (e.g. a failed transport).
    #[error("{0}")]
    Trapped(String),
}

/// Errors raised by token sinks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputError {
    /// `write` called on an output that reports full.
    #[error("output full")]
    Full,
    #[error("output closed")]
    Closed,
    #[error("{0}")]
    Trapped(String),
}

/// Error codes for parse diagnostics.
///
/// Kept as a small `Copy` enum; the human-readable text lives in
/// [`ParseErrorCode::message`] and the specifics in [`ParseError::message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ParseErrorCode {
    /// Input ended in the middle of a production.
    UnexpectedEnd = 0,
    /// A specific char was required.
    Expected,
    /// A char that cannot start or continue the current production.
    UnexpectedChar,
    /// `()` with nothing inside.
    EmptyGroup,
    /// Malformed numeric literal.
    InvalidNumber,
    /// Malformed `%` data literal.
    InvalidData,
    /// Malformed escape sequence in a string.
    InvalidEscape,
    /// Nesting deeper than `ParserSettings::max_depth`.
    DepthExceeded,
    /// The input reported an error.
    Input,
}

impl ParseErrorCode {
    /// Get a human-readable message for this error code.
    pub fn message(self) -> &'static str {
        match self {
            Self::UnexpectedEnd => "unexpected end of input",
            Self::Expected => "expected",
            Self::UnexpectedChar => "unexpected character",
            Self::EmptyGroup => "empty group",
            Self::InvalidNumber => "invalid number",
            Self::InvalidData => "invalid data",
            Self::InvalidEscape => "invalid escape",
            Self::DepthExceeded => "nesting too deep",
            Self::Input => "input error",
        }
    }
}

/// A position-tagged parse diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {mark}")]
pub struct ParseError {
    pub code: ParseErrorCode,
    pub message: String,
    pub mark: Mark,
}

impl ParseError {
    pub fn new(code: ParseErrorCode, message: impl Into<String>, mark: Mark) -> Self {
        Self { code, message: message.into(), mark }
    }

    /// A required char was missing.
    pub fn expected(expected: char, found: Option<char>, mark: Mark) -> Self {
        let message = match found {
            Some(c) => format!("expected {:?}, but found {:?}", expected, c),
            None => format!("expected {:?}, but found end of input", expected),
        };
        Self::new(ParseErrorCode::Expected, message, mark)
    }

    /// A char that fits no alternative of the current production.
    pub fn unexpected(found: char, mark: Mark) -> Self {
        Self::new(ParseErrorCode::UnexpectedChar, format!("unexpected {:?}", found), mark)
    }

    pub fn unexpected_end(what: &str, mark: Mark) -> Self {
        Self::new(ParseErrorCode::UnexpectedEnd, format!("unexpected end of input in {}", what), mark)
    }

    pub fn input(error: &InputError, mark: Mark) -> Self {
        Self::new(ParseErrorCode::Input, error.to_string(), mark)
    }
}

/// Errors attached to a writer's terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    /// The value has no Recon production (e.g. a bridge function).
    #[error("no recon form for {0}")]
    Unwritable(String),
    /// An identifier writer was handed a char outside the identifier tables.
    #[error("invalid identifier char {0:?}")]
    InvalidIdent(char),
    #[error("output closed")]
    OutputClosed,
    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

/// Synchronous failures of value mutators and decoders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("value is immutable")]
    Immutable,
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("invalid base-16 digit at position {position}")]
    InvalidBase16 { position: usize },
    #[error("invalid base-64 data: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}
