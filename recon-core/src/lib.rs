//! Recon Core
//!
//! Resumable parser and writer for Recon (Record Notation), plus the
//! copy-on-write value algebra they produce and consume.
//!
//! ```
//! use recon_core::value::Value;
//!
//! let value = recon_core::parse("a:1,b:@foo,c:3,@bar").unwrap();
//! assert_eq!(value.get("a"), &Value::from(1));
//! assert_eq!(recon_core::to_string(&value).unwrap(), "{a:1,b:@foo,c:3,@bar}");
//! ```
//!
//! # Architecture
//!
//! - **input.rs / output.rs** - char sources and sinks with cont/empty/done/error states
//! - **parser/** - state-machine parsers, one per grammar production
//! - **writer/** - state-machine writers with precedence-aware parenthesization
//! - **value/** - records, data buffers, selectors, operators, evaluation
//! - **grammar.rs** - identifier tables and keywords shared by parser and writer
//! - **mark.rs / error.rs / settings.rs** - positions, diagnostics, limits

use tracing::debug;

pub mod error;
pub mod grammar;
pub mod input;
pub mod mark;
pub mod output;
pub mod parser;
pub mod settings;
pub mod value;
pub mod writer;

pub use error::{InputError, OutputError, ParseError, ParseErrorCode, ValueError, WriteError};
pub use input::{Input, StringInput};
pub use mark::Mark;
pub use output::{Output, StringOutput};
pub use parser::{DocumentParser, ParseStep, Parser};
pub use settings::{OutputSettings, ParserSettings};
pub use value::{Data, Field, Func, Item, Num, Operator, Record, Selector, Value};
pub use writer::{size_of, ReconWriter, WriteStep, Writer};

use input::ConstInput;

/// Parse a complete Recon document with the default settings.
pub fn parse(text: &str) -> Result<Value, ParseError> {
    parse_with(text, &ParserSettings::default())
}

/// Parse a complete Recon document.
pub fn parse_with(text: &str, settings: &ParserSettings) -> Result<Value, ParseError> {
    debug!(len = text.len(), max_depth = settings.max_depth, "parsing document");
    let mut input = StringInput::new(text);
    let result = match DocumentParser::with_settings(settings).feed(&mut input) {
        ParseStep::Done(value) => Ok(value),
        ParseStep::Error(error) => Err(error),
        ParseStep::Cont(parser) => match parser.feed(&mut ConstInput::done().with_mark(input.mark())) {
            ParseStep::Done(value) => Ok(value),
            ParseStep::Error(error) => Err(error),
            ParseStep::Cont(_) => Err(ParseError::unexpected_end("document", input.mark())),
        },
    };
    if let Err(error) = &result {
        debug!(code = ?error.code, mark = %error.mark, "document parse failed");
    }
    result
}

/// Write `value` as Recon text.
pub fn to_string(value: &Value) -> Result<String, WriteError> {
    debug!("writing value");
    let mut output = StringOutput::new();
    match ReconWriter::new(value).pull(&mut output) {
        WriteStep::Done => Ok(output.bind()),
        WriteStep::Error(error) => {
            debug!(%error, "value write failed");
            Err(error)
        }
        WriteStep::Cont(_) => Err(WriteError::Output(OutputError::Full)),
    }
}
