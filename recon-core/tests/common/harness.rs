//! Drivers that feed parsers and pull writers in pieces

use recon_core::input::StringInput;
use recon_core::output::StringOutput;
use recon_core::parser::{DocumentParser, ParseStep, Parser};
use recon_core::value::Value;
use recon_core::writer::{ReconWriter, WriteStep, Writer};
use recon_core::{ParseError, WriteError};

/// Feed a document chunk by chunk, resuming on every empty input.
pub fn parse_chunks<'a>(chunks: impl IntoIterator<Item = &'a str>) -> Result<Value, ParseError> {
    let mut input = StringInput::streaming();
    let mut parser = DocumentParser::new();
    for chunk in chunks {
        input.push_str(chunk);
        parser = match parser.feed(&mut input) {
            ParseStep::Cont(parser) => parser,
            ParseStep::Done(value) => return Ok(value),
            ParseStep::Error(error) => return Err(error),
        };
    }
    input.finish();
    match parser.feed(&mut input) {
        ParseStep::Done(value) => Ok(value),
        ParseStep::Error(error) => Err(error),
        ParseStep::Cont(_) => panic!("parser suspended on a finished input"),
    }
}

/// Pull a writer through an output holding at most `limit` chars,
/// draining it after every suspension.
pub fn write_limited(value: &Value, limit: usize) -> Result<String, WriteError> {
    let mut output = StringOutput::with_limit(limit);
    let mut text = String::new();
    let mut writer = ReconWriter::new(value);
    loop {
        let step = writer.pull(&mut output);
        text.push_str(&output.drain());
        match step {
            WriteStep::Cont(next) => writer = next,
            WriteStep::Done => return Ok(text),
            WriteStep::Error(error) => return Err(error),
        }
    }
}
