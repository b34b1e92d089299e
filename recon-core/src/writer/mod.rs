//! Resumable Recon writers.
//!
//! A writer holds the output that remains to be produced. [`Writer::pull`]
//! writes chars while the [`Output`] accepts them and hands back one of:
//!
//! - `Cont(writer)` - the output is full; drain it and pull again
//! - `Done` - everything was written
//! - `Error(err)` - the value cannot be written, or the output failed
//!
//! Size computation drives the same writers against a counting output, so
//! [`size_of`] always agrees with what the writer emits.

mod ident;
mod structure;

pub use ident::{IdentWriter, StringWriter};
pub use structure::ReconWriter;

use crate::error::{OutputError, WriteError};
use crate::output::Output;
use crate::settings::OutputSettings;
use crate::value::Value;

/// Outcome of pulling a writer.
#[derive(Debug)]
pub enum WriteStep<W> {
    /// The output filled up; resume with the contained writer.
    Cont(W),
    Done,
    Error(WriteError),
}

impl<W> WriteStep<W> {
    pub fn is_cont(&self) -> bool {
        matches!(self, WriteStep::Cont(_))
    }

    pub fn is_done(&self) -> bool {
        matches!(self, WriteStep::Done)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, WriteStep::Error(_))
    }

    pub fn error(self) -> Option<WriteError> {
        match self {
            WriteStep::Error(error) => Some(error),
            _ => None,
        }
    }
}

/// A resumable writer.
pub trait Writer: Sized {
    fn pull<O: Output + ?Sized>(self, output: &mut O) -> WriteStep<Self>;
}

/// Whether `output` takes another char now. `Ok(false)` means full;
/// closed and failed outputs are errors.
pub(crate) fn ready<O: Output + ?Sized>(output: &O) -> Result<bool, WriteError> {
    if output.is_cont() {
        Ok(true)
    } else if output.is_error() {
        Err(output.trap().cloned().map_or(WriteError::OutputClosed, WriteError::Output))
    } else if output.is_full() && !output.is_done() {
        Ok(false)
    } else {
        Err(WriteError::OutputClosed)
    }
}

/// Write `text` from byte offset `pos`, advancing it. `Ok(true)` once
/// the whole text is written.
pub(crate) fn write_from<O: Output + ?Sized>(text: &str, pos: &mut usize, output: &mut O) -> Result<bool, WriteError> {
    while let Some(c) = text[*pos..].chars().next() {
        if !ready(output)? {
            return Ok(false);
        }
        output.write(c)?;
        *pos += c.len_utf8();
    }
    Ok(true)
}

/// Counts chars instead of storing them.
#[derive(Debug, Default)]
struct CountOutput {
    count: usize,
    settings: OutputSettings,
}

impl Output for CountOutput {
    type Product = usize;

    fn is_cont(&self) -> bool {
        true
    }

    fn is_full(&self) -> bool {
        false
    }

    fn is_done(&self) -> bool {
        false
    }

    fn is_error(&self) -> bool {
        false
    }

    fn write(&mut self, _c: char) -> Result<(), OutputError> {
        self.count += 1;
        Ok(())
    }

    fn trap(&self) -> Option<&OutputError> {
        None
    }

    fn settings(&self) -> &OutputSettings {
        &self.settings
    }

    fn bind(self) -> usize {
        self.count
    }
}

/// Drive `writer` to completion against an output that never fills.
pub(crate) fn run<W: Writer, O: Output>(writer: W, mut output: O) -> Result<O::Product, WriteError> {
    match writer.pull(&mut output) {
        WriteStep::Done => Ok(output.bind()),
        WriteStep::Error(error) => Err(error),
        WriteStep::Cont(_) => Err(WriteError::Output(OutputError::Full)),
    }
}

/// Number of chars `ReconWriter` emits for `value`.
pub fn size_of(value: &Value) -> Result<usize, WriteError> {
    run(ReconWriter::new(value), CountOutput::default())
}
