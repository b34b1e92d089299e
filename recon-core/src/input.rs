//! Pull-based token sources.
//!
//! An [`Input`] is a non-blocking cursor with a single token of lookahead.
//! At any moment it is in exactly one of four states:
//!
//! - **continue** - `head()` returns the lookahead, `step()` advances
//! - **empty** - nothing available now, more may arrive later
//! - **done** - the stream ended
//! - **error** - the stream failed, see `trap()`
//!
//! Parsers consume inputs until they leave the continue state and then
//! return control to their caller, who feeds them again later.

use crate::error::InputError;
use crate::mark::Mark;

/// A resumable source of `char` tokens.
pub trait Input {
    /// A lookahead token is available.
    fn is_cont(&self) -> bool;

    /// No token is available yet, but more may arrive.
    fn is_empty(&self) -> bool;

    /// No token will ever be available again.
    fn is_done(&self) -> bool;

    /// The input failed; the error is available via [`Input::trap`].
    fn is_error(&self) -> bool;

    /// The lookahead token, or `NotReady` outside the continue state.
    fn try_head(&self) -> Result<char, InputError>;

    /// Advance past the lookahead token.
    fn try_step(&mut self) -> Result<(), InputError>;

    /// The lookahead token.
    ///
    /// # Panics
    ///
    /// Panics when the input is not in the continue state.
    fn head(&self) -> char {
        match self.try_head() {
            Ok(c) => c,
            Err(err) => panic!("{}", err),
        }
    }

    /// Advance past the lookahead token.
    ///
    /// # Panics
    ///
    /// Panics when the input is not in the continue state.
    fn step(&mut self) {
        if let Err(err) = self.try_step() {
            panic!("{}", err);
        }
    }

    /// The error of an input in the error state.
    fn trap(&self) -> Option<&InputError>;

    /// Current position.
    fn mark(&self) -> Mark;

    /// Rewind (or fast-forward) to a previously observed position.
    fn seek(&mut self, mark: &Mark) -> Result<(), InputError> {
        let _ = mark;
        Err(InputError::Unsupported("seek"))
    }

    /// An independently positioned view over the same token stream.
    fn try_clone(&self) -> Result<Box<dyn Input>, InputError> {
        Err(InputError::Unsupported("clone"))
    }

    /// Diagnostic name of the stream.
    fn id(&self) -> Option<&str> {
        None
    }
}

/// Text input backed by a growable buffer.
///
/// A *part* input reports empty when its buffer is exhausted; call
/// [`StringInput::push_str`] to append more text and [`StringInput::finish`]
/// once the stream has ended.
#[derive(Debug, Clone)]
pub struct StringInput {
    text: String,
    /// Byte index of the lookahead within `text`.
    index: usize,
    /// Stream offset of `text[0]`; grows when consumed text is compacted away.
    base: usize,
    base_line: usize,
    base_column: usize,
    line: usize,
    column: usize,
    part: bool,
    id: Option<String>,
}

impl StringInput {
    /// A complete input over `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            index: 0,
            base: 0,
            base_line: 1,
            base_column: 1,
            line: 1,
            column: 1,
            part: false,
            id: None,
        }
    }

    /// An empty part input, waiting for text.
    pub fn streaming() -> Self {
        Self::new(String::new()).part(true)
    }

    /// Set whether more text may follow the buffered text.
    pub fn part(mut self, part: bool) -> Self {
        self.part = part;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn is_part(&self) -> bool {
        self.part
    }

    pub fn set_part(&mut self, part: bool) {
        self.part = part;
    }

    /// Append text to the end of the buffer.
    pub fn push_str(&mut self, chunk: &str) {
        self.text.push_str(chunk);
    }

    /// Mark the end of the stream; exhaustion now reports done.
    pub fn finish(&mut self) {
        self.part = false;
    }

    /// Unconsumed buffered text.
    pub fn remaining(&self) -> &str {
        &self.text[self.index..]
    }

    /// Drop consumed text, keeping stream offsets stable.
    ///
    /// Marks taken before the compaction can no longer be sought.
    pub fn compact(&mut self) {
        if self.index == 0 {
            return;
        }
        self.text.drain(..self.index);
        self.base += self.index;
        self.index = 0;
        self.base_line = self.line;
        self.base_column = self.column;
    }

    /// Seek to a stream byte offset, recomputing line and column.
    pub fn seek_offset(&mut self, offset: usize) -> Result<(), InputError> {
        let local = self.local_index(offset)?;
        let located = Mark::locate(&self.text, local);
        self.index = located.offset;
        if located.line == 1 {
            self.line = self.base_line;
            self.column = self.base_column + located.column - 1;
        } else {
            self.line = self.base_line + located.line - 1;
            self.column = located.column;
        }
        Ok(())
    }

    fn local_index(&self, offset: usize) -> Result<usize, InputError> {
        if offset < self.base || offset > self.base + self.text.len() {
            let mark = Mark::new(offset, 0, 0);
            return Err(InputError::SeekOutOfRange(mark));
        }
        Ok(offset - self.base)
    }
}

impl Input for StringInput {
    #[inline]
    fn is_cont(&self) -> bool {
        self.index < self.text.len()
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.part && !self.is_cont()
    }

    #[inline]
    fn is_done(&self) -> bool {
        !self.part && !self.is_cont()
    }

    #[inline]
    fn is_error(&self) -> bool {
        false
    }

    #[inline]
    fn try_head(&self) -> Result<char, InputError> {
        self.text[self.index..].chars().next().ok_or(InputError::NotReady)
    }

    fn try_step(&mut self) -> Result<(), InputError> {
        let c = self.try_head()?;
        self.index += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Ok(())
    }

    fn trap(&self) -> Option<&InputError> {
        None
    }

    fn mark(&self) -> Mark {
        let mark = Mark::new(self.base + self.index, self.line, self.column);
        match &self.id {
            Some(id) => mark.with_note(id.clone()),
            None => mark,
        }
    }

    fn seek(&mut self, mark: &Mark) -> Result<(), InputError> {
        let local = self.local_index(mark.offset)?;
        if !self.text.is_char_boundary(local) {
            return Err(InputError::SeekOutOfRange(mark.clone()));
        }
        self.index = local;
        self.line = mark.line;
        self.column = mark.column;
        Ok(())
    }

    fn try_clone(&self) -> Result<Box<dyn Input>, InputError> {
        Ok(Box::new(self.clone()))
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ConstState {
    Empty,
    Done,
    Error(InputError),
}

/// An input fixed in the empty, done or error state.
///
/// Feeding `ConstInput::done()` to a parser flushes it: every pending
/// production either completes or reports an unexpected end.
#[derive(Debug, Clone)]
pub struct ConstInput {
    state: ConstState,
    mark: Mark,
    id: Option<String>,
}

impl ConstInput {
    pub fn empty() -> Self {
        Self { state: ConstState::Empty, mark: Mark::start(), id: None }
    }

    pub fn done() -> Self {
        Self { state: ConstState::Done, mark: Mark::start(), id: None }
    }

    pub fn error(error: InputError) -> Self {
        Self { state: ConstState::Error(error), mark: Mark::start(), id: None }
    }

    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.mark = mark;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl Input for ConstInput {
    fn is_cont(&self) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.state == ConstState::Empty
    }

    fn is_done(&self) -> bool {
        self.state == ConstState::Done
    }

    fn is_error(&self) -> bool {
        matches!(self.state, ConstState::Error(_))
    }

    fn try_head(&self) -> Result<char, InputError> {
        Err(InputError::NotReady)
    }

    fn try_step(&mut self) -> Result<(), InputError> {
        Err(InputError::NotReady)
    }

    fn trap(&self) -> Option<&InputError> {
        match &self.state {
            ConstState::Error(err) => Some(err),
            _ => None,
        }
    }

    fn mark(&self) -> Mark {
        self.mark.clone()
    }

    fn try_clone(&self) -> Result<Box<dyn Input>, InputError> {
        Ok(Box::new(self.clone()))
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}
