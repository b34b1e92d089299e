//! Parser and output configuration.

use std::borrow::Cow;

/// Limits applied while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserSettings {
    /// Maximum nesting of records, groups, markup, attribute parameters,
    /// invocation arguments, selector steps and operators (default: 128).
    /// Parsed values never nest deeper than this.
    pub max_depth: usize,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self { max_depth: 128 }
    }
}

impl ParserSettings {
    /// Settings with no restrictions (for testing).
    pub fn unlimited() -> Self {
        Self { max_depth: usize::MAX }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Settings consulted by outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    /// Written by `Output::writeln` (default: `"\n"`).
    pub line_separator: Cow<'static, str>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self { line_separator: Cow::Borrowed("\n") }
    }
}

impl OutputSettings {
    pub fn with_line_separator(mut self, separator: impl Into<Cow<'static, str>>) -> Self {
        self.line_separator = separator.into();
        self
    }
}
