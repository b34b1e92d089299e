//! Push-based token sinks.
//!
//! An [`Output`] accepts chars while it is in the continue state. Writers
//! check `is_cont()` before every char and suspend when the output reports
//! full, so a bounded output never loses text.

use crate::error::OutputError;
use crate::settings::OutputSettings;
use crate::value::Data;

/// A resumable sink of `char` tokens.
pub trait Output {
    /// What [`Output::bind`] hands back once writing is finished.
    type Product;

    /// The output accepts another char.
    fn is_cont(&self) -> bool;

    /// No capacity right now; drain the output and resume.
    fn is_full(&self) -> bool;

    /// The output was closed and accepts nothing further.
    fn is_done(&self) -> bool;

    fn is_error(&self) -> bool;

    fn write(&mut self, c: char) -> Result<(), OutputError>;

    fn write_str(&mut self, s: &str) -> Result<(), OutputError> {
        for c in s.chars() {
            self.write(c)?;
        }
        Ok(())
    }

    /// Write the configured line separator.
    fn writeln(&mut self) -> Result<(), OutputError> {
        let separator = self.settings().line_separator.clone();
        self.write_str(&separator)
    }

    fn trap(&self) -> Option<&OutputError>;

    fn settings(&self) -> &OutputSettings;

    /// Finish writing and take the accumulated product.
    fn bind(self) -> Self::Product
    where
        Self: Sized;
}

/// Accumulates chars into a `String`, optionally bounded.
#[derive(Debug, Clone, Default)]
pub struct StringOutput {
    buf: String,
    /// Chars currently held in `buf`.
    count: usize,
    limit: Option<usize>,
    closed: bool,
    settings: OutputSettings,
}

impl StringOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// An output that reports full once it holds `limit` chars.
    pub fn with_limit(limit: usize) -> Self {
        Self { limit: Some(limit), ..Self::default() }
    }

    pub fn with_settings(mut self, settings: OutputSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Hand out the accumulated text, freeing capacity for more.
    pub fn drain(&mut self) -> String {
        self.count = 0;
        std::mem::take(&mut self.buf)
    }

    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl Output for StringOutput {
    type Product = String;

    #[inline]
    fn is_cont(&self) -> bool {
        !self.closed && !self.is_full()
    }

    #[inline]
    fn is_full(&self) -> bool {
        self.limit.is_some_and(|limit| self.count >= limit)
    }

    #[inline]
    fn is_done(&self) -> bool {
        self.closed
    }

    #[inline]
    fn is_error(&self) -> bool {
        false
    }

    fn write(&mut self, c: char) -> Result<(), OutputError> {
        if self.closed {
            return Err(OutputError::Closed);
        }
        if self.is_full() {
            return Err(OutputError::Full);
        }
        self.buf.push(c);
        self.count += 1;
        Ok(())
    }

    fn trap(&self) -> Option<&OutputError> {
        None
    }

    fn settings(&self) -> &OutputSettings {
        &self.settings
    }

    fn bind(self) -> String {
        self.buf
    }
}

/// Accumulates the UTF-8 encoding of the written chars into a [`Data`].
#[derive(Debug, Clone, Default)]
pub struct DataOutput {
    data: Data,
    error: Option<OutputError>,
    settings: OutputSettings,
}

impl DataOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to an existing buffer.
    pub fn with_data(data: Data) -> Self {
        Self { data, ..Self::default() }
    }

    pub fn with_settings(mut self, settings: OutputSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn data(&self) -> &Data {
        &self.data
    }
}

impl Output for DataOutput {
    type Product = Data;

    fn is_cont(&self) -> bool {
        self.error.is_none()
    }

    fn is_full(&self) -> bool {
        false
    }

    fn is_done(&self) -> bool {
        false
    }

    fn is_error(&self) -> bool {
        self.error.is_some()
    }

    fn write(&mut self, c: char) -> Result<(), OutputError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        let mut utf8 = [0u8; 4];
        let encoded = c.encode_utf8(&mut utf8);
        if let Err(err) = self.data.add_slice(encoded.as_bytes()) {
            let err = OutputError::Trapped(err.to_string());
            self.error = Some(err.clone());
            return Err(err);
        }
        Ok(())
    }

    fn trap(&self) -> Option<&OutputError> {
        self.error.as_ref()
    }

    fn settings(&self) -> &OutputSettings {
        &self.settings
    }

    fn bind(self) -> Data {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_output_accumulates() {
        let mut output = StringOutput::new();
        output.write_str("a:1").unwrap();
        output.writeln().unwrap();
        assert_eq!(output.bind(), "a:1\n");
    }

    #[test]
    fn test_limit_reports_full_and_drain_frees() {
        let mut output = StringOutput::with_limit(2);
        output.write('é').unwrap();
        output.write('x').unwrap();
        assert!(output.is_full());
        assert!(!output.is_cont());
        assert_eq!(output.write('y'), Err(OutputError::Full));
        assert_eq!(output.drain(), "éx");
        assert!(output.is_cont());
        output.write('y').unwrap();
        assert_eq!(output.as_str(), "y");
    }

    #[test]
    fn test_closed_output_rejects_writes() {
        let mut output = StringOutput::new();
        output.close();
        assert!(output.is_done());
        assert_eq!(output.write('a'), Err(OutputError::Closed));
    }

    #[test]
    fn test_custom_line_separator() {
        let settings = OutputSettings::default().with_line_separator("\r\n");
        let mut output = StringOutput::new().with_settings(settings);
        output.write('a').unwrap();
        output.writeln().unwrap();
        assert_eq!(output.bind(), "a\r\n");
    }

    #[test]
    fn test_data_output_encodes_utf8() {
        let mut output = DataOutput::new();
        output.write_str("aé").unwrap();
        assert_eq!(output.bind().to_vec(), vec![b'a', 0xC3, 0xA9]);
    }

    #[test]
    fn test_data_output_traps_immutable_buffer() {
        let mut data = Data::new();
        data.commit();
        let mut output = DataOutput::with_data(data);
        assert!(output.write('a').is_err());
        assert!(output.is_error());
        assert!(matches!(output.trap(), Some(OutputError::Trapped(_))));
    }
}
