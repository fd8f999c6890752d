use std::{
    borrow::Cow,
    io::{self, Write as _},
};

use crate::exception::RunError;

/// Trait for the output device targeted by `PRINT_ITEM` and `PRINT_NEWLINE`.
///
/// Implement this trait to capture or redirect output from executed bytecode.
/// The default implementation `StdPrint` writes to stdout.
pub trait PrintWriter {
    /// Called with the already-formatted text of one print item, or with `"\n"`
    /// for a newline. Implementations must not add separators of their own.
    fn write(&mut self, text: Cow<'_, str>) -> Result<(), RunError>;
}

/// Default `PrintWriter` that writes to stdout.
///
/// Output is buffered and flushed when the writer is dropped, so diagnostics
/// written to stderr by a tracer appear before the program's stdout.
#[derive(Debug, Default)]
pub struct StdPrint {
    buffer: String,
}

impl StdPrint {
    /// Creates a writer with an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes buffered text to stdout now.
    pub fn flush(&mut self) -> Result<(), RunError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(self.buffer.as_bytes())
            .and_then(|()| stdout.flush())
            .map_err(|err| RunError::Output { msg: err.to_string() })?;
        self.buffer.clear();
        Ok(())
    }
}

impl PrintWriter for StdPrint {
    fn write(&mut self, text: Cow<'_, str>) -> Result<(), RunError> {
        self.buffer.push_str(&text);
        Ok(())
    }
}

impl Drop for StdPrint {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// A `PrintWriter` that collects all output into a string.
///
/// Useful for testing or capturing print output programmatically.
#[derive(Debug, Default)]
pub struct CollectStringPrint(String);

impl CollectStringPrint {
    /// Creates a new empty `CollectStringPrint`.
    #[must_use]
    pub fn new() -> Self {
        Self(String::new())
    }

    /// Returns the collected output as a string slice.
    #[must_use]
    pub fn output(&self) -> &str {
        self.0.as_str()
    }

    /// Consumes the writer and returns the collected output.
    #[must_use]
    pub fn into_output(self) -> String {
        self.0
    }
}

impl PrintWriter for CollectStringPrint {
    fn write(&mut self, text: Cow<'_, str>) -> Result<(), RunError> {
        self.0.push_str(&text);
        Ok(())
    }
}

/// `PrintWriter` that ignores all output.
///
/// Useful for suppressing print output during testing or benchmarking.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn write(&mut self, _text: Cow<'_, str>) -> Result<(), RunError> {
        Ok(())
    }
}
