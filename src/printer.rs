//! In-place status line output.
//!
//! [`StatusPrinter`] redraws a single terminal line. Each write starts with a carriage
//! return, pads with spaces over whatever the previous (longer) line left behind, and
//! ends with another carriage return so the cursor is parked at column 0. It never
//! writes a newline; that decision belongs to the controller.

use std::io::{self, Write};

/// Overwrites one line of a sink in place.
#[derive(Debug)]
pub struct StatusPrinter<W> {
    sink: W,
    last_len: usize,
}

impl<W> StatusPrinter<W> {
    /// Wraps `sink`. Nothing is written until the first status.
    pub const fn new(sink: W) -> Self {
        Self { sink, last_len: 0 }
    }

    /// Length, in characters, of the last status written.
    #[must_use]
    pub const fn last_len(&self) -> usize {
        self.last_len
    }

    /// Borrows the underlying sink.
    #[must_use]
    pub const fn sink(&self) -> &W {
        &self.sink
    }

    /// Consumes the printer and returns the sink.
    pub fn into_sink(self) -> W {
        self.sink
    }
}

impl<W: Write> StatusPrinter<W> {
    /// Replaces the current line with `text` and flushes.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the sink.
    pub fn print_status(&mut self, text: &str) -> io::Result<()> {
        let len = text.chars().count();
        let pad = self.last_len.saturating_sub(len);

        write!(self.sink, "\r{text}{:pad$}\r", "")?;
        self.sink.flush()?;

        self.last_len = len;
        Ok(())
    }

    /// Writes `text` verbatim, outside the overwrite protocol, and flushes.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the sink.
    pub fn write_raw(&mut self, text: &str) -> io::Result<()> {
        self.sink.write_all(text.as_bytes())?;
        self.sink.flush()
    }
}
