//! Sinks for progress output.
//!
//! Any [`std::io::Write`] can receive a meter. This module adds [`SharedBuffer`], an
//! in-memory sink whose clones all point at the same bytes. Hand one clone to the
//! iterator adapter (which takes ownership of its sink) and keep another to read back
//! exactly what was drawn, which is how this crate's own tests observe the output.

use std::{
    fmt,
    io::{self, Write},
    sync::Arc,
};

use parking_lot::Mutex;

/// A cloneable, growable byte sink.
///
/// ```
/// use std::io::Write;
/// use tqdm::io::SharedBuffer;
///
/// let buf = SharedBuffer::new();
/// let mut writer = buf.clone();
/// writer.write_all(b"\rhi\r").unwrap();
/// assert_eq!(buf.contents(), "\rhi\r");
/// ```
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBuffer")
            .field("len", &self.len())
            .finish()
    }
}

impl SharedBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the raw bytes written so far.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.lock().clone()
    }

    /// Returns everything written so far, lossily decoded as UTF-8.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock()).into_owned()
    }

    /// The text of the most recent status redraw.
    ///
    /// Splits on carriage returns and newlines and returns the last segment with
    /// visible content, with the padding trimmed.
    #[must_use]
    pub fn last_status(&self) -> Option<String> {
        self.contents()
            .split(['\r', '\n'])
            .map(str::trim_end)
            .rfind(|line| !line.is_empty())
            .map(ToOwned::to_owned)
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Discards everything written so far.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
