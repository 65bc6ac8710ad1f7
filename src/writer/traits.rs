//! Byte sinks for the CDF-1 writer.
//!
//! A CDF-1 file is written front to back in one pass. The sink is told the
//! final file size before the first byte ([`NcWrite::reserve`]), and the only
//! write behind the current position is the header's record count
//! ([`NcWrite::patch`]) once a write or stream completes. Sinks exist for
//! in-memory buffers with just `alloc`, and for buffered files when the
//! `std` feature is enabled.

use alloc::vec::Vec;

use crate::{Error, Result};

/// Trait for write operations used by [`NcWriter`](super::NcWriter).
pub trait NcWrite {
    /// Write all bytes at the current position.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Seek to an absolute position.
    fn seek(&mut self, pos: u64) -> Result<u64>;

    /// Get the current position.
    fn position(&self) -> u64;

    /// Flush any buffered data.
    fn flush(&mut self) -> Result<()>;

    /// Prepare for a file of `total` bytes. The default does nothing.
    fn reserve(&mut self, total: u64) -> Result<()> {
        let _ = total;
        Ok(())
    }

    /// Overwrite already written bytes at `pos`, leaving the position at the
    /// end of the data.
    fn patch(&mut self, pos: u64, bytes: &[u8]) -> Result<()> {
        let end = self.position();
        self.seek(pos)?;
        self.write_all(bytes)?;
        self.seek(end)?;
        Ok(())
    }
}

/// A writer that writes to an in-memory buffer.
///
/// Available in both `std` and `no_std` builds.
pub struct VecWriter {
    buffer: Vec<u8>,
    position: u64,
}

impl VecWriter {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            position: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            position: 0,
        }
    }

    /// Consume the writer and return the underlying buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for VecWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl NcWrite for VecWriter {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let pos = self.position as usize;
        let end = pos + bytes.len();
        if end > self.buffer.len() {
            self.buffer.resize(end, 0);
        }
        self.buffer[pos..end].copy_from_slice(bytes);
        self.position = end as u64;
        Ok(())
    }

    fn seek(&mut self, pos: u64) -> Result<u64> {
        self.position = pos;
        Ok(self.position)
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Allocate the whole file up front so record appends never reallocate.
    fn reserve(&mut self, total: u64) -> Result<()> {
        let additional = (total as usize).saturating_sub(self.buffer.len());
        self.buffer.reserve(additional);
        Ok(())
    }

    /// Patch in place; only bytes that were written can be patched.
    fn patch(&mut self, pos: u64, bytes: &[u8]) -> Result<()> {
        let start = pos as usize;
        let field = self
            .buffer
            .get_mut(start..start + bytes.len())
            .ok_or(Error::InvalidState("patch beyond the written data"))?;
        field.copy_from_slice(bytes);
        Ok(())
    }
}

#[cfg(feature = "std")]
mod std_impl {
    use super::NcWrite;
    use crate::Result;
    use std::fs::File;
    use std::io::{BufWriter, Seek, SeekFrom, Write};

    /// A buffered file sink.
    pub struct FileWriter {
        inner: BufWriter<File>,
        position: u64,
    }

    impl FileWriter {
        /// Create the file at `path` with a 1 MB write buffer.
        pub fn new(path: &str) -> Result<Self> {
            Self::with_capacity(path, 1_048_576)
        }

        /// Create the file at `path` with the given buffer capacity.
        pub fn with_capacity(path: &str, capacity: usize) -> Result<Self> {
            let file = File::create(path)?;
            let inner = BufWriter::with_capacity(capacity, file);
            Ok(Self { inner, position: 0 })
        }
    }

    impl NcWrite for FileWriter {
        fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
            self.inner.write_all(bytes)?;
            self.position += bytes.len() as u64;
            Ok(())
        }

        fn seek(&mut self, pos: u64) -> Result<u64> {
            self.inner.seek(SeekFrom::Start(pos))?;
            self.position = pos;
            Ok(self.position)
        }

        fn position(&self) -> u64 {
            self.position
        }

        fn flush(&mut self) -> Result<()> {
            self.inner.flush()?;
            Ok(())
        }

        /// Extend the file to its final length up front.
        fn reserve(&mut self, total: u64) -> Result<()> {
            if total > self.position {
                self.inner.get_ref().set_len(total)?;
            }
            Ok(())
        }
    }
}

#[cfg(feature = "std")]
pub use std_impl::FileWriter;
