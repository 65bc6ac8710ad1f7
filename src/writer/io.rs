// Whole-dataset writing and low level sink handling for NcWriter
use super::{NcWrite, NcWriter, NumRecsMode};
use crate::{
    Dataset, Error, Result,
    format::{NUMRECS_OFFSET, checked_u32},
    layout::Layout,
};

#[cfg(feature = "std")]
use super::FileWriter;

/// Source for runs of zero bytes.
const ZEROS: [u8; 4096] = [0; 4096];

#[cfg(feature = "std")]
impl NcWriter<FileWriter> {
    /// Creates a writer for the given file path using a 1 MB internal
    /// buffer. Use [`Self::new_with_capacity`] to customize the buffer size.
    pub fn new(path: &str) -> Result<Self> {
        Self::new_with_capacity(path, 1_048_576)
    }

    /// Creates a writer with the specified `BufWriter` capacity.
    ///
    /// # Example
    /// ```no_run
    /// use cdf1_rs::NcWriter;
    ///
    /// // A 4 MB buffer for large record sections
    /// let writer = NcWriter::new_with_capacity("output.nc", 4 * 1024 * 1024)?;
    /// # Ok::<(), cdf1_rs::Error>(())
    /// ```
    pub fn new_with_capacity(path: &str, capacity: usize) -> Result<Self> {
        let file_writer = FileWriter::with_capacity(path, capacity)?;
        Ok(Self::from_writer(file_writer))
    }
}

impl<W: NcWrite> NcWriter<W> {
    /// Freeze `ds` and write the complete file: header, nonrecord section
    /// and all `ds.numrecs()` records. Returns the number of bytes written.
    ///
    /// The file size is checked against the format's range before anything
    /// is written, so an oversized dataset leaves the sink untouched. The
    /// sink must be empty: every `begin` offset in the header counts from
    /// its first byte.
    pub fn write_dataset(&mut self, ds: &mut Dataset) -> Result<u64> {
        self.ensure_at_start()?;
        let layout = ds.finalize()?.clone();
        let numrecs = layout.file_numrecs(ds.numrecs());
        let total = layout.total_size(numrecs)?;
        let header = ds.header_bytes(self.config.header_numrecs(numrecs))?;

        self.writer.reserve(total)?;
        self.write_bytes(&header)?;
        self.write_nonrecord_section(ds, &layout)?;

        for record in 0..numrecs {
            for v in layout.record_variables() {
                let slot = v.padded_size as usize;
                match ds.buffered(v.var, record * slot, slot) {
                    Some(bytes) => self.write_bytes(bytes)?,
                    None => self.write_zeros(v.padded_size)?,
                }
            }
        }

        if self.config.numrecs == NumRecsMode::Streaming {
            self.update_u32(NUMRECS_OFFSET, checked_u32(numrecs as u64, "record count")?)?;
        }
        self.flush()?;

        let written = self.offset;
        debug_assert_eq!(written, total);
        tracing::debug!(bytes = written, records = numrecs, "dataset written");
        Ok(written)
    }

    /// Write every nonrecord variable in serialization order, zeros for
    /// those never written.
    pub(super) fn write_nonrecord_section(&mut self, ds: &Dataset, layout: &Layout) -> Result<()> {
        for v in layout.serialization_order().filter(|v| !v.is_record) {
            match ds.buffered(v.var, 0, v.padded_size as usize) {
                Some(bytes) => self.write_bytes(bytes)?,
                None => self.write_zeros(v.padded_size)?,
            }
        }
        Ok(())
    }

    /// A file is written from offset zero of a fresh sink.
    pub(super) fn ensure_at_start(&self) -> Result<()> {
        if self.offset != 0 {
            return Err(Error::InvalidState("sink already holds data"));
        }
        Ok(())
    }

    pub(super) fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        self.offset += bytes.len() as u64;
        Ok(())
    }

    pub(super) fn write_zeros(&mut self, mut len: u64) -> Result<()> {
        while len > 0 {
            let n = len.min(ZEROS.len() as u64) as usize;
            self.write_bytes(&ZEROS[..n])?;
            len -= n as u64;
        }
        Ok(())
    }

    /// Patch a big-endian u32 at `offset` of the bytes already written.
    pub(super) fn update_u32(&mut self, offset: u64, value: u32) -> Result<()> {
        self.writer.patch(offset, &value.to_be_bytes())
    }

    /// Flush the sink.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.flush_state.on_flush();
        Ok(())
    }
}
