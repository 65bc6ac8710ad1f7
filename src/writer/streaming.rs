//! Writer configuration and the streaming record appender.
//!
//! A streaming write emits the header and the nonrecord section once, then
//! accepts one record at a time without holding records in memory. This is
//! how long captures are written when the final record count is unknown.
//!
//! # Example
//!
//! ```
//! use cdf1_rs::{AttributeList, Dataset, FlushPolicy, NcType, NcWriter, Values, VecWriter, WriterConfig};
//!
//! # fn main() -> cdf1_rs::Result<()> {
//! let mut ds = Dataset::new();
//! ds.add_dimension("time", 0)?;
//! ds.declare_variable("t", &["time"], NcType::Double, AttributeList::new())?;
//!
//! let config = WriterConfig::streaming().with_flush(FlushPolicy::EveryNRecords(100));
//! let mut writer = NcWriter::with_config(VecWriter::new(), config);
//! writer.start_stream(&mut ds)?;
//! for i in 0..1000 {
//!     writer.append_record(&[Values::Double(vec![i as f64])])?;
//! }
//! assert_eq!(writer.finish_stream(&mut ds)?, 1000);
//! assert_eq!(ds.numrecs(), 1000);
//! # Ok(())
//! # }
//! ```

use alloc::string::String;
use alloc::vec::Vec;

use super::{NcWrite, NcWriter};
use crate::{
    Dataset, Error, Result,
    format::{NUMRECS_OFFSET, NcType, NumRecs, Values, checked_u32},
    layout::Layout,
    variable::VarId,
};

/// How the header's record count is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumRecsMode {
    /// Write the record count known when the header is emitted.
    #[default]
    Committed,
    /// Write the streaming sentinel; the real count is patched in on finish.
    Streaming,
}

/// Policy for automatic flushing of the sink during streaming writes.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FlushPolicy {
    /// Only flush on finish or an explicit [`NcWriter::flush`].
    #[default]
    Manual,

    /// Flush after every N records appended.
    EveryNRecords(u64),

    /// Flush after N bytes of record data have been appended.
    EveryNBytes(u64),
}

/// Configuration for [`NcWriter`].
#[derive(Debug, Clone, Default)]
pub struct WriterConfig {
    pub numrecs: NumRecsMode,
    pub flush: FlushPolicy,
}

impl WriterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// A configuration that writes the streaming sentinel in the header.
    pub fn streaming() -> Self {
        Self {
            numrecs: NumRecsMode::Streaming,
            ..Self::default()
        }
    }

    pub fn with_flush(mut self, flush: FlushPolicy) -> Self {
        self.flush = flush;
        self
    }

    pub(super) fn header_numrecs(&self, numrecs: usize) -> NumRecs {
        match self.numrecs {
            NumRecsMode::Committed => NumRecs::Count(numrecs),
            NumRecsMode::Streaming => NumRecs::Streaming,
        }
    }
}

/// Tracks flush state for streaming writes.
#[derive(Debug, Default)]
pub(super) struct FlushState {
    /// Records written since last flush.
    pub records_since_flush: u64,
    /// Bytes written since last flush.
    pub bytes_since_flush: u64,
    pub flush_count: u64,
}

impl FlushState {
    pub fn record_write(&mut self, records: u64, bytes: u64) {
        self.records_since_flush += records;
        self.bytes_since_flush += bytes;
    }

    pub fn should_flush(&self, policy: &FlushPolicy) -> bool {
        match policy {
            FlushPolicy::Manual => false,
            FlushPolicy::EveryNRecords(n) => self.records_since_flush >= *n,
            FlushPolicy::EveryNBytes(n) => self.bytes_since_flush >= *n,
        }
    }

    pub fn on_flush(&mut self) {
        self.records_since_flush = 0;
        self.bytes_since_flush = 0;
        self.flush_count += 1;
    }
}

/// One record variable's slice within a streamed record.
#[derive(Debug)]
struct RecordSlot {
    name: String,
    nc_type: NcType,
    elements: usize,
    /// Offset of the slice within the record
    start: usize,
}

/// An open stream.
#[derive(Debug)]
pub(super) struct OpenStream {
    layout: Layout,
    slots: Vec<RecordSlot>,
    /// Record count written in the header
    committed: usize,
    records: usize,
    /// Scratch buffer reused for record encoding
    record_buf: Vec<u8>,
}

impl<W: NcWrite> NcWriter<W> {
    /// Freeze `ds`, then write its header and nonrecord section.
    ///
    /// Records buffered in `ds` are not written; the record section is
    /// produced by [`append_record`](Self::append_record). In
    /// [`NumRecsMode::Committed`] mode the header carries `ds.numrecs()`, so a
    /// producer that knows its record count can commit it with
    /// [`Dataset::set_numrecs`] first.
    pub fn start_stream(&mut self, ds: &mut Dataset) -> Result<()> {
        if self.stream.is_some() {
            return Err(Error::InvalidState("a stream is already open"));
        }
        self.ensure_at_start()?;
        let layout = ds.finalize()?.clone();
        let committed = layout.file_numrecs(ds.numrecs());
        layout.total_size(committed)?;

        let header = ds.header_bytes(self.config.header_numrecs(committed))?;
        self.write_bytes(&header)?;
        self.write_nonrecord_section(ds, &layout)?;

        let slots = layout
            .record_variables()
            .map(|v| RecordSlot {
                name: v.name.clone(),
                nc_type: v.nc_type,
                elements: v.elements as usize,
                start: (v.begin - layout.nonrecord_end) as usize,
            })
            .collect();
        tracing::debug!(
            header_size = layout.header_size,
            record_stride = layout.record_stride,
            committed,
            "stream started"
        );
        self.stream = Some(OpenStream {
            record_buf: Vec::with_capacity(layout.record_stride as usize),
            layout,
            slots,
            committed,
            records: 0,
        });
        Ok(())
    }

    /// Append one record: one [`Values`] per record variable, in
    /// serialization order. Short values are zero-filled to the slice.
    pub fn append_record(&mut self, values: &[Values]) -> Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or(Error::InvalidState("no open stream"))?;
        if values.len() != stream.slots.len() {
            return Err(Error::IndexOutOfBounds {
                variable: String::from("<record>"),
                index: values.len(),
                limit: stream.slots.len(),
            });
        }
        for (slot, v) in stream.slots.iter().zip(values) {
            if v.nc_type() != slot.nc_type {
                return Err(Error::TypeMismatch {
                    expected: slot.nc_type,
                    found: v.nc_type(),
                });
            }
            if v.len() > slot.elements {
                return Err(Error::IndexOutOfBounds {
                    variable: slot.name.clone(),
                    index: v.len(),
                    limit: slot.elements,
                });
            }
        }
        stream.layout.total_size(stream.records + 1)?;
        let stride = stream.layout.record_stride;

        stream.record_buf.clear();
        stream.record_buf.resize(stride as usize, 0);
        for (slot, v) in stream.slots.iter().zip(values) {
            v.encode_into(&mut stream.record_buf[slot.start..slot.start + v.byte_len()]);
        }
        let record = core::mem::take(&mut stream.record_buf);

        let result = self.write_bytes(&record);
        if let Some(stream) = self.stream.as_mut() {
            stream.record_buf = record;
            if result.is_ok() {
                stream.records += 1;
            }
        }
        if result.is_err() {
            // Rewind past any partial record.
            self.writer.seek(self.offset)?;
        }
        result?;

        self.flush_state.record_write(1, stride);
        if self.flush_state.should_flush(&self.config.flush) {
            self.flush()?;
        }
        Ok(())
    }

    /// Records appended to the open stream so far.
    pub fn streamed_records(&self) -> Option<usize> {
        self.stream.as_ref().map(|s| s.records)
    }

    /// Close the stream, returning the record count of the file.
    ///
    /// `ds` must be the dataset the stream was started with. If fewer records
    /// were appended than the header committed, the rest are written as
    /// zeros. The header's record count is then patched to the final value
    /// and `ds` is grown to it, so [`Dataset::virtual_size`] matches the file.
    pub fn finish_stream(&mut self, ds: &mut Dataset) -> Result<usize> {
        match (&self.stream, ds.frozen_layout()) {
            (None, _) => return Err(Error::InvalidState("no open stream")),
            (Some(stream), Some(layout)) if *layout == stream.layout => {}
            _ => return Err(Error::InvalidState("dataset does not match the open stream")),
        }
        let stream = self
            .stream
            .take()
            .ok_or(Error::InvalidState("no open stream"))?;

        let stride = stream.layout.record_stride;
        if stream.records < stream.committed {
            let missing = (stream.committed - stream.records) as u64 * stride;
            self.write_zeros(missing)?;
        }
        let numrecs = stream.layout.file_numrecs(stream.records.max(stream.committed));
        let field = NumRecs::Count(numrecs);
        if field != self.config.header_numrecs(stream.committed) {
            let value = checked_u32(numrecs as u64, "record count")?;
            self.update_u32(NUMRECS_OFFSET, value)?;
        }
        self.flush()?;
        ds.set_numrecs(numrecs.max(ds.numrecs()))?;
        tracing::debug!(records = numrecs, bytes = self.offset, "stream finished");
        Ok(numrecs)
    }
}

impl Dataset {
    /// Record variables in the order [`NcWriter::append_record`] expects them.
    pub fn record_variable_order(&self) -> Result<Vec<VarId>> {
        Ok(self.layout()?.record_variables().map(|v| v.var).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AttributeList, HeaderInfo, VecWriter};
    use alloc::vec;

    fn record_dataset() -> Dataset {
        let mut ds = Dataset::new();
        ds.add_dimension("time", 0).unwrap();
        ds.add_dimension("n", 2).unwrap();
        ds.declare_variable("id", &["n"], NcType::Int, AttributeList::new())
            .unwrap();
        ds.declare_variable("t", &["time"], NcType::Double, AttributeList::new())
            .unwrap();
        ds.declare_variable("q", &["time", "n"], NcType::Short, AttributeList::new())
            .unwrap();
        ds
    }

    #[test]
    fn test_flush_state_should_flush() {
        let mut state = FlushState::default();
        state.record_write(1000, 10000);
        assert!(!state.should_flush(&FlushPolicy::Manual));
        assert!(!state.should_flush(&FlushPolicy::EveryNRecords(1001)));
        assert!(state.should_flush(&FlushPolicy::EveryNRecords(1000)));
        assert!(!state.should_flush(&FlushPolicy::EveryNBytes(10001)));
        assert!(state.should_flush(&FlushPolicy::EveryNBytes(10000)));

        state.on_flush();
        assert_eq!(state.records_since_flush, 0);
        assert_eq!(state.bytes_since_flush, 0);
        assert_eq!(state.flush_count, 1);
    }

    #[test]
    fn test_stream_matches_buffered_write() {
        let mut streamed = record_dataset();
        let mut writer = NcWriter::from_writer(VecWriter::new());
        writer.start_stream(&mut streamed).unwrap();
        writer
            .append_record(&[Values::Double(vec![0.5]), Values::Short(vec![1, 2])])
            .unwrap();
        writer
            .append_record(&[Values::Double(vec![1.5]), Values::Short(vec![3])])
            .unwrap();
        assert_eq!(writer.finish_stream(&mut streamed).unwrap(), 2);
        assert_eq!(streamed.numrecs(), 2);
        let streamed_bytes = writer.into_inner().into_inner();

        let mut buffered = record_dataset();
        let t = buffered.variable("t").unwrap();
        let q = buffered.variable("q").unwrap();
        buffered.write(t, 0, &Values::Double(vec![0.5])).unwrap();
        buffered.write(q, 0, &Values::Short(vec![1, 2])).unwrap();
        buffered.write(t, 1, &Values::Double(vec![1.5])).unwrap();
        buffered.write(q, 1, &Values::Short(vec![3])).unwrap();
        let mut writer = NcWriter::from_writer(VecWriter::new());
        writer.write_dataset(&mut buffered).unwrap();

        assert_eq!(streamed_bytes, writer.into_inner().into_inner());
    }

    #[test]
    fn test_streaming_sentinel_is_patched() {
        let mut ds = record_dataset();
        let mut writer = NcWriter::with_config(VecWriter::new(), WriterConfig::streaming());
        writer.start_stream(&mut ds).unwrap();
        writer
            .append_record(&[Values::Double(vec![1.0]), Values::Short(vec![])])
            .unwrap();
        let bytes = writer.writer.as_slice();
        assert_eq!(&bytes[4..8], &[0xFF; 4]);

        writer.finish_stream(&mut ds).unwrap();
        let bytes = writer.into_inner().into_inner();
        let info = HeaderInfo::parse(&bytes).unwrap();
        assert_eq!(info.numrecs, NumRecs::Count(1));
        assert_eq!(ds.virtual_size().unwrap(), bytes.len() as u64);
    }

    #[test]
    fn test_committed_records_are_zero_filled() {
        let mut ds = record_dataset();
        ds.set_numrecs(3).unwrap();
        let expected = ds.virtual_size().unwrap();

        let mut writer = NcWriter::from_writer(VecWriter::new());
        writer.start_stream(&mut ds).unwrap();
        writer
            .append_record(&[Values::Double(vec![2.0]), Values::Short(vec![7, 7])])
            .unwrap();
        assert_eq!(writer.finish_stream(&mut ds).unwrap(), 3);
        assert_eq!(ds.numrecs(), 3);

        let bytes = writer.into_inner().into_inner();
        assert_eq!(bytes.len() as u64, expected);
        assert_eq!(HeaderInfo::parse(&bytes).unwrap().numrecs, NumRecs::Count(3));
    }

    #[test]
    fn test_append_rejects_bad_records() {
        let mut ds = record_dataset();
        let mut writer = NcWriter::from_writer(VecWriter::new());
        assert!(matches!(
            writer.append_record(&[]),
            Err(Error::InvalidState(_))
        ));

        writer.start_stream(&mut ds).unwrap();
        assert!(matches!(
            writer.append_record(&[Values::Double(vec![1.0])]),
            Err(Error::IndexOutOfBounds { .. })
        ));
        assert!(matches!(
            writer.append_record(&[Values::Float(vec![1.0]), Values::Short(vec![1])]),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            writer.append_record(&[Values::Double(vec![1.0]), Values::Short(vec![1, 2, 3])]),
            Err(Error::IndexOutOfBounds { .. })
        ));
        assert_eq!(writer.streamed_records(), Some(0));
    }

    #[test]
    fn test_flush_policy_triggers() {
        let mut ds = record_dataset();
        let config = WriterConfig::new().with_flush(FlushPolicy::EveryNRecords(2));
        let mut writer = NcWriter::with_config(VecWriter::new(), config);
        writer.start_stream(&mut ds).unwrap();
        for _ in 0..5 {
            writer
                .append_record(&[Values::Double(vec![0.0]), Values::Short(vec![0, 0])])
                .unwrap();
        }
        assert_eq!(writer.flush_count(), 2);
        assert_eq!(writer.flush_state.records_since_flush, 1);
    }

    #[test]
    fn test_record_variable_order() {
        let ds = record_dataset();
        let order = ds.record_variable_order().unwrap();
        assert_eq!(order, vec![ds.variable("t").unwrap(), ds.variable("q").unwrap()]);
    }

    /// A sink that rejects any write past `limit` bytes.
    struct LimitedSink {
        inner: VecWriter,
        limit: u64,
    }

    impl NcWrite for LimitedSink {
        fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
            if self.inner.position() + bytes.len() as u64 > self.limit {
                return Err(Error::InvalidState("sink full"));
            }
            self.inner.write_all(bytes)
        }

        fn seek(&mut self, pos: u64) -> Result<u64> {
            self.inner.seek(pos)
        }

        fn position(&self) -> u64 {
            self.inner.position()
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_append_is_not_counted() {
        let mut ds = record_dataset();
        let layout = ds.layout().unwrap();
        let limit = layout.nonrecord_end + layout.record_stride + 4;
        let sink = LimitedSink {
            inner: VecWriter::new(),
            limit,
        };
        let mut writer = NcWriter::with_config(sink, WriterConfig::streaming());
        writer.start_stream(&mut ds).unwrap();

        let record = [Values::Double(vec![1.0]), Values::Short(vec![2, 3])];
        writer.append_record(&record).unwrap();
        assert!(writer.append_record(&record).is_err());
        assert_eq!(writer.streamed_records(), Some(1));
        assert_eq!(writer.offset(), limit - 4);

        assert_eq!(writer.finish_stream(&mut ds).unwrap(), 1);
        assert_eq!(ds.numrecs(), 1);
        let bytes = writer.into_inner().inner.into_inner();
        assert_eq!(bytes.len() as u64, ds.virtual_size().unwrap());
        assert_eq!(HeaderInfo::parse(&bytes).unwrap().numrecs, NumRecs::Count(1));
    }

    #[test]
    fn test_stream_past_committed_count() {
        let mut ds = record_dataset();
        ds.set_numrecs(2).unwrap();
        let mut writer = NcWriter::from_writer(VecWriter::new());
        writer.start_stream(&mut ds).unwrap();
        for i in 0..5 {
            writer
                .append_record(&[Values::Double(vec![f64::from(i)]), Values::Short(vec![i as i16])])
                .unwrap();
        }
        assert_eq!(writer.finish_stream(&mut ds).unwrap(), 5);
        assert_eq!(ds.numrecs(), 5);

        let bytes = writer.into_inner().into_inner();
        assert_eq!(bytes.len() as u64, ds.virtual_size().unwrap());
        assert_eq!(HeaderInfo::parse(&bytes).unwrap().numrecs, NumRecs::Count(5));
    }

    #[test]
    fn test_finish_rejects_other_dataset() {
        let mut ds = record_dataset();
        let mut writer = NcWriter::from_writer(VecWriter::new());
        writer.start_stream(&mut ds).unwrap();

        let mut other = Dataset::new();
        other.add_dimension("time", 0).unwrap();
        assert!(matches!(
            writer.finish_stream(&mut other),
            Err(Error::InvalidState(_))
        ));
        assert_eq!(writer.streamed_records(), Some(0));
        assert_eq!(writer.finish_stream(&mut ds).unwrap(), 0);
    }
}
