//! CDF-1 file writer.
//!
//! [`NcWriter`] turns a [`Dataset`](crate::Dataset) into file bytes on any
//! [`NcWrite`] sink. Two workflows are supported:
//!
//! - [`write_dataset()`](NcWriter::write_dataset) freezes the dataset and
//!   writes the header, the nonrecord section and every buffered record in
//!   one pass. Variables that were never written come out as zeros.
//! - [`start_stream()`](NcWriter::start_stream),
//!   [`append_record()`](NcWriter::append_record) and
//!   [`finish_stream()`](NcWriter::finish_stream) write the header and the
//!   nonrecord section up front, then take records one at a time.
//!
//! # File structure
//!
//! ```text
//! CDF-1 file
//! ├── header (magic, numrecs, dimensions, attributes, variables)
//! ├── nonrecord variables, largest first
//! └── records
//!     └── one slice per record variable
//! ```
//!
//! # Example
//!
//! ```no_run
//! use cdf1_rs::{AttributeList, Dataset, NcType, NcWriter, Result, Values};
//!
//! fn write_stations() -> Result<()> {
//!     let mut ds = Dataset::new();
//!     ds.add_dimension("time", 0)?;
//!     ds.add_dimension("station", 3)?;
//!     let elev = ds.declare_variable("elevation", &["station"], NcType::Float, AttributeList::new())?;
//!     let temp = ds.declare_variable("temp", &["time", "station"], NcType::Float, AttributeList::new())?;
//!
//!     ds.write(elev, 0, &Values::Float(vec![12.0, 250.5, 1800.0]))?;
//!     ds.write(temp, 0, &Values::Float(vec![21.5, 18.0, 4.5]))?;
//!
//!     let mut writer = NcWriter::new("stations.nc")?;
//!     writer.write_dataset(&mut ds)?;
//!     Ok(())
//! }
//! ```
//!
//! # Performance
//!
//! File sinks use internal buffering (1 MB by default). For different buffer
//! sizes, use [`new_with_capacity()`](NcWriter::new_with_capacity).

mod io;
mod streaming;
mod traits;

use streaming::{FlushState, OpenStream};

pub use streaming::{FlushPolicy, NumRecsMode, WriterConfig};
#[cfg(feature = "std")]
pub use traits::FileWriter;
pub use traits::{NcWrite, VecWriter};

/// Writer for CDF-1 files.
///
/// `NcWriter` is not thread-safe. All writing operations should be performed
/// from a single thread.
pub struct NcWriter<W: NcWrite> {
    writer: W,
    offset: u64,
    config: WriterConfig,
    flush_state: FlushState,
    stream: Option<OpenStream>,
}

impl<W: NcWrite> NcWriter<W> {
    /// Create a writer on any sink with the default configuration.
    ///
    /// The sink must be empty. Writing a file into a sink that already holds
    /// data fails with [`Error::InvalidState`](crate::Error::InvalidState).
    pub fn from_writer(writer: W) -> Self {
        Self::with_config(writer, WriterConfig::default())
    }

    pub fn with_config(writer: W, config: WriterConfig) -> Self {
        Self {
            offset: writer.position(),
            writer,
            config,
            flush_state: FlushState::default(),
            stream: None,
        }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Bytes written so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Times the sink has been flushed, by policy or explicitly.
    pub fn flush_count(&self) -> u64 {
        self.flush_state.flush_count
    }

    /// Consume the writer and return the sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
