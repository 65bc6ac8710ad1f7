#![no_std]
#![forbid(unsafe_code)]

//! # cdf1-rs
//!
//! A Rust library for laying out and writing netCDF classic (CDF-1) files.
//!
//! CDF-1 is the original self-describing array format of the netCDF family:
//! a header naming dimensions, attributes and typed variables, followed by a
//! fixed-size section of nonrecord variables and a growable section of
//! records. Every offset in the file is a 32-bit value, which bounds it at
//! 2 GiB.
//!
//! ## Features
//!
//! - **Schema**: declare dimensions (at most one unlimited), global and
//!   per-variable attributes, and typed variables
//! - **Virtual sizing**: compute the header size, every variable's offset and
//!   the final file size before any data exists, without side effects
//! - **Lazy buffers**: declaring thousands of variables allocates nothing;
//!   buffers appear on first write and unwritten data is emitted as zeros
//! - **Writing**: emit a whole dataset at once, or stream records one by one
//! - **Header decoding**: read back a header for inspection and round trips
//!
//! ## Quick Start
//!
//! ### Writing a file
//!
//! ```no_run
//! use cdf1_rs::{Attribute, AttributeList, Dataset, NcType, NcWriter, Result, Values};
//!
//! fn main() -> Result<()> {
//!     let mut ds = Dataset::new();
//!     ds.set_attribute(Attribute::text("title", "surface observations"))?;
//!     ds.add_dimension("time", 0)?;
//!     ds.add_dimension("station", 3)?;
//!
//!     let temp = ds.declare_variable(
//!         "temp",
//!         &["time", "station"],
//!         NcType::Float,
//!         AttributeList::new().with(Attribute::text("units", "degC")),
//!     )?;
//!
//!     for (record, row) in [[20.5f32, 21.0, 19.5], [21.5, 22.0, 20.0]].iter().enumerate() {
//!         ds.write(temp, record, &Values::Float(row.to_vec()))?;
//!     }
//!
//!     let mut writer = NcWriter::new("obs.nc")?;
//!     writer.write_dataset(&mut ds)?;
//!     Ok(())
//! }
//! ```
//!
//! ### Sizing a file without writing it
//!
//! ```
//! use cdf1_rs::{AttributeList, Dataset, NcType, Result};
//!
//! fn main() -> Result<()> {
//!     let mut ds = Dataset::new();
//!     ds.add_dimension("time", 0)?;
//!     ds.add_dimension("x", 1000)?;
//!     ds.declare_variable("grid", &["x"], NcType::Double, AttributeList::new())?;
//!     ds.declare_variable("series", &["time", "x"], NcType::Float, AttributeList::new())?;
//!
//!     let layout = ds.layout()?;
//!     assert_eq!(layout.record_stride, 4000);
//!     ds.set_numrecs(24)?;
//!     assert_eq!(ds.virtual_size()?, layout.nonrecord_end + 24 * 4000);
//!     assert!(!ds.is_frozen());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`format`] | Wire constants, scalar types and the header codec |
//! | [`dimension`] | Dimension table |
//! | [`attribute`] | Attribute lists |
//! | [`variable`] | Variable registry |
//! | [`layout`] | Offsets, padding and file size |
//! | [`buffer`] | Lazily allocated data buffers |
//! | [`dataset`] | The [`Dataset`] tying it together |
//! | [`writer`] | File creation with [`NcWriter`] |
//! | [`error`] | Error types and [`Result`] alias |
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`], which is an alias for
//! `core::result::Result<T, Error>`. A failed call leaves the dataset as it
//! was. Offsets beyond the 32-bit range are reported as [`Error::Overflow`].
//!
//! ## Cargo features
//!
//! - `std` (default): file sinks, `std::error::Error`, layout JSON export
//! - `alloc`: the `no_std` core
//! - `serde`: `Serialize`/`Deserialize` for the layout types

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod attribute;
pub mod buffer;
pub mod dataset;
pub mod dimension;
pub mod error;
pub mod format;
pub mod layout;
pub mod variable;
pub mod writer;

// Re-export commonly used types at the crate root
pub use attribute::{Attribute, AttributeList};
pub use buffer::DataBuffer;
pub use dataset::Dataset;
pub use dimension::{DimId, Dimension, DimensionTable};
pub use error::{Error, Result};
pub use format::{HeaderInfo, NcType, NumRecs, Value, Values, VarInfo};
pub use layout::{Layout, VarLayout};
pub use variable::{VarId, Variable, VariableRegistry};
#[cfg(feature = "std")]
pub use writer::FileWriter;
pub use writer::{FlushPolicy, NcWrite, NcWriter, NumRecsMode, VecWriter, WriterConfig};
