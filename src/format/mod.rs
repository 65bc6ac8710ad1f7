// src/format/mod.rs
//! Wire-level pieces of the CDF-1 format: constants, byte helpers, the scalar
//! type registry and the header codec.

// ============================================================================
// Format Constants
// ============================================================================
// Every integer in a classic file is a big-endian 4-byte value and every
// variable-length field is padded to a 4-byte boundary.

/// Magic bytes of a classic file: `CDF` followed by the version byte 1.
pub const MAGIC: [u8; 4] = *b"CDF\x01";

/// Byte offset of the numrecs field, right after the magic.
pub const NUMRECS_OFFSET: u64 = MAGIC.len() as u64;

/// Tag introducing a non-empty dimension list.
pub const NC_DIMENSION: u32 = 10;

/// Tag introducing a non-empty variable list.
pub const NC_VARIABLE: u32 = 11;

/// Tag introducing a non-empty attribute list.
pub const NC_ATTRIBUTE: u32 = 12;

/// Encoding of an empty list: a zero tag followed by a zero count.
pub const ABSENT: [u8; 8] = [0; 8];

/// Value of the numrecs field when the record count is not committed up front.
pub const STREAMING: u32 = 0xFFFF_FFFF;

/// Largest byte offset a classic file can address (offsets are signed 32-bit).
pub const MAX_OFFSET: u64 = i32::MAX as u64;

/// Every field and every padded data region is aligned to this many bytes.
pub const ALIGNMENT: u64 = 4;

// ============================================================================
// Submodules
// ============================================================================

mod common;
mod header;
mod nc_type;

pub use common::{padded_len, padding_to_align_4, read_u32};
pub(crate) use common::{checked_u32, validate_buffer_size};
pub use header::{HeaderInfo, NumRecs, VarInfo};
pub(crate) use header::{encoded_header_size, write_header};
pub use nc_type::{NcType, Value, Values};
