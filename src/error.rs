//! Error types for CDF-1 operations.
//!
//! This module defines the [`Error`] enum which represents all possible failures
//! that can occur when declaring a schema, laying it out, buffering data, or
//! writing a netCDF classic file.
//!
//! # Example
//!
//! ```
//! use cdf1_rs::{Dataset, Error};
//!
//! let mut ds = Dataset::new();
//! ds.add_dimension("time", 0).unwrap();
//! match ds.add_dimension("station", 0) {
//!     Err(Error::MultipleUnlimited { existing, .. }) => {
//!         assert_eq!(existing, "time");
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

use core::fmt;

use alloc::string::String;

use crate::format::NcType;

/// Errors that can occur during CDF-1 operations.
///
/// Every failing call leaves the dataset exactly as it was before the call.
#[derive(Debug)]
pub enum Error {
    /// A dimension or variable with this name already exists.
    DuplicateName {
        /// What kind of object collided ("dimension" or "variable")
        kind: &'static str,
        /// The offending name
        name: String,
    },

    /// A variable referenced a dimension that is not in the dimension table.
    UnknownDimension(String),

    /// A second unlimited dimension was requested.
    MultipleUnlimited {
        /// Name of the unlimited dimension already declared
        existing: String,
        /// Name of the rejected dimension
        requested: String,
    },

    /// The unlimited dimension appeared somewhere other than position 0.
    UnlimitedNotFirst {
        /// Variable being declared
        variable: String,
        /// Position at which the unlimited dimension was found
        position: usize,
    },

    /// A type tag or type code outside the six classic types.
    UnsupportedType(String),

    /// A schema declaration was attempted after the header was finalized.
    SchemaFrozen(&'static str),

    /// A write or read touched elements or records outside the variable's shape.
    IndexOutOfBounds {
        /// Variable being accessed
        variable: String,
        /// First index past the valid range that the call would touch
        index: usize,
        /// Number of valid positions
        limit: usize,
    },

    /// An offset or size does not fit the 32-bit CDF-1 addressing range.
    ///
    /// Files this large need the 64-bit offset variant of the format.
    Overflow(String),

    /// The encoded header itself exceeds the 32-bit size range.
    HeaderTooLarge {
        /// Header size in bytes
        size: u64,
    },

    /// Values of one scalar type were supplied where another was required.
    TypeMismatch {
        /// Type declared on the variable or attribute
        expected: NcType,
        /// Type of the supplied values
        found: NcType,
    },

    /// A variable handle that this dataset never issued.
    UnknownVariable(String),

    /// A record-only operation was applied to a nonrecord variable.
    NotRecordVariable(String),

    /// An attempt to lower the record count.
    RecordCountDecrease {
        /// Current record count
        current: usize,
        /// Requested record count
        requested: usize,
    },

    /// Buffer provided for decoding was too small.
    TooShortBuffer {
        /// Actual number of bytes available
        actual: usize,
        /// Minimum number of bytes required
        expected: usize,
        /// Source file where the error was detected
        file: &'static str,
        /// Line number where the error was detected
        line: u32,
    },

    /// The leading bytes are not `CDF` followed by version 1.
    InvalidMagic(String),

    /// A list tag in the header did not match the expected value.
    UnexpectedTag {
        /// The tag that was found
        actual: u32,
        /// The tag that was expected
        expected: u32,
    },

    /// A writer operation was called out of sequence, e.g. appending a
    /// record with no open stream.
    InvalidState(&'static str),

    /// The layout could not be exported.
    SerializationError(String),

    /// An I/O error occurred while writing the file.
    ///
    /// Only available with the `std` feature.
    #[cfg(feature = "std")]
    IOError(std::io::Error),

    /// A write operation failed (no_std version).
    ///
    /// Only available without the `std` feature.
    #[cfg(not(feature = "std"))]
    WriteError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DuplicateName { kind, name } => {
                write!(f, "Duplicate {kind} name: {name:?}")
            }
            Error::UnknownDimension(name) => write!(f, "Unknown dimension: {name:?}"),
            Error::MultipleUnlimited {
                existing,
                requested,
            } => write!(
                f,
                "Cannot add unlimited dimension {requested:?}: {existing:?} is already unlimited"
            ),
            Error::UnlimitedNotFirst { variable, position } => write!(
                f,
                "Unlimited dimension must be the first dimension of variable {variable:?}, found at position {position}"
            ),
            Error::UnsupportedType(t) => write!(f, "Unsupported type: {t}"),
            Error::SchemaFrozen(op) => {
                write!(f, "Schema is frozen: cannot {op} after the header is finalized")
            }
            Error::IndexOutOfBounds {
                variable,
                index,
                limit,
            } => write!(
                f,
                "Index {index} out of bounds for variable {variable:?} (limit {limit})"
            ),
            Error::Overflow(what) => write!(
                f,
                "{what} exceeds the CDF-1 32-bit offset range; use a 64-bit offset format"
            ),
            Error::HeaderTooLarge { size } => {
                write!(f, "Header of {size} bytes does not fit the CDF-1 size field")
            }
            Error::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {expected}, got {found}")
            }
            Error::UnknownVariable(v) => write!(f, "Unknown variable: {v}"),
            Error::NotRecordVariable(v) => write!(f, "Variable {v:?} is not a record variable"),
            Error::RecordCountDecrease { current, requested } => write!(
                f,
                "Record count can only grow: current {current}, requested {requested}"
            ),
            Error::TooShortBuffer {
                actual,
                expected,
                file,
                line,
            } => write!(
                f,
                "Buffer too small at {file}:{line}: need at least {expected} bytes, got {actual}"
            ),
            Error::InvalidMagic(found) => {
                write!(f, r#"Invalid magic: expected "CDF\x01", found {found}"#)
            }
            Error::UnexpectedTag { actual, expected } => {
                write!(f, "Unexpected header tag: expected {expected}, got {actual}")
            }
            Error::InvalidState(s) => write!(f, "Invalid writer state: {s}"),
            Error::SerializationError(s) => write!(f, "Serialization error: {s}"),
            #[cfg(feature = "std")]
            Error::IOError(e) => write!(f, "I/O error: {e}"),
            #[cfg(not(feature = "std"))]
            Error::WriteError => write!(f, "Write error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IOError(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IOError(err)
    }
}

/// A specialized Result type for CDF-1 operations.
///
/// This is defined as `core::result::Result<T, Error>` for convenience.
pub type Result<T> = core::result::Result<T, Error>;
