// format/common.rs
//! Byte and alignment helpers shared by the header codec and the layout engine.

use super::ALIGNMENT;
use crate::{Error, Result};
use alloc::format;

// ============================================================================
// Byte Parsing Helpers
// ============================================================================

/// Read a u32 from a byte slice at the given offset (big-endian).
///
/// # Panics
/// Panics if `offset + 4 > bytes.len()`. Call [`validate_buffer_size`] first.
#[inline]
pub fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

// ============================================================================
// Validation Helpers
// ============================================================================

/// Validate that a buffer has at least `expected` bytes.
///
/// Returns `Err(TooShortBuffer)` if the buffer is too small.
#[inline]
pub(crate) fn validate_buffer_size(bytes: &[u8], expected: usize) -> Result<()> {
    if bytes.len() < expected {
        return Err(Error::TooShortBuffer {
            actual: bytes.len(),
            expected,
            file: file!(),
            line: line!(),
        });
    }
    Ok(())
}

/// Narrow a size or offset to the 32-bit field the header stores it in.
#[inline]
pub(crate) fn checked_u32(value: u64, context: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::Overflow(format!("{context} value {value}")))
}

// ============================================================================
// Alignment Helpers
// ============================================================================

/// Calculate padding needed to reach 4-byte alignment.
#[inline]
pub const fn padding_to_align_4(size: usize) -> usize {
    (4 - (size % 4)) % 4
}

/// Round `size` up to the next multiple of [`ALIGNMENT`].
///
/// Returns `None` when the rounded value does not fit in a `u64`.
#[inline]
pub const fn padded_len(size: u64) -> Option<u64> {
    match size.checked_add(ALIGNMENT - 1) {
        Some(v) => Some(v & !(ALIGNMENT - 1)),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_to_align_4() {
        assert_eq!(padding_to_align_4(0), 0);
        assert_eq!(padding_to_align_4(1), 3);
        assert_eq!(padding_to_align_4(4), 0);
        assert_eq!(padding_to_align_4(7), 1);
    }

    #[test]
    fn test_padded_len() {
        assert_eq!(padded_len(0), Some(0));
        assert_eq!(padded_len(5), Some(8));
        assert_eq!(padded_len(12), Some(12));
        assert_eq!(padded_len(u64::MAX), None);
    }

    #[test]
    fn test_read_u32_is_big_endian() {
        assert_eq!(read_u32(&[0, 0, 1, 2], 0), 0x0102);
    }

    #[test]
    fn test_checked_u32() {
        assert_eq!(checked_u32(7, "vsize").unwrap(), 7);
        assert!(matches!(
            checked_u32(u64::from(u32::MAX) + 1, "vsize"),
            Err(Error::Overflow(_))
        ));
    }
}
