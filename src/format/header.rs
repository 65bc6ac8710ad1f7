// format/header.rs
//! The CDF-1 header: sizing, serialization and decoding.
//!
//! ```text
//! header    := magic numrecs dim_list gatt_list var_list
//! magic     := 'C' 'D' 'F' 0x01
//! dim_list  := ABSENT | NC_DIMENSION nelems [name dim_length ...]
//! gatt_list := ABSENT | NC_ATTRIBUTE nelems [name nc_type nelems values ...]
//! var_list  := ABSENT | NC_VARIABLE nelems [name nelems [dimid ...] vatt_list nc_type vsize begin ...]
//! name      := nelems bytes padding
//! ```
//!
//! Every integer is a big-endian 4-byte value. Names and attribute values are
//! zero-padded to a 4-byte boundary. The size of a header depends only on the
//! schema, never on offsets, so it can be computed before the layout.

use alloc::string::String;
use alloc::vec::Vec;

use super::{
    ABSENT, MAGIC, MAX_OFFSET, NC_ATTRIBUTE, NC_DIMENSION, NC_VARIABLE, NcType, STREAMING, Values,
    checked_u32, padding_to_align_4, read_u32, validate_buffer_size,
};
use crate::{
    Error, Result,
    attribute::{Attribute, AttributeList},
    dimension::{Dimension, DimensionTable},
    layout::Layout,
    variable::VariableRegistry,
};

/// Value of the header's record-count field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumRecs {
    /// A committed record count.
    Count(usize),
    /// The count is not known yet; readers derive it from the file size.
    Streaming,
}

impl NumRecs {
    fn to_field(self) -> Result<u32> {
        match self {
            NumRecs::Count(n) => {
                let field = checked_u32(n as u64, "record count")?;
                if field == STREAMING {
                    return Err(Error::Overflow(String::from("record count")));
                }
                Ok(field)
            }
            NumRecs::Streaming => Ok(STREAMING),
        }
    }

    fn from_field(field: u32) -> Self {
        if field == STREAMING {
            NumRecs::Streaming
        } else {
            NumRecs::Count(field as usize)
        }
    }
}

// ============================================================================
// Sizing
// ============================================================================

#[inline]
fn name_len(name: &str) -> u64 {
    (4 + name.len() + padding_to_align_4(name.len())) as u64
}

#[inline]
fn values_len(values: &Values) -> u64 {
    let n = values.byte_len();
    (8 + n + padding_to_align_4(n)) as u64
}

fn att_list_len(attrs: &AttributeList) -> u64 {
    8 + attrs
        .iter()
        .map(|a| name_len(&a.name) + values_len(&a.values))
        .sum::<u64>()
}

/// Encoded size of the header for this schema.
///
/// Fails with [`Error::HeaderTooLarge`] if it exceeds the format's range.
pub(crate) fn encoded_header_size(
    dims: &DimensionTable,
    gatts: &AttributeList,
    vars: &VariableRegistry,
) -> Result<u64> {
    let mut size = (MAGIC.len() + 4) as u64;

    size += 8 + dims.list().iter().map(|d| name_len(&d.name) + 4).sum::<u64>();
    size += att_list_len(gatts);
    size += 8 + vars
        .iter()
        .map(|(_, v)| {
            name_len(v.name()) + 4 + 4 * v.dims().len() as u64 + att_list_len(v.attributes()) + 12
        })
        .sum::<u64>();

    check_header_size(size)
}

/// The header must end within the 32-bit offset range its `begin` fields use.
fn check_header_size(size: u64) -> Result<u64> {
    if size > MAX_OFFSET {
        return Err(Error::HeaderTooLarge { size });
    }
    Ok(size)
}

// ============================================================================
// Serialization
// ============================================================================

#[inline]
fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_count(out: &mut Vec<u8>, count: usize) -> Result<()> {
    put_u32(out, checked_u32(count as u64, "element count")?);
    Ok(())
}

fn put_name(out: &mut Vec<u8>, name: &str) -> Result<()> {
    put_count(out, name.len())?;
    out.extend_from_slice(name.as_bytes());
    out.resize(out.len() + padding_to_align_4(name.len()), 0);
    Ok(())
}

fn put_att_list(out: &mut Vec<u8>, attrs: &AttributeList) -> Result<()> {
    if attrs.is_empty() {
        out.extend_from_slice(&ABSENT);
        return Ok(());
    }
    put_u32(out, NC_ATTRIBUTE);
    put_count(out, attrs.len())?;
    for attr in attrs {
        put_name(out, &attr.name)?;
        put_u32(out, attr.nc_type().tag());
        put_count(out, attr.values.len())?;
        attr.values.encode_to_vec(out);
        out.resize(out.len() + padding_to_align_4(attr.values.byte_len()), 0);
    }
    Ok(())
}

/// Append the complete header to `out`.
///
/// Variables are written in the layout's serialization order, each with the
/// `vsize` and `begin` the layout assigned to it.
pub(crate) fn write_header(
    out: &mut Vec<u8>,
    numrecs: NumRecs,
    dims: &DimensionTable,
    gatts: &AttributeList,
    vars: &VariableRegistry,
    layout: &Layout,
) -> Result<()> {
    out.extend_from_slice(&MAGIC);
    put_u32(out, numrecs.to_field()?);

    if dims.is_empty() {
        out.extend_from_slice(&ABSENT);
    } else {
        put_u32(out, NC_DIMENSION);
        put_count(out, dims.len())?;
        for dim in dims.list() {
            put_name(out, &dim.name)?;
            put_count(out, dim.size)?;
        }
    }

    put_att_list(out, gatts)?;

    if vars.is_empty() {
        out.extend_from_slice(&ABSENT);
        return Ok(());
    }
    put_u32(out, NC_VARIABLE);
    put_count(out, vars.len())?;
    for placement in layout.serialization_order() {
        let var = vars.resolve(placement.var)?;
        put_name(out, var.name())?;
        put_count(out, var.dims().len())?;
        for dim in var.dims() {
            put_count(out, dim.index())?;
        }
        put_att_list(out, var.attributes())?;
        put_u32(out, var.nc_type().tag());
        put_u32(out, checked_u32(placement.header_vsize(), "vsize")?);
        put_u32(out, checked_u32(placement.begin, "begin")?);
    }
    Ok(())
}

// ============================================================================
// Decoding
// ============================================================================

/// One variable entry of a decoded header.
#[derive(Debug, Clone, PartialEq)]
pub struct VarInfo {
    pub name: String,
    /// Positions in the dimension list
    pub dim_ids: Vec<usize>,
    pub attributes: AttributeList,
    pub nc_type: NcType,
    pub vsize: u32,
    pub begin: u64,
}

/// A decoded CDF-1 header.
///
/// # Example
///
/// ```
/// use cdf1_rs::{AttributeList, Dataset, HeaderInfo, NcType, NumRecs};
///
/// # fn main() -> cdf1_rs::Result<()> {
/// let mut ds = Dataset::new();
/// ds.add_dimension("x", 3)?;
/// ds.declare_variable("v", &["x"], NcType::Int, AttributeList::new())?;
///
/// let info = HeaderInfo::parse(&ds.header_bytes(NumRecs::Count(0))?)?;
/// assert_eq!(info.dimensions[0].name, "x");
/// assert_eq!(info.variables[0].vsize, 12);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderInfo {
    pub numrecs: NumRecs,
    pub dimensions: Vec<Dimension>,
    pub attributes: AttributeList,
    pub variables: Vec<VarInfo>,
    /// Bytes consumed by the header
    pub header_size: u64,
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.saturating_add(n);
        validate_buffer_size(self.bytes, end)?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32> {
        let raw = self.take(4)?;
        Ok(read_u32(raw, 0))
    }

    fn count(&mut self) -> Result<usize> {
        Ok(self.u32()? as usize)
    }

    fn padded(&mut self, n: usize) -> Result<&'a [u8]> {
        let data = self.take(n)?;
        self.take(padding_to_align_4(n))?;
        Ok(data)
    }

    fn name(&mut self) -> Result<String> {
        let n = self.count()?;
        let raw = self.padded(n)?;
        Ok(String::from_utf8_lossy(raw).into_owned())
    }

    /// Read a list header, returning the element count (zero for ABSENT).
    fn list(&mut self, expected: u32) -> Result<usize> {
        let tag = self.u32()?;
        let count = self.count()?;
        match tag {
            0 => Ok(0),
            t if t == expected => Ok(count),
            actual => Err(Error::UnexpectedTag { actual, expected }),
        }
    }

    fn att_list(&mut self) -> Result<AttributeList> {
        let count = self.list(NC_ATTRIBUTE)?;
        let mut attrs = AttributeList::new();
        for _ in 0..count {
            let name = self.name()?;
            let nc_type = NcType::from_tag(self.u32()?)?;
            let nelems = self.count()?;
            let len = nelems.saturating_mul(nc_type.item_size());
            let raw = self.padded(len)?;
            attrs.set(Attribute::new(&name, Values::decode(nc_type, raw)));
        }
        Ok(attrs)
    }
}

impl HeaderInfo {
    /// Decode the header at the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut cur = Cursor { bytes, pos: 0 };

        let magic = cur.take(4)?;
        if magic != MAGIC {
            return Err(Error::InvalidMagic(String::from_utf8_lossy(magic).into_owned()));
        }
        let numrecs = NumRecs::from_field(cur.u32()?);

        let mut dimensions = Vec::new();
        for _ in 0..cur.list(NC_DIMENSION)? {
            let name = cur.name()?;
            let size = cur.count()?;
            dimensions.push(Dimension { name, size });
        }

        let attributes = cur.att_list()?;

        let mut variables = Vec::new();
        for _ in 0..cur.list(NC_VARIABLE)? {
            let name = cur.name()?;
            let ndims = cur.count()?;
            let mut dim_ids = Vec::new();
            for _ in 0..ndims {
                dim_ids.push(cur.count()?);
            }
            let attributes = cur.att_list()?;
            let nc_type = NcType::from_tag(cur.u32()?)?;
            let vsize = cur.u32()?;
            let begin = u64::from(cur.u32()?);
            variables.push(VarInfo {
                name,
                dim_ids,
                attributes,
                nc_type,
                vsize,
                begin,
            });
        }

        Ok(Self {
            numrecs,
            dimensions,
            attributes,
            variables,
            header_size: cur.pos as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AttributeList, Dataset};
    use alloc::vec;

    #[test]
    fn test_header_size_limit() {
        assert_eq!(check_header_size(MAX_OFFSET).unwrap(), MAX_OFFSET);
        match check_header_size(MAX_OFFSET + 4) {
            Err(Error::HeaderTooLarge { size }) => assert_eq!(size, MAX_OFFSET + 4),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_empty_header_bytes() {
        let ds = Dataset::new();
        let bytes = ds.header_bytes(NumRecs::Count(0)).unwrap();
        let mut expected = b"CDF\x01".to_vec();
        expected.extend_from_slice(&[0; 4]);
        expected.extend_from_slice(&[0; 24]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_dimension_and_attribute_encoding() {
        let mut ds = Dataset::new();
        ds.add_dimension("time", 0).unwrap();
        ds.add_dimension("x", 5).unwrap();
        ds.set_attribute(Attribute::text("title", "hi")).unwrap();
        let bytes = ds.header_bytes(NumRecs::Count(2)).unwrap();

        let mut expected = b"CDF\x01".to_vec();
        expected.extend_from_slice(&2u32.to_be_bytes());
        // dim_list
        expected.extend_from_slice(&NC_DIMENSION.to_be_bytes());
        expected.extend_from_slice(&2u32.to_be_bytes());
        expected.extend_from_slice(&4u32.to_be_bytes());
        expected.extend_from_slice(b"time");
        expected.extend_from_slice(&0u32.to_be_bytes());
        expected.extend_from_slice(&1u32.to_be_bytes());
        expected.extend_from_slice(b"x\0\0\0");
        expected.extend_from_slice(&5u32.to_be_bytes());
        // gatt_list
        expected.extend_from_slice(&NC_ATTRIBUTE.to_be_bytes());
        expected.extend_from_slice(&1u32.to_be_bytes());
        expected.extend_from_slice(&5u32.to_be_bytes());
        expected.extend_from_slice(b"title\0\0\0");
        expected.extend_from_slice(&NcType::Char.tag().to_be_bytes());
        expected.extend_from_slice(&2u32.to_be_bytes());
        expected.extend_from_slice(b"hi\0\0");
        // var_list
        expected.extend_from_slice(&ABSENT);

        assert_eq!(bytes, expected);
        assert_eq!(bytes.len() as u64, ds.header_size().unwrap());
    }

    #[test]
    fn test_variable_entry_uses_layout() {
        let mut ds = Dataset::new();
        ds.add_dimension("n", 3).unwrap();
        ds.declare_variable("small", &["n"], NcType::Byte, AttributeList::new())
            .unwrap();
        ds.declare_variable("big", &["n"], NcType::Double, AttributeList::new())
            .unwrap();

        let bytes = ds.header_bytes(NumRecs::Count(0)).unwrap();
        let info = HeaderInfo::parse(&bytes).unwrap();
        let names: Vec<&str> = info.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["big", "small"]);
        assert_eq!(info.variables[0].begin, bytes.len() as u64);
        assert_eq!(info.variables[0].vsize, 24);
        assert_eq!(info.variables[1].begin, bytes.len() as u64 + 24);
        assert_eq!(info.variables[1].vsize, 4);
        assert_eq!(info.variables[1].dim_ids, vec![0]);
    }

    #[test]
    fn test_streaming_sentinel() {
        let ds = Dataset::new();
        let bytes = ds.header_bytes(NumRecs::Streaming).unwrap();
        assert_eq!(&bytes[4..8], &[0xFF; 4]);
        assert_eq!(HeaderInfo::parse(&bytes).unwrap().numrecs, NumRecs::Streaming);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            HeaderInfo::parse(b"CDF\x02\0\0\0\0"),
            Err(Error::InvalidMagic(_))
        ));
        assert!(matches!(
            HeaderInfo::parse(b"CDF\x01"),
            Err(Error::TooShortBuffer { .. })
        ));

        let mut bytes = b"CDF\x01".to_vec();
        bytes.extend_from_slice(&[0; 4]);
        bytes.extend_from_slice(&NC_VARIABLE.to_be_bytes());
        bytes.extend_from_slice(&[0; 4]);
        assert!(matches!(
            HeaderInfo::parse(&bytes),
            Err(Error::UnexpectedTag {
                actual: NC_VARIABLE,
                expected: NC_DIMENSION
            })
        ));
    }
}
