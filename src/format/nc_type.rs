// format/nc_type.rs
//! The closed set of classic scalar types and their big-endian codecs.

use crate::{Error, Result};
use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use super::validate_buffer_size;

/// One of the six scalar types a CDF-1 file can store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NcType {
    /// 8-bit signed integer
    Byte,
    /// 8-bit character (text is stored as UTF-8 bytes)
    Char,
    /// 16-bit signed integer
    Short,
    /// 32-bit signed integer
    Int,
    /// 32-bit IEEE float
    Float,
    /// 64-bit IEEE float
    Double,
}

impl NcType {
    /// All classic types in tag order.
    pub const ALL: [NcType; 6] = [
        NcType::Byte,
        NcType::Char,
        NcType::Short,
        NcType::Int,
        NcType::Float,
        NcType::Double,
    ];

    /// The 4-byte tag written in the header for this type.
    pub const fn tag(self) -> u32 {
        match self {
            NcType::Byte => 1,
            NcType::Char => 2,
            NcType::Short => 3,
            NcType::Int => 4,
            NcType::Float => 5,
            NcType::Double => 6,
        }
    }

    /// Convert a header tag back to a type.
    pub fn from_tag(tag: u32) -> Result<Self> {
        match tag {
            1 => Ok(NcType::Byte),
            2 => Ok(NcType::Char),
            3 => Ok(NcType::Short),
            4 => Ok(NcType::Int),
            5 => Ok(NcType::Float),
            6 => Ok(NcType::Double),
            _ => Err(Error::UnsupportedType(format!("type tag {tag}"))),
        }
    }

    /// Convert a one-letter type code (`b c h i f d`) to a type.
    pub fn from_typecode(code: char) -> Result<Self> {
        match code {
            'b' => Ok(NcType::Byte),
            'c' => Ok(NcType::Char),
            'h' => Ok(NcType::Short),
            'i' => Ok(NcType::Int),
            'f' => Ok(NcType::Float),
            'd' => Ok(NcType::Double),
            _ => Err(Error::UnsupportedType(format!("type code {code:?}"))),
        }
    }

    /// Size of one element in bytes.
    pub const fn item_size(self) -> usize {
        match self {
            NcType::Byte | NcType::Char => 1,
            NcType::Short => 2,
            NcType::Int | NcType::Float => 4,
            NcType::Double => 8,
        }
    }

    /// Natural alignment of one element, equal to its size. Data regions as a
    /// whole are aligned to [`ALIGNMENT`](super::ALIGNMENT).
    pub const fn alignment(self) -> usize {
        self.item_size()
    }

    /// Append the big-endian encoding of `value` to `out`.
    ///
    /// Fails with [`Error::TypeMismatch`] if `value` is not of this type.
    pub fn encode(self, value: &Value, out: &mut Vec<u8>) -> Result<()> {
        if value.nc_type() != self {
            return Err(Error::TypeMismatch {
                expected: self,
                found: value.nc_type(),
            });
        }
        let start = out.len();
        out.resize(start + self.item_size(), 0);
        value.write_be(&mut out[start..]);
        Ok(())
    }

    /// Decode one big-endian element from the front of `bytes`.
    pub fn decode(self, bytes: &[u8]) -> Result<Value> {
        validate_buffer_size(bytes, self.item_size())?;
        let value = match self {
            NcType::Byte => Value::Byte(i8::from_be_bytes([bytes[0]])),
            NcType::Char => Value::Char(bytes[0]),
            NcType::Short => Value::Short(i16::from_be_bytes([bytes[0], bytes[1]])),
            NcType::Int => Value::Int(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
            NcType::Float => {
                Value::Float(f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
            NcType::Double => Value::Double(f64::from_be_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ])),
        };
        Ok(value)
    }
}

impl core::fmt::Display for NcType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NcType::Byte => write!(f, "byte"),
            NcType::Char => write!(f, "char"),
            NcType::Short => write!(f, "short"),
            NcType::Int => write!(f, "int"),
            NcType::Float => write!(f, "float"),
            NcType::Double => write!(f, "double"),
        }
    }
}

/// A single scalar of one of the classic types.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Byte(i8),
    Char(u8),
    Short(i16),
    Int(i32),
    Float(f32),
    Double(f64),
}

impl Value {
    /// The type this value belongs to.
    pub fn nc_type(&self) -> NcType {
        match self {
            Value::Byte(_) => NcType::Byte,
            Value::Char(_) => NcType::Char,
            Value::Short(_) => NcType::Short,
            Value::Int(_) => NcType::Int,
            Value::Float(_) => NcType::Float,
            Value::Double(_) => NcType::Double,
        }
    }

    fn write_be(&self, out: &mut [u8]) {
        match self {
            Value::Byte(v) => out[..1].copy_from_slice(&v.to_be_bytes()),
            Value::Char(v) => out[0] = *v,
            Value::Short(v) => out[..2].copy_from_slice(&v.to_be_bytes()),
            Value::Int(v) => out[..4].copy_from_slice(&v.to_be_bytes()),
            Value::Float(v) => out[..4].copy_from_slice(&v.to_be_bytes()),
            Value::Double(v) => out[..8].copy_from_slice(&v.to_be_bytes()),
        }
    }
}

/// A homogeneous sequence of scalars, used for attribute values and variable data.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Byte(Vec<i8>),
    Char(Vec<u8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

macro_rules! encode_be {
    ($vals:expr, $out:expr, $size:expr) => {
        for (v, chunk) in $vals.iter().zip($out.chunks_exact_mut($size)) {
            chunk.copy_from_slice(&v.to_be_bytes());
        }
    };
}

macro_rules! decode_be {
    ($bytes:expr, $t:ty, $size:literal) => {
        $bytes
            .chunks_exact($size)
            .map(|c| {
                let mut raw = [0u8; $size];
                raw.copy_from_slice(c);
                <$t>::from_be_bytes(raw)
            })
            .collect()
    };
}

impl Values {
    /// `n` zero elements of type `ty`.
    pub fn zeros(ty: NcType, n: usize) -> Self {
        match ty {
            NcType::Byte => Values::Byte(vec![0; n]),
            NcType::Char => Values::Char(vec![0; n]),
            NcType::Short => Values::Short(vec![0; n]),
            NcType::Int => Values::Int(vec![0; n]),
            NcType::Float => Values::Float(vec![0.0; n]),
            NcType::Double => Values::Double(vec![0.0; n]),
        }
    }

    /// The element type of this sequence.
    pub fn nc_type(&self) -> NcType {
        match self {
            Values::Byte(_) => NcType::Byte,
            Values::Char(_) => NcType::Char,
            Values::Short(_) => NcType::Short,
            Values::Int(_) => NcType::Int,
            Values::Float(_) => NcType::Float,
            Values::Double(_) => NcType::Double,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Values::Byte(v) => v.len(),
            Values::Char(v) => v.len(),
            Values::Short(v) => v.len(),
            Values::Int(v) => v.len(),
            Values::Float(v) => v.len(),
            Values::Double(v) => v.len(),
        }
    }

    /// Returns true if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encoded size in bytes, without padding.
    pub fn byte_len(&self) -> usize {
        self.len() * self.nc_type().item_size()
    }

    /// Element `index`, if present.
    pub fn get(&self, index: usize) -> Option<Value> {
        match self {
            Values::Byte(v) => v.get(index).copied().map(Value::Byte),
            Values::Char(v) => v.get(index).copied().map(Value::Char),
            Values::Short(v) => v.get(index).copied().map(Value::Short),
            Values::Int(v) => v.get(index).copied().map(Value::Int),
            Values::Float(v) => v.get(index).copied().map(Value::Float),
            Values::Double(v) => v.get(index).copied().map(Value::Double),
        }
    }

    /// Write the big-endian encoding into the front of `out`.
    ///
    /// # Panics
    /// Panics if `out` is shorter than [`byte_len`](Self::byte_len).
    pub fn encode_into(&self, out: &mut [u8]) {
        let out = &mut out[..self.byte_len()];
        match self {
            Values::Byte(v) => encode_be!(v, out, 1),
            Values::Char(v) => out.copy_from_slice(v),
            Values::Short(v) => encode_be!(v, out, 2),
            Values::Int(v) => encode_be!(v, out, 4),
            Values::Float(v) => encode_be!(v, out, 4),
            Values::Double(v) => encode_be!(v, out, 8),
        }
    }

    /// Append the big-endian encoding to `out`.
    pub fn encode_to_vec(&self, out: &mut Vec<u8>) {
        let start = out.len();
        out.resize(start + self.byte_len(), 0);
        self.encode_into(&mut out[start..]);
    }

    /// Decode every whole element in `bytes` as type `ty`.
    pub fn decode(ty: NcType, bytes: &[u8]) -> Self {
        match ty {
            NcType::Byte => Values::Byte(decode_be!(bytes, i8, 1)),
            NcType::Char => Values::Char(bytes.to_vec()),
            NcType::Short => Values::Short(decode_be!(bytes, i16, 2)),
            NcType::Int => Values::Int(decode_be!(bytes, i32, 4)),
            NcType::Float => Values::Float(decode_be!(bytes, f32, 4)),
            NcType::Double => Values::Double(decode_be!(bytes, f64, 8)),
        }
    }
}

impl From<Vec<i8>> for Values {
    fn from(v: Vec<i8>) -> Self {
        Values::Byte(v)
    }
}

impl From<Vec<u8>> for Values {
    fn from(v: Vec<u8>) -> Self {
        Values::Char(v)
    }
}

impl From<Vec<i16>> for Values {
    fn from(v: Vec<i16>) -> Self {
        Values::Short(v)
    }
}

impl From<Vec<i32>> for Values {
    fn from(v: Vec<i32>) -> Self {
        Values::Int(v)
    }
}

impl From<Vec<f32>> for Values {
    fn from(v: Vec<f32>) -> Self {
        Values::Float(v)
    }
}

impl From<Vec<f64>> for Values {
    fn from(v: Vec<f64>) -> Self {
        Values::Double(v)
    }
}

impl From<&str> for Values {
    fn from(s: &str) -> Self {
        Values::Char(s.as_bytes().to_vec())
    }
}

impl From<Value> for Values {
    fn from(v: Value) -> Self {
        match v {
            Value::Byte(x) => Values::Byte(vec![x]),
            Value::Char(x) => Values::Char(vec![x]),
            Value::Short(x) => Values::Short(vec![x]),
            Value::Int(x) => Values::Int(vec![x]),
            Value::Float(x) => Values::Float(vec![x]),
            Value::Double(x) => Values::Double(vec![x]),
        }
    }
}
