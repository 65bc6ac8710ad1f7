//! The layout engine: where every variable's bytes land in a CDF-1 file.
//!
//! Layout is a pure function of the schema. It never touches data buffers,
//! so it can be computed at any time ("virtual mode") to learn the header
//! size, every variable's `begin` offset and the file size for a given
//! record count.
//!
//! # Algorithm
//!
//! 1. Partition variables into nonrecord and record variables, keeping
//!    declaration order inside each group.
//! 2. Order nonrecord variables by descending size; ties keep declaration order.
//! 3. Lay nonrecord variables out back to back after the header, each padded
//!    to 4 bytes. The last one is left unpadded when the file has no record
//!    variables.
//! 4. Lay record variables out as one record slice each, padded to 4 bytes
//!    unless there is exactly one record variable. The record stride is the
//!    sum of the padded slices.
//! 5. `total_size(R) = header + nonrecord section + R * stride`.
//!
//! ```text
//! +--------+----------------------+---------------------------+-----
//! | header | nonrecord variables  | record 0: rv0 rv1 ... rvN | record 1 ...
//! +--------+----------------------+---------------------------+-----
//! ```

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::{
    Error, Result,
    dimension::DimensionTable,
    format::{MAX_OFFSET, NcType, padded_len},
    variable::{VarId, VariableRegistry},
};

/// Placement of one variable.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarLayout {
    /// Handle of the variable in declaration order
    pub var: VarId,
    /// Variable name
    pub name: String,
    /// Element type
    pub nc_type: NcType,
    /// Whether the variable lives in the record section
    pub is_record: bool,
    /// Elements in the whole variable (nonrecord) or one record slice (record)
    pub elements: u64,
    /// Natural size in bytes of the variable or of one record slice
    pub vsize: u64,
    /// Bytes the variable (or one record slice) occupies in the file
    pub padded_size: u64,
    /// Byte offset from the start of the file; for record variables the
    /// offset of record 0
    pub begin: u64,
}

impl VarLayout {
    /// The value written to the header's `vsize` field.
    ///
    /// Nonrecord sizes are always rounded up to 4 in the header, even for the
    /// last variable whose bytes are not padded in the file.
    pub fn header_vsize(&self) -> u64 {
        if self.is_record {
            self.padded_size
        } else {
            (self.vsize + 3) & !3
        }
    }

    /// Number of pad bytes following the variable's data.
    pub fn padding(&self) -> u64 {
        self.padded_size - self.vsize
    }
}

/// The computed layout of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Layout {
    /// Size of the encoded header; the data section starts here
    pub header_size: u64,
    /// Offset at which the record section starts
    pub nonrecord_end: u64,
    /// Bytes spanned by one record across all record variables
    pub record_stride: u64,
    /// Placement per variable, indexed by declaration order
    variables: Vec<VarLayout>,
    /// Serialization order: sorted nonrecord variables, then record variables
    order: Vec<VarId>,
    record_vars: usize,
}

impl Layout {
    /// Lay out every variable of `vars` after a header of `header_size` bytes.
    pub fn compute(
        header_size: u64,
        dims: &DimensionTable,
        vars: &VariableRegistry,
    ) -> Result<Self> {
        let mut variables = Vec::with_capacity(vars.len());
        for (id, var) in vars.iter() {
            let elements = var.slice_elements(dims)?;
            let vsize = elements
                .checked_mul(var.nc_type().item_size() as u64)
                .filter(|&v| v <= MAX_OFFSET)
                .ok_or_else(|| Error::Overflow(format!("size of variable {:?}", var.name())))?;
            variables.push(VarLayout {
                var: id,
                name: String::from(var.name()),
                nc_type: var.nc_type(),
                is_record: var.is_record(),
                elements,
                vsize,
                padded_size: vsize,
                begin: 0,
            });
        }

        // Steps 1 and 2. The sort is stable, so equal sizes keep declaration order.
        let mut nonrecord: Vec<VarId> = variables
            .iter()
            .filter(|v| !v.is_record)
            .map(|v| v.var)
            .collect();
        nonrecord.sort_by(|a, b| variables[b.0].vsize.cmp(&variables[a.0].vsize));
        let record: Vec<VarId> = variables
            .iter()
            .filter(|v| v.is_record)
            .map(|v| v.var)
            .collect();

        // Step 3
        let mut offset = header_size;
        let last_nonrecord = nonrecord.last().copied();
        for &id in &nonrecord {
            let v = &mut variables[id.0];
            v.padded_size = if record.is_empty() && Some(id) == last_nonrecord {
                v.vsize
            } else {
                pad4(v.vsize)?
            };
            v.begin = offset;
            offset = checked_end(offset, v.padded_size, &v.name)?;
        }
        let nonrecord_end = offset;

        // Step 4
        let mut stride = 0u64;
        for &id in &record {
            let v = &mut variables[id.0];
            if record.len() > 1 {
                v.padded_size = pad4(v.vsize)?;
            }
            v.begin = checked_end(nonrecord_end, stride, &v.name)?;
            stride = stride
                .checked_add(v.padded_size)
                .filter(|&s| s <= MAX_OFFSET)
                .ok_or_else(|| Error::Overflow(String::from("record size")))?;
        }

        let mut order = nonrecord;
        order.extend_from_slice(&record);

        tracing::debug!(
            header_size,
            nonrecord_end,
            record_stride = stride,
            variables = order.len(),
            record_variables = record.len(),
            "computed layout"
        );

        Ok(Self {
            header_size,
            nonrecord_end,
            record_stride: stride,
            variables,
            order,
            record_vars: record.len(),
        })
    }

    /// Placement of one variable.
    pub fn get(&self, var: VarId) -> Option<&VarLayout> {
        self.variables.get(var.0)
    }

    /// Placements in declaration order.
    pub fn variables(&self) -> &[VarLayout] {
        &self.variables
    }

    /// Placements in the order they are written to the header and data section.
    pub fn serialization_order(&self) -> impl Iterator<Item = &VarLayout> {
        self.order.iter().map(|id| &self.variables[id.0])
    }

    /// Record variables in the order their slices are interleaved in each record.
    pub fn record_variables(&self) -> impl Iterator<Item = &VarLayout> {
        self.serialization_order().filter(|v| v.is_record)
    }

    /// Returns true if the file has a record section.
    pub fn has_records(&self) -> bool {
        self.record_vars > 0
    }

    /// Record count written to the header of a file holding `numrecs`
    /// records. A file without a record section always carries zero.
    pub fn file_numrecs(&self, numrecs: usize) -> usize {
        if self.has_records() { numrecs } else { 0 }
    }

    /// Size of the complete file holding `numrecs` records.
    ///
    /// Without record variables the size does not depend on `numrecs`.
    pub fn total_size(&self, numrecs: usize) -> Result<u64> {
        if !self.has_records() {
            return Ok(self.nonrecord_end);
        }
        (numrecs as u64)
            .checked_mul(self.record_stride)
            .and_then(|r| r.checked_add(self.nonrecord_end))
            .filter(|&t| t <= MAX_OFFSET)
            .ok_or_else(|| Error::Overflow(format!("file size with {numrecs} records")))
    }

    /// Largest record count whose file still fits the format, or `None`
    /// when the file has no record section or its records are empty.
    pub fn max_records(&self) -> Option<u64> {
        if !self.has_records() || self.record_stride == 0 {
            return None;
        }
        Some((MAX_OFFSET - self.nonrecord_end) / self.record_stride)
    }

    /// File offset of record `record` of record variable `var`.
    pub fn record_offset(&self, var: VarId, record: usize) -> Result<u64> {
        let v = self
            .get(var)
            .ok_or_else(|| Error::UnknownVariable(format!("#{}", var.0)))?;
        if !v.is_record {
            return Err(Error::NotRecordVariable(v.name.clone()));
        }
        (record as u64)
            .checked_mul(self.record_stride)
            .and_then(|r| r.checked_add(v.begin))
            .filter(|&o| o <= MAX_OFFSET)
            .ok_or_else(|| Error::Overflow(format!("offset of record {record}")))
    }

    /// Serialize the layout to pretty-printed JSON.
    ///
    /// Requires the `serde` and `serde_json` features.
    #[cfg(all(feature = "serde", feature = "serde_json"))]
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::SerializationError(format!("JSON serialization failed: {e}")))
    }

    /// Save the layout as JSON, e.g. for tools that pre-allocate or map the file.
    ///
    /// Requires the `std`, `serde` and `serde_json` features.
    #[cfg(all(feature = "std", feature = "serde", feature = "serde_json"))]
    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(Error::IOError)?;
        Ok(())
    }
}

#[inline]
fn pad4(size: u64) -> Result<u64> {
    padded_len(size)
        .filter(|&p| p <= MAX_OFFSET)
        .ok_or_else(|| Error::Overflow(format!("padded size {size}")))
}

#[inline]
fn checked_end(offset: u64, len: u64, name: &str) -> Result<u64> {
    offset
        .checked_add(len)
        .filter(|&end| end <= MAX_OFFSET)
        .ok_or_else(|| Error::Overflow(format!("offset of variable {name:?}")))
}
