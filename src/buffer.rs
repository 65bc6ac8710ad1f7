//! Just-in-time data buffers.
//!
//! Declaring a variable allocates nothing. A variable's buffer is created,
//! zero-filled, the first time data is written to it (or it is explicitly
//! materialized), sized from the layout: the padded size for a nonrecord
//! variable, and one padded record slice per record for a record variable.
//! Variables never written are emitted as zeros by the writer.

use alloc::vec::Vec;

use crate::{
    Dataset, Error, Result,
    format::Values,
    variable::VarId,
};

/// Storage for one variable's data, in file byte order.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DataBuffer {
    /// Nothing written yet; the data is implicitly all zeros.
    #[default]
    Unallocated,
    /// Big-endian bytes laid out exactly as in the file's data section.
    Allocated(Vec<u8>),
}

impl DataBuffer {
    pub fn is_allocated(&self) -> bool {
        matches!(self, DataBuffer::Allocated(_))
    }

    /// Bytes currently held by this buffer.
    pub fn allocated_len(&self) -> usize {
        match self {
            DataBuffer::Allocated(buf) => buf.len(),
            DataBuffer::Unallocated => 0,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            DataBuffer::Allocated(buf) => Some(buf),
            DataBuffer::Unallocated => None,
        }
    }

    /// Allocate `len` zeroed bytes if unset, or grow to `len`; never shrinks.
    fn ensure(&mut self, len: usize) -> &mut Vec<u8> {
        if let DataBuffer::Unallocated = self {
            *self = DataBuffer::Allocated(Vec::new());
        }
        let DataBuffer::Allocated(buf) = self else {
            unreachable!("buffer was allocated above");
        };
        if buf.len() < len {
            buf.resize(len, 0);
        }
        buf
    }
}

/// A validated write.
struct WritePlan {
    /// Padded size of one slice (record variables) or of the whole variable
    slot: usize,
    /// Byte offset of the write within the buffer
    offset: usize,
    is_record: bool,
    /// Record count the write grows the dataset to
    grow_to: Option<usize>,
}

impl Dataset {
    /// Write `values` into a variable, freezing the schema on first use.
    ///
    /// For a record variable `index` is the record number and `values` fills
    /// the start of that record's slice; writing past the current record
    /// count grows it, exposing zero-filled records for every record
    /// variable. For a nonrecord variable `index` is the flat element offset
    /// at which `values` starts.
    pub fn write(&mut self, var: VarId, index: usize, values: &Values) -> Result<()> {
        let plan = self.check_write(var, index, values)?;
        self.finalize()?;
        if let Some(numrecs) = plan.grow_to {
            self.grow_records(numrecs);
        }

        let capacity = if plan.is_record {
            plan.slot * self.numrecs
        } else {
            plan.slot
        };
        let start = plan.offset;
        let v = self.variables.resolve_mut(var)?;
        if !v.data.is_allocated() {
            tracing::trace!(variable = v.name(), bytes = capacity, "allocated data buffer");
        }
        let buf = v.data.ensure(capacity);
        values.encode_into(&mut buf[start..start + values.byte_len()]);
        Ok(())
    }

    /// Validate a write without touching any state.
    fn check_write(&self, var: VarId, index: usize, values: &Values) -> Result<WritePlan> {
        let v = self.variables.resolve(var)?;
        if values.nc_type() != v.nc_type() {
            return Err(Error::TypeMismatch {
                expected: v.nc_type(),
                found: values.nc_type(),
            });
        }
        let computed;
        let layout = match &self.frozen {
            Some(layout) => layout,
            None => {
                computed = self.layout()?;
                &computed
            }
        };
        let placement = layout
            .get(var)
            .ok_or_else(|| Error::UnknownVariable(v.name().into()))?;
        let elements = placement.elements as usize;
        let slot = placement.padded_size as usize;

        if !placement.is_record {
            let end = index.checked_add(values.len()).unwrap_or(usize::MAX);
            if end > elements {
                return Err(Error::IndexOutOfBounds {
                    variable: placement.name.clone(),
                    index: end,
                    limit: elements,
                });
            }
            return Ok(WritePlan {
                slot,
                offset: index * v.nc_type().item_size(),
                is_record: false,
                grow_to: None,
            });
        }

        if values.len() > elements {
            return Err(Error::IndexOutOfBounds {
                variable: placement.name.clone(),
                index: values.len(),
                limit: elements,
            });
        }
        let needed = index.checked_add(1).unwrap_or(usize::MAX);
        let grow = if needed > self.numrecs {
            layout.total_size(needed)?;
            Some(needed)
        } else {
            None
        };
        Ok(WritePlan {
            slot,
            offset: index * slot,
            is_record: true,
            grow_to: grow,
        })
    }

    /// Allocate a variable's buffer without writing to it.
    ///
    /// A record variable gets one slice per record, and at least one.
    pub fn materialize(&mut self, var: VarId) -> Result<()> {
        self.variables.resolve(var)?;
        let (is_record, slot) = {
            let placement = &self.finalize()?.variables()[var.0];
            (placement.is_record, placement.padded_size as usize)
        };
        let capacity = if is_record {
            slot * self.numrecs.max(1)
        } else {
            slot
        };
        let v = self.variables.resolve_mut(var)?;
        if !v.data.is_allocated() {
            tracing::trace!(variable = v.name(), bytes = capacity, "materialized data buffer");
            v.data.ensure(capacity);
        }
        Ok(())
    }

    /// Raise the record count, zero-extending every allocated record buffer.
    pub(crate) fn grow_records(&mut self, numrecs: usize) {
        if numrecs <= self.numrecs {
            return;
        }
        if let Some(layout) = &self.frozen {
            for (placement, v) in layout.variables().iter().zip(self.variables.iter_mut()) {
                if let (true, DataBuffer::Allocated(buf)) = (placement.is_record, &mut v.data) {
                    buf.resize(placement.padded_size as usize * numrecs, 0);
                }
            }
        }
        tracing::debug!(from = self.numrecs, to = numrecs, "record count grew");
        self.numrecs = numrecs;
    }

    /// Decode one record of a record variable. Unwritten data reads as zeros.
    pub fn read_record(&self, var: VarId, record: usize) -> Result<Values> {
        let v = self.variables.resolve(var)?;
        if !v.is_record() {
            return Err(Error::NotRecordVariable(v.name().into()));
        }
        if record >= self.numrecs {
            return Err(Error::IndexOutOfBounds {
                variable: v.name().into(),
                index: record,
                limit: self.numrecs,
            });
        }
        let elements = v.slice_elements(&self.dimensions)? as usize;
        let len = elements * v.nc_type().item_size();
        let slot = self.slot_size(var);
        Ok(match self.buffered(var, record * slot, len) {
            Some(bytes) => Values::decode(v.nc_type(), bytes),
            None => Values::zeros(v.nc_type(), elements),
        })
    }

    /// Decode all of a variable's data; record variables yield every record
    /// concatenated, without padding.
    pub fn read_all(&self, var: VarId) -> Result<Values> {
        let v = self.variables.resolve(var)?;
        let elements = v.slice_elements(&self.dimensions)? as usize;
        let len = elements * v.nc_type().item_size();
        if !v.is_record() {
            return Ok(match self.buffered(var, 0, len) {
                Some(bytes) => Values::decode(v.nc_type(), bytes),
                None => Values::zeros(v.nc_type(), elements),
            });
        }

        let slot = self.slot_size(var);
        let mut bytes = Vec::with_capacity(len * self.numrecs);
        for record in 0..self.numrecs {
            match self.buffered(var, record * slot, len) {
                Some(chunk) => bytes.extend_from_slice(chunk),
                None => bytes.resize(bytes.len() + len, 0),
            }
        }
        Ok(Values::decode(v.nc_type(), &bytes))
    }

    /// Total bytes held by all data buffers.
    pub fn allocated_bytes(&self) -> usize {
        self.variables
            .iter()
            .map(|(_, v)| v.data.allocated_len())
            .sum()
    }

    /// `len` buffered bytes at `start`, or `None` if the variable was never
    /// written.
    pub(crate) fn buffered(&self, var: VarId, start: usize, len: usize) -> Option<&[u8]> {
        self.variables
            .by_id(var)?
            .data
            .as_bytes()?
            .get(start..start + len)
    }

    fn slot_size(&self, var: VarId) -> usize {
        self.frozen
            .as_ref()
            .and_then(|layout| layout.get(var))
            .map_or(0, |placement| placement.padded_size as usize)
    }
}
