//! The registry of declared variables.
//!
//! Variables are kept in declaration order. The order they are laid out and
//! serialized in is computed separately by [`Layout`](crate::Layout).

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::{
    Error, Result,
    attribute::AttributeList,
    buffer::DataBuffer,
    dimension::{DimId, DimensionTable},
    format::NcType,
};

/// Handle to a declared variable: its position in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Position of the variable in declaration order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A typed array over an ordered tuple of dimensions.
///
/// A variable whose first dimension is the unlimited dimension is a record
/// variable; its data is interleaved with the other record variables.
#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    dims: Vec<DimId>,
    nc_type: NcType,
    attributes: AttributeList,
    is_record: bool,
    pub(crate) data: DataBuffer,
}

impl Variable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dims(&self) -> &[DimId] {
        &self.dims
    }

    pub fn nc_type(&self) -> NcType {
        self.nc_type
    }

    pub fn attributes(&self) -> &AttributeList {
        &self.attributes
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut AttributeList {
        &mut self.attributes
    }

    #[inline]
    pub fn is_record(&self) -> bool {
        self.is_record
    }

    /// Returns true once a data buffer has been allocated for this variable.
    pub fn is_allocated(&self) -> bool {
        self.data.is_allocated()
    }

    /// Dimension sizes, with the unlimited dimension resolved to `numrecs`.
    pub fn shape(&self, dims: &DimensionTable, numrecs: usize) -> Vec<usize> {
        self.dims
            .iter()
            .filter_map(|&id| dims.by_id(id))
            .map(|d| if d.is_unlimited() { numrecs } else { d.size })
            .collect()
    }

    /// Number of elements in the whole variable (nonrecord) or in one
    /// record slice (record).
    pub fn slice_elements(&self, dims: &DimensionTable) -> Result<u64> {
        let fixed = if self.is_record {
            &self.dims[1..]
        } else {
            &self.dims[..]
        };
        fixed
            .iter()
            .filter_map(|&id| dims.by_id(id))
            .try_fold(1u64, |acc, d| acc.checked_mul(d.size as u64))
            .ok_or_else(|| Error::Overflow(format!("element count of variable {:?}", self.name)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct VariableRegistry {
    vars: Vec<Variable>,
    by_name: BTreeMap<String, usize>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variable over the named dimensions.
    ///
    /// Nothing is allocated for its data until it is first written.
    pub fn declare(
        &mut self,
        dims: &DimensionTable,
        name: &str,
        dim_names: &[&str],
        nc_type: NcType,
        attributes: AttributeList,
    ) -> Result<VarId> {
        if self.by_name.contains_key(name) {
            return Err(Error::DuplicateName {
                kind: "variable",
                name: name.to_string(),
            });
        }

        let mut ids = Vec::with_capacity(dim_names.len());
        for dim_name in dim_names {
            let id = dims
                .index_of(dim_name)
                .ok_or_else(|| Error::UnknownDimension(dim_name.to_string()))?;
            ids.push(id);
        }

        let unlimited = dims.unlimited();
        if let Some(position) = ids.iter().skip(1).position(|&id| Some(id) == unlimited) {
            return Err(Error::UnlimitedNotFirst {
                variable: name.to_string(),
                position: position + 1,
            });
        }
        let is_record = unlimited.is_some() && ids.first().copied() == unlimited;

        let id = self.vars.len();
        self.vars.push(Variable {
            name: name.to_string(),
            dims: ids,
            nc_type,
            attributes,
            is_record,
            data: DataBuffer::Unallocated,
        });
        self.by_name.insert(name.to_string(), id);
        Ok(VarId(id))
    }

    pub fn get(&self, name: &str) -> Option<VarId> {
        self.by_name.get(name).copied().map(VarId)
    }

    pub fn by_id(&self, id: VarId) -> Option<&Variable> {
        self.vars.get(id.0)
    }

    pub(crate) fn resolve(&self, id: VarId) -> Result<&Variable> {
        self.vars
            .get(id.0)
            .ok_or_else(|| Error::UnknownVariable(format!("#{}", id.0)))
    }

    pub(crate) fn resolve_mut(&mut self, id: VarId) -> Result<&mut Variable> {
        self.vars
            .get_mut(id.0)
            .ok_or_else(|| Error::UnknownVariable(format!("#{}", id.0)))
    }

    /// Variables in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (VarId, &Variable)> {
        self.vars.iter().enumerate().map(|(i, v)| (VarId(i), v))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Variable> {
        self.vars.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
