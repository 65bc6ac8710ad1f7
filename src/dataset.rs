//! The dataset: schema tables, the record count and the freeze state.
//!
//! A dataset starts open. Dimensions, variables and attributes can be declared
//! freely and the layout can be queried at any time without side effects.
//! The first data write, an explicit [`Dataset::finalize`], or writing the
//! file freezes the schema; from then on only record growth and data writes
//! are accepted.
//!
//! # Example
//!
//! ```
//! use cdf1_rs::{AttributeList, Dataset, NcType, Values};
//!
//! # fn main() -> cdf1_rs::Result<()> {
//! let mut ds = Dataset::new();
//! ds.add_dimension("time", 0)?;
//! ds.add_dimension("station", 3)?;
//! let temp = ds.declare_variable("temp", &["time", "station"], NcType::Float, AttributeList::new())?;
//!
//! // Virtual mode: sizes are known before any data exists.
//! let before = ds.virtual_size()?;
//! ds.write(temp, 1, &Values::Float(vec![1.0, 2.0, 3.0]))?;
//! assert_eq!(ds.numrecs(), 2);
//! assert_eq!(ds.virtual_size()?, before + 2 * 12);
//! # Ok(())
//! # }
//! ```

use alloc::vec::Vec;

use crate::{
    Error, Result,
    attribute::{Attribute, AttributeList},
    dimension::{DimId, DimensionTable},
    format::{MAX_OFFSET, NcType, NumRecs, encoded_header_size, write_header},
    layout::Layout,
    variable::{VarId, VariableRegistry},
};

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub(crate) dimensions: DimensionTable,
    pub(crate) attributes: AttributeList,
    pub(crate) variables: VariableRegistry,
    pub(crate) numrecs: usize,
    /// Set when the schema is frozen.
    pub(crate) frozen: Option<Layout>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self, operation: &'static str) -> Result<()> {
        if self.frozen.is_some() {
            return Err(Error::SchemaFrozen(operation));
        }
        Ok(())
    }

    /// Add a dimension. A `size` of zero declares the unlimited dimension.
    pub fn add_dimension(&mut self, name: &str, size: usize) -> Result<DimId> {
        self.ensure_open("add a dimension")?;
        self.dimensions.add(name, size)
    }

    /// Set a global attribute, replacing the value of an existing one in place.
    pub fn set_attribute(&mut self, attr: Attribute) -> Result<()> {
        self.ensure_open("set a global attribute")?;
        self.attributes.set(attr);
        Ok(())
    }

    /// Declare a variable over the named dimensions.
    pub fn declare_variable(
        &mut self,
        name: &str,
        dims: &[&str],
        nc_type: NcType,
        attributes: AttributeList,
    ) -> Result<VarId> {
        self.ensure_open("declare a variable")?;
        self.variables
            .declare(&self.dimensions, name, dims, nc_type, attributes)
    }

    /// Set an attribute on a variable.
    pub fn set_variable_attribute(&mut self, var: VarId, attr: Attribute) -> Result<()> {
        self.ensure_open("set a variable attribute")?;
        self.variables.resolve_mut(var)?.attributes_mut().set(attr);
        Ok(())
    }

    pub fn dimensions(&self) -> &DimensionTable {
        &self.dimensions
    }

    /// Global attributes.
    pub fn attributes(&self) -> &AttributeList {
        &self.attributes
    }

    pub fn variables(&self) -> &VariableRegistry {
        &self.variables
    }

    /// Look up a variable handle by name.
    pub fn variable(&self, name: &str) -> Option<VarId> {
        self.variables.get(name)
    }

    /// Current record count R.
    pub fn numrecs(&self) -> usize {
        self.numrecs
    }

    /// Commit the record count up front, e.g. before streaming records.
    ///
    /// The record count can only grow. Growing it exposes zero-filled records.
    ///
    /// The count is kept even while no record variable exists, since one may
    /// still be declared before the schema freezes. A file written without
    /// record variables carries a record count of zero regardless (see
    /// [`Layout::file_numrecs`]).
    pub fn set_numrecs(&mut self, numrecs: usize) -> Result<()> {
        if numrecs < self.numrecs {
            return Err(Error::RecordCountDecrease {
                current: self.numrecs,
                requested: numrecs,
            });
        }
        self.layout()?.total_size(numrecs)?;
        self.grow_records(numrecs);
        Ok(())
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    /// Size of the encoded header for the current schema.
    pub fn header_size(&self) -> Result<u64> {
        encoded_header_size(&self.dimensions, &self.attributes, &self.variables)
    }

    /// Compute the layout without freezing the schema or allocating data.
    ///
    /// Once frozen, this returns the layout fixed at freeze time.
    pub fn layout(&self) -> Result<Layout> {
        if let Some(layout) = &self.frozen {
            return Ok(layout.clone());
        }
        Layout::compute(self.header_size()?, &self.dimensions, &self.variables)
    }

    /// The layout fixed at freeze time, if the schema is frozen.
    pub fn frozen_layout(&self) -> Option<&Layout> {
        self.frozen.as_ref()
    }

    /// Size of the complete file at the current record count.
    pub fn virtual_size(&self) -> Result<u64> {
        match &self.frozen {
            Some(layout) => layout.total_size(self.numrecs),
            None => self.layout()?.total_size(self.numrecs),
        }
    }

    /// Freeze the schema and fix its layout. Calling it again is a no-op.
    pub fn finalize(&mut self) -> Result<&Layout> {
        let layout = match self.frozen.take() {
            Some(layout) => layout,
            None => {
                let layout = self.layout()?;
                layout.total_size(self.numrecs)?;
                tracing::debug!(
                    header_size = layout.header_size,
                    variables = self.variables.len(),
                    "schema frozen"
                );
                layout
            }
        };
        let layout: &Layout = self.frozen.insert(layout);
        Ok(layout)
    }

    /// Render the header without freezing the schema.
    ///
    /// With [`NumRecs::Streaming`] the record count is left for a reader to
    /// infer, so the header can be emitted before any record exists.
    pub fn header_bytes(&self, numrecs: NumRecs) -> Result<Vec<u8>> {
        let layout = self.layout()?;
        let mut out = Vec::with_capacity(layout.header_size as usize);
        write_header(
            &mut out,
            numrecs,
            &self.dimensions,
            &self.attributes,
            &self.variables,
            &layout,
        )?;
        debug_assert_eq!(out.len() as u64, layout.header_size);
        Ok(out)
    }

    /// Largest record count this dataset can reach within the format's range.
    pub fn max_records(&self) -> Result<u64> {
        Ok(self.layout()?.max_records().unwrap_or(MAX_OFFSET))
    }
}
