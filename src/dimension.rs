//! The ordered table of named dimensions.
//!
//! Creation order is the order dimensions are written to the header, and a
//! dimension's position in the table is the id variables refer to it by.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::{Error, Result, format::MAX_OFFSET};

/// Handle to a dimension: its position in the [`DimensionTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DimId(pub(crate) usize);

impl DimId {
    /// Position of the dimension in the table (its header dimid).
    pub fn index(self) -> usize {
        self.0
    }
}

/// A named axis. A size of zero marks the unlimited (record) dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub size: usize,
}

impl Dimension {
    /// Returns true for the record dimension.
    #[inline]
    pub fn is_unlimited(&self) -> bool {
        self.size == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct DimensionTable {
    dims: Vec<Dimension>,
    by_name: BTreeMap<String, usize>,
    unlimited: Option<usize>,
}

impl DimensionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dimension. `size == 0` declares the unlimited dimension.
    pub fn add(&mut self, name: &str, size: usize) -> Result<DimId> {
        if self.by_name.contains_key(name) {
            return Err(Error::DuplicateName {
                kind: "dimension",
                name: name.to_string(),
            });
        }
        if size == 0 {
            if let Some(existing) = self.unlimited {
                return Err(Error::MultipleUnlimited {
                    existing: self.dims[existing].name.clone(),
                    requested: name.to_string(),
                });
            }
        }
        if size as u64 > MAX_OFFSET {
            return Err(Error::Overflow(format!("length of dimension {name:?}")));
        }

        let id = self.dims.len();
        self.dims.push(Dimension {
            name: name.to_string(),
            size,
        });
        self.by_name.insert(name.to_string(), id);
        if size == 0 {
            self.unlimited = Some(id);
        }
        Ok(DimId(id))
    }

    pub fn get(&self, name: &str) -> Option<&Dimension> {
        self.by_name.get(name).map(|&i| &self.dims[i])
    }

    pub fn index_of(&self, name: &str) -> Option<DimId> {
        self.by_name.get(name).copied().map(DimId)
    }

    /// Look up a dimension by handle.
    pub fn by_id(&self, id: DimId) -> Option<&Dimension> {
        self.dims.get(id.0)
    }

    /// All dimensions in creation order.
    pub fn list(&self) -> &[Dimension] {
        &self.dims
    }

    /// Handle of the unlimited dimension, if one was declared.
    pub fn unlimited(&self) -> Option<DimId> {
        self.unlimited.map(DimId)
    }

    pub fn len(&self) -> usize {
        self.dims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dims.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_preserves_order() {
        let mut table = DimensionTable::new();
        table.add("lat", 10).unwrap();
        table.add("time", 0).unwrap();
        table.add("lon", 20).unwrap();

        let names: Vec<&str> = table.list().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["lat", "time", "lon"]);
        assert_eq!(table.index_of("lon"), Some(DimId(2)));
        assert_eq!(table.unlimited(), Some(DimId(1)));
        assert!(table.get("time").unwrap().is_unlimited());
    }

    #[test]
    fn test_duplicate_name() {
        let mut table = DimensionTable::new();
        table.add("x", 3).unwrap();
        let err = table.add("x", 4).unwrap_err();
        assert!(matches!(err, Error::DuplicateName { kind: "dimension", .. }));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("x").unwrap().size, 3);
    }

    #[test]
    fn test_multiple_unlimited() {
        let mut table = DimensionTable::new();
        table.add("time", 0).unwrap();
        let err = table.add("step", 0).unwrap_err();
        match err {
            Error::MultipleUnlimited {
                existing,
                requested,
            } => {
                assert_eq!(existing, "time");
                assert_eq!(requested, "step");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(table.len(), 1);
        assert!(table.get("step").is_none());
    }

    #[test]
    fn test_unknown_lookup() {
        let table = DimensionTable::new();
        assert!(table.is_empty());
        assert!(table.get("nope").is_none());
        assert!(table.index_of("nope").is_none());
        assert!(table.unlimited().is_none());
    }
}
