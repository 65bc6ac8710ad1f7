//! Typed key/value attributes attached to a dataset or a variable.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::format::{NcType, Values};

/// A named, typed sequence of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub values: Values,
}

impl Attribute {
    pub fn new(name: &str, values: impl Into<Values>) -> Self {
        Self {
            name: name.to_string(),
            values: values.into(),
        }
    }

    /// A `char` attribute holding `text` as UTF-8 bytes.
    pub fn text(name: &str, text: &str) -> Self {
        Self::new(name, text)
    }

    pub fn nc_type(&self) -> NcType {
        self.values.nc_type()
    }
}

/// Attributes in insertion order. Order is part of the serialized header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeList {
    attrs: Vec<Attribute>,
}

impl AttributeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, attr: Attribute) -> Self {
        self.set(attr);
        self
    }

    /// Insert an attribute, or replace the value of an existing one in place.
    ///
    /// Replacing keeps the attribute's original position.
    pub fn set(&mut self, attr: Attribute) {
        match self.attrs.iter_mut().find(|a| a.name == attr.name) {
            Some(existing) => existing.values = attr.values,
            None => self.attrs.push(attr),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attrs.iter().find(|a| a.name == name)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Attribute> {
        self.attrs.iter()
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

impl FromIterator<Attribute> for AttributeList {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        let mut list = AttributeList::new();
        for attr in iter {
            list.set(attr);
        }
        list
    }
}

impl<'a> IntoIterator for &'a AttributeList {
    type Item = &'a Attribute;
    type IntoIter = core::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.attrs.iter()
    }
}
