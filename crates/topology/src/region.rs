use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{arc::ArcRef, value::AttrValue};

/// A named map feature whose boundary is made of shared arcs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,

    /// Arbitrary string-keyed attributes, carried through untouched.
    #[serde(default)]
    pub properties: BTreeMap<String, AttrValue>,

    /// Polygons of this region.  Each polygon is a list of rings (exterior
    /// first, then holes) and each ring is a sequence of arc references.
    pub polygons: Vec<Vec<Vec<ArcRef>>>,
}

impl Region {
    pub fn new(id: impl Into<String>, polygons: Vec<Vec<Vec<ArcRef>>>) -> Self {
        Self { id: id.into(), properties: BTreeMap::new(), polygons }
    }

    /// Builder-style attribute setter.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Attribute value by name, if present.
    #[inline]
    pub fn attribute(&self, name: &str) -> Option<&AttrValue> { self.properties.get(name) }

    /// Every arc reference used by any ring of this region.
    pub fn arc_refs(&self) -> impl Iterator<Item = ArcRef> + '_ {
        self.polygons.iter().flatten().flatten().copied()
    }
}
