use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use strata_types::{ElementKind, Shape};

use crate::error::{StoreError, StoreResult};

/// Storage type of a dataset's elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dtype {
    /// Fixed-size numeric elements, little-endian.
    Numeric(ElementKind),
    /// Fixed-width byte strings of the given octet width, NUL padded.
    FixedBytes(usize),
}

impl Dtype {
    /// Bytes per element.
    pub fn itemsize(&self) -> usize {
        match self {
            Self::Numeric(kind) => kind.size(),
            Self::FixedBytes(width) => *width,
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(kind) => write!(f, "{kind}"),
            Self::FixedBytes(width) => write!(f, "S{width}"),
        }
    }
}

/// A typed multi-dimensional block of bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    dtype: Dtype,
    shape: Shape,
    data: Vec<u8>,
}

impl Dataset {
    /// Create a dataset, checking that `data` holds exactly one element per
    /// shape slot.
    pub fn new(dtype: Dtype, shape: impl Into<Shape>, data: Vec<u8>) -> StoreResult<Self> {
        let shape = shape.into();
        let expected = shape.len() * dtype.itemsize();
        if data.len() != expected {
            return Err(StoreError::ShapeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { dtype, shape, data })
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.shape.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    pub fn into_parts(self) -> (Dtype, Shape, Vec<u8>) {
        (self.dtype, self.shape, self.data)
    }
}

/// A key/value attribute attached to a group or dataset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    UInts(Vec<u64>),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_uints(&self) -> Option<&[u64]> {
        match self {
            Self::UInts(v) => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<&Shape> for AttrValue {
    fn from(shape: &Shape) -> Self {
        Self::UInts(shape.dims().iter().map(|d| *d as u64).collect())
    }
}

/// Attribute table of a node, sorted by name.
pub type Attributes = BTreeMap<String, AttrValue>;

/// Whether a node is a group or a dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Group,
    Dataset,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group => write!(f, "group"),
            Self::Dataset => write!(f, "dataset"),
        }
    }
}

/// A named container of child nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub attrs: Attributes,
    pub children: BTreeMap<String, Node>,
}

/// A dataset together with its attributes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetNode {
    pub dataset: Dataset,
    pub attrs: Attributes,
}

/// A node in the store tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    Group(Group),
    Dataset(DatasetNode),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Group(_) => NodeKind::Group,
            Self::Dataset(_) => NodeKind::Dataset,
        }
    }

    pub fn attrs(&self) -> &Attributes {
        match self {
            Self::Group(g) => &g.attrs,
            Self::Dataset(d) => &d.attrs,
        }
    }

    pub fn attrs_mut(&mut self) -> &mut Attributes {
        match self {
            Self::Group(g) => &mut g.attrs,
            Self::Dataset(d) => &mut d.attrs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_checks_byte_length() {
        let ok = Dataset::new(Dtype::Numeric(ElementKind::Int32), [2, 3], vec![0; 24]);
        assert!(ok.is_ok());
        let short = Dataset::new(Dtype::Numeric(ElementKind::Int32), [2, 3], vec![0; 20]);
        let err = short.unwrap_err();
        assert!(matches!(err, StoreError::ShapeMismatch { expected: 24, actual: 20 }));
    }

    #[test]
    fn zero_width_strings_hold_no_bytes() {
        let ds = Dataset::new(Dtype::FixedBytes(0), Shape::scalar(), Vec::new()).unwrap();
        assert_eq!(ds.len(), 1);
        assert!(ds.data().is_empty());
    }

    #[test]
    fn attr_accessors() {
        assert_eq!(AttrValue::from("x").as_str(), Some("x"));
        assert_eq!(AttrValue::from(7i64).as_int(), Some(7));
        assert_eq!(AttrValue::from(&Shape::from([1, 0])).as_uints(), Some(&[1u64, 0][..]));
        assert_eq!(AttrValue::Int(1).as_str(), None);
    }

    #[test]
    fn dtype_display() {
        assert_eq!(Dtype::Numeric(ElementKind::Float64).to_string(), "float64");
        assert_eq!(Dtype::FixedBytes(12).to_string(), "S12");
    }
}
