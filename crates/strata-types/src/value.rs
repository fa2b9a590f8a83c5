use std::fmt;

use crate::array::{BytesArray, NumericArray, ObjectArray, TextArray};
use crate::element::Complex;

/// Variant of a sequence-like collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    List,
    Tuple,
    Set,
    FrozenSet,
    Deque,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 5] = [
        Self::List,
        Self::Tuple,
        Self::Set,
        Self::FrozenSet,
        Self::Deque,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Set => "set",
            Self::FrozenSet => "frozenset",
            Self::Deque => "deque",
        }
    }

    /// Returns `true` for the unordered variants.
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set | Self::FrozenSet)
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An ordered sequence of values tagged with its collection variant.
///
/// Sets keep their elements in insertion order for serialization, but compare
/// as multisets.
#[derive(Clone, Debug)]
pub struct Collection {
    kind: CollectionKind,
    elements: Vec<Value>,
}

impl Collection {
    pub fn new(kind: CollectionKind, elements: Vec<Value>) -> Self {
        Self { kind, elements }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn into_elements(self) -> Vec<Value> {
        self.elements
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        if self.kind != other.kind || self.elements.len() != other.elements.len() {
            return false;
        }
        if !self.kind.is_set() {
            return self.elements == other.elements;
        }
        let mut matched = vec![false; other.elements.len()];
        self.elements.iter().all(|mine| {
            let hit = other
                .elements
                .iter()
                .enumerate()
                .find(|(i, theirs)| !matched[*i] && *theirs == mine)
                .map(|(i, _)| i);
            match hit {
                Some(i) => {
                    matched[i] = true;
                    true
                }
                None => false,
            }
        })
    }
}

/// The closed set of values the marshaling engine understands.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Complex(Complex<f64>),
    Text(String),
    Bytes(Vec<u8>),
    /// Byte string that the caller may mutate (round-trips distinctly from `Bytes`).
    MutableBytes(Vec<u8>),
    Numeric(NumericArray),
    TextArray(TextArray),
    BytesArray(BytesArray),
    ObjectArray(ObjectArray),
    Collection(Collection),
}

/// Classification of a [`Value`], used to select its marshaler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Null,
    Bool,
    Int,
    Float,
    Complex,
    Text,
    Bytes,
    MutableBytes,
    NumericScalar,
    NumericArray,
    TextArray,
    BytesArray,
    ObjectArray,
    Collection,
}

impl TypeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Complex => "complex",
            Self::Text => "text",
            Self::Bytes => "bytes",
            Self::MutableBytes => "mutable bytes",
            Self::NumericScalar => "numeric scalar",
            Self::NumericArray => "numeric array",
            Self::TextArray => "text array",
            Self::BytesArray => "bytes array",
            Self::ObjectArray => "object array",
            Self::Collection => "collection",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    pub fn kind(&self) -> TypeKind {
        match self {
            Value::Null => TypeKind::Null,
            Value::Bool(_) => TypeKind::Bool,
            Value::Int(_) => TypeKind::Int,
            Value::Float(_) => TypeKind::Float,
            Value::Complex(_) => TypeKind::Complex,
            Value::Text(_) => TypeKind::Text,
            Value::Bytes(_) => TypeKind::Bytes,
            Value::MutableBytes(_) => TypeKind::MutableBytes,
            Value::Numeric(a) if a.is_scalar() => TypeKind::NumericScalar,
            Value::Numeric(_) => TypeKind::NumericArray,
            Value::TextArray(_) => TypeKind::TextArray,
            Value::BytesArray(_) => TypeKind::BytesArray,
            Value::ObjectArray(_) => TypeKind::ObjectArray,
            Value::Collection(_) => TypeKind::Collection,
        }
    }

    /// Child values of a container, in storage order.
    pub fn children(&self) -> &[Value] {
        match self {
            Value::ObjectArray(a) => a.elements(),
            Value::Collection(c) => c.elements(),
            _ => &[],
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Value::ObjectArray(_) | Value::Collection(_))
    }

    pub fn list(elements: Vec<Value>) -> Self {
        Value::Collection(Collection::new(CollectionKind::List, elements))
    }

    pub fn as_numeric(&self) -> Option<&NumericArray> {
        match self {
            Value::Numeric(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_text_array(&self) -> Option<&TextArray> {
        match self {
            Value::TextArray(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object_array(&self) -> Option<&ObjectArray> {
        match self {
            Value::ObjectArray(a) => Some(a),
            _ => None,
        }
    }
}

fn same_f64(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => same_f64(*a, *b),
            (Value::Complex(a), Value::Complex(b)) => same_f64(a.re, b.re) && same_f64(a.im, b.im),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::MutableBytes(a), Value::MutableBytes(b)) => a == b,
            (Value::Numeric(a), Value::Numeric(b)) => a == b,
            (Value::TextArray(a), Value::TextArray(b)) => a == b,
            (Value::BytesArray(a), Value::BytesArray(b)) => a == b,
            (Value::ObjectArray(a), Value::ObjectArray(b)) => a == b,
            (Value::Collection(a), Value::Collection(b)) => a == b,
            _ => false,
        }
    }
}

macro_rules! value_from {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

value_from!(bool, Bool);
value_from!(i64, Int);
value_from!(f64, Float);
value_from!(Complex<f64>, Complex);
value_from!(String, Text);
value_from!(NumericArray, Numeric);
value_from!(TextArray, TextArray);
value_from!(BytesArray, BytesArray);
value_from!(ObjectArray, ObjectArray);
value_from!(Collection, Collection);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}
