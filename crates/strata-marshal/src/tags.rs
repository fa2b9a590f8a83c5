//! Attribute names and type tags recorded on stored nodes.

use std::fmt;

use strata_types::{CollectionKind, ElementKind};

/// Type tag naming the original value kind.
pub const TYPE_ATTR: &str = "Marshal.Type";
/// Element kind of a stored array (`float64`, `str8`, `bytes3`, `object`).
pub const ELEMENT_KIND_ATTR: &str = "Marshal.ElementKind";
/// Original shape of an array or object array.
pub const SHAPE_ATTR: &str = "Marshal.Shape";
/// Element count of a collection.
pub const LENGTH_ATTR: &str = "Marshal.Length";
/// MATLAB class of the stored data.
pub const MATLAB_CLASS_ATTR: &str = "MATLAB_class";
/// Set to 1 when the stored MATLAB array has no elements.
pub const MATLAB_EMPTY_ATTR: &str = "MATLAB_empty";

/// The value kind recorded in [`TYPE_ATTR`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Null,
    Bool,
    Int,
    Float,
    Complex,
    Str,
    Bytes,
    ByteArray,
    NdArray,
    Object,
    List,
    Tuple,
    Set,
    FrozenSet,
    Deque,
}

impl TypeTag {
    pub const ALL: [TypeTag; 15] = [
        Self::Null,
        Self::Bool,
        Self::Int,
        Self::Float,
        Self::Complex,
        Self::Str,
        Self::Bytes,
        Self::ByteArray,
        Self::NdArray,
        Self::Object,
        Self::List,
        Self::Tuple,
        Self::Set,
        Self::FrozenSet,
        Self::Deque,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Complex => "complex",
            Self::Str => "str",
            Self::Bytes => "bytes",
            Self::ByteArray => "bytearray",
            Self::NdArray => "ndarray",
            Self::Object => "object",
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Set => "set",
            Self::FrozenSet => "frozenset",
            Self::Deque => "deque",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|tag| tag.name() == s)
    }

    pub fn for_collection(kind: CollectionKind) -> Self {
        match kind {
            CollectionKind::List => Self::List,
            CollectionKind::Tuple => Self::Tuple,
            CollectionKind::Set => Self::Set,
            CollectionKind::FrozenSet => Self::FrozenSet,
            CollectionKind::Deque => Self::Deque,
        }
    }

    /// The collection variant this tag names, if any.
    pub fn collection_kind(&self) -> Option<CollectionKind> {
        match self {
            Self::List => Some(CollectionKind::List),
            Self::Tuple => Some(CollectionKind::Tuple),
            Self::Set => Some(CollectionKind::Set),
            Self::FrozenSet => Some(CollectionKind::FrozenSet),
            Self::Deque => Some(CollectionKind::Deque),
            _ => None,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parsed form of [`ELEMENT_KIND_ATTR`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoredElementKind {
    Numeric(ElementKind),
    /// Fixed-width text, width in codepoints.
    Text(usize),
    /// Fixed-width bytes, width in octets.
    Bytes(usize),
    Object,
}

impl StoredElementKind {
    pub fn parse(s: &str) -> Option<Self> {
        if s == "object" {
            return Some(Self::Object);
        }
        if let Some(width) = s.strip_prefix("str") {
            return parse_width(width).map(Self::Text);
        }
        if let Some(width) = s.strip_prefix("bytes") {
            return parse_width(width).map(Self::Bytes);
        }
        s.parse().ok().map(Self::Numeric)
    }
}

fn parse_width(s: &str) -> Option<usize> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for StoredElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(kind) => write!(f, "{kind}"),
            Self::Text(width) => write!(f, "str{width}"),
            Self::Bytes(width) => write!(f, "bytes{width}"),
            Self::Object => f.write_str("object"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_names_roundtrip() {
        for tag in TypeTag::ALL {
            assert_eq!(TypeTag::parse(tag.name()), Some(tag));
        }
        assert_eq!(TypeTag::parse("numpy.float128"), None);
    }

    #[test]
    fn collection_tags() {
        for kind in CollectionKind::ALL {
            let tag = TypeTag::for_collection(kind);
            assert_eq!(tag.collection_kind(), Some(kind));
            assert_eq!(tag.name(), kind.name());
        }
        assert_eq!(TypeTag::Object.collection_kind(), None);
    }

    #[test]
    fn element_kind_strings() {
        assert_eq!(
            StoredElementKind::parse("float64"),
            Some(StoredElementKind::Numeric(ElementKind::Float64))
        );
        assert_eq!(StoredElementKind::parse("str12"), Some(StoredElementKind::Text(12)));
        assert_eq!(StoredElementKind::parse("bytes0"), Some(StoredElementKind::Bytes(0)));
        assert_eq!(StoredElementKind::parse("object"), Some(StoredElementKind::Object));
        assert_eq!(StoredElementKind::parse("str"), None);
        assert_eq!(StoredElementKind::parse("str+1"), None);
        assert_eq!(StoredElementKind::parse("float80"), None);
        assert_eq!(StoredElementKind::Text(3).to_string(), "str3");
    }
}
