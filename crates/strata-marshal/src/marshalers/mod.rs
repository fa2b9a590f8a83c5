//! Per-kind marshalers.
//!
//! A marshaler turns a value into what the engine stores for it (a dataset
//! or a group of child elements) and reconstructs the value from what was
//! read back. Marshalers never touch the store themselves.

pub mod array;
pub mod container;
pub mod null;
pub mod scalar;
pub mod string;

use strata_store::{AttrValue, Attributes, Dataset, StorePath};
use strata_types::{Shape, TypeKind, Value};

use crate::error::{MarshalError, MarshalResult};
use crate::options::{Layout, Options, Regime};
use crate::tags::{TypeTag, MATLAB_CLASS_ATTR, TYPE_ATTR};

pub use array::ArrayMarshaler;
pub use container::ContainerMarshaler;
pub use null::NullMarshaler;
pub use scalar::ScalarMarshaler;
pub use string::StringMarshaler;

/// What a marshaler asks the engine to store for one value.
#[derive(Debug)]
pub enum Encoded<'v> {
    /// A single dataset.
    Leaf { dataset: Dataset, attrs: Attributes },
    /// A group whose elements are written beneath it in order.
    Container {
        attrs: Attributes,
        children: &'v [Value],
    },
}

/// What the engine read back for one node.
#[derive(Debug)]
pub enum Stored {
    Leaf { dataset: Dataset, attrs: Attributes },
    /// A group with its elements already decoded, in index order.
    Container {
        attrs: Attributes,
        children: Vec<Value>,
    },
}

impl Stored {
    pub fn attrs(&self) -> &Attributes {
        match self {
            Self::Leaf { attrs, .. } | Self::Container { attrs, .. } => attrs,
        }
    }
}

/// Where a value lives and which rules apply to it.
#[derive(Clone, Copy, Debug)]
pub struct Context<'a> {
    pub path: &'a StorePath,
    pub options: &'a Options,
}

impl<'a> Context<'a> {
    pub fn new(path: &'a StorePath, options: &'a Options) -> Self {
        Self { path, options }
    }

    pub fn regime(&self) -> Regime {
        self.options.regime()
    }

    pub fn layout(&self) -> Layout {
        self.options.layout()
    }

    /// Whether type information is recorded and read back.
    pub fn tagged(&self) -> bool {
        self.regime() == Regime::Fidelity
    }

    pub fn corrupt(&self, reason: impl Into<String>) -> MarshalError {
        MarshalError::corrupt(self.path, reason)
    }

    /// Attributes every stored node starts from: the type tag when values
    /// are tagged, and the MATLAB class under [`Layout::Matlab`].
    pub fn base_attrs(&self, tag: TypeTag, matlab_class: Option<&str>) -> Attributes {
        let mut attrs = Attributes::new();
        if self.tagged() {
            attrs.insert(TYPE_ATTR.into(), tag.name().into());
        }
        if self.layout() == Layout::Matlab {
            if let Some(class) = matlab_class {
                attrs.insert(MATLAB_CLASS_ATTR.into(), class.into());
            }
        }
        attrs
    }

    /// Record a type-information attribute, only when values are tagged.
    pub fn describe(&self, attrs: &mut Attributes, name: &str, value: AttrValue) {
        if self.tagged() {
            attrs.insert(name.into(), value);
        }
    }

    /// Read a shape-valued attribute.
    pub fn shape_attr(&self, attrs: &Attributes, name: &str) -> MarshalResult<Option<Shape>> {
        match attrs.get(name) {
            None => Ok(None),
            Some(AttrValue::UInts(dims)) => {
                let mut out = Vec::with_capacity(dims.len());
                for d in dims {
                    let d = usize::try_from(*d)
                        .map_err(|_| self.corrupt(format!("{name} dimension {d} overflows")))?;
                    out.push(d);
                }
                Ok(Some(Shape::new(out)))
            }
            Some(other) => Err(self.corrupt(format!(
                "{name} must be a list of dimensions, found {other:?}"
            ))),
        }
    }

    /// Read a string-valued attribute.
    pub fn str_attr<'s>(
        &self,
        attrs: &'s Attributes,
        name: &str,
    ) -> MarshalResult<Option<&'s str>> {
        match attrs.get(name) {
            None => Ok(None),
            Some(AttrValue::Str(s)) => Ok(Some(s)),
            Some(other) => Err(self.corrupt(format!("{name} must be a string, found {other:?}"))),
        }
    }
}

/// Converts one family of value kinds to and from stored form.
pub trait Marshaler: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Value kinds this marshaler writes.
    fn kinds(&self) -> &[TypeKind];

    /// Type tags this marshaler reads.
    fn tags(&self) -> &[TypeTag];

    /// Produce the stored form of `value`.
    fn encode<'v>(&self, value: &'v Value, ctx: &Context<'_>) -> MarshalResult<Encoded<'v>>;

    /// Rebuild a value from a node carrying one of [`Self::tags`].
    fn decode(&self, tag: TypeTag, stored: Stored, ctx: &Context<'_>) -> MarshalResult<Value>;
}

/// Unwrap a leaf, or report a tag that belongs on a dataset but sits on a group.
pub(crate) fn expect_leaf(
    tag: TypeTag,
    stored: Stored,
    ctx: &Context<'_>,
) -> MarshalResult<(Dataset, Attributes)> {
    match stored {
        Stored::Leaf { dataset, attrs } => Ok((dataset, attrs)),
        Stored::Container { .. } => Err(ctx.corrupt(format!("type {tag} stored as a group"))),
    }
}

/// A marshaler was handed a value outside its kinds.
pub(crate) fn wrong_kind(marshaler: &str, value: &Value) -> MarshalError {
    MarshalError::unsupported(
        value.kind().name(),
        format!("not handled by the {marshaler} marshaler"),
    )
}
