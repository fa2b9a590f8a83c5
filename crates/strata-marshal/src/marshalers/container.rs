use strata_store::{AttrValue, Attributes};
use strata_types::{Collection, ObjectArray, Shape, TypeKind, Value};

use super::{wrong_kind, Context, Encoded, Marshaler, Stored};
use crate::error::MarshalResult;
use crate::options::Layout;
use crate::tags::{StoredElementKind, TypeTag, ELEMENT_KIND_ATTR, LENGTH_ATTR, SHAPE_ATTR};
use crate::transform::{self, CELL_CLASS};

/// Stores collections and object arrays as groups of element nodes.
///
/// The group's shape attribute is written in every regime since it is the
/// only record of an object array's dimensions. Untagged MATLAB-layout
/// groups record the promoted shape instead.
#[derive(Debug, Default)]
pub struct ContainerMarshaler;

impl Marshaler for ContainerMarshaler {
    fn name(&self) -> &str {
        "container"
    }

    fn kinds(&self) -> &[TypeKind] {
        &[TypeKind::ObjectArray, TypeKind::Collection]
    }

    fn tags(&self) -> &[TypeTag] {
        &[
            TypeTag::Object,
            TypeTag::List,
            TypeTag::Tuple,
            TypeTag::Set,
            TypeTag::FrozenSet,
            TypeTag::Deque,
        ]
    }

    fn encode<'v>(&self, value: &'v Value, ctx: &Context<'_>) -> MarshalResult<Encoded<'v>> {
        let (tag, shape) = match value {
            Value::Collection(c) => (TypeTag::for_collection(c.kind()), Shape::from([c.len()])),
            Value::ObjectArray(a) => (TypeTag::Object, a.shape().clone()),
            other => return Err(wrong_kind(self.name(), other)),
        };
        let children = value.children();
        let mut attrs = ctx.base_attrs(tag, Some(CELL_CLASS));

        match value {
            Value::Collection(c) => {
                ctx.describe(&mut attrs, LENGTH_ATTR, AttrValue::Int(c.len() as i64))
            }
            _ => ctx.describe(
                &mut attrs,
                ELEMENT_KIND_ATTR,
                StoredElementKind::Object.to_string().into(),
            ),
        }

        if ctx.layout() == Layout::Matlab && children.is_empty() {
            transform::mark_empty(&mut attrs);
        }
        // Tagged groups keep the value's own shape so reads can restore it.
        let shape = match ctx.layout() {
            Layout::Matlab if ctx.tagged() => shape,
            Layout::Matlab if children.is_empty() => transform::promote_empty(&shape),
            Layout::Matlab => transform::promote_2d(&shape),
            Layout::Natural => shape,
        };
        attrs.insert(SHAPE_ATTR.into(), (&shape).into());

        Ok(Encoded::Container { attrs, children })
    }

    fn decode(&self, tag: TypeTag, stored: Stored, ctx: &Context<'_>) -> MarshalResult<Value> {
        let (attrs, children) = match stored {
            Stored::Container { attrs, children } => (attrs, children),
            Stored::Leaf { .. } => {
                return Err(ctx.corrupt(format!("type {tag} stored as a dataset")))
            }
        };
        if tag == TypeTag::Object {
            return object_array(&attrs, children, ctx).map(Value::ObjectArray);
        }
        let Some(kind) = tag.collection_kind() else {
            return Err(ctx.corrupt(format!("container marshaler cannot read {tag}")));
        };
        match attrs.get(LENGTH_ATTR) {
            None => {}
            Some(AttrValue::Int(n)) if usize::try_from(*n).ok() == Some(children.len()) => {}
            Some(other) => {
                return Err(ctx.corrupt(format!(
                    "{LENGTH_ATTR} {other:?} does not match {} stored elements",
                    children.len()
                )))
            }
        }
        Ok(Value::Collection(Collection::new(kind, children)))
    }
}

/// Fold decoded elements into an object array shaped by the group's shape
/// attribute, or a vector when the attribute is absent.
pub fn object_array(
    attrs: &Attributes,
    children: Vec<Value>,
    ctx: &Context<'_>,
) -> MarshalResult<ObjectArray> {
    let shape = ctx
        .shape_attr(attrs, SHAPE_ATTR)?
        .unwrap_or_else(|| Shape::from([children.len()]));
    if shape.len() != children.len() {
        return Err(ctx.corrupt(format!(
            "shape {shape} does not match {} stored elements",
            children.len()
        )));
    }
    Ok(ObjectArray::new(shape, children)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MarshalError;
    use crate::options::Options;
    use crate::tags::{MATLAB_CLASS_ATTR, MATLAB_EMPTY_ATTR, TYPE_ATTR};
    use strata_store::StorePath;
    use strata_types::CollectionKind;

    fn attrs_of(value: &Value, options: &Options) -> Attributes {
        let path = StorePath::parse("/c").unwrap();
        match ContainerMarshaler.encode(value, &Context::new(&path, options)).unwrap() {
            Encoded::Container { attrs, children } => {
                assert_eq!(children.len(), value.children().len());
                attrs
            }
            Encoded::Leaf { .. } => panic!("container encoded as a dataset"),
        }
    }

    fn tuple(n: i64) -> Value {
        let elements = (0..n).map(Value::Int).collect();
        Value::Collection(Collection::new(CollectionKind::Tuple, elements))
    }

    #[test]
    fn fidelity_records_kind_and_length() {
        let attrs = attrs_of(&tuple(3), &Options::fidelity());
        assert_eq!(attrs.get(TYPE_ATTR), Some(&AttrValue::from("tuple")));
        assert_eq!(attrs.get(LENGTH_ATTR), Some(&AttrValue::Int(3)));
        assert_eq!(attrs.get(SHAPE_ATTR), Some(&AttrValue::UInts(vec![3])));
    }

    #[test]
    fn bare_keeps_only_shape() {
        let attrs = attrs_of(&tuple(2), &Options::bare());
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.get(SHAPE_ATTR), Some(&AttrValue::UInts(vec![2])));
    }

    #[test]
    fn matlab_cells_are_rows() {
        let attrs = attrs_of(&tuple(4), &Options::matlab());
        assert_eq!(attrs.get(SHAPE_ATTR), Some(&AttrValue::UInts(vec![1, 4])));
        assert_eq!(attrs.get(MATLAB_CLASS_ATTR), Some(&AttrValue::from("cell")));

        let attrs = attrs_of(&tuple(0), &Options::matlab());
        assert_eq!(attrs.get(SHAPE_ATTR), Some(&AttrValue::UInts(vec![1, 0])));
    }

    #[test]
    fn tagged_matlab_groups_keep_value_shape() {
        let attrs = attrs_of(&tuple(4), &Options::default());
        assert_eq!(attrs.get(SHAPE_ATTR), Some(&AttrValue::UInts(vec![4])));
        assert_eq!(attrs.get(MATLAB_CLASS_ATTR), Some(&AttrValue::from("cell")));

        let attrs = attrs_of(&tuple(0), &Options::default());
        assert_eq!(attrs.get(SHAPE_ATTR), Some(&AttrValue::UInts(vec![0])));
        assert_eq!(attrs.get(MATLAB_EMPTY_ATTR), Some(&AttrValue::Int(1)));
    }

    #[test]
    fn fidelity_groups_carry_no_matlab_class() {
        let attrs = attrs_of(&tuple(1), &Options::fidelity());
        assert!(attrs.get(MATLAB_CLASS_ATTR).is_none());
    }

    #[test]
    fn object_array_uses_shape_attribute() {
        let path = StorePath::parse("/c").unwrap();
        let options = Options::bare();
        let ctx = Context::new(&path, &options);
        let mut attrs = Attributes::new();
        attrs.insert(SHAPE_ATTR.into(), AttrValue::UInts(vec![2, 1]));
        let array = object_array(&attrs, vec![Value::Null, Value::Int(1)], &ctx).unwrap();
        assert_eq!(array.shape(), &Shape::from([2, 1]));

        let array = object_array(&Attributes::new(), vec![Value::Null], &ctx).unwrap();
        assert_eq!(array.shape(), &Shape::from([1]));

        let err = object_array(&attrs, vec![Value::Null], &ctx).unwrap_err();
        assert!(matches!(err, MarshalError::CorruptMetadata { .. }));
    }

    #[test]
    fn length_mismatch_is_corrupt() {
        let path = StorePath::parse("/c").unwrap();
        let options = Options::fidelity();
        let ctx = Context::new(&path, &options);
        let mut attrs = Attributes::new();
        attrs.insert(LENGTH_ATTR.into(), AttrValue::Int(5));
        let stored = Stored::Container {
            attrs,
            children: vec![Value::Null],
        };
        let err = ContainerMarshaler.decode(TypeTag::List, stored, &ctx).unwrap_err();
        assert!(matches!(err, MarshalError::CorruptMetadata { .. }));
    }

    #[test]
    fn set_decodes_as_set() {
        let path = StorePath::parse("/c").unwrap();
        let options = Options::fidelity();
        let ctx = Context::new(&path, &options);
        let stored = Stored::Container {
            attrs: Attributes::new(),
            children: vec![Value::Int(2), Value::Int(1)],
        };
        let value = ContainerMarshaler.decode(TypeTag::Set, stored, &ctx).unwrap();
        let expected = Collection::new(CollectionKind::Set, vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(value, Value::Collection(expected));
    }
}
