//! Walks value trees onto a store and back.
//!
//! Neither direction recurses: writes drain an explicit stack of pending
//! nodes into a plan that is applied only once every node has encoded, and
//! reads lay the stored subtree out in an arena breadth-first
//! before folding containers from the deepest level up. Nesting depth is
//! bounded by memory, not by the call stack.

use std::mem;

use strata_store::{Attributes, Dataset, HierarchicalStore, NodeKind, StorePath};
use strata_types::Value;
use tracing::{debug, warn};

use crate::error::{MarshalError, MarshalResult};
use crate::marshalers::{array, container, Context, Encoded, Stored};
use crate::namer;
use crate::options::Options;
use crate::registry::Registry;
use crate::tags::TYPE_ATTR;

/// A node ready to be created: every node of a value is encoded before the
/// store is touched.
enum Planned {
    Leaf { dataset: Dataset, attrs: Attributes },
    Group { attrs: Attributes },
}

/// Write `value` at `path`, replacing whatever is stored there.
///
/// The whole tree is classified and encoded first, so a value that cannot
/// be stored leaves any existing node at `path` untouched.
pub fn write_value(
    store: &dyn HierarchicalStore,
    registry: &Registry,
    path: &StorePath,
    value: &Value,
    options: &Options,
) -> MarshalResult<()> {
    if path.is_root() {
        return Err(MarshalError::conflict(path, "values cannot be written at the root group"));
    }
    debug!(%path, regime = %options.regime(), kind = %value.kind(), "writing value");
    let plan = plan_value(registry, path, value, options)?;

    for ancestor in path.ancestors() {
        if store.node_kind(&ancestor)? == Some(NodeKind::Dataset) {
            return Err(MarshalError::conflict(
                path,
                format!("ancestor {ancestor} is a dataset"),
            ));
        }
    }
    if store.remove(path)? {
        debug!(%path, "replaced existing node");
    }

    let nodes = plan.len();
    for (node_path, planned) in plan {
        match planned {
            Planned::Leaf { dataset, attrs } => {
                store.create_dataset(&node_path, dataset)?;
                set_attributes(store, &node_path, attrs)?;
            }
            Planned::Group { attrs } => {
                store.create_group(&node_path)?;
                set_attributes(store, &node_path, attrs)?;
            }
        }
    }

    debug!(%path, nodes, "value written");
    Ok(())
}

/// Encode every node of `value` in pre-order, groups before their elements.
fn plan_value(
    registry: &Registry,
    path: &StorePath,
    value: &Value,
    options: &Options,
) -> MarshalResult<Vec<(StorePath, Planned)>> {
    let mut pending: Vec<(StorePath, &Value)> = vec![(path.clone(), value)];
    let mut plan = Vec::new();

    while let Some((node_path, node)) = pending.pop() {
        let marshaler = registry.classify(node)?;
        let ctx = Context::new(&node_path, options);
        let planned = match marshaler.encode(node, &ctx)? {
            Encoded::Leaf { dataset, attrs } => Planned::Leaf { dataset, attrs },
            Encoded::Container { attrs, children } => {
                for (index, child) in children.iter().enumerate().rev() {
                    pending.push((namer::child_path(&node_path, index)?, child));
                }
                Planned::Group { attrs }
            }
        };
        plan.push((node_path, planned));
    }
    Ok(plan)
}

fn set_attributes(
    store: &dyn HierarchicalStore,
    path: &StorePath,
    attrs: Attributes,
) -> MarshalResult<()> {
    for (name, value) in attrs {
        store.set_attribute(path, &name, value)?;
    }
    Ok(())
}

/// A stored node during a read: decoded already, or a group waiting on its
/// elements.
enum Slot {
    Ready(Value),
    Group {
        path: StorePath,
        attrs: Attributes,
        children: Vec<usize>,
    },
    Taken,
}

/// Read the value stored at `path`.
pub fn read_value(
    store: &dyn HierarchicalStore,
    registry: &Registry,
    path: &StorePath,
    options: &Options,
) -> MarshalResult<Value> {
    if store.node_kind(path)?.is_none() {
        return Err(MarshalError::PathNotFound(path.to_string()));
    }
    debug!(%path, regime = %options.regime(), "reading value");

    // Breadth-first: every group's elements land after it in the arena.
    let mut paths = vec![path.clone()];
    let mut slots: Vec<Slot> = Vec::new();
    let mut next = 0;
    while next < paths.len() {
        let node_path = paths[next].clone();
        next += 1;
        let slot = match store.node_kind(&node_path)? {
            None => return Err(MarshalError::PathNotFound(node_path.to_string())),
            Some(NodeKind::Dataset) => {
                let stored = Stored::Leaf {
                    dataset: store.read_dataset(&node_path)?,
                    attrs: store.attributes(&node_path)?,
                };
                Slot::Ready(decode(registry, stored, &Context::new(&node_path, options))?)
            }
            Some(NodeKind::Group) => {
                let attrs = store.attributes(&node_path)?;
                let count = element_count(store, &node_path)?;
                let mut children = Vec::with_capacity(count);
                for index in 0..count {
                    children.push(paths.len());
                    paths.push(namer::child_path(&node_path, index)?);
                }
                Slot::Group {
                    path: node_path,
                    attrs,
                    children,
                }
            }
        };
        slots.push(slot);
    }

    // Elements always sit at higher indices than their group, so a reverse
    // sweep sees every element decoded before its container.
    for index in (0..slots.len()).rev() {
        let slot = mem::replace(&mut slots[index], Slot::Taken);
        let (group_path, attrs, children) = match slot {
            Slot::Group {
                path,
                attrs,
                children,
            } => (path, attrs, children),
            other => {
                slots[index] = other;
                continue;
            }
        };
        let mut values = Vec::with_capacity(children.len());
        for child in children {
            match mem::replace(&mut slots[child], Slot::Taken) {
                Slot::Ready(value) => values.push(value),
                _ => {
                    return Err(MarshalError::corrupt(&group_path, "element visited out of order"))
                }
            }
        }
        let stored = Stored::Container {
            attrs,
            children: values,
        };
        let value = decode(registry, stored, &Context::new(&group_path, options))?;
        slots[index] = Slot::Ready(value);
    }

    match slots.into_iter().next() {
        Some(Slot::Ready(value)) => {
            debug!(%path, kind = %value.kind(), "value read");
            Ok(value)
        }
        _ => Err(MarshalError::PathNotFound(path.to_string())),
    }
}

/// Number of elements in a stored container. Element names must be exactly
/// the names for indices `0..n`.
fn element_count(store: &dyn HierarchicalStore, path: &StorePath) -> MarshalResult<usize> {
    let names = store.list_children(path)?;
    let mut indices = Vec::with_capacity(names.len());
    for name in &names {
        let index = namer::parse_child_name(name)
            .ok_or_else(|| MarshalError::corrupt(path, format!("unexpected child {name:?}")))?;
        indices.push(index);
    }
    indices.sort_unstable();
    for (expected, index) in indices.iter().enumerate() {
        if *index != expected {
            return Err(MarshalError::corrupt(
                path,
                format!("element {expected} missing from {} stored elements", names.len()),
            ));
        }
    }
    Ok(indices.len())
}

/// Decode one node: through its type tag when the options store tags,
/// otherwise (or when the tag is unknown) by inference from its layout.
fn decode(registry: &Registry, stored: Stored, ctx: &Context<'_>) -> MarshalResult<Value> {
    if ctx.tagged() {
        if let Some(tag) = ctx.str_attr(stored.attrs(), TYPE_ATTR)? {
            match registry.marshaler_for_tag(tag, ctx.path) {
                Ok((tag, marshaler)) => return marshaler.decode(tag, stored, ctx),
                Err(MarshalError::UnknownTypeTag { tag, .. }) => {
                    warn!(
                        path = %ctx.path, %tag,
                        "unknown type tag, inferring type from layout"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }
    infer(stored, ctx)
}

/// Reconstruct a node without type information.
pub fn infer(stored: Stored, ctx: &Context<'_>) -> MarshalResult<Value> {
    match stored {
        Stored::Leaf { dataset, attrs } => array::infer_leaf(dataset, &attrs, ctx),
        Stored::Container { attrs, children } => {
            container::object_array(&attrs, children, ctx).map(Value::ObjectArray)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_store::{AttrValue, Dtype, InMemoryStore};
    use strata_types::{
        Collection, CollectionKind, ElementKind, Float16, NumericArray, ObjectArray, Shape,
    };

    fn path(s: &str) -> StorePath {
        StorePath::parse(s).unwrap()
    }

    fn roundtrip(value: &Value, options: &Options) -> Value {
        let store = InMemoryStore::new();
        let registry = Registry::default();
        write_value(&store, &registry, &path("/v"), value, options).unwrap();
        read_value(&store, &registry, &path("/v"), options).unwrap()
    }

    #[test]
    fn nested_containers_roundtrip() {
        let inner = ObjectArray::new([2, 1], vec![Value::from("x"), Value::Null]).unwrap();
        let value = Value::list(vec![
            Value::Int(1),
            Value::ObjectArray(inner),
            Value::Collection(Collection::new(
                CollectionKind::FrozenSet,
                vec![Value::Bytes(b"k".to_vec())],
            )),
        ]);
        assert_eq!(roundtrip(&value, &Options::default()), value);
        assert_eq!(roundtrip(&value, &Options::fidelity()), value);
    }

    #[test]
    fn elements_are_named_by_index() {
        let store = InMemoryStore::new();
        let value = Value::list((0..12).map(Value::Int).collect());
        let options = Options::fidelity();
        write_value(&store, &Registry::default(), &path("/l"), &value, &options).unwrap();
        let names = store.list_children(&path("/l")).unwrap();
        assert_eq!(names.first().map(String::as_str), Some("a0"));
        assert_eq!(names.last().map(String::as_str), Some("b11"));
    }

    #[test]
    fn deep_nesting_roundtrips() {
        let mut value = Value::Int(0);
        for _ in 0..1_000 {
            value = Value::list(vec![value]);
        }
        let store = InMemoryStore::new();
        let registry = Registry::default();
        let options = Options::fidelity();
        write_value(&store, &registry, &path("/deep"), &value, &options).unwrap();
        let back = read_value(&store, &registry, &path("/deep"), &options).unwrap();

        let mut depth = 0;
        let mut cur = &back;
        while let Value::Collection(c) = cur {
            cur = &c.elements()[0];
            depth += 1;
        }
        assert_eq!(depth, 1_000);
        assert_eq!(cur, &Value::Int(0));
    }

    #[test]
    fn writing_replaces_existing_node() {
        let store = InMemoryStore::new();
        let registry = Registry::default();
        let options = Options::fidelity();
        let list = Value::list(vec![Value::Int(1); 3]);
        write_value(&store, &registry, &path("/v"), &list, &options).unwrap();
        write_value(&store, &registry, &path("/v"), &Value::Float(2.0), &options).unwrap();
        let back = read_value(&store, &registry, &path("/v"), &options).unwrap();
        assert_eq!(back, Value::Float(2.0));
    }

    #[test]
    fn rejected_value_keeps_existing_node() {
        let store = InMemoryStore::new();
        let registry = Registry::default();
        let options = Options::matlab();
        write_value(&store, &registry, &path("/v"), &Value::Int(1), &options).unwrap();
        let before = read_value(&store, &registry, &path("/v"), &options).unwrap();

        let half = Value::Numeric(NumericArray::scalar(Float16::from_bits(0x3c00)));
        let value = Value::list(vec![Value::Int(2), half]);
        let err = write_value(&store, &registry, &path("/v"), &value, &options).unwrap_err();
        assert!(matches!(err, MarshalError::UnsupportedType { .. }), "{err}");

        assert_eq!(store.node_kind(&path("/v")).unwrap(), Some(NodeKind::Dataset));
        assert_eq!(read_value(&store, &registry, &path("/v"), &options).unwrap(), before);
    }

    #[test]
    fn root_and_dataset_ancestors_conflict() {
        let store = InMemoryStore::new();
        let registry = Registry::default();
        let options = Options::default();
        let root = StorePath::root();
        let err = write_value(&store, &registry, &root, &Value::Null, &options).unwrap_err();
        assert!(matches!(err, MarshalError::PathConflict { .. }));

        write_value(&store, &registry, &path("/a"), &Value::Int(1), &options).unwrap();
        let nested = path("/a/b");
        let err = write_value(&store, &registry, &nested, &Value::Int(2), &options).unwrap_err();
        assert!(matches!(err, MarshalError::PathConflict { .. }));
    }

    #[test]
    fn missing_path_is_not_found() {
        let store = InMemoryStore::new();
        let options = Options::default();
        let err = read_value(&store, &Registry::default(), &path("/nope"), &options).unwrap_err();
        assert!(matches!(err, MarshalError::PathNotFound(ref p) if p == "/nope"));
    }

    #[test]
    fn unsupported_kind_fails_before_writing() {
        let store = InMemoryStore::new();
        let registry = Registry::default().without(strata_types::TypeKind::Null);
        let options = Options::default();
        let err = write_value(&store, &registry, &path("/n"), &Value::Null, &options).unwrap_err();
        assert!(matches!(err, MarshalError::UnsupportedType { .. }));
        assert!(!store.exists(&path("/n")).unwrap());
    }

    #[test]
    fn unknown_tag_falls_back_to_inference() {
        let store = InMemoryStore::new();
        let data = NumericArray::from_vec([2], vec![1.5f32, 2.5]).unwrap();
        let (kind, shape, bytes) = data.clone().into_parts();
        let ds = Dataset::new(Dtype::Numeric(kind), shape, bytes).unwrap();
        store.create_dataset(&path("/x"), ds).unwrap();
        store
            .set_attribute(&path("/x"), TYPE_ATTR, AttrValue::from("numpy.recarray"))
            .unwrap();
        let options = Options::fidelity();
        let value = read_value(&store, &Registry::default(), &path("/x"), &options).unwrap();
        assert_eq!(value, Value::Numeric(data));
    }

    #[test]
    fn untagged_group_reads_as_object_array() {
        let store = InMemoryStore::new();
        store.create_group(&path("/g")).unwrap();
        for i in 0..2 {
            let dtype = Dtype::Numeric(ElementKind::UInt8);
            let ds = Dataset::new(dtype, Shape::scalar(), vec![i as u8]).unwrap();
            store.create_dataset(&namer::child_path(&path("/g"), i).unwrap(), ds).unwrap();
        }
        let options = Options::default();
        let value = read_value(&store, &Registry::default(), &path("/g"), &options).unwrap();
        let expected = ObjectArray::new(
            [2],
            vec![
                Value::Numeric(NumericArray::scalar(0u8)),
                Value::Numeric(NumericArray::scalar(1u8)),
            ],
        )
        .unwrap();
        assert_eq!(value, Value::ObjectArray(expected));
    }

    #[test]
    fn gaps_in_element_names_are_corrupt() {
        let store = InMemoryStore::new();
        let dtype = Dtype::Numeric(ElementKind::UInt8);
        let ds = Dataset::new(dtype, Shape::scalar(), vec![0]).unwrap();
        store.create_dataset(&path("/g/a0"), ds.clone()).unwrap();
        store.create_dataset(&path("/g/a2"), ds).unwrap();
        let options = Options::bare();
        let err = read_value(&store, &Registry::default(), &path("/g"), &options).unwrap_err();
        assert!(matches!(err, MarshalError::CorruptMetadata { .. }));
    }

    #[test]
    fn foreign_child_names_are_corrupt() {
        let store = InMemoryStore::new();
        store.create_group(&path("/g/notes")).unwrap();
        let options = Options::bare();
        let err = read_value(&store, &Registry::default(), &path("/g"), &options).unwrap_err();
        assert!(matches!(err, MarshalError::CorruptMetadata { .. }));
    }

    #[test]
    fn malformed_tag_attribute_is_corrupt() {
        let store = InMemoryStore::new();
        let dtype = Dtype::Numeric(ElementKind::UInt8);
        let ds = Dataset::new(dtype, Shape::scalar(), vec![0]).unwrap();
        store.create_dataset(&path("/x"), ds).unwrap();
        store.set_attribute(&path("/x"), TYPE_ATTR, AttrValue::Int(3)).unwrap();
        let options = Options::fidelity();
        let err = read_value(&store, &Registry::default(), &path("/x"), &options).unwrap_err();
        assert!(matches!(err, MarshalError::CorruptMetadata { .. }));
    }
}
