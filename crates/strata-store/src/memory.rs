use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::node::{AttrValue, Attributes, Dataset, DatasetNode, Group, Node, NodeKind};
use crate::path::StorePath;
use crate::traits::HierarchicalStore;

/// In-memory, tree-shaped hierarchical store.
///
/// Intended for tests and embedding, and as the working copy behind
/// [`ContainerFile`](crate::ContainerFile). The whole tree sits behind a
/// `RwLock`; datasets are cloned on read.
pub struct InMemoryStore {
    root: RwLock<Node>,
}

impl InMemoryStore {
    /// Create a store holding only an empty root group.
    pub fn new() -> Self {
        Self::from_root(Group::default())
    }

    /// Create a store from an existing root group.
    pub fn from_root(root: Group) -> Self {
        Self {
            root: RwLock::new(Node::Group(root)),
        }
    }

    /// Clone of the entire tree, rooted at `/`.
    pub fn snapshot(&self) -> Group {
        match &*self.root.read().expect("lock poisoned") {
            Node::Group(g) => g.clone(),
            Node::Dataset(_) => Group::default(),
        }
    }

    /// Total number of nodes below the root.
    pub fn node_count(&self) -> usize {
        fn count(node: &Node) -> usize {
            match node {
                Node::Group(g) => g.children.values().map(|c| 1 + count(c)).sum(),
                Node::Dataset(_) => 0,
            }
        }
        count(&self.root.read().expect("lock poisoned"))
    }

    /// Returns `true` if the root group has no children.
    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }

    /// Remove every node and root attribute.
    pub fn clear(&self) {
        *self.root.write().expect("lock poisoned") = Node::Group(Group::default());
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup<'a>(root: &'a Node, path: &StorePath) -> Option<&'a Node> {
    let mut cur = root;
    for segment in path.segments() {
        cur = match cur {
            Node::Group(g) => g.children.get(segment)?,
            Node::Dataset(_) => return None,
        };
    }
    Some(cur)
}

fn lookup_mut<'a>(root: &'a mut Node, path: &StorePath) -> Option<&'a mut Node> {
    let mut cur = root;
    for segment in path.segments() {
        cur = match cur {
            Node::Group(g) => g.children.get_mut(segment)?,
            Node::Dataset(_) => return None,
        };
    }
    Some(cur)
}

/// Walk to the group at `path`, creating missing groups on the way.
fn ensure_group<'a>(root: &'a mut Node, path: &StorePath) -> StoreResult<&'a mut Group> {
    let mut cur = match root {
        Node::Group(g) => g,
        Node::Dataset(_) => return Err(StoreError::NotAGroup("/".into())),
    };
    let mut walked = String::new();
    for segment in path.segments() {
        walked.push('/');
        walked.push_str(segment);
        let child = cur
            .children
            .entry(segment.to_string())
            .or_insert_with(|| Node::Group(Group::default()));
        cur = match child {
            Node::Group(g) => g,
            Node::Dataset(_) => return Err(StoreError::NotAGroup(walked)),
        };
    }
    Ok(cur)
}

impl HierarchicalStore for InMemoryStore {
    fn create_group(&self, path: &StorePath) -> StoreResult<()> {
        let mut root = self.root.write().expect("lock poisoned");
        ensure_group(&mut root, path).map(|_| ())
    }

    fn create_dataset(&self, path: &StorePath, dataset: Dataset) -> StoreResult<()> {
        let (parent, name) = match (path.parent(), path.name()) {
            (Some(parent), Some(name)) => (parent, name),
            _ => return Err(StoreError::AlreadyExists(path.to_string())),
        };
        let mut root = self.root.write().expect("lock poisoned");
        let group = ensure_group(&mut root, &parent)?;
        if group.children.contains_key(name) {
            return Err(StoreError::AlreadyExists(path.to_string()));
        }
        group.children.insert(
            name.to_string(),
            Node::Dataset(DatasetNode {
                dataset,
                attrs: Attributes::new(),
            }),
        );
        Ok(())
    }

    fn set_attribute(&self, path: &StorePath, name: &str, value: AttrValue) -> StoreResult<()> {
        let mut root = self.root.write().expect("lock poisoned");
        let node =
            lookup_mut(&mut root, path).ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        node.attrs_mut().insert(name.to_string(), value);
        Ok(())
    }

    fn attribute(&self, path: &StorePath, name: &str) -> StoreResult<Option<AttrValue>> {
        let root = self.root.read().expect("lock poisoned");
        let node = lookup(&root, path).ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        Ok(node.attrs().get(name).cloned())
    }

    fn attributes(&self, path: &StorePath) -> StoreResult<Attributes> {
        let root = self.root.read().expect("lock poisoned");
        let node = lookup(&root, path).ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        Ok(node.attrs().clone())
    }

    fn read_dataset(&self, path: &StorePath) -> StoreResult<Dataset> {
        let root = self.root.read().expect("lock poisoned");
        match lookup(&root, path) {
            Some(Node::Dataset(d)) => Ok(d.dataset.clone()),
            Some(Node::Group(_)) => Err(StoreError::NotADataset(path.to_string())),
            None => Err(StoreError::NotFound(path.to_string())),
        }
    }

    fn node_kind(&self, path: &StorePath) -> StoreResult<Option<NodeKind>> {
        let root = self.root.read().expect("lock poisoned");
        Ok(lookup(&root, path).map(Node::kind))
    }

    fn list_children(&self, path: &StorePath) -> StoreResult<Vec<String>> {
        let root = self.root.read().expect("lock poisoned");
        match lookup(&root, path) {
            Some(Node::Group(g)) => Ok(g.children.keys().cloned().collect()),
            Some(Node::Dataset(_)) => Err(StoreError::NotAGroup(path.to_string())),
            None => Err(StoreError::NotFound(path.to_string())),
        }
    }

    fn remove(&self, path: &StorePath) -> StoreResult<bool> {
        let mut root = self.root.write().expect("lock poisoned");
        let (parent, name) = match (path.parent(), path.name()) {
            (Some(parent), Some(name)) => (parent, name),
            _ => {
                *root = Node::Group(Group::default());
                return Ok(true);
            }
        };
        match lookup_mut(&mut root, &parent) {
            Some(Node::Group(g)) => Ok(g.children.remove(name).is_some()),
            _ => Ok(false),
        }
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("node_count", &self.node_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Dtype;
    use strata_types::{ElementKind, Shape};

    fn path(s: &str) -> StorePath {
        StorePath::parse(s).unwrap()
    }

    fn scalar_i64(v: i64) -> Dataset {
        Dataset::new(
            Dtype::Numeric(ElementKind::Int64),
            Shape::scalar(),
            v.to_le_bytes().to_vec(),
        )
        .unwrap()
    }

    // -----------------------------------------------------------------------
    // Groups and datasets
    // -----------------------------------------------------------------------

    #[test]
    fn dataset_creates_intermediate_groups() {
        let store = InMemoryStore::new();
        store.create_dataset(&path("/a/b/c"), scalar_i64(5)).unwrap();

        assert_eq!(store.node_kind(&path("/a")).unwrap(), Some(NodeKind::Group));
        assert_eq!(store.node_kind(&path("/a/b")).unwrap(), Some(NodeKind::Group));
        assert_eq!(store.node_kind(&path("/a/b/c")).unwrap(), Some(NodeKind::Dataset));
        assert_eq!(store.node_count(), 3);
    }

    #[test]
    fn write_and_read_dataset() {
        let store = InMemoryStore::new();
        let ds = scalar_i64(-9);
        store.create_dataset(&path("/x"), ds.clone()).unwrap();
        assert_eq!(store.read_dataset(&path("/x")).unwrap(), ds);
    }

    #[test]
    fn create_group_is_idempotent() {
        let store = InMemoryStore::new();
        store.create_group(&path("/g")).unwrap();
        store.create_group(&path("/g")).unwrap();
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn dataset_cannot_be_overwritten() {
        let store = InMemoryStore::new();
        store.create_dataset(&path("/x"), scalar_i64(1)).unwrap();
        let err = store.create_dataset(&path("/x"), scalar_i64(2)).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[test]
    fn cannot_create_beneath_dataset() {
        let store = InMemoryStore::new();
        store.create_dataset(&path("/x"), scalar_i64(1)).unwrap();
        let err = store.create_dataset(&path("/x/y"), scalar_i64(2)).unwrap_err();
        assert!(matches!(err, StoreError::NotAGroup(ref p) if p == "/x"));
        assert!(matches!(
            store.create_group(&path("/x")).unwrap_err(),
            StoreError::NotAGroup(_)
        ));
    }

    #[test]
    fn root_cannot_be_a_dataset() {
        let store = InMemoryStore::new();
        let err = store.create_dataset(&StorePath::root(), scalar_i64(1)).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[test]
    fn read_group_as_dataset_fails() {
        let store = InMemoryStore::new();
        store.create_group(&path("/g")).unwrap();
        assert!(matches!(
            store.read_dataset(&path("/g")).unwrap_err(),
            StoreError::NotADataset(_)
        ));
        assert!(matches!(
            store.read_dataset(&path("/missing")).unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    // -----------------------------------------------------------------------
    // Attributes
    // -----------------------------------------------------------------------

    #[test]
    fn attributes_on_groups_and_datasets() {
        let store = InMemoryStore::new();
        store.create_group(&path("/g")).unwrap();
        store.create_dataset(&path("/g/d"), scalar_i64(0)).unwrap();

        store.set_attribute(&path("/g"), "kind", "list".into()).unwrap();
        store.set_attribute(&path("/g/d"), "n", AttrValue::Int(3)).unwrap();

        assert_eq!(store.attribute(&path("/g"), "kind").unwrap(), Some("list".into()));
        assert_eq!(store.attribute(&path("/g/d"), "n").unwrap(), Some(AttrValue::Int(3)));
        assert_eq!(store.attribute(&path("/g"), "absent").unwrap(), None);
        assert_eq!(store.attributes(&path("/g")).unwrap().len(), 1);
    }

    #[test]
    fn attribute_on_missing_node_fails() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.set_attribute(&path("/nope"), "a", AttrValue::Int(1)).unwrap_err(),
            StoreError::NotFound(_)
        ));
        assert!(store.attribute(&path("/nope"), "a").is_err());
    }

    // -----------------------------------------------------------------------
    // Listing and removal
    // -----------------------------------------------------------------------

    #[test]
    fn children_are_sorted() {
        let store = InMemoryStore::new();
        for name in ["c", "a", "b"] {
            store.create_dataset(&path(&format!("/g/{name}")), scalar_i64(0)).unwrap();
        }
        assert_eq!(store.list_children(&path("/g")).unwrap(), vec!["a", "b", "c"]);
        assert!(store.list_children(&path("/g/a")).is_err());
    }

    #[test]
    fn remove_detaches_subtree() {
        let store = InMemoryStore::new();
        store.create_dataset(&path("/g/h/d"), scalar_i64(0)).unwrap();
        assert!(store.remove(&path("/g/h")).unwrap());
        assert!(!store.exists(&path("/g/h/d")).unwrap());
        assert!(store.exists(&path("/g")).unwrap());
        assert!(!store.remove(&path("/g/h")).unwrap());
    }

    #[test]
    fn remove_root_clears_everything() {
        let store = InMemoryStore::new();
        store.create_dataset(&path("/a"), scalar_i64(0)).unwrap();
        assert!(store.remove(&StorePath::root()).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn snapshot_roundtrips_through_from_root() {
        let store = InMemoryStore::new();
        store.create_dataset(&path("/a/b"), scalar_i64(4)).unwrap();
        let copy = InMemoryStore::from_root(store.snapshot());
        assert_eq!(copy.read_dataset(&path("/a/b")).unwrap(), scalar_i64(4));
    }

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryStore::new());
        store.create_dataset(&path("/shared"), scalar_i64(42)).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let ds = store.read_dataset(&StorePath::parse("/shared").unwrap()).unwrap();
                    assert_eq!(ds.data(), &42i64.to_le_bytes());
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
    }

    #[test]
    fn debug_format() {
        let store = InMemoryStore::new();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryStore"));
        assert!(debug.contains("node_count"));
    }
}
