use crate::error::StoreResult;
use crate::node::{AttrValue, Attributes, Dataset, NodeKind};
use crate::path::StorePath;

/// A named hierarchical store of groups and datasets.
///
/// All implementations must satisfy these invariants:
/// - Intermediate groups are created on demand by `create_group` and
///   `create_dataset`.
/// - Creating beneath a dataset fails with `NotAGroup`.
/// - `list_children` returns names in ascending byte order.
/// - The store never interprets dataset bytes or attribute values.
/// - All I/O errors are propagated, never silently ignored.
pub trait HierarchicalStore: Send + Sync {
    /// Create a group (and any missing ancestors).
    ///
    /// Succeeds without change if a group already exists at `path`.
    fn create_group(&self, path: &StorePath) -> StoreResult<()>;

    /// Create a dataset (and any missing ancestor groups).
    ///
    /// Fails with `AlreadyExists` if any node already occupies `path`.
    fn create_dataset(&self, path: &StorePath, dataset: Dataset) -> StoreResult<()>;

    /// Set (or replace) an attribute on an existing node.
    fn set_attribute(&self, path: &StorePath, name: &str, value: AttrValue) -> StoreResult<()>;

    /// Read one attribute. Returns `Ok(None)` if the node lacks it.
    fn attribute(&self, path: &StorePath, name: &str) -> StoreResult<Option<AttrValue>>;

    /// Read every attribute of a node.
    fn attributes(&self, path: &StorePath) -> StoreResult<Attributes>;

    /// Read a dataset's dtype, shape and bytes.
    fn read_dataset(&self, path: &StorePath) -> StoreResult<Dataset>;

    /// Kind of the node at `path`, or `None` if nothing exists there.
    fn node_kind(&self, path: &StorePath) -> StoreResult<Option<NodeKind>>;

    /// Names of a group's children, sorted.
    fn list_children(&self, path: &StorePath) -> StoreResult<Vec<String>>;

    /// Remove a node and its subtree. Returns `true` if it existed.
    fn remove(&self, path: &StorePath) -> StoreResult<bool>;

    /// Check whether a node exists at `path`.
    fn exists(&self, path: &StorePath) -> StoreResult<bool> {
        Ok(self.node_kind(path)?.is_some())
    }

    /// Persist buffered changes. In-memory backends have nothing to do.
    fn flush(&self) -> StoreResult<()> {
        Ok(())
    }
}
