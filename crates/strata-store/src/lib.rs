//! Hierarchical storage for strata.
//!
//! A store is a tree of named nodes addressed by absolute POSIX-style
//! paths. Each node is either a group (which holds children) or a dataset
//! (a typed, shaped block of bytes). Both kinds carry a table of named
//! attributes.
//!
//! # Storage Backends
//!
//! All backends implement the [`HierarchicalStore`] trait:
//!
//! - [`InMemoryStore`] -- lock-guarded node tree for tests and embedding
//! - [`ContainerFile`] -- an in-memory tree persisted to a single checksummed file
//!
//! # Design Rules
//!
//! 1. Missing intermediate groups are created on demand.
//! 2. Children are listed in ascending byte order of their names.
//! 3. The store never interprets dataset bytes or attribute values.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod file;
pub mod memory;
pub mod node;
pub mod path;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::ContainerFile;
pub use memory::InMemoryStore;
pub use node::{AttrValue, Attributes, Dataset, DatasetNode, Dtype, Group, Node, NodeKind};
pub use path::StorePath;
pub use traits::HierarchicalStore;
