//! Marshaling engine for strata.
//!
//! Writes trees of [`Value`](strata_types::Value)s into a
//! [`HierarchicalStore`](strata_store::HierarchicalStore) and reads them
//! back. How much is recorded depends on the [`Regime`] selected by the
//! [`Options`]:
//!
//! - **Fidelity** -- type tags are stored alongside the data, so every value
//!   reads back as exactly what was written
//! - **Matlab** -- shapes and string layouts follow MATLAB's conventions and
//!   only the `MATLAB_class` attributes are added
//! - **Bare** -- plain data with no metadata beyond container shapes
//!
//! The [`Layout`] is chosen separately. With both flags set (the default)
//! datasets take MATLAB's shapes and classes and still carry type tags, so
//! MATLAB can load the file and reads here remain exact.
//!
//! # Quick Start
//!
//! ```rust
//! use strata_marshal::{Container, Marshaller, Options};
//! use strata_store::InMemoryStore;
//! use strata_types::Value;
//!
//! let store = InMemoryStore::new();
//! let marshaller = Marshaller::new(Options::default());
//! let value = Value::list(vec![Value::Int(1), Value::from("two")]);
//! marshaller.write(&store, "/data/pair", &value).unwrap();
//! assert_eq!(marshaller.read(&store, "/data/pair").unwrap(), value);
//!
//! // The same, through a scoped container handle.
//! let options = Options::default();
//! strata_marshal::write(&value, "/copy", Container::store(&store), &options).unwrap();
//! ```
//!
//! # Layout Rules
//!
//! 1. A container becomes a group whose elements are named by [`namer`].
//! 2. Everything else becomes a single dataset.
//! 3. Writing over an existing path replaces whatever was there.
//! 4. Unknown type tags fall back to reading by inference.

pub mod api;
pub mod codec;
pub mod engine;
pub mod error;
pub mod marshalers;
pub mod namer;
pub mod options;
pub mod registry;
pub mod tags;
pub mod transform;

// Re-exports for convenience.
pub use api::{read, read_many, write, write_many, Container, Marshaller};
pub use error::{MarshalError, MarshalResult};
pub use marshalers::{Context, Encoded, Marshaler, Stored};
pub use options::{Layout, Options, Regime};
pub use registry::Registry;
pub use tags::TypeTag;
