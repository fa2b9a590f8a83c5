//! Value model for the strata marshaling engine.
//!
//! Every value the engine can persist is a [`Value`]: scalars
//! and strings, dense numeric arrays, fixed-width string arrays, object
//! arrays, and sequence collections. Containers nest arbitrarily (the model
//! is a tree, never a graph).
//!
//! # Key Types
//!
//! - [`Value`] -- tagged variant over all representable values
//! - [`TypeKind`] -- classification used to pick a marshaler
//! - [`ElementKind`] -- numeric element kinds (`bool` through `complex128`)
//! - [`Shape`] -- array dimensions
//! - [`NumericArray`], [`TextArray`], [`BytesArray`], [`ObjectArray`] -- array values
//! - [`Collection`] -- list, tuple, set, frozenset, or deque

pub mod array;
pub mod element;
pub mod error;
pub mod shape;
pub mod value;

pub use array::{BytesArray, NumericArray, ObjectArray, TextArray};
pub use element::{Complex, Element, ElementKind, Float16};
pub use error::{TypeError, TypeResult};
pub use shape::Shape;
pub use value::{Collection, CollectionKind, TypeKind, Value};
