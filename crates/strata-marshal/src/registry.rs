use std::collections::HashMap;
use std::fmt;

use strata_store::StorePath;
use strata_types::{TypeKind, Value};

use crate::error::{MarshalError, MarshalResult};
use crate::marshalers::{
    ArrayMarshaler, ContainerMarshaler, Marshaler, NullMarshaler, ScalarMarshaler, StringMarshaler,
};
use crate::tags::TypeTag;

/// Dispatch table from value kinds and type tags to marshalers.
///
/// Later registrations take over the kinds and tags they claim from earlier
/// ones.
pub struct Registry {
    marshalers: Vec<Box<dyn Marshaler>>,
    by_kind: HashMap<TypeKind, usize>,
    by_tag: HashMap<TypeTag, usize>,
}

impl Registry {
    /// An empty registry. Every value is unsupported until marshalers are
    /// registered.
    pub fn new() -> Self {
        Self {
            marshalers: Vec::new(),
            by_kind: HashMap::new(),
            by_tag: HashMap::new(),
        }
    }

    /// A registry covering every [`Value`] variant.
    pub fn with_default_marshalers() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(NullMarshaler));
        registry.register(Box::new(ScalarMarshaler));
        registry.register(Box::new(StringMarshaler));
        registry.register(Box::new(ArrayMarshaler));
        registry.register(Box::new(ContainerMarshaler));
        registry
    }

    /// Add a marshaler, taking over every kind and tag it claims.
    pub fn register(&mut self, marshaler: Box<dyn Marshaler>) {
        let index = self.marshalers.len();
        for kind in marshaler.kinds() {
            self.by_kind.insert(*kind, index);
        }
        for tag in marshaler.tags() {
            self.by_tag.insert(*tag, index);
        }
        self.marshalers.push(marshaler);
    }

    /// Stop writing values of `kind`. Stored tags stay readable.
    pub fn without(mut self, kind: TypeKind) -> Self {
        self.by_kind.remove(&kind);
        self
    }

    /// The marshaler responsible for writing `value`.
    pub fn classify(&self, value: &Value) -> MarshalResult<&dyn Marshaler> {
        self.marshaler_for(value.kind())
    }

    pub fn marshaler_for(&self, kind: TypeKind) -> MarshalResult<&dyn Marshaler> {
        self.by_kind
            .get(&kind)
            .map(|i| self.marshalers[*i].as_ref())
            .ok_or_else(|| MarshalError::unsupported(kind.name(), "no marshaler registered"))
    }

    /// The marshaler that reads nodes tagged `tag`, with the parsed tag.
    pub fn marshaler_for_tag(
        &self,
        tag: &str,
        path: &StorePath,
    ) -> MarshalResult<(TypeTag, &dyn Marshaler)> {
        TypeTag::parse(tag)
            .and_then(|parsed| {
                self.by_tag
                    .get(&parsed)
                    .map(|i| (parsed, self.marshalers[*i].as_ref()))
            })
            .ok_or_else(|| MarshalError::UnknownTypeTag {
                path: path.to_string(),
                tag: tag.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.marshalers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marshalers.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_default_marshalers()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.marshalers.iter().map(|m| m.name()).collect();
        f.debug_struct("Registry").field("marshalers", &names).finish()
    }
}
