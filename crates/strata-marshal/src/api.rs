use std::path::Path;

use strata_store::{ContainerFile, HierarchicalStore, StorePath};
use strata_types::Value;
use tracing::debug;

use crate::engine;
use crate::error::MarshalResult;
use crate::options::Options;
use crate::registry::Registry;

/// Where values are written to or read from.
#[derive(Clone, Copy)]
pub enum Container<'a> {
    /// A store the caller already holds open.
    Store(&'a dyn HierarchicalStore),
    /// A container file, opened for the duration of one call and closed on
    /// every exit path.
    File(&'a Path),
}

impl<'a> Container<'a> {
    pub fn store(store: &'a dyn HierarchicalStore) -> Self {
        Self::Store(store)
    }

    pub fn file(path: &'a (impl AsRef<Path> + ?Sized)) -> Self {
        Self::File(path.as_ref())
    }
}

impl std::fmt::Debug for Container<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(_) => f.write_str("Container::Store"),
            Self::File(path) => f.debug_tuple("Container::File").field(path).finish(),
        }
    }
}

/// A registry and options bundled for repeated use.
#[derive(Debug, Default)]
pub struct Marshaller {
    registry: Registry,
    options: Options,
}

impl Marshaller {
    /// A marshaller with the built-in marshalers.
    pub fn new(options: Options) -> Self {
        Self::with_registry(Registry::with_default_marshalers(), options)
    }

    pub fn with_registry(registry: Registry, options: Options) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Write `value` at the absolute path `name` in `store`.
    pub fn write(
        &self,
        store: &dyn HierarchicalStore,
        name: &str,
        value: &Value,
    ) -> MarshalResult<()> {
        let path = StorePath::parse(name)?;
        engine::write_value(store, &self.registry, &path, value, &self.options)
    }

    /// Read the value at the absolute path `name` in `store`.
    pub fn read(&self, store: &dyn HierarchicalStore, name: &str) -> MarshalResult<Value> {
        let path = StorePath::parse(name)?;
        engine::read_value(store, &self.registry, &path, &self.options)
    }

    /// Write several values under one acquisition of `container`.
    pub fn write_many<'v>(
        &self,
        items: impl IntoIterator<Item = (&'v str, &'v Value)>,
        container: Container<'_>,
    ) -> MarshalResult<()> {
        with_store(container, Access::Write, |store| {
            for (name, value) in items {
                self.write(store, name, value)?;
            }
            Ok(())
        })
    }

    /// Read several values under one acquisition of `container`, in the
    /// order of `names`.
    pub fn read_many<'n>(
        &self,
        names: impl IntoIterator<Item = &'n str>,
        container: Container<'_>,
    ) -> MarshalResult<Vec<Value>> {
        with_store(container, Access::Read, |store| {
            names.into_iter().map(|name| self.read(store, name)).collect()
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

/// Run `op` against the container's store. File containers are opened
/// first and closed afterwards whether or not `op` succeeded; an error from
/// `op` takes precedence over an error closing the file.
fn with_store<T>(
    container: Container<'_>,
    access: Access,
    op: impl FnOnce(&dyn HierarchicalStore) -> MarshalResult<T>,
) -> MarshalResult<T> {
    match container {
        Container::Store(store) => op(store),
        Container::File(path) => {
            let file = match access {
                Access::Write => ContainerFile::open_or_create(path)?,
                Access::Read => ContainerFile::open_read_only(path)?,
            };
            debug!(path = %path.display(), ?access, "container opened");
            let result = op(&file);
            let closed = file.close();
            let value = result?;
            closed?;
            Ok(value)
        }
    }
}

/// Write `value` at the absolute path `name` in `container`.
///
/// # Examples
///
/// ```
/// use strata_marshal::{read, write, Container, Options};
/// use strata_store::InMemoryStore;
/// use strata_types::Value;
///
/// let store = InMemoryStore::new();
/// let options = Options::default();
/// write(&Value::Int(42), "/answer", Container::store(&store), &options).unwrap();
/// let back = read("/answer", Container::store(&store), &options).unwrap();
/// assert_eq!(back, Value::Int(42));
/// ```
pub fn write(
    value: &Value,
    name: &str,
    container: Container<'_>,
    options: &Options,
) -> MarshalResult<()> {
    write_many([(name, value)], container, options)
}

/// Read the value at the absolute path `name` in `container`.
pub fn read(name: &str, container: Container<'_>, options: &Options) -> MarshalResult<Value> {
    let mut values = read_many([name], container, options)?;
    Ok(values.remove(0))
}

/// Write several `(name, value)` pairs under one acquisition of `container`.
pub fn write_many<'v>(
    items: impl IntoIterator<Item = (&'v str, &'v Value)>,
    container: Container<'_>,
    options: &Options,
) -> MarshalResult<()> {
    Marshaller::new(options.clone()).write_many(items, container)
}

/// Read the values at `names` under one acquisition of `container`.
pub fn read_many<'n>(
    names: impl IntoIterator<Item = &'n str>,
    container: Container<'_>,
    options: &Options,
) -> MarshalResult<Vec<Value>> {
    Marshaller::new(options.clone()).read_many(names, container)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MarshalError;
    use strata_store::{InMemoryStore, StoreError};
    use strata_types::{Collection, CollectionKind};

    #[test]
    fn file_roundtrip_closes_container() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.strata");
        let value = Value::list(vec![Value::from("a"), Value::Float(f64::NAN)]);
        let options = Options::default();

        write(&value, "/x/y", Container::file(&file), &options).unwrap();
        assert!(file.exists());
        assert_eq!(read("/x/y", Container::file(&file), &options).unwrap(), value);
    }

    #[test]
    fn failed_write_still_closes_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.strata");
        let options = Options::default();
        write(&Value::Int(1), "/a", Container::file(&file), &options).unwrap();

        let err = write(&Value::Int(2), "/a/b", Container::file(&file), &options).unwrap_err();
        assert!(matches!(err, MarshalError::PathConflict { .. }));
        // The container is still readable and unchanged.
        assert_eq!(read("/a", Container::file(&file), &options).unwrap(), Value::Int(1));
    }

    #[test]
    fn reading_a_missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("absent");
        let err = read("/a", Container::file(&absent), &Options::default()).unwrap_err();
        assert!(matches!(err, MarshalError::Store(StoreError::Io(_))));
    }

    #[test]
    fn relative_names_are_rejected() {
        let store = InMemoryStore::new();
        let options = Options::default();
        let err = write(&Value::Null, "rel", Container::store(&store), &options).unwrap_err();
        assert!(matches!(err, MarshalError::Store(StoreError::InvalidPath { .. })));
    }

    #[test]
    fn many_values_share_one_container() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("many.strata");
        let options = Options::fidelity();
        let a = Value::Int(1);
        let b = Value::Collection(Collection::new(CollectionKind::Set, vec![Value::from("s")]));
        write_many([("/a", &a), ("/g/b", &b)], Container::file(&file), &options).unwrap();

        let values = read_many(["/g/b", "/a"], Container::file(&file), &options).unwrap();
        assert_eq!(values, vec![b, a]);
    }

    #[test]
    fn marshaller_works_on_any_store() {
        let store = InMemoryStore::new();
        let marshaller = Marshaller::new(Options::bare());
        marshaller.write(&store, "/n", &Value::Null).unwrap();
        let back = marshaller.read(&store, "/n").unwrap();
        let empty = strata_types::NumericArray::empty(strata_types::ElementKind::Float64);
        assert_eq!(back, Value::Numeric(empty));
        assert_eq!(marshaller.options(), &Options::bare());
    }
}
