//! File-backed hierarchical store.
//!
//! The whole node tree is loaded into an [`InMemoryStore`] on open and
//! written back on [`ContainerFile::close`] (or best-effort on drop).
//!
//! On-disk format:
//! ```text
//! [4 bytes: magic "STRC"]
//! [4 bytes: format version (little-endian u32)]
//! [8 bytes: payload length (little-endian u64)]
//! [4 bytes: CRC32 of payload (little-endian u32)]
//! [N bytes: payload (bincode-serialized root group)]
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryStore;
use crate::node::{AttrValue, Attributes, Dataset, Group, NodeKind};
use crate::path::StorePath;
use crate::traits::HierarchicalStore;

const MAGIC: &[u8; 4] = b"STRC";
const VERSION: u32 = 1;
/// Magic + version + length + CRC.
const HEADER_SIZE: usize = 20;

/// A hierarchical store persisted to a single file.
pub struct ContainerFile {
    path: PathBuf,
    store: InMemoryStore,
    dirty: AtomicBool,
    read_only: bool,
}

impl ContainerFile {
    /// Open an existing container, or start an empty one if the file does
    /// not exist yet. The file is only created when changes are flushed.
    pub fn open_or_create(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path, false)
        } else {
            debug!(path = %path.display(), "new container");
            Ok(Self {
                path: path.to_path_buf(),
                store: InMemoryStore::new(),
                dirty: AtomicBool::new(true),
                read_only: false,
            })
        }
    }

    /// Open an existing container for reading. Mutations are rejected.
    pub fn open_read_only(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::load(path.as_ref(), true)
    }

    fn load(path: &Path, read_only: bool) -> StoreResult<Self> {
        let bytes = std::fs::read(path)?;
        let root = decode_container(&bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "container loaded");
        Ok(Self {
            path: path.to_path_buf(),
            store: InMemoryStore::from_root(root),
            dirty: AtomicBool::new(false),
            read_only,
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if there are changes not yet written to disk.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Write pending changes and release the container.
    pub fn close(self) -> StoreResult<()> {
        self.persist()
    }

    fn persist(&self) -> StoreResult<()> {
        if self.read_only || !self.is_dirty() {
            return Ok(());
        }
        let bytes = encode_container(&self.store.snapshot())?;

        // Write to a sibling temp file and rename over the target so a crash
        // never leaves a torn container behind.
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;

        self.dirty.store(false, Ordering::Release);
        debug!(path = %self.path.display(), bytes = bytes.len(), "container flushed");
        Ok(())
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.read_only {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("container {} is open read-only", self.path.display()),
            )));
        }
        Ok(())
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }
}

impl HierarchicalStore for ContainerFile {
    fn create_group(&self, path: &StorePath) -> StoreResult<()> {
        self.check_writable()?;
        self.store.create_group(path)?;
        self.mark_dirty();
        Ok(())
    }

    fn create_dataset(&self, path: &StorePath, dataset: Dataset) -> StoreResult<()> {
        self.check_writable()?;
        self.store.create_dataset(path, dataset)?;
        self.mark_dirty();
        Ok(())
    }

    fn set_attribute(&self, path: &StorePath, name: &str, value: AttrValue) -> StoreResult<()> {
        self.check_writable()?;
        self.store.set_attribute(path, name, value)?;
        self.mark_dirty();
        Ok(())
    }

    fn attribute(&self, path: &StorePath, name: &str) -> StoreResult<Option<AttrValue>> {
        self.store.attribute(path, name)
    }

    fn attributes(&self, path: &StorePath) -> StoreResult<Attributes> {
        self.store.attributes(path)
    }

    fn read_dataset(&self, path: &StorePath) -> StoreResult<Dataset> {
        self.store.read_dataset(path)
    }

    fn node_kind(&self, path: &StorePath) -> StoreResult<Option<NodeKind>> {
        self.store.node_kind(path)
    }

    fn list_children(&self, path: &StorePath) -> StoreResult<Vec<String>> {
        self.store.list_children(path)
    }

    fn remove(&self, path: &StorePath) -> StoreResult<bool> {
        self.check_writable()?;
        let removed = self.store.remove(path)?;
        if removed {
            self.mark_dirty();
        }
        Ok(removed)
    }

    fn flush(&self) -> StoreResult<()> {
        self.persist()
    }
}

impl Drop for ContainerFile {
    fn drop(&mut self) {
        if let Err(e) = self.persist() {
            warn!(path = %self.path.display(), error = %e, "failed to flush container on drop");
        }
    }
}

impl std::fmt::Debug for ContainerFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerFile")
            .field("path", &self.path)
            .field("node_count", &self.store.node_count())
            .field("dirty", &self.is_dirty())
            .field("read_only", &self.read_only)
            .finish()
    }
}

/// Serialize a root group into framed container bytes.
pub fn encode_container(root: &Group) -> StoreResult<Vec<u8>> {
    let payload = bincode::serialize(root).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    out.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Parse framed container bytes back into a root group.
pub fn decode_container(bytes: &[u8]) -> StoreResult<Group> {
    if bytes.len() < HEADER_SIZE {
        return Err(StoreError::Serialization(format!(
            "container too short: {} bytes",
            bytes.len()
        )));
    }
    if &bytes[0..4] != MAGIC {
        return Err(StoreError::InvalidMagic {
            expected: String::from_utf8_lossy(MAGIC).into(),
            actual: String::from_utf8_lossy(&bytes[0..4]).into(),
        });
    }
    let version = u32::from_le_bytes(read_array(&bytes[4..8]));
    if version != VERSION {
        return Err(StoreError::UnsupportedVersion(version));
    }
    let length = u64::from_le_bytes(read_array(&bytes[8..16])) as usize;
    let expected = u32::from_le_bytes(read_array(&bytes[16..20]));

    let payload = &bytes[HEADER_SIZE..];
    if payload.len() != length {
        return Err(StoreError::Serialization(format!(
            "payload length mismatch: header says {length}, found {}",
            payload.len()
        )));
    }
    let computed = crc32fast::hash(payload);
    if computed != expected {
        return Err(StoreError::ChecksumMismatch { expected, computed });
    }
    bincode::deserialize(payload).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn read_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}
