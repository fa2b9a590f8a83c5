/// Errors from hierarchical store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No node exists at the path.
    #[error("node not found: {0}")]
    NotFound(String),

    /// A node already exists where a new one was to be created.
    #[error("node already exists: {0}")]
    AlreadyExists(String),

    /// A group was required but a dataset sits at the path.
    #[error("not a group: {0}")]
    NotAGroup(String),

    /// A dataset was required but a group sits at the path.
    #[error("not a dataset: {0}")]
    NotADataset(String),

    /// The path string is not a valid absolute store path.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// Dataset bytes do not match its dtype and shape.
    #[error("dataset size mismatch: expected {expected} bytes, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Container file does not start with the expected magic bytes.
    #[error("invalid container magic: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    /// Container file was written by an unknown format version.
    #[error("unsupported container version: {0}")]
    UnsupportedVersion(u32),

    /// Container payload failed its CRC32 check.
    #[error("container checksum mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { expected: u32, computed: u32 },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
