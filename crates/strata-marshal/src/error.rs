use strata_store::StoreError;
use strata_types::TypeError;

/// Errors raised while marshaling values to or from a store.
#[derive(Debug, thiserror::Error)]
pub enum MarshalError {
    /// The value, or the target layout, cannot represent the input.
    #[error("unsupported type {kind}: {reason}")]
    UnsupportedType { kind: String, reason: String },

    /// Nothing is stored at the requested path.
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// The requested path cannot hold a new value.
    #[error("path conflict at {path}: {reason}")]
    PathConflict { path: String, reason: String },

    /// Stored attributes disagree with the stored structure.
    #[error("corrupt metadata at {path}: {reason}")]
    CorruptMetadata { path: String, reason: String },

    /// A stored type tag names no registered marshaler.
    #[error("unknown type tag {tag:?} at {path}")]
    UnknownTypeTag { path: String, tag: String },

    /// Error from the underlying store, propagated unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Error constructing a value from stored data.
    #[error(transparent)]
    Type(#[from] TypeError),
}

impl MarshalError {
    pub fn unsupported(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedType {
            kind: kind.into(),
            reason: reason.into(),
        }
    }

    pub fn corrupt(path: impl ToString, reason: impl Into<String>) -> Self {
        Self::CorruptMetadata {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub fn conflict(path: impl ToString, reason: impl Into<String>) -> Self {
        Self::PathConflict {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias for marshaling operations.
pub type MarshalResult<T> = Result<T, MarshalError>;
