use thiserror::Error;

/// Errors produced while constructing or inspecting values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown element kind: {0}")]
    UnknownElementKind(String),

    #[error("element count mismatch: shape {shape} holds {expected} elements, got {actual}")]
    ElementCount {
        shape: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("element kind mismatch: array holds {actual}, requested {requested}")]
    KindMismatch { actual: String, requested: String },

    #[error("bool array contains byte {0:#04x}")]
    InvalidBool(u8),

    #[error("element exceeds width {width}: length {length}")]
    WidthExceeded { width: usize, length: usize },
}

/// Result alias for value-model operations.
pub type TypeResult<T> = Result<T, TypeError>;
