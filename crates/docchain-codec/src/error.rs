use docchain_types::{TypeError, ValueType};

/// Errors from flattening or rebuilding documents.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The raw payload is not valid JSON.
    #[error("unable to decode payload: {0}")]
    Json(#[from] serde_json::Error),

    /// A document ID or map key cannot be used as a path segment.
    #[error("invalid path segment {segment:?}: {reason}")]
    InvalidSegment { segment: String, reason: &'static str },

    /// A stored path could not be parsed.
    #[error(transparent)]
    Path(#[from] TypeError),

    /// A leaf value does not match the encoding its type tag requires.
    #[error("invalid {value_type} value at {path}: {reason}")]
    InvalidValue {
        path: String,
        value_type: ValueType,
        reason: String,
    },

    /// The path expects a map where a sequence (or leaf) already sits, or
    /// the reverse.
    #[error("conflicting structure at {path}")]
    ShapeConflict { path: String },

    /// An element index is not below its sequence's length.
    #[error("element index {index} out of bounds for length {len} at {path}")]
    IndexOutOfBounds { path: String, index: usize, len: usize },

    /// A declared sequence capacity exceeds the reconstruction limit.
    #[error("declared capacity {capacity} at {path} exceeds the limit")]
    CapacityTooLarge { path: String, capacity: usize },

    /// The list mixes properties of several documents.
    #[error("property {path} belongs to document {found:?}, expected {expected:?}")]
    MixedDocuments {
        path: String,
        expected: String,
        found: String,
    },
}

pub type CodecResult<T> = Result<T, CodecError>;
