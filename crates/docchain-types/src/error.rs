use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid property path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("unknown value type tag: {0:?}")]
    UnknownValueType(String),

    #[error("invalid array segment: {0:?}")]
    InvalidSegment(String),
}
