use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocError {
    /// The input payload is not a valid document. Nothing was written.
    #[error("unable to decode document: {0}")]
    Decode(#[source] docchain_codec::CodecError),

    /// One or more property writes failed; no manifest was written.
    #[error("failed to store document {doc_id}: {}", .failures.join("; "))]
    Write { doc_id: String, failures: Vec<String> },

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("no manifest of document {doc_id} at index {index}")]
    VersionNotFound { doc_id: String, index: u64 },

    /// The manifest references an index the engine does not have.
    #[error("property of document {doc_id} missing at index {index}")]
    PropertyMissing { doc_id: String, index: u64 },

    #[error("property {key} not found in document {doc_id}")]
    PropertyNotFound { doc_id: String, key: String },

    /// The manifest references an entry stored under another document.
    #[error("entry {key} at index {index} does not belong to document {doc_id}")]
    ForeignProperty { doc_id: String, key: String, index: u64 },

    /// The stored properties no longer fold to the manifest's hash.
    #[error("document {doc_id} does not match its manifest hash")]
    IntegrityMismatch { doc_id: String },

    #[error("invalid update: {0}")]
    InvalidUpdate(String),

    #[error("operation cancelled")]
    Cancelled,

    /// The write queues closed before every property was accounted for.
    #[error("write pool stopped after {received} of {expected} properties")]
    Incomplete { expected: usize, received: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("codec error: {0}")]
    Codec(#[from] docchain_codec::CodecError),

    #[error("manifest error: {0}")]
    Chain(#[from] docchain_crypto::ChainError),

    #[error("store error: {0}")]
    Store(#[from] docchain_store::StoreError),

    #[error("pool error: {0}")]
    Pool(#[from] docchain_pool::PoolError),
}

pub type DocResult<T> = Result<T, DocError>;
