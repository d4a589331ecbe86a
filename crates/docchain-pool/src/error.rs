use docchain_store::StoreError;

/// Errors produced by the write pool.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("workers are already started")]
    AlreadyStarted,

    #[error("workers are not started")]
    NotStarted,

    #[error("write pool is stopped")]
    Stopped,

    #[error("invalid pool configuration: {0}")]
    InvalidConfig(String),

    /// A single property write failed. Never retried.
    #[error("failed to write {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: StoreError,
    },

    /// The task writing a property panicked or was aborted.
    #[error("write task for {key} failed: {reason}")]
    TaskFailed { key: String, reason: String },

    /// The caller's execution context was cancelled.
    #[error("write cancelled")]
    Cancelled,
}

pub type PoolResult<T> = Result<T, PoolError>;
