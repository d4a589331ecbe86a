/// Errors from key-value engine operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No entry exists at the requested physical index.
    #[error("no entry at index {0}")]
    IndexNotFound(u64),

    /// An entry failed the engine's tamper check.
    #[error("verification failed for entry at index {index}")]
    VerificationFailed { index: u64 },

    /// The engine's internal lock was poisoned by a panicking writer.
    #[error("engine lock poisoned: {0}")]
    LockPoisoned(String),

    /// Failure reported by an external engine backend.
    #[error("engine error: {0}")]
    Backend(String),
}

/// Result alias for engine operations.
pub type StoreResult<T> = Result<T, StoreError>;
