use docchain_crypto::DigestScheme;

use crate::error::{PoolError, PoolResult};

/// Configuration for a [`WriteWorkerPool`](crate::WriteWorkerPool).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker tasks.
    pub num_workers: usize,
    /// Capacity of each of the job, result, and error queues.
    pub queue_capacity: usize,
    /// Use the engine's verified write for every property.
    pub verified_writes: bool,
    /// Digest scheme for property hashes.
    pub digest: DigestScheme,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            num_workers: 500,
            queue_capacity: 50,
            verified_writes: false,
            digest: DigestScheme::Sha256,
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> PoolResult<()> {
        if self.num_workers == 0 {
            return Err(PoolError::InvalidConfig("num_workers must be at least 1".into()));
        }
        if self.queue_capacity == 0 {
            return Err(PoolError::InvalidConfig("queue_capacity must be at least 1".into()));
        }
        Ok(())
    }
}
