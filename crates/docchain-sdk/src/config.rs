use std::path::Path;

use docchain_crypto::DigestScheme;
use docchain_pool::PoolConfig;
use serde::{Deserialize, Serialize};

use crate::error::{DocError, DocResult};

/// Settings for a [`DocumentManager`](crate::DocumentManager).
///
/// Every field is optional in TOML; missing fields take their defaults.
///
/// ```toml
/// num_workers = 16
/// queue_capacity = 64
/// verified_writes = true
/// digest = "sha256"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub num_workers: usize,
    pub queue_capacity: usize,
    pub verified_writes: bool,
    pub digest: DigestScheme,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        let pool = PoolConfig::default();
        Self {
            num_workers: pool.num_workers,
            queue_capacity: pool.queue_capacity,
            verified_writes: pool.verified_writes,
            digest: pool.digest,
        }
    }
}

impl ManagerConfig {
    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn with_verified_writes(mut self, verified_writes: bool) -> Self {
        self.verified_writes = verified_writes;
        self
    }

    pub fn with_digest(mut self, digest: DigestScheme) -> Self {
        self.digest = digest;
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> DocResult<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| DocError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> DocResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DocError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> DocResult<()> {
        self.pool_config()
            .validate()
            .map_err(|e| DocError::Config(e.to_string()))
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            num_workers: self.num_workers,
            queue_capacity: self.queue_capacity,
            verified_writes: self.verified_writes,
            digest: self.digest,
        }
    }
}
