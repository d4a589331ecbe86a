use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};

/// One stored entry as returned by the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KvItem {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub index: u64,
}

/// Append-only, index-addressed key-value engine.
///
/// Implementations must be safe to share across tasks; docchain issues
/// writes from many workers at once without extra locking.
#[async_trait]
pub trait KvEngine: Send + Sync {
    /// Append `value` under `key` and return the assigned index.
    async fn write(&self, key: &[u8], value: &[u8]) -> StoreResult<u64>;

    /// Append with engine-side tamper evidence.
    async fn verified_write(&self, key: &[u8], value: &[u8]) -> StoreResult<u64>;

    /// Latest version of `key`, or `Ok(None)` if it was never written.
    async fn read(&self, key: &[u8]) -> StoreResult<Option<KvItem>>;

    /// Latest version of `key`, checked against the engine's tamper evidence.
    async fn verified_read(&self, key: &[u8]) -> StoreResult<Option<KvItem>>;

    /// Entry at a physical index, or `Ok(None)` if there is none.
    async fn read_by_index(&self, index: u64) -> StoreResult<Option<KvItem>>;

    /// Every entry whose key starts with `prefix`, in index order.
    async fn scan(&self, prefix: &[u8]) -> StoreResult<Vec<KvItem>>;

    /// Entries at several indexes, in the order requested.
    ///
    /// Default implementation calls `read_by_index()` for each index and
    /// fails on the first missing one. Backends may override to save
    /// round-trips.
    async fn read_batch(&self, indexes: &[u64]) -> StoreResult<Vec<KvItem>> {
        let mut items = Vec::with_capacity(indexes.len());
        for &index in indexes {
            let item = self
                .read_by_index(index)
                .await?
                .ok_or(StoreError::IndexNotFound(index))?;
            items.push(item);
        }
        Ok(items)
    }
}
