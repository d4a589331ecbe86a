use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use docchain_crypto::DigestScheme;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{KvEngine, KvItem};

/// In-memory, append-only key-value engine.
///
/// Intended for tests and embedding. Entries live in a `Vec` whose position
/// is the physical index; a side table maps each key to its latest index.
/// Every entry also keeps the digest it had when appended, which verified
/// reads check.
pub struct InMemoryKvEngine {
    inner: RwLock<EngineState>,
}

#[derive(Default)]
struct EngineState {
    log: Vec<LogEntry>,
    latest: HashMap<Vec<u8>, u64>,
}

struct LogEntry {
    item: KvItem,
    digest: Vec<u8>,
}

impl LogEntry {
    fn is_intact(&self) -> bool {
        entry_digest(&self.item) == self.digest
    }
}

fn entry_digest(item: &KvItem) -> Vec<u8> {
    DigestScheme::Sha256.property_digest(item.index, &item.key, &item.value)
}

impl InMemoryKvEngine {
    /// Create a new empty engine.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(EngineState::default()),
        }
    }

    /// Number of entries ever appended.
    pub fn len(&self) -> usize {
        self.state().map(|s| s.log.len()).unwrap_or_default()
    }

    /// Returns `true` if nothing was ever appended.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the value stored at `index` in place, bypassing the
    /// append-only discipline. The entry keeps its original digest, so
    /// this simulates out-of-band tampering with the underlying storage.
    pub fn overwrite_at(&self, index: u64, value: Vec<u8>) -> StoreResult<()> {
        let mut state = self.state_mut()?;
        let entry = usize::try_from(index)
            .ok()
            .and_then(|pos| state.log.get_mut(pos))
            .ok_or(StoreError::IndexNotFound(index))?;
        entry.item.value = value;
        Ok(())
    }

    fn append(&self, key: &[u8], value: &[u8]) -> StoreResult<u64> {
        let mut state = self.state_mut()?;
        let index = state.log.len() as u64;
        let item = KvItem {
            key: key.to_vec(),
            value: value.to_vec(),
            index,
        };
        let digest = entry_digest(&item);
        state.log.push(LogEntry { item, digest });
        state.latest.insert(key.to_vec(), index);
        debug!(index, key = %String::from_utf8_lossy(key), "entry appended");
        Ok(index)
    }

    fn latest(&self, key: &[u8], verify: bool) -> StoreResult<Option<KvItem>> {
        let state = self.state()?;
        let Some(&index) = state.latest.get(key) else {
            return Ok(None);
        };
        let entry = state
            .log
            .get(index as usize)
            .ok_or(StoreError::IndexNotFound(index))?;
        if verify && !entry.is_intact() {
            return Err(StoreError::VerificationFailed { index });
        }
        Ok(Some(entry.item.clone()))
    }

    fn state(&self) -> StoreResult<RwLockReadGuard<'_, EngineState>> {
        self.inner
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn state_mut(&self) -> StoreResult<RwLockWriteGuard<'_, EngineState>> {
        self.inner
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl Default for InMemoryKvEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvEngine for InMemoryKvEngine {
    async fn write(&self, key: &[u8], value: &[u8]) -> StoreResult<u64> {
        self.append(key, value)
    }

    async fn verified_write(&self, key: &[u8], value: &[u8]) -> StoreResult<u64> {
        let index = self.append(key, value)?;
        let state = self.state()?;
        let intact = state
            .log
            .get(index as usize)
            .is_some_and(|entry| entry.item.key == key && entry.item.value == value && entry.is_intact());
        if !intact {
            return Err(StoreError::VerificationFailed { index });
        }
        Ok(index)
    }

    async fn read(&self, key: &[u8]) -> StoreResult<Option<KvItem>> {
        self.latest(key, false)
    }

    async fn verified_read(&self, key: &[u8]) -> StoreResult<Option<KvItem>> {
        self.latest(key, true)
    }

    async fn read_by_index(&self, index: u64) -> StoreResult<Option<KvItem>> {
        let state = self.state()?;
        Ok(usize::try_from(index)
            .ok()
            .and_then(|pos| state.log.get(pos))
            .map(|entry| entry.item.clone()))
    }

    async fn scan(&self, prefix: &[u8]) -> StoreResult<Vec<KvItem>> {
        let state = self.state()?;
        Ok(state
            .log
            .iter()
            .filter(|entry| entry.item.key.starts_with(prefix))
            .map(|entry| entry.item.clone())
            .collect())
    }
}

impl std::fmt::Debug for InMemoryKvEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryKvEngine")
            .field("entry_count", &self.len())
            .finish()
    }
}
