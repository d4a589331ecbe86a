use crate::digest::DigestScheme;

/// Digest of one stored property, tied to the physical index the engine
/// assigned it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyHash {
    pub index: u64,
    pub key: String,
    pub digest: Vec<u8>,
}

impl PropertyHash {
    /// Digest a property as stored at `index`.
    pub fn create(scheme: DigestScheme, index: u64, key: &str, value: &[u8]) -> Self {
        Self {
            index,
            key: key.to_string(),
            digest: scheme.property_digest(index, key.as_bytes(), value),
        }
    }

    /// Returns `true` if `value` stored under this key and index produces
    /// this digest.
    pub fn verify(&self, scheme: DigestScheme, value: &[u8]) -> bool {
        scheme.property_digest(self.index, self.key.as_bytes(), value) == self.digest
    }
}

/// The property digests of one document.
///
/// Hashes arrive in worker completion order; [`global_hash`] and
/// [`indexes`] always work on the list sorted by index, so the result does
/// not depend on that order.
///
/// [`global_hash`]: PropertyHashList::global_hash
/// [`indexes`]: PropertyHashList::indexes
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyHashList(Vec<PropertyHash>);

impl PropertyHashList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn push(&mut self, hash: PropertyHash) {
        self.0.push(hash);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PropertyHash> {
        self.0.iter()
    }

    /// Physical indexes in ascending order.
    pub fn indexes(&self) -> Vec<u64> {
        self.sorted().into_iter().map(|hash| hash.index).collect()
    }

    /// Hex-encoded fold of all digests, ordered by index.
    pub fn global_hash(&self, scheme: DigestScheme) -> String {
        let sorted = self.sorted();
        hex::encode(scheme.fold(sorted.iter().map(|hash| hash.digest.as_slice())))
    }

    /// Find the hash whose key satisfies `predicate`.
    pub fn position(&self, predicate: impl Fn(&PropertyHash) -> bool) -> Option<usize> {
        self.0.iter().position(predicate)
    }

    /// Replace the entry at `position`, returning the previous one.
    pub fn replace(&mut self, position: usize, hash: PropertyHash) -> Option<PropertyHash> {
        self.0
            .get_mut(position)
            .map(|slot| std::mem::replace(slot, hash))
    }

    fn sorted(&self) -> Vec<&PropertyHash> {
        let mut refs: Vec<&PropertyHash> = self.0.iter().collect();
        refs.sort_by_key(|hash| hash.index);
        refs
    }
}

impl From<Vec<PropertyHash>> for PropertyHashList {
    fn from(hashes: Vec<PropertyHash>) -> Self {
        Self(hashes)
    }
}

impl FromIterator<PropertyHash> for PropertyHashList {
    fn from_iter<I: IntoIterator<Item = PropertyHash>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for PropertyHashList {
    type Item = PropertyHash;
    type IntoIter = std::vec::IntoIter<PropertyHash>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
