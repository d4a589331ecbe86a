use docchain_crypto::{ObjectManifest, PropertyHashList};

/// Outcome of a store or update: where the manifest landed and the
/// document hash it records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreReceipt {
    pub index: u64,
    pub hash: String,
}

/// A document read back from the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentRead {
    /// Reconstructed document as compact JSON.
    pub payload: Vec<u8>,
    /// Physical index of the manifest that was read.
    pub index: u64,
    /// Hash recomputed from the fetched properties.
    pub hash: String,
}

impl DocumentRead {
    pub fn payload_str(&self) -> &str {
        std::str::from_utf8(&self.payload).unwrap_or_default()
    }
}

/// Integrity evidence for one manifest version.
#[derive(Clone, Debug)]
pub struct DocumentProof {
    pub manifest: ObjectManifest,
    pub manifest_index: u64,
    /// Digests recomputed from the properties the engine returned, in
    /// manifest order.
    pub hashes: PropertyHashList,
    /// Hash folded from `hashes`.
    pub hash: String,
}

impl DocumentProof {
    /// Returns `true` if the recomputed hash matches the manifest.
    pub fn is_valid(&self) -> bool {
        self.hash.eq_ignore_ascii_case(&self.manifest.object_hash)
    }
}

/// One stored version of a document's manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestVersion {
    pub index: u64,
    pub object_hash: String,
}
