use serde::{Deserialize, Serialize};

use crate::digest::DigestScheme;
use crate::error::ChainError;
use crate::hash_list::PropertyHashList;

/// Key prefix under which manifests are stored.
pub const MANIFEST_PREFIX: &str = "manifest/";

/// Storage key of the manifest for `object_id`.
pub fn manifest_key(object_id: &str) -> String {
    format!("{MANIFEST_PREFIX}{object_id}")
}

/// The durable record of one document: where its properties live and the
/// hash they fold to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectManifest {
    pub object_id: String,
    pub property_indexes: Vec<u64>,
    pub object_hash: String,
    #[serde(default)]
    pub digest: DigestScheme,
}

impl ObjectManifest {
    /// Build a manifest from a document's property hashes.
    pub fn from_hashes(object_id: &str, hashes: &PropertyHashList, scheme: DigestScheme) -> Self {
        Self {
            object_id: object_id.to_string(),
            property_indexes: hashes.indexes(),
            object_hash: hashes.global_hash(scheme),
            digest: scheme,
        }
    }

    pub fn key(&self) -> String {
        manifest_key(&self.object_id)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, ChainError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a stored manifest and check it describes `object_id`.
    pub fn from_json(object_id: &str, bytes: &[u8]) -> Result<Self, ChainError> {
        let manifest: Self = serde_json::from_slice(bytes)?;
        if manifest.object_id != object_id {
            return Err(ChainError::ForeignManifest {
                expected: object_id.to_string(),
                found: manifest.object_id,
            });
        }
        Ok(manifest)
    }

    /// Returns `true` if `hashes` fold to the recorded object hash.
    pub fn validate(&self, hashes: &PropertyHashList) -> bool {
        hashes
            .global_hash(self.digest)
            .eq_ignore_ascii_case(&self.object_hash)
    }
}
