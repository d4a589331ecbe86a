use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Versioned digest algorithm used for property digests and document hashes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestScheme {
    /// SHA-256 over `index_be8 || key || value`.
    #[default]
    Sha256,
}

impl DigestScheme {
    /// Stable name, as recorded in manifests and configuration.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }

    /// Digest length in bytes.
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha256 => 32,
        }
    }

    /// Digest of a single stored property.
    pub fn property_digest(self, index: u64, key: &[u8], value: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(index.to_be_bytes());
                hasher.update(key);
                hasher.update(value);
                hasher.finalize().to_vec()
            }
        }
    }

    /// Fold a sequence of digests into one, in the order given.
    pub fn fold<'a, I>(self, digests: I) -> Vec<u8>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        match self {
            Self::Sha256 => {
                let mut hasher = Sha256::new();
                for digest in digests {
                    hasher.update(digest);
                }
                hasher.finalize().to_vec()
            }
        }
    }
}
