//! Integrity digest chain.
//!
//! Every stored property gets a digest over its physical index, key, and
//! value. A document's hash folds those digests, ordered by index, into one
//! hex string that is recorded in its [`ObjectManifest`]. Recomputing the
//! chain from what the engine returns and comparing against the recorded
//! hash detects tampering with any property.
//!
//! The digest algorithm is a versioned [`DigestScheme`] recorded in the
//! manifest; SHA-256 is the only scheme today.

pub mod digest;
pub mod error;
pub mod hash_list;
pub mod manifest;

pub use digest::DigestScheme;
pub use error::ChainError;
pub use hash_list::{PropertyHash, PropertyHashList};
pub use manifest::{manifest_key, ObjectManifest, MANIFEST_PREFIX};
