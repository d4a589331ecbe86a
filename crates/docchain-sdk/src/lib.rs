//! High-level SDK for docchain.
//!
//! [`DocumentManager`] is the main entry point for applications embedding
//! docchain. It sequences the codec, the write pool, and the digest chain
//! into store, get, update, and verify operations against any
//! [`KvEngine`](docchain_store::KvEngine).

pub mod config;
pub mod error;
pub mod manager;
pub mod record;

pub use config::ManagerConfig;
pub use error::{DocError, DocResult};
pub use manager::DocumentManager;
pub use record::{DocumentProof, DocumentRead, ManifestVersion, StoreReceipt};

// Re-export key types
pub use docchain_crypto::{DigestScheme, ObjectManifest, PropertyHash, PropertyHashList};
pub use docchain_store::{InMemoryKvEngine, KvEngine};
pub use docchain_types::Document;
pub use tokio_util::sync::CancellationToken;
