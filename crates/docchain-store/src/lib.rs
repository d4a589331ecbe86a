//! Key-value engine interface consumed by docchain.
//!
//! docchain layers documents on top of an append-only, index-addressed
//! key-value engine. Every write appends a new entry and returns the
//! physical index the engine assigned to it; old versions are never
//! removed, only superseded.
//!
//! # Engines
//!
//! All engines implement the [`KvEngine`] trait:
//!
//! - [`InMemoryKvEngine`] -- append-only `Vec`-backed engine for tests and embedding
//!
//! # Contract
//!
//! 1. Indexes are assigned by the engine and strictly increase.
//! 2. `read` and `verified_read` return the latest version of a key.
//! 3. `read_by_index` reaches any version, including superseded ones.
//! 4. `scan` returns every version under a prefix, in index order.
//! 5. Engines are safe for concurrent use from many tasks.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryKvEngine;
pub use traits::{KvEngine, KvItem};
