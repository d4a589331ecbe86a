//! Concurrent write pool.
//!
//! A fixed set of worker tasks shares one bounded job queue. Each worker
//! writes a property to the key-value engine, digests it, and publishes the
//! resulting [`PropertyHash`](docchain_crypto::PropertyHash) on a bounded
//! result queue, or the failure on a bounded error queue. Results arrive in
//! completion order; nothing is retried.
//!
//! # Lifecycle
//!
//! ```text
//! Created --start_workers--> Started --stop--> Stopped
//!    |                                            ^
//!    +-------------------stop---------------------+
//! ```
//!
//! `stop` signals shutdown, waits for every worker to exit, then closes the
//! queues. Calling it again is a no-op.

pub mod config;
pub mod error;
pub mod pool;
mod worker;

pub use config::PoolConfig;
pub use error::{PoolError, PoolResult};
pub use pool::{PoolStatus, WriteStreams, WriteWorkerPool};
