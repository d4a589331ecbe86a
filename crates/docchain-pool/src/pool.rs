use std::sync::Arc;

use docchain_crypto::PropertyHash;
use docchain_store::KvEngine;
use docchain_types::{PropertyEntry, PropertyEntryList};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult};
use crate::worker::{SharedJobs, Worker};

/// Observable lifecycle state of a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolStatus {
    Created,
    Started,
    Stopped,
}

/// Read side of the pool's result and error queues.
///
/// Every handle returned by [`WriteWorkerPool::write`] reads the same
/// queues. Both queues report `None` once the pool has stopped and they
/// are drained.
#[derive(Clone)]
pub struct WriteStreams {
    results: Arc<Mutex<mpsc::Receiver<PropertyHash>>>,
    errors: Arc<Mutex<mpsc::Receiver<PoolError>>>,
    shutdown: CancellationToken,
}

impl WriteStreams {
    /// Next successfully written property.
    pub async fn next_result(&self) -> Option<PropertyHash> {
        self.results.lock().await.recv().await
    }

    /// Next failed property.
    pub async fn next_error(&self) -> Option<PoolError> {
        self.errors.lock().await.recv().await
    }

    /// Resolves once the pool has been told to shut down.
    pub async fn stopped(&self) {
        self.shutdown.cancelled().await;
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

/// Pending queue ends held until the workers start.
struct Queues {
    jobs_tx: mpsc::Sender<PropertyEntry>,
    jobs_rx: mpsc::Receiver<PropertyEntry>,
    results_tx: mpsc::Sender<PropertyHash>,
    errors_tx: mpsc::Sender<PoolError>,
}

enum PoolState {
    Created(Queues),
    Started {
        jobs: mpsc::Sender<PropertyEntry>,
        workers: Vec<JoinHandle<()>>,
        feeders: Vec<JoinHandle<()>>,
    },
    Stopped,
}

/// Pool of writer tasks feeding properties into a [`KvEngine`].
pub struct WriteWorkerPool {
    engine: Arc<dyn KvEngine>,
    config: PoolConfig,
    shutdown: CancellationToken,
    streams: WriteStreams,
    state: Mutex<PoolState>,
}

impl WriteWorkerPool {
    /// Create a pool. No task runs until [`start_workers`](Self::start_workers).
    pub fn new(engine: Arc<dyn KvEngine>, config: PoolConfig) -> PoolResult<Self> {
        config.validate()?;

        let (jobs_tx, jobs_rx) = mpsc::channel(config.queue_capacity);
        let (results_tx, results_rx) = mpsc::channel(config.queue_capacity);
        let (errors_tx, errors_rx) = mpsc::channel(config.queue_capacity);
        let shutdown = CancellationToken::new();

        Ok(Self {
            engine,
            streams: WriteStreams {
                results: Arc::new(Mutex::new(results_rx)),
                errors: Arc::new(Mutex::new(errors_rx)),
                shutdown: shutdown.clone(),
            },
            shutdown,
            config,
            state: Mutex::new(PoolState::Created(Queues {
                jobs_tx,
                jobs_rx,
                results_tx,
                errors_tx,
            })),
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Spawn the worker tasks.
    ///
    /// `context` is the caller's execution context: cancelling it makes every
    /// worker report [`PoolError::Cancelled`] and exit. Fails with
    /// [`PoolError::AlreadyStarted`] on a second call, spawning nothing.
    pub async fn start_workers(&self, context: CancellationToken) -> PoolResult<()> {
        let mut state = self.state.lock().await;
        let queues = match std::mem::replace(&mut *state, PoolState::Stopped) {
            PoolState::Created(queues) => queues,
            started @ PoolState::Started { .. } => {
                *state = started;
                return Err(PoolError::AlreadyStarted);
            }
            PoolState::Stopped => return Err(PoolError::Stopped),
        };

        let jobs: SharedJobs = Arc::new(Mutex::new(queues.jobs_rx));
        let workers = (0..self.config.num_workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    engine: Arc::clone(&self.engine),
                    jobs: Arc::clone(&jobs),
                    results: queues.results_tx.clone(),
                    errors: queues.errors_tx.clone(),
                    shutdown: self.shutdown.clone(),
                    context: context.clone(),
                    verified_writes: self.config.verified_writes,
                    digest: self.config.digest,
                };
                tokio::spawn(worker.run())
            })
            .collect();

        *state = PoolState::Started {
            jobs: queues.jobs_tx,
            workers,
            feeders: Vec::new(),
        };
        info!(
            workers = self.config.num_workers,
            queue_capacity = self.config.queue_capacity,
            verified = self.config.verified_writes,
            "write pool started"
        );
        Ok(())
    }

    /// Queue every property for writing, in list order, and return the
    /// read side of the result and error queues.
    ///
    /// Returns immediately: a background task feeds the job queue and may
    /// itself wait while the queue is full.
    pub async fn write(&self, properties: PropertyEntryList) -> PoolResult<WriteStreams> {
        let mut state = self.state.lock().await;
        let (jobs, feeders) = match &mut *state {
            PoolState::Started { jobs, feeders, .. } => (jobs, feeders),
            PoolState::Created(_) => return Err(PoolError::NotStarted),
            PoolState::Stopped => return Err(PoolError::Stopped),
        };

        let jobs = jobs.clone();
        let shutdown = self.shutdown.clone();
        let count = properties.len();
        feeders.push(tokio::spawn(async move {
            for entry in properties {
                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    sent = jobs.send(entry) => {
                        if sent.is_err() {
                            return;
                        }
                    }
                }
            }
        }));

        debug!(count, "properties queued");
        Ok(self.streams.clone())
    }

    /// Signal shutdown, wait for all workers to exit, then close the queues.
    ///
    /// Workers drop any job not yet started. Safe to call more than once.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, PoolState::Stopped) {
            PoolState::Started {
                jobs,
                workers,
                feeders,
            } => {
                self.shutdown.cancel();
                for handle in feeders.into_iter().chain(workers) {
                    if let Err(err) = handle.await {
                        warn!(error = %err, "write pool task ended abnormally");
                    }
                }
                drop(jobs);
                info!("write pool stopped");
            }
            PoolState::Created(_) => self.shutdown.cancel(),
            PoolState::Stopped => {}
        }
    }

    pub async fn status(&self) -> PoolStatus {
        match &*self.state.lock().await {
            PoolState::Created(_) => PoolStatus::Created,
            PoolState::Started { .. } => PoolStatus::Started,
            PoolState::Stopped => PoolStatus::Stopped,
        }
    }

    /// Number of worker tasks spawned and not yet joined.
    pub async fn worker_count(&self) -> usize {
        match &*self.state.lock().await {
            PoolState::Started { workers, .. } => workers.len(),
            _ => 0,
        }
    }
}

impl Drop for WriteWorkerPool {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docchain_crypto::DigestScheme;
    use docchain_store::{InMemoryKvEngine, KvItem, StoreError, StoreResult};
    use std::collections::HashSet;
    use std::time::Duration;

    enum Fault {
        Fail,
        Panic,
    }

    /// Engine that faults on every write whose key contains `poison`.
    struct FailingEngine {
        inner: InMemoryKvEngine,
        poison: &'static str,
        fault: Fault,
    }

    impl FailingEngine {
        fn new(poison: &'static str, fault: Fault) -> Self {
            Self {
                inner: InMemoryKvEngine::new(),
                poison,
                fault,
            }
        }

        fn check(&self, key: &[u8]) -> StoreResult<()> {
            if !String::from_utf8_lossy(key).contains(self.poison) {
                return Ok(());
            }
            match self.fault {
                Fault::Fail => Err(StoreError::Backend("injected failure".into())),
                Fault::Panic => panic!("engine crashed"),
            }
        }
    }

    #[async_trait]
    impl KvEngine for FailingEngine {
        async fn write(&self, key: &[u8], value: &[u8]) -> StoreResult<u64> {
            self.check(key)?;
            self.inner.write(key, value).await
        }
        async fn verified_write(&self, key: &[u8], value: &[u8]) -> StoreResult<u64> {
            self.check(key)?;
            self.inner.verified_write(key, value).await
        }
        async fn read(&self, key: &[u8]) -> StoreResult<Option<KvItem>> {
            self.inner.read(key).await
        }
        async fn verified_read(&self, key: &[u8]) -> StoreResult<Option<KvItem>> {
            self.inner.verified_read(key).await
        }
        async fn read_by_index(&self, index: u64) -> StoreResult<Option<KvItem>> {
            self.inner.read_by_index(index).await
        }
        async fn scan(&self, prefix: &[u8]) -> StoreResult<Vec<KvItem>> {
            self.inner.scan(prefix).await
        }
    }

    fn config(num_workers: usize) -> PoolConfig {
        PoolConfig {
            num_workers,
            queue_capacity: 4,
            ..PoolConfig::default()
        }
    }

    fn entries(n: usize) -> PropertyEntryList {
        (0..n)
            .map(|i| PropertyEntry::new(format!("doc/k{i}/string"), format!("v{i}").into_bytes()))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn second_start_fails_and_spawns_nothing() {
        let pool = WriteWorkerPool::new(Arc::new(InMemoryKvEngine::new()), config(3)).unwrap();
        assert_eq!(pool.status().await, PoolStatus::Created);

        pool.start_workers(CancellationToken::new()).await.unwrap();
        assert_eq!(pool.worker_count().await, 3);

        let err = pool.start_workers(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, PoolError::AlreadyStarted));
        assert_eq!(err.to_string(), "workers are already started");
        assert_eq!(pool.worker_count().await, 3);

        pool.stop().await;
    }

    #[tokio::test]
    async fn stop_twice_is_a_noop() {
        let pool = WriteWorkerPool::new(Arc::new(InMemoryKvEngine::new()), config(2)).unwrap();
        pool.start_workers(CancellationToken::new()).await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            pool.stop().await;
            pool.stop().await;
        })
        .await
        .expect("stop should not block");

        assert_eq!(pool.status().await, PoolStatus::Stopped);
        assert_eq!(pool.worker_count().await, 0);
    }

    #[tokio::test]
    async fn stopped_pool_cannot_restart_or_write() {
        let pool = WriteWorkerPool::new(Arc::new(InMemoryKvEngine::new()), config(1)).unwrap();
        pool.stop().await;
        assert!(matches!(
            pool.start_workers(CancellationToken::new()).await,
            Err(PoolError::Stopped)
        ));
        assert!(matches!(pool.write(entries(1)).await, Err(PoolError::Stopped)));
    }

    #[tokio::test]
    async fn write_before_start_fails() {
        let pool = WriteWorkerPool::new(Arc::new(InMemoryKvEngine::new()), config(1)).unwrap();
        assert!(matches!(pool.write(entries(1)).await, Err(PoolError::NotStarted)));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = WriteWorkerPool::new(Arc::new(InMemoryKvEngine::new()), config(0));
        assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
    }

    // -----------------------------------------------------------------------
    // Writing
    // -----------------------------------------------------------------------

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn writes_every_entry_once() {
        let engine = Arc::new(InMemoryKvEngine::new());
        let pool = WriteWorkerPool::new(engine.clone(), config(8)).unwrap();
        pool.start_workers(CancellationToken::new()).await.unwrap();

        let streams = pool.write(entries(40)).await.unwrap();
        let mut indexes = HashSet::new();
        for _ in 0..40 {
            let hash = streams.next_result().await.unwrap();
            let item = engine.read_by_index(hash.index).await.unwrap().unwrap();
            assert_eq!(item.key, hash.key.as_bytes());
            assert!(hash.verify(DigestScheme::Sha256, &item.value));
            indexes.insert(hash.index);
        }
        assert_eq!(indexes.len(), 40);
        assert_eq!(engine.len(), 40);

        pool.stop().await;
        assert!(streams.is_stopped());
        assert!(streams.next_result().await.is_none());
        assert!(streams.next_error().await.is_none());
    }

    #[tokio::test]
    async fn failures_are_reported_not_retried() {
        let engine = Arc::new(FailingEngine::new("k1/", Fault::Fail));
        let pool = WriteWorkerPool::new(engine.clone(), config(2)).unwrap();
        pool.start_workers(CancellationToken::new()).await.unwrap();

        let streams = pool.write(entries(3)).await.unwrap();
        let mut ok = 0;
        let mut failed = Vec::new();
        while ok + failed.len() < 3 {
            tokio::select! {
                Some(_) = streams.next_result() => ok += 1,
                Some(err) = streams.next_error() => failed.push(err),
            }
        }
        pool.stop().await;

        assert_eq!(ok, 2);
        assert_eq!(failed.len(), 1);
        assert!(matches!(&failed[0], PoolError::Write { key, .. } if key == "doc/k1/string"));
        assert_eq!(engine.inner.len(), 2);
    }

    #[tokio::test]
    async fn panicking_write_is_reported_as_failure() {
        let engine = Arc::new(FailingEngine::new("k0/", Fault::Panic));
        let pool = WriteWorkerPool::new(engine.clone(), config(1)).unwrap();
        pool.start_workers(CancellationToken::new()).await.unwrap();

        let streams = pool.write(entries(3)).await.unwrap();
        let (ok, failed) = tokio::time::timeout(Duration::from_secs(5), async {
            let mut ok = 0;
            let mut failed = Vec::new();
            while ok + failed.len() < 3 {
                tokio::select! {
                    Some(_) = streams.next_result() => ok += 1,
                    Some(err) = streams.next_error() => failed.push(err),
                }
            }
            (ok, failed)
        })
        .await
        .expect("a panicking write must still produce an outcome");
        pool.stop().await;

        // The single worker survives the panic and writes the rest.
        assert_eq!(ok, 2);
        assert_eq!(failed.len(), 1);
        assert!(matches!(&failed[0], PoolError::TaskFailed { key, .. } if key == "doc/k0/string"));
        assert_eq!(engine.inner.len(), 2);
    }

    #[tokio::test]
    async fn verified_writes_use_verified_path() {
        let engine = Arc::new(InMemoryKvEngine::new());
        let pool = WriteWorkerPool::new(
            engine.clone(),
            PoolConfig {
                verified_writes: true,
                ..config(2)
            },
        )
        .unwrap();
        pool.start_workers(CancellationToken::new()).await.unwrap();
        let streams = pool.write(entries(2)).await.unwrap();
        assert!(streams.next_result().await.is_some());
        assert!(streams.next_result().await.is_some());
        pool.stop().await;
        assert!(engine.verified_read(b"doc/k0/string").await.unwrap().is_some());
    }

    // -----------------------------------------------------------------------
    // Cancellation and shutdown
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn cancelled_context_reports_cancellation() {
        let pool = WriteWorkerPool::new(Arc::new(InMemoryKvEngine::new()), config(2)).unwrap();
        let context = CancellationToken::new();
        pool.start_workers(context.clone()).await.unwrap();
        context.cancel();

        let streams = pool.write(entries(1)).await.unwrap();
        let err = tokio::time::timeout(Duration::from_secs(5), streams.next_error())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(err, PoolError::Cancelled));
        pool.stop().await;
    }

    #[tokio::test]
    async fn stop_discards_pending_jobs() {
        let engine = Arc::new(InMemoryKvEngine::new());
        let pool = WriteWorkerPool::new(engine.clone(), config(1)).unwrap();
        pool.start_workers(CancellationToken::new()).await.unwrap();

        // Nobody drains the result queue, so the single worker stalls once
        // it fills and the feeder stalls behind the full job queue.
        let _streams = pool.write(entries(100)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        tokio::time::timeout(Duration::from_secs(5), pool.stop())
            .await
            .expect("stop should not block on full queues");
        assert!(engine.len() < 100);
    }
}
