use std::sync::Arc;

use docchain_crypto::{DigestScheme, PropertyHash};
use docchain_store::KvEngine;
use docchain_types::PropertyEntry;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::PoolError;

/// Job queue shared by every worker; one receiver, taken in turn.
pub(crate) type SharedJobs = Arc<Mutex<mpsc::Receiver<PropertyEntry>>>;

/// One writer task.
pub(crate) struct Worker {
    pub id: usize,
    pub engine: Arc<dyn KvEngine>,
    pub jobs: SharedJobs,
    pub results: mpsc::Sender<PropertyHash>,
    pub errors: mpsc::Sender<PoolError>,
    pub shutdown: CancellationToken,
    pub context: CancellationToken,
    pub verified_writes: bool,
    pub digest: DigestScheme,
}

impl Worker {
    pub async fn run(self) {
        loop {
            let job = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = self.context.cancelled() => {
                    self.report(PoolError::Cancelled).await;
                    break;
                }
                job = next_job(&self.jobs) => job,
            };

            // Queue closed: the pool is gone.
            let Some(entry) = job else { break };

            // An in-flight write is abandoned, not rolled back, when the
            // pool stops or the context is cancelled.
            let outcome = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = self.context.cancelled() => {
                    self.report(PoolError::Cancelled).await;
                    break;
                }
                outcome = self.write(entry) => outcome,
            };

            match outcome {
                Ok(hash) => {
                    debug!(worker = self.id, index = hash.index, key = %hash.key, "property written");
                    tokio::select! {
                        _ = self.shutdown.cancelled() => break,
                        _ = self.results.send(hash) => {}
                    }
                }
                Err(err) => {
                    warn!(worker = self.id, error = %err, "property write failed");
                    self.report(err).await;
                }
            }
        }
        debug!(worker = self.id, "worker exited");
    }

    /// Run one engine write on its own task, so a panicking engine costs
    /// this job only and still yields an outcome.
    async fn write(&self, entry: PropertyEntry) -> Result<PropertyHash, PoolError> {
        let engine = Arc::clone(&self.engine);
        let verified = self.verified_writes;
        let key = entry.path.clone();
        let task = tokio::spawn(async move {
            let written = if verified {
                engine.verified_write(entry.path.as_bytes(), &entry.value).await
            } else {
                engine.write(entry.path.as_bytes(), &entry.value).await
            };
            written.map(|index| (index, entry))
        });

        match task.await {
            Ok(Ok((index, entry))) => Ok(PropertyHash::create(
                self.digest,
                index,
                &entry.path,
                &entry.value,
            )),
            Ok(Err(source)) => Err(PoolError::Write { key, source }),
            Err(err) => Err(PoolError::TaskFailed {
                key,
                reason: err.to_string(),
            }),
        }
    }

    async fn report(&self, err: PoolError) {
        tokio::select! {
            _ = self.shutdown.cancelled() => {}
            _ = self.errors.send(err) => {}
        }
    }
}

async fn next_job(jobs: &SharedJobs) -> Option<PropertyEntry> {
    jobs.lock().await.recv().await
}
