use std::sync::Arc;
use std::time::Instant;

use docchain_codec::{decode_json, encode_json, encode_value, flatten, unflatten};
use docchain_crypto::{manifest_key, ObjectManifest, PropertyHash, PropertyHashList};
use docchain_pool::{PoolError, WriteStreams, WriteWorkerPool};
use docchain_store::{KvEngine, KvItem, StoreError};
use docchain_types::{split_type_tag, Document, PropertyEntry, PropertyEntryList, PATH_SEPARATOR};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ManagerConfig;
use crate::error::{DocError, DocResult};
use crate::record::{DocumentProof, DocumentRead, ManifestVersion, StoreReceipt};

/// Stores documents as flat, digest-chained properties on a key-value engine.
///
/// No locking spans documents: concurrent stores or updates of the same
/// document ID race, and the last manifest written wins.
pub struct DocumentManager {
    engine: Arc<dyn KvEngine>,
    config: ManagerConfig,
}

/// Properties fetched through a manifest, with their recomputed digests in
/// manifest order.
struct Fetched {
    properties: PropertyEntryList,
    hashes: PropertyHashList,
}

impl DocumentManager {
    pub fn new(engine: Arc<dyn KvEngine>, config: ManagerConfig) -> DocResult<Self> {
        config.validate()?;
        Ok(Self { engine, config })
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<dyn KvEngine> {
        &self.engine
    }

    // ---- Store ----

    /// Store a raw JSON document under `doc_id`.
    pub async fn store_document(&self, doc_id: &str, raw: &[u8]) -> DocResult<StoreReceipt> {
        self.store_document_with_cancel(doc_id, raw, CancellationToken::new())
            .await
    }

    /// Store a raw JSON document, aborting when `cancel` fires.
    ///
    /// Properties already written when a failure or cancellation happens
    /// stay in the engine unreferenced; the manifest is only written once
    /// every property has succeeded.
    pub async fn store_document_with_cancel(
        &self,
        doc_id: &str,
        raw: &[u8],
        cancel: CancellationToken,
    ) -> DocResult<StoreReceipt> {
        let started = Instant::now();
        let document = decode_json(raw).map_err(DocError::Decode)?;
        let properties = flatten(doc_id, &document)?;
        let count = properties.len();

        let hashes = if properties.is_empty() {
            PropertyHashList::new()
        } else {
            self.write_properties(doc_id, properties, &cancel).await?
        };

        let manifest = ObjectManifest::from_hashes(doc_id, &hashes, self.config.digest);
        let index = self.write_manifest(&manifest).await?;

        info!(
            doc_id,
            index,
            count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "document stored"
        );
        Ok(StoreReceipt {
            index,
            hash: manifest.object_hash,
        })
    }

    async fn write_properties(
        &self,
        doc_id: &str,
        properties: PropertyEntryList,
        cancel: &CancellationToken,
    ) -> DocResult<PropertyHashList> {
        let pool = WriteWorkerPool::new(Arc::clone(&self.engine), self.config.pool_config())?;
        pool.start_workers(cancel.clone()).await?;

        let expected = properties.len();
        let outcome = match pool.write(properties).await {
            Ok(streams) => collect(doc_id, &streams, expected, cancel).await,
            Err(err) => Err(err.into()),
        };
        pool.stop().await;
        outcome
    }

    async fn write_manifest(&self, manifest: &ObjectManifest) -> DocResult<u64> {
        let index = self
            .engine
            .verified_write(manifest.key().as_bytes(), &manifest.to_json()?)
            .await?;
        Ok(index)
    }

    // ---- Read ----

    /// Read a document back through its latest manifest.
    ///
    /// The returned hash is recomputed from the fetched properties. A
    /// mismatch with the manifest is logged, not returned as an error; use
    /// [`verify_document`](Self::verify_document) to check integrity.
    pub async fn get_document(&self, doc_id: &str) -> DocResult<DocumentRead> {
        let started = Instant::now();
        let (manifest, index) = self.load_manifest(doc_id).await?;
        let fetched = self.fetch_properties(doc_id, &manifest).await?;

        let hash = fetched.hashes.global_hash(manifest.digest);
        if !manifest.validate(&fetched.hashes) {
            warn!(
                doc_id,
                index,
                recorded = %manifest.object_hash,
                recomputed = %hash,
                "document hash does not match its manifest"
            );
        }

        let document = unflatten(fetched.properties)?;
        let payload = encode_json(&document)?;

        info!(
            doc_id,
            index,
            count = manifest.property_indexes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "document read"
        );
        Ok(DocumentRead {
            payload,
            index,
            hash,
        })
    }

    /// Recompute a document's hash and compare it with `expected_hash`.
    ///
    /// A mismatch yields `Ok(false)`; only failures to fetch are errors.
    pub async fn verify_document(&self, doc_id: &str, expected_hash: &str) -> DocResult<bool> {
        let (manifest, index) = self.load_manifest(doc_id).await?;
        let fetched = self.fetch_properties(doc_id, &manifest).await?;
        let hash = fetched.hashes.global_hash(manifest.digest);
        let valid = hash.eq_ignore_ascii_case(expected_hash);
        if !valid {
            warn!(doc_id, index, expected = expected_hash, recomputed = %hash, "document verification failed");
        }
        Ok(valid)
    }

    // ---- Update ----

    /// Replace one leaf of a stored document.
    ///
    /// The current properties must still fold to the manifest's hash;
    /// otherwise nothing is written and [`DocError::IntegrityMismatch`] is
    /// returned.
    ///
    /// `property_key` is the leaf's path below the document ID without its
    /// type tag, e.g. `"a"` or `"b/[1.3]"`. The new value must be a scalar;
    /// it may have a different type than the old one. Only the new property
    /// and a new manifest version are written.
    pub async fn update_document(
        &self,
        doc_id: &str,
        property_key: &str,
        new_value: &Document,
    ) -> DocResult<StoreReceipt> {
        let (value_type, value) = encode_value(new_value).ok_or_else(|| {
            DocError::InvalidUpdate(format!(
                "{property_key}: only null, string, bool, and number values can be written"
            ))
        })?;

        let (mut manifest, _) = self.load_manifest(doc_id).await?;
        let mut fetched = self.fetch_properties(doc_id, &manifest).await?;
        if !manifest.validate(&fetched.hashes) {
            warn!(doc_id, recorded = %manifest.object_hash, "refusing to update a tampered document");
            return Err(DocError::IntegrityMismatch {
                doc_id: doc_id.to_string(),
            });
        }

        let path = format!("{doc_id}{PATH_SEPARATOR}{property_key}");
        let position = fetched
            .hashes
            .position(|hash| split_type_tag(&hash.key).is_some_and(|(prefix, _)| prefix == path))
            .ok_or_else(|| DocError::PropertyNotFound {
                doc_id: doc_id.to_string(),
                key: property_key.to_string(),
            })?;

        let key = format!("{path}{PATH_SEPARATOR}{value_type}");
        let index = self.engine.verified_write(key.as_bytes(), &value).await?;
        debug!(doc_id, index, key = %key, "property rewritten");

        let hash = PropertyHash::create(manifest.digest, index, &key, &value);
        fetched.hashes.replace(position, hash);
        if let Some(slot) = manifest.property_indexes.get_mut(position) {
            *slot = index;
        }
        manifest.object_hash = fetched.hashes.global_hash(manifest.digest);

        let manifest_index = self.write_manifest(&manifest).await?;
        info!(doc_id, index = manifest_index, key = %key, "document updated");
        Ok(StoreReceipt {
            index: manifest_index,
            hash: manifest.object_hash,
        })
    }

    // ---- Proofs and history ----

    /// Recompute the digest chain of the manifest version stored at
    /// `manifest_index`. Superseded versions stay addressable.
    pub async fn document_proof(&self, doc_id: &str, manifest_index: u64) -> DocResult<DocumentProof> {
        let version_missing = || DocError::VersionNotFound {
            doc_id: doc_id.to_string(),
            index: manifest_index,
        };
        let item = self
            .engine
            .read_by_index(manifest_index)
            .await?
            .ok_or_else(version_missing)?;
        if item.key != manifest_key(doc_id).as_bytes() {
            return Err(version_missing());
        }

        let manifest = ObjectManifest::from_json(doc_id, &item.value)?;
        let fetched = self.fetch_properties(doc_id, &manifest).await?;
        let hash = fetched.hashes.global_hash(manifest.digest);
        Ok(DocumentProof {
            manifest,
            manifest_index,
            hashes: fetched.hashes,
            hash,
        })
    }

    /// Every stored manifest version of `doc_id`, oldest first.
    pub async fn manifest_versions(&self, doc_id: &str) -> DocResult<Vec<ManifestVersion>> {
        let key = manifest_key(doc_id);
        self.engine
            .scan(key.as_bytes())
            .await?
            .into_iter()
            .filter(|item| item.key == key.as_bytes())
            .map(|item| -> DocResult<ManifestVersion> {
                let manifest = ObjectManifest::from_json(doc_id, &item.value)?;
                Ok(ManifestVersion {
                    index: item.index,
                    object_hash: manifest.object_hash,
                })
            })
            .collect()
    }

    // ---- Internals ----

    async fn load_manifest(&self, doc_id: &str) -> DocResult<(ObjectManifest, u64)> {
        let item = self
            .engine
            .verified_read(manifest_key(doc_id).as_bytes())
            .await?
            .ok_or_else(|| DocError::NotFound(doc_id.to_string()))?;
        let manifest = ObjectManifest::from_json(doc_id, &item.value)?;
        Ok((manifest, item.index))
    }

    async fn fetch_properties(&self, doc_id: &str, manifest: &ObjectManifest) -> DocResult<Fetched> {
        let items = match self.engine.read_batch(&manifest.property_indexes).await {
            Ok(items) => items,
            Err(StoreError::IndexNotFound(index)) => {
                return Err(DocError::PropertyMissing {
                    doc_id: doc_id.to_string(),
                    index,
                })
            }
            Err(err) => return Err(err.into()),
        };

        let owner = format!("{doc_id}{PATH_SEPARATOR}");
        let mut properties = PropertyEntryList::with_capacity(items.len());
        let mut hashes = PropertyHashList::with_capacity(items.len());
        for KvItem { key, value, index } in items {
            let key = match String::from_utf8(key) {
                Ok(key) if key.starts_with(&owner) => key,
                Ok(key) => return Err(foreign(doc_id, key, index)),
                Err(err) => {
                    let key = String::from_utf8_lossy(err.as_bytes()).into_owned();
                    return Err(foreign(doc_id, key, index));
                }
            };
            hashes.push(PropertyHash::create(manifest.digest, index, &key, &value));
            properties.push(PropertyEntry::new(key, value));
        }
        Ok(Fetched { properties, hashes })
    }
}

fn foreign(doc_id: &str, key: String, index: u64) -> DocError {
    DocError::ForeignProperty {
        doc_id: doc_id.to_string(),
        key,
        index,
    }
}

/// Drain the result and error queues until every submitted property is
/// accounted for.
async fn collect(
    doc_id: &str,
    streams: &WriteStreams,
    expected: usize,
    cancel: &CancellationToken,
) -> DocResult<PropertyHashList> {
    let mut hashes = PropertyHashList::with_capacity(expected);
    let mut failures = Vec::new();

    while hashes.len() + failures.len() < expected {
        let received = hashes.len() + failures.len();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DocError::Cancelled),
            Some(hash) = streams.next_result() => hashes.push(hash),
            Some(err) = streams.next_error() => match err {
                PoolError::Cancelled => return Err(DocError::Cancelled),
                err => failures.push(err.to_string()),
            },
            _ = streams.stopped() => return Err(DocError::Incomplete { expected, received }),
            else => return Err(DocError::Incomplete { expected, received }),
        }
    }

    if !failures.is_empty() {
        warn!(doc_id, failed = failures.len(), expected, "document store failed");
        return Err(DocError::Write {
            doc_id: doc_id.to_string(),
            failures,
        });
    }
    Ok(hashes)
}
