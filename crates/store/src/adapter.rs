//! Production [`BlobStore`] over the `object_store` crate.
//!
//! `stage_block` feeds a native multipart upload, one per destination
//! object; `commit_block_list` completes it, which is the backend's atomic
//! visibility transition. A staging or commit failure aborts the native
//! upload so nothing dangles server-side.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use object_store::path::Path as ObjectPath;
use object_store::{MultipartUpload, ObjectStore};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{BlobStore, StoreError};

/// [`BlobStore`] backed by any `object_store` implementation.
pub struct ObjectStoreAdapter {
    store: Arc<dyn ObjectStore>,
    pending: Mutex<HashMap<String, Pending>>,
}

struct Pending {
    upload: Box<dyn MultipartUpload>,
    staged_ids: Vec<String>,
}

impl ObjectStoreAdapter {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            pending: Mutex::new(HashMap::new()),
        }
    }

    async fn abort_pending(&self, object: &str, mut pending: Pending) {
        if let Err(e) = pending.upload.abort().await {
            warn!(object, error = %e, "could not abort multipart upload");
        }
    }
}

#[async_trait::async_trait]
impl BlobStore for ObjectStoreAdapter {
    async fn list_object_names(&self) -> Result<BTreeSet<String>, StoreError> {
        let mut names = BTreeSet::new();
        let mut entries = self.store.list(None);
        while let Some(entry) = entries.next().await {
            let meta = entry.map_err(|e| StoreError::List(e.to_string()))?;
            names.insert(meta.location.to_string());
        }
        Ok(names)
    }

    async fn stage_block(
        &self,
        object: &str,
        block_id: &str,
        data: Bytes,
    ) -> Result<(), StoreError> {
        let stage_err = |detail: String| StoreError::Stage {
            object: object.to_string(),
            block_id: block_id.to_string(),
            detail,
        };

        let mut pending = self.pending.lock().await;
        let entry = match pending.entry(object.to_string()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(v) => {
                let upload = self
                    .store
                    .put_multipart(&ObjectPath::from(object))
                    .await
                    .map_err(|e| stage_err(e.to_string()))?;
                v.insert(Pending {
                    upload,
                    staged_ids: Vec::new(),
                })
            }
        };

        match entry.upload.put_part(data.into()).await {
            Ok(()) => {
                entry.staged_ids.push(block_id.to_string());
                Ok(())
            }
            Err(e) => {
                if let Some(abandoned) = pending.remove(object) {
                    drop(pending);
                    self.abort_pending(object, abandoned).await;
                }
                Err(stage_err(e.to_string()))
            }
        }
    }

    async fn commit_block_list(
        &self,
        object: &str,
        block_ids: &[String],
    ) -> Result<(), StoreError> {
        let commit_err = |detail: String| StoreError::Commit {
            object: object.to_string(),
            detail,
        };

        let mut pending = self.pending.lock().await;
        let Some(mut entry) = pending.remove(object) else {
            // Zero-block files stage nothing; an empty manifest still
            // produces an (empty) object.
            if block_ids.is_empty() {
                return self.put_object(object, Bytes::new()).await;
            }
            return Err(StoreError::NothingStaged {
                object: object.to_string(),
            });
        };
        drop(pending);

        // Native multipart backends persist parts in staging order only.
        if entry.staged_ids != block_ids {
            self.abort_pending(object, entry).await;
            return Err(commit_err("manifest does not match staging order".into()));
        }

        match entry.upload.complete().await {
            Ok(_) => {
                debug!(object, blocks = block_ids.len(), "multipart upload completed");
                Ok(())
            }
            Err(e) => {
                self.abort_pending(object, entry).await;
                Err(commit_err(e.to_string()))
            }
        }
    }

    async fn put_object(&self, object: &str, data: Bytes) -> Result<(), StoreError> {
        self.store
            .put(&ObjectPath::from(object), data.into())
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Write {
                object: object.to_string(),
                detail: e.to_string(),
            })
    }
}
