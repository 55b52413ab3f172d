//! In-memory [`BlobStore`] used by unit and scenario tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use bytes::Bytes;

use crate::{BlobStore, StoreError};

/// In-memory store with staged-vs-committed visibility semantics.
///
/// Staged blocks live in a side table and never show up in listings or
/// object reads until committed, mirroring how a block-blob backend behaves.
#[derive(Default)]
pub struct MemoryBlobStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    objects: HashMap<String, Vec<u8>>,
    staged: HashMap<String, HashMap<String, Bytes>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates a committed object (test setup).
    pub fn insert_object(&self, name: &str, data: &[u8]) {
        let mut inner = self.inner.lock().unwrap();
        inner.objects.insert(name.to_string(), data.to_vec());
    }

    /// Returns the committed content of `name`, if present.
    pub fn object(&self, name: &str) -> Option<Vec<u8>> {
        let inner = self.inner.lock().unwrap();
        inner.objects.get(name).cloned()
    }

    /// Returns `true` if any block of `object` is staged but uncommitted.
    pub fn has_staged(&self, object: &str) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.staged.get(object).is_some_and(|m| !m.is_empty())
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    async fn list_object_names(&self) -> Result<BTreeSet<String>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.objects.keys().cloned().collect())
    }

    async fn stage_block(
        &self,
        object: &str,
        block_id: &str,
        data: Bytes,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .staged
            .entry(object.to_string())
            .or_default()
            .insert(block_id.to_string(), data);
        Ok(())
    }

    async fn commit_block_list(
        &self,
        object: &str,
        block_ids: &[String],
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let mut staged = inner.staged.remove(object).unwrap_or_default();

        let mut content = Vec::new();
        for id in block_ids {
            let block = staged.remove(id).ok_or_else(|| StoreError::UnknownBlock {
                object: object.to_string(),
                block_id: id.clone(),
            })?;
            content.extend_from_slice(&block);
        }

        inner.objects.insert(object.to_string(), content);
        Ok(())
    }

    async fn put_object(&self, object: &str, data: Bytes) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.objects.insert(object.to_string(), data.to_vec());
        Ok(())
    }
}
