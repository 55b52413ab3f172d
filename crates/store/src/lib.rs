//! Destination blob-store interface and backends.
//!
//! The pipeline writes to the destination container exclusively through the
//! [`BlobStore`] trait: name listing, block staging, manifest commit and
//! whole-object writes. [`MemoryBlobStore`] backs tests;
//! [`ObjectStoreAdapter`] backs real object storage via the `object_store`
//! crate.

mod adapter;
mod memory;

pub use adapter::ObjectStoreAdapter;
pub use memory::MemoryBlobStore;

use std::collections::BTreeSet;

use bytes::Bytes;

/// Errors produced by destination-store backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("listing objects failed: {0}")]
    List(String),

    #[error("staging block `{block_id}` of `{object}` failed: {detail}")]
    Stage {
        object: String,
        block_id: String,
        detail: String,
    },

    #[error("committing `{object}` failed: {detail}")]
    Commit { object: String, detail: String },

    #[error("writing `{object}` failed: {detail}")]
    Write { object: String, detail: String },

    #[error("no staged blocks for `{object}`")]
    NothingStaged { object: String },

    #[error("unknown block id `{block_id}` for `{object}`")]
    UnknownBlock { object: String, block_id: String },
}

/// Write/list surface of the destination container.
///
/// Block staging plus the manifest commit form the durability protocol:
/// staged blocks are invisible to readers until `commit_block_list` makes
/// the whole object appear at once. `put_object` is the single-call path
/// used for run logs and folder markers, never for package payloads.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns every object name currently in the container.
    async fn list_object_names(&self) -> Result<BTreeSet<String>, StoreError>;

    /// Stages one block of `object` under `block_id` without making it
    /// visible.
    async fn stage_block(
        &self,
        object: &str,
        block_id: &str,
        data: Bytes,
    ) -> Result<(), StoreError>;

    /// Commits the staged blocks, in the given order, as the content of
    /// `object`.
    async fn commit_block_list(
        &self,
        object: &str,
        block_ids: &[String],
    ) -> Result<(), StoreError>;

    /// Writes `object` in a single call.
    async fn put_object(&self, object: &str, data: Bytes) -> Result<(), StoreError>;
}
