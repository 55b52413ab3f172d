//! Block-wise file reading and the chunked upload protocol.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use pkgmirror_store::BlobStore;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::{BLOCK_SIZE, TransferError};

/// Callback invoked with the byte count of each staged block.
pub type ProgressCallback = Box<dyn Fn(u64) + Send + Sync>;

/// Derives the wire identifier of the block at `index`.
fn block_id(index: usize) -> String {
    BASE64.encode(format!("block-{index}"))
}

/// Reads a file in fixed-size blocks.
pub struct BlockReader {
    file: File,
    block_size: usize,
    file_size: u64,
    read: u64,
}

impl BlockReader {
    /// Opens `path` for block-wise reading.
    ///
    /// A `block_size` of 0 selects [`BLOCK_SIZE`].
    pub async fn open(path: &Path, block_size: usize) -> std::io::Result<Self> {
        let file = File::open(path).await?;
        let file_size = file.metadata().await?.len();
        let block_size = if block_size == 0 { BLOCK_SIZE } else { block_size };
        Ok(Self {
            file,
            block_size,
            file_size,
            read: 0,
        })
    }

    /// Total file size in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Reads the next block. Returns `None` at EOF.
    pub async fn next_block(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        let remaining = self.file_size - self.read;
        if remaining == 0 {
            return Ok(None);
        }

        let len = remaining.min(self.block_size as u64) as usize;
        let mut buf = vec![0u8; len];
        self.file.read_exact(&mut buf).await?;
        self.read += len as u64;
        Ok(Some(buf))
    }
}

/// Uploads a local file to a named remote object in staged blocks.
///
/// Blocks are staged sequentially, each under an identifier derived from its
/// ordinal index, while the identifiers accumulate in an in-memory manifest.
/// Committing that manifest after the last block is the single visibility
/// transition; a failure at any block (or at commit) returns without
/// committing, leaving the destination object absent or in its prior state.
pub struct BlockUploader<'a> {
    store: &'a dyn BlobStore,
    block_size: usize,
    progress: Option<ProgressCallback>,
}

impl<'a> BlockUploader<'a> {
    pub fn new(store: &'a dyn BlobStore) -> Self {
        Self {
            store,
            block_size: BLOCK_SIZE,
            progress: None,
        }
    }

    /// Overrides the block size; 0 keeps [`BLOCK_SIZE`].
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Registers a per-block progress callback. Observability only; the
    /// callback cannot influence the upload.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Uploads the file at `path` as `object`.
    pub async fn upload(&self, path: &Path, object: &str) -> Result<(), TransferError> {
        let mut reader = BlockReader::open(path, self.block_size).await?;
        let mut manifest = Vec::new();

        let mut index = 0usize;
        while let Some(block) = reader.next_block().await? {
            let id = block_id(index);
            let len = block.len() as u64;
            self.store
                .stage_block(object, &id, Bytes::from(block))
                .await
                .map_err(|source| TransferError::StageBlock { index, source })?;
            manifest.push(id);
            if let Some(progress) = &self.progress {
                progress(len);
            }
            index += 1;
        }

        self.store
            .commit_block_list(object, &manifest)
            .await
            .map_err(|source| TransferError::Commit { source })?;

        debug!(object, blocks = manifest.len(), "block manifest committed");
        Ok(())
    }
}
