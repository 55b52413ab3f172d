//! Chunked upload to a blob store, content digests and the zip fallback.

mod archive;
mod chunked;
mod digest;

pub use archive::zip_file;
pub use chunked::{BlockReader, BlockUploader, ProgressCallback};
pub use digest::{digest_bytes, file_digest};

/// Upload block size: 4 MiB.
pub const BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("staging block {index} failed: {source}")]
    StageBlock {
        index: usize,
        #[source]
        source: pkgmirror_store::StoreError,
    },

    #[error("commit failed: {source}")]
    Commit {
        #[source]
        source: pkgmirror_store::StoreError,
    },

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}
