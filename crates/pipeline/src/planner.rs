//! Per-package transfer decision and execution.

use std::collections::BTreeSet;
use std::path::Path;

use pkgmirror_source::Package;
use pkgmirror_store::BlobStore;
use pkgmirror_transfer::{BlockUploader, TransferError, file_digest, zip_file};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::source::PackageSource;
use crate::types::{FailureStage, RunEvent, TransferOutcome};
use crate::workspace::Workspace;

/// Drives one package to a terminal [`TransferOutcome`].
///
/// The decision tree: skip against the pre-run inventory, otherwise
/// resolve → download → digest → direct upload, with a single zip-fallback
/// attempt after a failed direct upload. Every remote call is attempted
/// once per stage; retry policy does not exist beyond the fallback.
pub struct TransferPlanner<'a> {
    source: &'a dyn PackageSource,
    store: &'a dyn BlobStore,
    workspace: &'a Workspace,
    block_size: usize,
    events: mpsc::Sender<RunEvent>,
}

impl<'a> TransferPlanner<'a> {
    pub fn new(
        source: &'a dyn PackageSource,
        store: &'a dyn BlobStore,
        workspace: &'a Workspace,
        events: mpsc::Sender<RunEvent>,
    ) -> Self {
        Self {
            source,
            store,
            workspace,
            block_size: 0,
            events,
        }
    }

    /// Overrides the upload block size; 0 keeps the default.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Runs the decision algorithm for `package` against the pre-run
    /// `inventory` snapshot.
    pub async fn process(
        &self,
        package: &Package,
        inventory: &BTreeSet<String>,
    ) -> TransferOutcome {
        let name = &package.name;
        self.emit(RunEvent::PackageStarted { name: name.clone() }).await;

        let fallback_object = format!("{name}.zip");
        if inventory.contains(name) || inventory.contains(&fallback_object) {
            info!(package = %name, "already mirrored, skipping");
            return self
                .finish(TransferOutcome::Skipped { name: name.clone() })
                .await;
        }

        let location = match self.source.resolve_download(package).await {
            Ok(location) => location,
            Err(e) => {
                warn!(package = %name, error = %e, "download location resolution failed");
                return self.finish(failed(FailureStage::Resolve, name, e)).await;
            }
        };

        let staged = match self.workspace.staging_path(name) {
            Ok(path) => path,
            Err(e) => {
                warn!(package = %name, error = %e, "unusable package name");
                return self.finish(failed(FailureStage::Download, name, e)).await;
            }
        };

        match self.source.download(&location, &staged).await {
            Ok(bytes) => info!(package = %name, bytes, "downloaded"),
            Err(e) => {
                // The partial file stays for inspection; the next run's
                // workspace reset removes it.
                warn!(
                    package = %name,
                    error = %e,
                    staged = %staged.display(),
                    "download failed, partial file kept"
                );
                return self.finish(failed(FailureStage::Download, name, e)).await;
            }
        }

        // Recorded for integrity verification; does not gate the skip
        // decision.
        let digest = match file_digest(&staged).await {
            Ok(digest) => {
                info!(package = %name, digest = %digest, "content digest");
                digest
            }
            Err(e) => {
                warn!(package = %name, error = %e, "could not digest staged file");
                return self.finish(failed(FailureStage::Download, name, e)).await;
            }
        };

        match self.upload(&staged, name).await {
            Ok(()) => {
                self.remove_local(&staged).await;
                return self
                    .finish(TransferOutcome::Uploaded {
                        object: name.clone(),
                        digest,
                    })
                    .await;
            }
            Err(e) => {
                warn!(package = %name, error = %e, "direct upload failed, attempting zip fallback");
            }
        }

        let outcome = self.fallback(&staged, name, &fallback_object, digest).await;
        // The raw staged file is removed once its upload stage reached a
        // terminal outcome, success or not.
        self.remove_local(&staged).await;
        self.finish(outcome).await
    }

    /// The single fallback attempt: wrap in a zip, upload under the `.zip`
    /// name, and remove the archive either way.
    async fn fallback(
        &self,
        staged: &Path,
        name: &str,
        fallback_object: &str,
        digest: String,
    ) -> TransferOutcome {
        let source_path = staged.to_path_buf();
        let archive = match tokio::task::spawn_blocking(move || zip_file(&source_path)).await {
            Ok(Ok(archive)) => archive,
            Ok(Err(e)) => {
                warn!(package = %name, error = %e, "fallback archive creation failed");
                return failed(FailureStage::FallbackUpload, name, e);
            }
            Err(e) => {
                warn!(package = %name, error = %e, "fallback archive task failed");
                return failed(FailureStage::FallbackUpload, name, e);
            }
        };

        let result = self.upload(&archive, fallback_object).await;
        self.remove_local(&archive).await;

        match result {
            Ok(()) => TransferOutcome::UploadedAsFallback {
                object: fallback_object.to_string(),
                digest,
            },
            Err(e) => {
                warn!(package = %name, error = %e, "fallback upload failed");
                failed(FailureStage::FallbackUpload, name, e)
            }
        }
    }

    async fn upload(&self, path: &Path, object: &str) -> Result<(), TransferError> {
        let total_bytes = tokio::fs::metadata(path).await?.len();
        self.emit(RunEvent::UploadStarted {
            object: object.to_string(),
            total_bytes,
        })
        .await;

        let events = self.events.clone();
        let event_object = object.to_string();
        BlockUploader::new(self.store)
            .with_block_size(self.block_size)
            .with_progress(Box::new(move |bytes| {
                // Display only; a saturated or closed channel must not
                // stall the transfer.
                let _ = events.try_send(RunEvent::BlockStaged {
                    object: event_object.clone(),
                    bytes,
                });
            }))
            .upload(path, object)
            .await
    }

    async fn remove_local(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "could not remove staged file");
        }
    }

    async fn finish(&self, outcome: TransferOutcome) -> TransferOutcome {
        self.emit(RunEvent::PackageCompleted {
            outcome: outcome.clone(),
        })
        .await;
        outcome
    }

    async fn emit(&self, event: RunEvent) {
        let _ = self.events.send(event).await;
    }
}

fn failed(stage: FailureStage, name: &str, err: impl std::fmt::Display) -> TransferOutcome {
    TransferOutcome::Failed {
        stage,
        name: name.to_string(),
        detail: err.to_string(),
    }
}
