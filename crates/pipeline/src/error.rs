//! Pipeline error types.

/// Run-fatal errors.
///
/// Per-package failures are [`crate::TransferOutcome::Failed`] values, not
/// errors; anything surfacing here aborts the whole run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("authentication failed: {0}")]
    Auth(#[source] pkgmirror_source::Error),

    #[error("catalog listing failed: {0}")]
    Catalog(#[source] pkgmirror_source::Error),

    #[error("log-folder marker failed: {0}")]
    FolderMarker(#[source] pkgmirror_store::StoreError),

    #[error("inventory listing failed: {0}")]
    Inventory(#[from] pkgmirror_store::StoreError),

    #[error("workspace error: {0}")]
    Workspace(#[from] std::io::Error),
}
