//! Scratch-directory hygiene and destination folder markers.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use pkgmirror_store::{BlobStore, StoreError};
use tracing::{debug, warn};

/// Error for catalog names unusable as staging file names.
#[derive(Debug, thiserror::Error)]
#[error("invalid package name `{0}`")]
pub struct InvalidName(pub String);

/// Scratch directory for staged downloads; exclusive to one run.
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The scratch directory root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the scratch directory if needed and deletes everything in it.
    ///
    /// Called once at run start. Deletion is best-effort; entries that
    /// cannot be removed are logged and left behind.
    pub async fn reset(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;

        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let removed = if entry.file_type().await?.is_dir() {
                tokio::fs::remove_dir_all(&path).await
            } else {
                tokio::fs::remove_file(&path).await
            };
            if let Err(e) = removed {
                warn!(path = %path.display(), error = %e, "could not clear workspace entry");
            }
        }

        debug!(root = %self.root.display(), "workspace reset");
        Ok(())
    }

    /// Returns the staging path for a catalog-supplied name.
    ///
    /// Names come from a remote catalog; anything other than a single plain
    /// file name is rejected.
    pub fn staging_path(&self, name: &str) -> Result<PathBuf, InvalidName> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }
}

fn validate_name(name: &str) -> Result<(), InvalidName> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(InvalidName(name.to_string())),
    }
}

/// Makes `{folder}/` discoverable by prefix-based listings: writes an empty
/// `{folder}/blob` object when nothing under the prefix exists yet.
/// Idempotent.
pub async fn ensure_folder_marker(store: &dyn BlobStore, folder: &str) -> Result<(), StoreError> {
    let prefix = format!("{folder}/");
    let names = store.list_object_names().await?;
    if names.iter().any(|n| n.starts_with(&prefix)) {
        return Ok(());
    }

    let marker = format!("{folder}/blob");
    store.put_object(&marker, Bytes::new()).await?;
    debug!(marker, "created folder marker");
    Ok(())
}
