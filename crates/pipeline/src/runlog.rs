//! Append-only run log, flushed to the destination store at run end.

use bytes::Bytes;
use chrono::Local;
use pkgmirror_store::{BlobStore, StoreError};
use tracing::info;

/// Ordered human-readable outcome records for one run.
///
/// Created empty at run start, grows monotonically, flushed exactly once.
#[derive(Debug, Default)]
pub struct RunLog {
    records: Vec<String>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one record; order-preserving, no validation.
    pub fn append(&mut self, record: impl Into<String>) {
        self.records.push(record.into());
    }

    /// Records appended so far.
    pub fn records(&self) -> &[String] {
        &self.records
    }

    /// Writes all records, newline-joined, as one timestamped object under
    /// `folder`. Returns the object name.
    pub async fn flush(&self, store: &dyn BlobStore, folder: &str) -> Result<String, StoreError> {
        let object = format!("{folder}/{}.log", Local::now().format("%Y-%m-%d_%H-%M-%S"));
        let content = self.records.join("\n");
        store
            .put_object(&object, Bytes::from(content.into_bytes()))
            .await?;

        info!(object, records = self.records.len(), "run log flushed");
        Ok(object)
    }
}
