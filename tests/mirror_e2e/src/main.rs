fn main() {
    println!("Run `cargo test -p mirror-e2e` to execute the end-to-end scenarios.");
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::io::{Cursor, Read};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;
    use pkgmirror_pipeline::{
        FailureStage, PackageSource, PipelineDriver, PipelineError, RunOptions, TransferOutcome,
        Workspace,
    };
    use pkgmirror_source::{Error as SourceError, Package};
    use pkgmirror_store::{BlobStore, MemoryBlobStore, StoreError};
    use tempfile::TempDir;
    use tokio::io::AsyncWriteExt;

    /// Scripted catalog: a list of packages, each with fixed content.
    struct ScriptedSource {
        packages: Vec<(Package, Vec<u8>)>,
        fail_auth: bool,
        resolve_calls: AtomicUsize,
        download_calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(entries: &[(&str, &[u8])]) -> Self {
            let packages = entries
                .iter()
                .enumerate()
                .map(|(i, (name, content))| {
                    (
                        Package {
                            id: i as i64 + 1,
                            name: (*name).to_string(),
                        },
                        content.to_vec(),
                    )
                })
                .collect();
            Self {
                packages,
                fail_auth: false,
                resolve_calls: AtomicUsize::new(0),
                download_calls: AtomicUsize::new(0),
            }
        }

        fn content_of(&self, name: &str) -> &[u8] {
            &self
                .packages
                .iter()
                .find(|(p, _)| p.name == name)
                .expect("unknown package")
                .1
        }
    }

    #[async_trait::async_trait]
    impl PackageSource for ScriptedSource {
        async fn authenticate(&self) -> Result<(), SourceError> {
            if self.fail_auth {
                return Err(SourceError::Api {
                    status: 401,
                    body: "bad credentials".into(),
                });
            }
            Ok(())
        }

        async fn list_packages(&self) -> Result<Vec<Package>, SourceError> {
            Ok(self.packages.iter().map(|(p, _)| p.clone()).collect())
        }

        async fn resolve_download(&self, package: &Package) -> Result<String, SourceError> {
            self.resolve_calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("mock://{}", package.name))
        }

        async fn download(&self, location: &str, dest: &Path) -> Result<u64, SourceError> {
            self.download_calls.fetch_add(1, Ordering::SeqCst);
            let name = location.trim_start_matches("mock://");
            let content = self.content_of(name).to_vec();
            let mut file = tokio::fs::File::create(dest).await?;
            file.write_all(&content).await?;
            file.flush().await?;
            Ok(content.len() as u64)
        }
    }

    /// Store wrapper that fails staging of direct (non-`.zip`) uploads at a
    /// chosen block ordinal, or everywhere.
    struct BlockFailingStore {
        inner: MemoryBlobStore,
        fail_direct_at: Option<usize>,
        fail_fallback: bool,
        direct_stage_calls: AtomicUsize,
        fallback_stage_calls: AtomicUsize,
        commit_calls: AtomicUsize,
    }

    impl BlockFailingStore {
        fn new(fail_direct_at: Option<usize>, fail_fallback: bool) -> Self {
            Self {
                inner: MemoryBlobStore::new(),
                fail_direct_at,
                fail_fallback,
                direct_stage_calls: AtomicUsize::new(0),
                fallback_stage_calls: AtomicUsize::new(0),
                commit_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl BlobStore for BlockFailingStore {
        async fn list_object_names(&self) -> Result<BTreeSet<String>, StoreError> {
            self.inner.list_object_names().await
        }

        async fn stage_block(
            &self,
            object: &str,
            block_id: &str,
            data: Bytes,
        ) -> Result<(), StoreError> {
            let injected = StoreError::Stage {
                object: object.to_string(),
                block_id: block_id.to_string(),
                detail: "injected failure".into(),
            };
            if object.ends_with(".zip") {
                self.fallback_stage_calls.fetch_add(1, Ordering::SeqCst);
                if self.fail_fallback {
                    return Err(injected);
                }
            } else {
                let ordinal = self.direct_stage_calls.fetch_add(1, Ordering::SeqCst);
                if self.fail_direct_at == Some(ordinal) {
                    return Err(injected);
                }
            }
            self.inner.stage_block(object, block_id, data).await
        }

        async fn commit_block_list(
            &self,
            object: &str,
            block_ids: &[String],
        ) -> Result<(), StoreError> {
            self.commit_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.commit_block_list(object, block_ids).await
        }

        async fn put_object(&self, object: &str, data: Bytes) -> Result<(), StoreError> {
            self.inner.put_object(object, data).await
        }
    }

    fn log_content(store: &MemoryBlobStore, object: &str) -> String {
        String::from_utf8(store.object(object).expect("log object missing")).unwrap()
    }

    // Scenario A: empty inventory, one package, clean upload.
    #[tokio::test]
    async fn fresh_package_is_uploaded_and_logged() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::new(dir.path());
        let source =
            ScriptedSource::new(&[("Firefox.pkg", b"firefox installer bytes".as_slice())]);
        let store = MemoryBlobStore::new();

        let mut driver = PipelineDriver::new();
        let report = driver
            .run(&source, &store, &workspace, &RunOptions::default())
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert!(matches!(
            &report.outcomes[0],
            TransferOutcome::Uploaded { object, .. } if object == "Firefox.pkg"
        ));
        assert_eq!(
            store.object("Firefox.pkg").unwrap(),
            b"firefox installer bytes"
        );

        let log = log_content(&store, &report.log_object.unwrap());
        assert_eq!(log, "Uploaded: Firefox.pkg");

        // Workspace left clean.
        let remaining: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(remaining.is_empty());
    }

    // Scenario B: object already mirrored, nothing is transferred.
    #[tokio::test]
    async fn mirrored_package_is_skipped_without_transfer() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::new(dir.path());
        let source = ScriptedSource::new(&[("Firefox.pkg", b"new bytes".as_slice())]);
        let store = BlockFailingStore::new(None, false);
        store.inner.insert_object("Firefox.pkg", b"existing bytes");

        let mut driver = PipelineDriver::new();
        let report = driver
            .run(&source, &store, &workspace, &RunOptions::default())
            .await
            .unwrap();

        assert!(matches!(
            report.outcomes[0],
            TransferOutcome::Skipped { .. }
        ));
        assert_eq!(source.resolve_calls.load(Ordering::SeqCst), 0);
        assert_eq!(source.download_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.direct_stage_calls.load(Ordering::SeqCst), 0);
        // Only the run log was committed via put_object; no block commits.
        assert_eq!(store.commit_calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            store.inner.object("Firefox.pkg").unwrap(),
            b"existing bytes"
        );

        let log = log_content(
            &store.inner,
            &report.log_object.unwrap(),
        );
        assert_eq!(
            log,
            "Skipped (already exists): Firefox.pkg or Firefox.pkg.zip"
        );
    }

    // Scenario C: direct upload dies on block 3 of 5, fallback succeeds.
    #[tokio::test]
    async fn failed_direct_upload_falls_back_to_zip() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::new(dir.path());
        let content = b"0123456789abcdefghij"; // 5 blocks of 4 bytes
        let source = ScriptedSource::new(&[("Big.pkg", content.as_slice())]);
        let store = BlockFailingStore::new(Some(2), false);

        let mut driver = PipelineDriver::new();
        let options = RunOptions {
            block_size: 4,
            ..RunOptions::default()
        };
        let report = driver.run(&source, &store, &workspace, &options).await.unwrap();

        assert!(matches!(
            &report.outcomes[0],
            TransferOutcome::UploadedAsFallback { object, .. } if object == "Big.pkg.zip"
        ));
        // Direct object never appeared; the fallback artifact did.
        assert!(store.inner.object("Big.pkg").is_none());
        let archive_bytes = store.inner.object("Big.pkg.zip").unwrap();

        // The archive holds the original bytes under the original name.
        let mut archive = zip::ZipArchive::new(Cursor::new(archive_bytes)).unwrap();
        assert_eq!(archive.len(), 1);
        let mut entry = archive.by_name("Big.pkg").unwrap();
        let mut unpacked = Vec::new();
        entry.read_to_end(&mut unpacked).unwrap();
        assert_eq!(unpacked, content);

        // Direct staging stopped at the failed block: blocks 0, 1, 2.
        assert_eq!(store.direct_stage_calls.load(Ordering::SeqCst), 3);

        // Raw staged file and archive both removed from the workspace.
        let remaining: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(remaining.is_empty());

        let log = log_content(&store.inner, &report.log_object.unwrap());
        assert_eq!(log, "Uploaded: Big.pkg.zip");
    }

    // Scenario D: direct and fallback both fail; the run moves on.
    #[tokio::test]
    async fn double_failure_is_logged_and_run_continues() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::new(dir.path());
        let source = ScriptedSource::new(&[
            ("Doomed.pkg", b"unlucky bytes".as_slice()),
            ("Lucky.pkg", b"these make it".as_slice()),
        ]);
        let store = BlockFailingStore::new(Some(0), true);

        let mut driver = PipelineDriver::new();
        let report = driver
            .run(&source, &store, &workspace, &RunOptions::default())
            .await
            .unwrap();

        assert!(matches!(
            report.outcomes[0],
            TransferOutcome::Failed {
                stage: FailureStage::FallbackUpload,
                ..
            }
        ));
        // Fallback was attempted exactly once for the doomed package.
        assert_eq!(store.fallback_stage_calls.load(Ordering::SeqCst), 1);

        // The second package still went through; its direct upload uses the
        // next stage ordinal, which no longer matches the failure point.
        assert!(matches!(
            report.outcomes[1],
            TransferOutcome::Uploaded { .. }
        ));
        assert_eq!(store.inner.object("Lucky.pkg").unwrap(), b"these make it");

        let log = log_content(&store.inner, &report.log_object.unwrap());
        assert_eq!(
            log,
            "Failed to upload: Doomed.pkg.zip\nUploaded: Lucky.pkg"
        );
    }

    // Authentication failure aborts the run before any package work.
    #[tokio::test]
    async fn auth_failure_aborts_the_whole_run() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::new(dir.path());
        let mut source = ScriptedSource::new(&[("Firefox.pkg", b"bytes".as_slice())]);
        source.fail_auth = true;
        let store = MemoryBlobStore::new();

        let mut driver = PipelineDriver::new();
        let err = driver
            .run(&source, &store, &workspace, &RunOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Auth(_)));
        assert_eq!(source.resolve_calls.load(Ordering::SeqCst), 0);
        assert_eq!(source.download_calls.load(Ordering::SeqCst), 0);
        assert!(store.object("Firefox.pkg").is_none());
        // No run log either: the run never reached its end.
        let names = store.list_object_names().await.unwrap();
        assert!(!names.iter().any(|n| n.ends_with(".log")));
    }
}
