//! Run orchestration: inventory snapshot, sequential processing, log flush.

use std::collections::BTreeSet;

use pkgmirror_store::BlobStore;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::error::PipelineError;
use crate::planner::TransferPlanner;
use crate::runlog::RunLog;
use crate::source::PackageSource;
use crate::types::{RunEvent, TransferOutcome};
use crate::workspace::{Workspace, ensure_folder_marker};

/// Options for one mirror run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Logical folder for run-log objects.
    pub log_folder: String,
    /// Upload block size override; 0 keeps the default.
    pub block_size: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            log_folder: "logs".into(),
            block_size: 0,
        }
    }
}

/// Everything a finished run reports.
#[derive(Debug)]
pub struct RunReport {
    /// Terminal outcome per catalog package, in catalog order.
    pub outcomes: Vec<TransferOutcome>,
    /// Name of the flushed log object, when the flush succeeded.
    pub log_object: Option<String>,
    /// Flush error message; never affects the outcomes above.
    pub log_flush_error: Option<String>,
}

/// Orchestrates one run from catalog enumeration through log flush.
///
/// Packages are processed strictly sequentially: each reaches its terminal
/// outcome before the next begins. Display events are available through
/// [`take_events`](Self::take_events).
pub struct PipelineDriver {
    events_tx: mpsc::Sender<RunEvent>,
    events_rx: Option<mpsc::Receiver<RunEvent>>,
}

impl Default for PipelineDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineDriver {
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<RunEvent>> {
        self.events_rx.take()
    }

    /// Executes one full run.
    ///
    /// Fatal conditions (authentication, catalog or inventory listing,
    /// workspace reset) return `Err` before any package is touched;
    /// per-package failures become `Failed` outcomes and the run continues.
    pub async fn run(
        &mut self,
        source: &dyn PackageSource,
        store: &dyn BlobStore,
        workspace: &Workspace,
        options: &RunOptions,
    ) -> Result<RunReport, PipelineError> {
        // An unclaimed receiver would fill up and stall the run.
        drop(self.events_rx.take());

        workspace.reset().await?;
        ensure_folder_marker(store, &options.log_folder)
            .await
            .map_err(PipelineError::FolderMarker)?;

        source.authenticate().await.map_err(PipelineError::Auth)?;

        let inventory: BTreeSet<String> = store.list_object_names().await?;
        let packages = source
            .list_packages()
            .await
            .map_err(PipelineError::Catalog)?;
        info!(
            packages = packages.len(),
            inventory = inventory.len(),
            "starting mirror run"
        );

        let planner = TransferPlanner::new(source, store, workspace, self.events_tx.clone())
            .with_block_size(options.block_size);

        let mut log = RunLog::new();
        let mut outcomes = Vec::with_capacity(packages.len());
        for package in &packages {
            let outcome = planner.process(package, &inventory).await;
            info!(package = %package.name, outcome = %outcome.log_line(), "package processed");
            log.append(outcome.log_line());
            outcomes.push(outcome);
        }

        let (log_object, log_flush_error) = match log.flush(store, &options.log_folder).await {
            Ok(object) => (Some(object), None),
            Err(e) => {
                error!(error = %e, "run-log flush failed; transfer outcomes are unaffected");
                (None, Some(e.to_string()))
            }
        };

        Ok(RunReport {
            outcomes,
            log_object,
            log_flush_error,
        })
    }
}
