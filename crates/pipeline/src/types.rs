//! Run-level value types: outcomes, failure stages, display events.

use std::fmt;

/// Stage at which a per-package transfer failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Resolve,
    Download,
    FallbackUpload,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureStage::Resolve => "resolve",
            FailureStage::Download => "download",
            FailureStage::FallbackUpload => "fallback-upload",
        })
    }
}

/// Terminal result of one package in one run.
///
/// Produced exactly once per catalog package and never mutated; the run log
/// records `log_line()` for each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// `{name}` or `{name}.zip` already existed before the run.
    Skipped { name: String },
    /// Direct upload committed as `object`.
    Uploaded { object: String, digest: String },
    /// Fallback archive committed as `object` after a failed direct upload.
    UploadedAsFallback { object: String, digest: String },
    /// No artifact produced; the run continues with the next package.
    Failed {
        stage: FailureStage,
        name: String,
        detail: String,
    },
}

impl TransferOutcome {
    /// The run-log line for this outcome.
    pub fn log_line(&self) -> String {
        match self {
            TransferOutcome::Skipped { name } => {
                format!("Skipped (already exists): {name} or {name}.zip")
            }
            TransferOutcome::Uploaded { object, .. }
            | TransferOutcome::UploadedAsFallback { object, .. } => {
                format!("Uploaded: {object}")
            }
            TransferOutcome::Failed { stage, name, .. } => match stage {
                FailureStage::Resolve => format!("Failed to retrieve URL for: {name}"),
                FailureStage::Download => format!("Failed to download: {name}"),
                FailureStage::FallbackUpload => format!("Failed to upload: {name}.zip"),
            },
        }
    }
}

/// Display notification emitted while a run progresses.
///
/// Events never carry control flow; a dropped or saturated receiver does
/// not affect the run.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// A package left the queue and is being decided.
    PackageStarted { name: String },
    /// An upload attempt began; `total_bytes` sizes the progress display.
    UploadStarted { object: String, total_bytes: u64 },
    /// One block of `object` was staged.
    BlockStaged { object: String, bytes: u64 },
    /// The package reached a terminal outcome.
    PackageCompleted { outcome: TransferOutcome },
}
