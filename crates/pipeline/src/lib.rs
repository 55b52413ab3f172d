//! One mirror run: decide per package, transfer, record, flush.
//!
//! The driver enumerates the destination inventory and the source catalog,
//! feeds every package through the planner's skip/transfer/fallback decision
//! tree, accumulates a run log and flushes it to the destination store at
//! the end. Collaborators are consumed through capability traits
//! ([`PackageSource`], [`pkgmirror_store::BlobStore`]) so runs are fully
//! testable without a network.

mod driver;
mod error;
mod planner;
mod runlog;
mod source;
mod types;
mod workspace;

pub use driver::{PipelineDriver, RunOptions, RunReport};
pub use error::PipelineError;
pub use planner::TransferPlanner;
pub use runlog::RunLog;
pub use source::PackageSource;
pub use types::{FailureStage, RunEvent, TransferOutcome};
pub use workspace::{InvalidName, Workspace, ensure_folder_marker};
