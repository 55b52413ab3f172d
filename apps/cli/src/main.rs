//! `pkgmirror` entry point.

mod config;
mod progress;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use object_store::azure::MicrosoftAzureBuilder;
use pkgmirror_pipeline::{PipelineDriver, RunOptions, RunReport, TransferOutcome, Workspace};
use pkgmirror_source::Client;
use pkgmirror_store::ObjectStoreAdapter;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, MirrorConfig};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match MirrorConfig::resolve(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "configuration error");
            return ExitCode::FAILURE;
        }
    };

    info!(version = env!("CARGO_PKG_VERSION"), "starting pkgmirror");

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "mirror run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: MirrorConfig) -> anyhow::Result<()> {
    let azure = MicrosoftAzureBuilder::new()
        .with_url(&config.account_url)
        .with_access_key(&config.account_key)
        .with_container_name(&config.container_name)
        .build()?;
    let store = ObjectStoreAdapter::new(Arc::new(azure));

    let source = Client::new(&config.source_url, &config.username, &config.password)?;
    let workspace = Workspace::new(&config.workspace_dir);

    let mut driver = PipelineDriver::new();
    let renderer = driver.take_events().map(|events| tokio::spawn(progress::render(events)));

    let options = RunOptions {
        log_folder: config.log_folder.clone(),
        block_size: 0,
    };
    let report = driver.run(&source, &store, &workspace, &options).await?;

    drop(driver);
    if let Some(renderer) = renderer {
        let _ = renderer.await;
    }

    summarize(&report);
    Ok(())
}

fn summarize(report: &RunReport) {
    let mut uploaded = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;
    for outcome in &report.outcomes {
        match outcome {
            TransferOutcome::Uploaded { .. } | TransferOutcome::UploadedAsFallback { .. } => {
                uploaded += 1;
            }
            TransferOutcome::Skipped { .. } => skipped += 1,
            TransferOutcome::Failed { .. } => failed += 1,
        }
    }

    info!(uploaded, skipped, failed, "mirror run finished");
    match (&report.log_object, &report.log_flush_error) {
        (Some(object), _) => info!(object = %object, "run log uploaded"),
        (None, Some(e)) => warn!(error = %e, "run log was not persisted"),
        (None, None) => {}
    }
}
