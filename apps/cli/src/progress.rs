//! Terminal rendering of run events.

use indicatif::{ProgressBar, ProgressStyle};
use pkgmirror_pipeline::RunEvent;
use tokio::sync::mpsc;

fn upload_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg} [{bar:40}] {bytes}/{total_bytes} ({bytes_per_sec})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Renders run events until the channel closes.
///
/// One progress bar per upload attempt; outcome lines are printed as each
/// package reaches its terminal state.
pub async fn render(mut events: mpsc::Receiver<RunEvent>) {
    let mut bar: Option<ProgressBar> = None;

    while let Some(event) = events.recv().await {
        match event {
            RunEvent::PackageStarted { .. } => {}
            RunEvent::UploadStarted {
                object,
                total_bytes,
            } => {
                let b = ProgressBar::new(total_bytes);
                b.set_style(upload_style());
                b.set_message(object);
                bar = Some(b);
            }
            RunEvent::BlockStaged { bytes, .. } => {
                if let Some(b) = &bar {
                    b.inc(bytes);
                }
            }
            RunEvent::PackageCompleted { outcome } => {
                if let Some(b) = bar.take() {
                    b.finish_and_clear();
                }
                println!("{}", outcome.log_line());
            }
        }
    }
}
