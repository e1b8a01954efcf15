use framegate_pipeline::{CancelSignal, Progress, RunControl};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::CliError;

const PROGRESS_BUFFER: usize = 64;
/// Log cadence when the container does not report a frame count.
const UNKNOWN_TOTAL_STEP: u64 = 100;

/// Run a pipeline pass on the blocking pool.
///
/// The pass gets a [`RunControl`] whose progress observer forwards into a
/// channel drained by a logging task, and whose cancel signal is raised on
/// Ctrl-C. Progress updates are dropped rather than stall the pass when the
/// logger falls behind.
pub async fn run_pass<T, F>(label: &'static str, job: F) -> Result<T, CliError>
where
    F: FnOnce(&mut RunControl<'_>) -> Result<T, CliError> + Send + 'static,
    T: Send + 'static,
{
    let cancel = CancelSignal::new();
    let (tx, rx) = mpsc::channel::<Progress>(PROGRESS_BUFFER);

    let reporter = tokio::spawn(log_progress(label, rx));

    let interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!(pass = label, "interrupt received, stopping after current frame");
            interrupt.cancel();
        }
    });

    let outcome = tokio::task::spawn_blocking(move || {
        let mut control = RunControl::new().with_cancel(cancel).with_progress(move |p| {
            let _ = tx.try_send(p);
        });
        job(&mut control)
    })
    .await;

    watcher.abort();
    let _ = reporter.await;
    outcome?
}

async fn log_progress(label: &'static str, mut rx: mpsc::Receiver<Progress>) {
    let mut last_step = None;
    while let Some(p) = rx.recv().await {
        let step = if p.total > 0 {
            (p.fraction() * 10.0) as u64
        } else {
            p.processed / UNKNOWN_TOTAL_STEP
        };
        if last_step != Some(step) {
            last_step = Some(step);
            info!(
                pass = label,
                processed = p.processed,
                total = p.total,
                percent = (p.fraction() * 100.0).round() as u64,
                "progress"
            );
        }
    }
}
