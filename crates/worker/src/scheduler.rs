//! Fixed-interval driver for the queue processor.

use std::sync::Arc;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::processor::QueueProcessor;

/// Run [`QueueProcessor::run_once`] every `run_interval` until `cancel`
/// fires. The first run starts immediately. A run that overlaps the next
/// tick delays it rather than bursting.
pub async fn run(processor: Arc<QueueProcessor>, cancel: CancellationToken) {
    let run_interval = processor.config().run_interval;
    tracing::info!(
        interval_secs = run_interval.as_secs(),
        batch_size = processor.config().batch_size,
        "Diagram queue scheduler started",
    );

    let mut interval = tokio::time::interval(run_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Diagram queue scheduler stopping");
                break;
            }
            _ = interval.tick() => {
                if let Err(e) = processor.run_once().await {
                    tracing::error!(error = %e, "Diagram queue run failed");
                }
            }
        }
    }
}
