//! One pass over the diagram queue.
//!
//! Jobs are claimed one at a time (oldest first) up to the batch size and
//! handled strictly in sequence. A failing job is recorded and skipped; it
//! never aborts the batch. Generator calls are paced start-to-start so the
//! downstream endpoint sees at most one request per `min_interval`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use ohm_core::circuit::CircuitJson;
use ohm_core::hashing::circuit_hash;
use ohm_core::queue::pacing_delay;
use ohm_render::{DiagramGenerator, RenderError};
use serde::Serialize;

use crate::config::ProcessorConfig;
use crate::store::{ClaimedJob, DiagramStore, StoreError};

/// Upper bound for the stale-claim window (one year).
const MAX_STALE_SECS: u64 = 365 * 24 * 60 * 60;

// ---------------------------------------------------------------------------
// Results and errors
// ---------------------------------------------------------------------------

/// Outcome counts for one run, returned by the cron endpoint as
/// `{processed, cached, failed, total, duration}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessSummary {
    /// Jobs completed, cache hits included.
    pub processed: u32,
    /// Completions served from the cache.
    pub cached: u32,
    pub failed: u32,
    /// Jobs claimed this run.
    pub total: u32,
    /// Wall-clock run time in milliseconds.
    #[serde(rename = "duration")]
    pub duration_ms: u64,
}

/// A run-level failure. Per-job problems never surface here.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Queue store error: {0}")]
    Store(#[from] StoreError),
}

/// Why a single job failed. The display text becomes `error_message`.
#[derive(Debug, thiserror::Error)]
enum JobError {
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(String),

    #[error("Diagram generation failed: {0}")]
    Render(#[from] RenderError),

    #[error("{0}")]
    Store(#[from] StoreError),
}

#[derive(Debug)]
enum JobOutcome {
    Rendered,
    Cached,
}

// ---------------------------------------------------------------------------
// QueueProcessor
// ---------------------------------------------------------------------------

/// Drains queued diagram jobs through the cache and the generator.
pub struct QueueProcessor {
    store: Arc<dyn DiagramStore>,
    generator: Arc<dyn DiagramGenerator>,
    config: ProcessorConfig,
}

impl QueueProcessor {
    pub fn new(
        store: Arc<dyn DiagramStore>,
        generator: Arc<dyn DiagramGenerator>,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            store,
            generator,
            config,
        }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Process up to `batch_size` queued jobs and report what happened.
    ///
    /// Fails only if the store cannot requeue or claim; everything that goes
    /// wrong inside a job is recorded on that job.
    pub async fn run_once(&self) -> Result<ProcessSummary, ProcessError> {
        let started = Instant::now();
        let mut summary = ProcessSummary::default();

        let stale_secs = self.config.stale_after.as_secs().min(MAX_STALE_SECS) as i64;
        let cutoff = Utc::now() - chrono::Duration::seconds(stale_secs);
        let requeued = self.store.requeue_stale(cutoff).await?;
        if requeued > 0 {
            tracing::warn!(requeued, "Requeued abandoned diagram jobs");
        }

        // Start time of the previous generator call, for pacing.
        let mut last_call: Option<Instant> = None;

        while summary.total < self.config.batch_size {
            let Some(job) = self.store.claim_next().await? else {
                break;
            };
            summary.total += 1;

            match self.process_job(&job, &mut last_call).await {
                Ok(JobOutcome::Cached) => {
                    summary.processed += 1;
                    summary.cached += 1;
                }
                Ok(JobOutcome::Rendered) => summary.processed += 1,
                Err(e) => {
                    summary.failed += 1;
                    let message = e.to_string();
                    tracing::error!(
                        job_id = job.id,
                        artifact_id = job.artifact_id,
                        error = %message,
                        "Diagram job failed",
                    );
                    if let Err(store_err) = self.store.fail(&job, &message).await {
                        tracing::error!(
                            job_id = job.id,
                            error = %store_err,
                            "Failed to record diagram job failure",
                        );
                    }
                }
            }
        }

        summary.duration_ms = started.elapsed().as_millis() as u64;

        if summary.total > 0 {
            tracing::info!(
                processed = summary.processed,
                cached = summary.cached,
                failed = summary.failed,
                total = summary.total,
                duration_ms = summary.duration_ms,
                "Diagram queue run finished",
            );
        } else {
            tracing::debug!("Diagram queue empty");
        }

        Ok(summary)
    }

    /// Cache lookup, then generation on a miss.
    async fn process_job(
        &self,
        job: &ClaimedJob,
        last_call: &mut Option<Instant>,
    ) -> Result<JobOutcome, JobError> {
        let circuit = CircuitJson::parse_checked(&job.circuit_json).map_err(|errors| {
            let detail: Vec<String> = errors
                .iter()
                .map(|e| format!("{} {}", e.field, e.message))
                .collect();
            JobError::InvalidCircuit(detail.join("; "))
        })?;

        let hash = if job.circuit_hash.is_empty() {
            circuit_hash(&circuit)
        } else {
            job.circuit_hash.clone()
        };

        if let Some(url) = self.store.cached_url(&hash).await? {
            tracing::info!(job_id = job.id, circuit_hash = %hash, "Diagram served from cache");
            self.store.complete(job, &url, true).await?;
            return Ok(JobOutcome::Cached);
        }

        if let Some(previous) = *last_call {
            let delay = pacing_delay(self.config.min_interval, previous.elapsed());
            if delay > Duration::ZERO {
                tracing::debug!(delay_ms = delay.as_millis() as u64, "Pacing generator call");
                tokio::time::sleep(delay).await;
            }
        }
        *last_call = Some(Instant::now());

        let url = self.generator.generate(&circuit).await?;

        // A cache write failure does not invalidate the rendered diagram.
        let url = match self.store.cache_url(&hash, &url).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(job_id = job.id, error = %e, "Failed to cache rendered diagram");
                url
            }
        };

        self.store.complete(job, &url, false).await?;
        tracing::info!(job_id = job.id, circuit_hash = %hash, "Diagram rendered");
        Ok(JobOutcome::Rendered)
    }
}
