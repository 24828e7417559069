//! Diagram queue status values, pacing and wait estimation.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Jobs claimed per processor run.
pub const DEFAULT_BATCH_SIZE: u32 = 60;
/// Minimum spacing between generator calls (downstream rate limit).
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1000);
/// How often the processor runs.
pub const DEFAULT_RUN_INTERVAL: Duration = Duration::from_secs(60);
/// A `processing` row older than this is assumed abandoned.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(600);

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle of a diagram job: `queued -> processing -> complete | failed`.
///
/// Stored as lowercase text in both `diagram_queue.status` and
/// `artifact_versions.diagram_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramStatus {
    Queued,
    Processing,
    Complete,
    Failed,
}

impl DiagramStatus {
    pub const ALL: [DiagramStatus; 4] = [
        DiagramStatus::Queued,
        DiagramStatus::Processing,
        DiagramStatus::Complete,
        DiagramStatus::Failed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DiagramStatus::Queued => "queued",
            DiagramStatus::Processing => "processing",
            DiagramStatus::Complete => "complete",
            DiagramStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DiagramStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagramStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiagramStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown diagram status '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Pacing and estimation
// ---------------------------------------------------------------------------

/// Remaining wait so consecutive generator calls are at least
/// `min_interval` apart: `max(0, min_interval - elapsed)`.
pub fn pacing_delay(min_interval: Duration, elapsed: Duration) -> Duration {
    min_interval.saturating_sub(elapsed)
}

/// Estimated seconds until a job at 1-based FIFO `position` is processed.
///
/// Jobs beyond the first `batch_size` wait for whole runs; within a run each
/// job ahead costs one pacing interval.
pub fn estimate_wait_secs(
    position: u64,
    batch_size: u32,
    min_interval: Duration,
    run_interval: Duration,
) -> u64 {
    let position = position.max(1);
    let batch_size = u64::from(batch_size.max(1));
    let runs_ahead = (position - 1) / batch_size;
    let slot = (position - 1) % batch_size + 1;
    let per_job_ms = min_interval.as_millis() as u64;
    let wait_ms = runs_ahead * run_interval.as_millis() as u64 + slot * per_job_ms;
    wait_ms.div_ceil(1000)
}
