use std::time::Duration;

use ohm_core::queue::{
    DEFAULT_BATCH_SIZE, DEFAULT_MIN_INTERVAL, DEFAULT_RUN_INTERVAL, DEFAULT_STALE_AFTER,
};

/// Queue processor tuning.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Maximum jobs claimed per run.
    pub batch_size: u32,
    /// Minimum spacing between generator calls.
    pub min_interval: Duration,
    /// `processing` rows claimed longer ago than this are requeued.
    pub stale_after: Duration,
    /// Spacing between scheduled runs.
    pub run_interval: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            min_interval: DEFAULT_MIN_INTERVAL,
            stale_after: DEFAULT_STALE_AFTER,
            run_interval: DEFAULT_RUN_INTERVAL,
        }
    }
}

impl ProcessorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default |
    /// |-----------------------------|---------|
    /// | `DIAGRAM_BATCH_SIZE`        | `60`    |
    /// | `DIAGRAM_MIN_INTERVAL_MS`   | `1000`  |
    /// | `DIAGRAM_STALE_AFTER_SECS`  | `600`   |
    /// | `DIAGRAM_RUN_INTERVAL_SECS` | `60`    |
    ///
    /// Panics on unparseable values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let batch_size: u32 = std::env::var("DIAGRAM_BATCH_SIZE")
            .unwrap_or_else(|_| defaults.batch_size.to_string())
            .parse()
            .expect("DIAGRAM_BATCH_SIZE must be a valid u32");

        let min_interval_ms: u64 = std::env::var("DIAGRAM_MIN_INTERVAL_MS")
            .unwrap_or_else(|_| defaults.min_interval.as_millis().to_string())
            .parse()
            .expect("DIAGRAM_MIN_INTERVAL_MS must be a valid u64");

        let stale_after_secs: u64 = std::env::var("DIAGRAM_STALE_AFTER_SECS")
            .unwrap_or_else(|_| defaults.stale_after.as_secs().to_string())
            .parse()
            .expect("DIAGRAM_STALE_AFTER_SECS must be a valid u64");

        let run_interval_secs: u64 = std::env::var("DIAGRAM_RUN_INTERVAL_SECS")
            .unwrap_or_else(|_| defaults.run_interval.as_secs().to_string())
            .parse()
            .expect("DIAGRAM_RUN_INTERVAL_SECS must be a valid u64");

        Self {
            batch_size: batch_size.max(1),
            min_interval: Duration::from_millis(min_interval_ms),
            stale_after: Duration::from_secs(stale_after_secs),
            run_interval: Duration::from_secs(run_interval_secs.max(1)),
        }
    }
}
