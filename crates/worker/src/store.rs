//! Persistence seam for the queue processor.

use async_trait::async_trait;
use ohm_core::types::{DbId, Timestamp};
use ohm_db::models::diagram_job::DiagramJob;
use ohm_db::repositories::{ArtifactVersionRepo, DiagramCacheRepo, DiagramJobRepo};
use sqlx::PgPool;

/// The fields of a claimed job the processor needs.
#[derive(Debug, Clone)]
pub struct ClaimedJob {
    pub id: DbId,
    pub artifact_id: DbId,
    pub circuit_json: serde_json::Value,
    pub circuit_hash: String,
}

impl From<DiagramJob> for ClaimedJob {
    fn from(job: DiagramJob) -> Self {
        Self {
            id: job.id,
            artifact_id: job.artifact_id,
            circuit_json: job.circuit_json,
            circuit_hash: job.circuit_hash,
        }
    }
}

/// Errors from a [`DiagramStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Queue, cache, and artifact writes used by the processor.
#[async_trait]
pub trait DiagramStore: Send + Sync {
    /// Return abandoned `processing` jobs to `queued`.
    async fn requeue_stale(&self, claimed_before: Timestamp) -> Result<u64, StoreError>;

    /// Atomically move the oldest queued job, and its artifact, to
    /// `processing`.
    async fn claim_next(&self) -> Result<Option<ClaimedJob>, StoreError>;

    async fn cached_url(&self, circuit_hash: &str) -> Result<Option<String>, StoreError>;

    /// Store a rendered URL; returns the URL the cache now holds.
    async fn cache_url(&self, circuit_hash: &str, diagram_url: &str) -> Result<String, StoreError>;

    async fn complete(
        &self,
        job: &ClaimedJob,
        diagram_url: &str,
        from_cache: bool,
    ) -> Result<(), StoreError>;

    async fn fail(&self, job: &ClaimedJob, error: &str) -> Result<(), StoreError>;
}

/// PostgreSQL-backed store. Keeps `artifact_versions` in step with the
/// queue row on every transition.
#[derive(Clone)]
pub struct PgDiagramStore {
    pool: PgPool,
}

impl PgDiagramStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DiagramStore for PgDiagramStore {
    async fn requeue_stale(&self, claimed_before: Timestamp) -> Result<u64, StoreError> {
        Ok(DiagramJobRepo::requeue_stale(&self.pool, claimed_before).await?)
    }

    async fn claim_next(&self) -> Result<Option<ClaimedJob>, StoreError> {
        let job = DiagramJobRepo::claim_next(&self.pool).await?;
        Ok(job.map(ClaimedJob::from))
    }

    async fn cached_url(&self, circuit_hash: &str) -> Result<Option<String>, StoreError> {
        Ok(DiagramCacheRepo::get(&self.pool, circuit_hash).await?)
    }

    async fn cache_url(&self, circuit_hash: &str, diagram_url: &str) -> Result<String, StoreError> {
        Ok(DiagramCacheRepo::put(&self.pool, circuit_hash, diagram_url).await?)
    }

    async fn complete(
        &self,
        job: &ClaimedJob,
        diagram_url: &str,
        from_cache: bool,
    ) -> Result<(), StoreError> {
        let updated = DiagramJobRepo::complete(&self.pool, job.id, diagram_url, from_cache).await?;
        if !updated {
            tracing::warn!(job_id = job.id, "Job left processing before completion was recorded");
            return Ok(());
        }
        ArtifactVersionRepo::record_diagram(&self.pool, job.artifact_id, diagram_url).await?;
        Ok(())
    }

    async fn fail(&self, job: &ClaimedJob, error: &str) -> Result<(), StoreError> {
        let updated = DiagramJobRepo::fail(&self.pool, job.id, error).await?;
        if !updated {
            tracing::warn!(job_id = job.id, "Job left processing before failure was recorded");
            return Ok(());
        }
        ArtifactVersionRepo::record_failure(&self.pool, job.artifact_id, error).await?;
        Ok(())
    }
}
