//! Repository for the `diagram_queue` table.
//!
//! Status literals come from [`DiagramStatus`]; nothing here hard-codes the
//! strings. Every transition out of `processing` is guarded on the current
//! status so a job is finished at most once. Enqueue and claim also move the
//! owning artifact's `diagram_status` inside the same transaction.

use ohm_core::queue::DiagramStatus;
use ohm_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::diagram_job::{DiagramJob, NewDiagramJob, StatusCounts};

/// Column list for `diagram_queue` queries.
const COLUMNS: &str = "\
    id, circuit_json, circuit_hash, artifact_id, chat_id, status, \
    error_message, diagram_url, from_cache, \
    created_at, claimed_at, processed_at";

/// Provides queue operations for diagram render jobs.
pub struct DiagramJobRepo;

impl DiagramJobRepo {
    /// Insert a new `queued` job and mark its artifact `queued`.
    ///
    /// The artifact is written first and both rows commit together, so a
    /// processor can never finish the job before the artifact shows it queued.
    pub async fn enqueue(pool: &PgPool, input: &NewDiagramJob) -> Result<DiagramJob, sqlx::Error> {
        let mut tx = pool.begin().await?;

        mark_artifact(&mut *tx, input.artifact_id, DiagramStatus::Queued).await?;

        let query = format!(
            "INSERT INTO diagram_queue (circuit_json, circuit_hash, artifact_id, chat_id, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let job = sqlx::query_as::<_, DiagramJob>(&query)
            .bind(&input.circuit_json)
            .bind(&input.circuit_hash)
            .bind(input.artifact_id)
            .bind(input.chat_id)
            .bind(DiagramStatus::Queued.as_str())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(job)
    }

    /// Atomically claim the oldest `queued` job and move it to `processing`.
    ///
    /// Uses `SELECT FOR UPDATE SKIP LOCKED` so overlapping processor runs
    /// never claim the same row. The artifact is marked `processing` in the
    /// same transaction; if that write fails the claim is rolled back.
    pub async fn claim_next(pool: &PgPool) -> Result<Option<DiagramJob>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE diagram_queue \
             SET status = $1, claimed_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM diagram_queue \
                 WHERE status = $2 \
                 ORDER BY created_at ASC, id ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        let job = sqlx::query_as::<_, DiagramJob>(&query)
            .bind(DiagramStatus::Processing.as_str())
            .bind(DiagramStatus::Queued.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(job) = &job {
            mark_artifact(&mut *tx, job.artifact_id, DiagramStatus::Processing).await?;
        }

        tx.commit().await?;
        Ok(job)
    }

    /// Mark a `processing` job complete with its diagram URL.
    ///
    /// Returns `false` if the job was not in `processing` (already finished
    /// or requeued by another run).
    pub async fn complete(
        pool: &PgPool,
        job_id: DbId,
        diagram_url: &str,
        from_cache: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE diagram_queue \
             SET status = $2, diagram_url = $3, from_cache = $4, \
                 error_message = NULL, processed_at = NOW() \
             WHERE id = $1 AND status = $5",
        )
        .bind(job_id)
        .bind(DiagramStatus::Complete.as_str())
        .bind(diagram_url)
        .bind(from_cache)
        .bind(DiagramStatus::Processing.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a `processing` job failed. No retry is scheduled.
    pub async fn fail(pool: &PgPool, job_id: DbId, error: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE diagram_queue \
             SET status = $2, error_message = $3, processed_at = NOW() \
             WHERE id = $1 AND status = $4",
        )
        .bind(job_id)
        .bind(DiagramStatus::Failed.as_str())
        .bind(error)
        .bind(DiagramStatus::Processing.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Return `processing` jobs claimed before `claimed_before` to `queued`.
    ///
    /// Recovers jobs whose run died mid-batch. Returns the number requeued.
    pub async fn requeue_stale(pool: &PgPool, claimed_before: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE diagram_queue \
             SET status = $1, claimed_at = NULL \
             WHERE status = $2 AND claimed_at < $3",
        )
        .bind(DiagramStatus::Queued.as_str())
        .bind(DiagramStatus::Processing.as_str())
        .bind(claimed_before)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Find a job by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DiagramJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM diagram_queue WHERE id = $1");
        sqlx::query_as::<_, DiagramJob>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Most recently submitted job for an artifact.
    pub async fn latest_for_artifact(
        pool: &PgPool,
        artifact_id: DbId,
    ) -> Result<Option<DiagramJob>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM diagram_queue \
             WHERE artifact_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, DiagramJob>(&query)
            .bind(artifact_id)
            .fetch_optional(pool)
            .await
    }

    /// Count jobs in each status.
    pub async fn status_counts(pool: &PgPool) -> Result<StatusCounts, sqlx::Error> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM diagram_queue GROUP BY status",
        )
        .fetch_all(pool)
        .await?;
        Ok(StatusCounts::from_rows(&rows))
    }

    /// 1-based FIFO position of a queued job: the number of queued jobs
    /// created at or before it. Returns 0 if the job is not queued.
    pub async fn queue_position(pool: &PgPool, job_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM diagram_queue q, diagram_queue target \
             WHERE target.id = $1 AND target.status = $2 AND q.status = $2 \
               AND (q.created_at, q.id) <= (target.created_at, target.id)",
        )
        .bind(job_id)
        .bind(DiagramStatus::Queued.as_str())
        .fetch_one(pool)
        .await
    }
}

/// Set an artifact's non-terminal `diagram_status`, clearing any earlier error.
async fn mark_artifact(
    conn: &mut PgConnection,
    artifact_id: DbId,
    status: DiagramStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE artifact_versions \
         SET diagram_status = $2, error_message = NULL, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(artifact_id)
    .bind(status.as_str())
    .execute(conn)
    .await?;
    Ok(())
}
