//! End-to-end processor runs against PostgreSQL.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use chrono::Utc;
use ohm_core::circuit::CircuitJson;
use ohm_core::hashing::circuit_hash;
use ohm_core::queue::DiagramStatus;
use ohm_core::types::DbId;
use ohm_db::models::artifact_version::CreateArtifactVersion;
use ohm_db::models::diagram_job::NewDiagramJob;
use ohm_db::repositories::{ArtifactVersionRepo, DiagramCacheRepo, DiagramJobRepo};
use ohm_worker::{PgDiagramStore, ProcessError, ProcessorConfig, QueueProcessor};
use serde_json::Value;
use sqlx::PgPool;

use common::{circuit, titled_circuit, ScriptedGenerator, FAILING_TITLE};

fn pg_processor(pool: &PgPool, generator: &Arc<ScriptedGenerator>) -> QueueProcessor {
    QueueProcessor::new(
        Arc::new(PgDiagramStore::new(pool.clone())),
        generator.clone(),
        ProcessorConfig {
            min_interval: Duration::ZERO,
            ..ProcessorConfig::default()
        },
    )
}

/// Create an artifact and queue a job for `value`. Returns `(artifact_id, job_id)`.
async fn enqueue(pool: &PgPool, value: Value) -> (DbId, DbId) {
    let artifact = ArtifactVersionRepo::create(
        pool,
        &CreateArtifactVersion {
            chat_id: uuid::Uuid::new_v4(),
            version: None,
        },
    )
    .await
    .unwrap();
    let hash = circuit_hash(&CircuitJson::parse(&value).unwrap());
    let job = DiagramJobRepo::enqueue(
        pool,
        &NewDiagramJob {
            circuit_json: value,
            circuit_hash: hash,
            artifact_id: artifact.id,
            chat_id: artifact.chat_id,
        },
    )
    .await
    .unwrap();
    (artifact.id, job.id)
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn run_completes_job_and_updates_artifact(pool: PgPool) {
    let generator = Arc::new(ScriptedGenerator::default());
    let (artifact_id, job_id) = enqueue(&pool, circuit("D13")).await;

    let summary = pg_processor(&pool, &generator).run_once().await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.total, 1);

    let job = DiagramJobRepo::find_by_id(&pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.status().unwrap(), DiagramStatus::Complete);
    assert_eq!(job.diagram_url.as_deref(), Some("https://img.test/1.png"));
    assert!(job.processed_at.is_some());

    let artifact = ArtifactVersionRepo::find_by_id(&pool, artifact_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(artifact.fritzing_url.as_deref(), Some("https://img.test/1.png"));
    assert_eq!(artifact.diagram_status.as_deref(), Some("complete"));

    let cached = DiagramCacheRepo::find(&pool, &job.circuit_hash)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cached.diagram_url, "https://img.test/1.png");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn repeated_circuit_hits_cache(pool: PgPool) {
    let generator = Arc::new(ScriptedGenerator::default());
    let (_, first) = enqueue(&pool, circuit("A1")).await;
    let (second_artifact, second) = enqueue(&pool, circuit("A1")).await;

    let summary = pg_processor(&pool, &generator).run_once().await.unwrap();

    assert_eq!(generator.calls(), 1);
    assert_eq!(summary.cached, 1);
    let first = DiagramJobRepo::find_by_id(&pool, first).await.unwrap().unwrap();
    let second = DiagramJobRepo::find_by_id(&pool, second).await.unwrap().unwrap();
    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(first.diagram_url, second.diagram_url);

    let artifact = ArtifactVersionRepo::find_by_id(&pool, second_artifact)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(artifact.fritzing_url, second.diagram_url);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failure_is_recorded_on_job_and_artifact(pool: PgPool) {
    let generator = Arc::new(ScriptedGenerator::default());
    let (artifact_id, job_id) = enqueue(&pool, titled_circuit(FAILING_TITLE, "D2")).await;
    let (_, healthy) = enqueue(&pool, circuit("D3")).await;

    let summary = pg_processor(&pool, &generator).run_once().await.unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.processed, 1);

    let job = DiagramJobRepo::find_by_id(&pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.status().unwrap(), DiagramStatus::Failed);
    assert!(job.error_message.unwrap().contains("model crashed"));

    let artifact = ArtifactVersionRepo::find_by_id(&pool, artifact_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(artifact.diagram_status.as_deref(), Some("failed"));
    assert!(artifact.fritzing_url.is_none());

    let healthy = DiagramJobRepo::find_by_id(&pool, healthy).await.unwrap().unwrap();
    assert_eq!(healthy.status().unwrap(), DiagramStatus::Complete);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn abandoned_claim_is_retried(pool: PgPool) {
    let generator = Arc::new(ScriptedGenerator::default());
    let (_, job_id) = enqueue(&pool, circuit("D4")).await;

    // Simulate a run that claimed the job and died long ago.
    DiagramJobRepo::claim_next(&pool).await.unwrap().unwrap();
    sqlx::query("UPDATE diagram_queue SET claimed_at = $2 WHERE id = $1")
        .bind(job_id)
        .bind(Utc::now() - chrono::Duration::hours(1))
        .execute(&pool)
        .await
        .unwrap();

    let summary = pg_processor(&pool, &generator).run_once().await.unwrap();
    assert_eq!(summary.processed, 1);

    let job = DiagramJobRepo::find_by_id(&pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.status().unwrap(), DiagramStatus::Complete);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn fresh_claim_is_left_alone(pool: PgPool) {
    let generator = Arc::new(ScriptedGenerator::default());
    let (_, job_id) = enqueue(&pool, circuit("D5")).await;
    DiagramJobRepo::claim_next(&pool).await.unwrap().unwrap();

    let summary = pg_processor(&pool, &generator).run_once().await.unwrap();
    assert_eq!(summary.total, 0);

    let job = DiagramJobRepo::find_by_id(&pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.status().unwrap(), DiagramStatus::Processing);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn claim_is_undone_when_artifact_cannot_be_marked(pool: PgPool) {
    let generator = Arc::new(ScriptedGenerator::default());
    let (artifact_id, job_id) = enqueue(&pool, circuit("D6")).await;
    sqlx::query(
        "ALTER TABLE artifact_versions \
         ADD CONSTRAINT ck_no_processing CHECK (diagram_status IS DISTINCT FROM 'processing')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let result = pg_processor(&pool, &generator).run_once().await;
    assert_matches!(result, Err(ProcessError::Store(_)));
    assert_eq!(generator.calls(), 0);

    let job = DiagramJobRepo::find_by_id(&pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.status().unwrap(), DiagramStatus::Queued);
    assert!(job.claimed_at.is_none());

    let artifact = ArtifactVersionRepo::find_by_id(&pool, artifact_id).await.unwrap().unwrap();
    assert_eq!(artifact.diagram_status.as_deref(), Some("queued"));
}
