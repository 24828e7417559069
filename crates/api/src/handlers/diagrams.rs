//! Handlers for diagram submission and status polling.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use ohm_core::circuit::{CircuitJson, CIRCUIT_FIELD};
use ohm_core::error::{CoreError, FieldError};
use ohm_core::hashing::circuit_hash;
use ohm_core::queue::{estimate_wait_secs, DiagramStatus};
use ohm_core::types::{DbId, Timestamp};
use ohm_db::models::diagram_job::{DiagramJob, NewDiagramJob};
use ohm_db::repositories::{ArtifactVersionRepo, DiagramJobRepo};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Response for POST /diagrams.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueResponse {
    pub job_id: DbId,
    pub status: DiagramStatus,
    /// Seconds until the job is expected to be processed.
    pub estimated_time: u64,
}

/// Public view of a queue row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramJobView {
    pub job_id: DbId,
    pub artifact_id: DbId,
    pub status: String,
    pub diagram_url: Option<String>,
    pub error_message: Option<String>,
    pub from_cache: bool,
    pub created_at: Timestamp,
    pub processed_at: Option<Timestamp>,
}

impl From<DiagramJob> for DiagramJobView {
    fn from(job: DiagramJob) -> Self {
        Self {
            job_id: job.id,
            artifact_id: job.artifact_id,
            status: job.status,
            diagram_url: job.diagram_url,
            error_message: job.error_message,
            from_cache: job.from_cache,
            created_at: job.created_at,
            processed_at: job.processed_at,
        }
    }
}

/// Response for GET /diagrams/status without an artifact.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatusResponse {
    pub queued: i64,
    pub processing: i64,
    pub complete: i64,
    pub failed: i64,
    /// Seconds a job submitted now would wait.
    pub estimated_wait: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub artifact_id: Option<DbId>,
}

/// A validated enqueue request.
#[derive(Debug)]
struct EnqueueInput {
    circuit: CircuitJson,
    artifact_id: DbId,
    chat_id: uuid::Uuid,
}

impl EnqueueInput {
    /// Validate the raw body, reporting every bad field at once.
    fn from_body(body: &Value) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();

        if !body.is_object() {
            return Err(vec![FieldError::new("body", "must be a JSON object")]);
        }

        let artifact_id = match &body["artifactId"] {
            Value::Null => {
                errors.push(FieldError::new("artifactId", "is required"));
                None
            }
            Value::Number(n) => match n.as_i64().filter(|id| *id > 0) {
                Some(id) => Some(id),
                None => {
                    errors.push(FieldError::new("artifactId", "must be a positive integer"));
                    None
                }
            },
            Value::String(s) => match s.trim().parse::<DbId>() {
                Ok(id) if id > 0 => Some(id),
                _ => {
                    errors.push(FieldError::new("artifactId", "must be a positive integer"));
                    None
                }
            },
            _ => {
                errors.push(FieldError::new("artifactId", "must be a positive integer"));
                None
            }
        };

        let chat_id = match &body["chatId"] {
            Value::Null => {
                errors.push(FieldError::new("chatId", "is required"));
                None
            }
            Value::String(s) => match uuid::Uuid::parse_str(s.trim()) {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.push(FieldError::new("chatId", "must be a UUID"));
                    None
                }
            },
            _ => {
                errors.push(FieldError::new("chatId", "must be a UUID"));
                None
            }
        };

        let circuit = match CircuitJson::parse_checked(&body[CIRCUIT_FIELD]) {
            Ok(circuit) => Some(circuit),
            Err(circuit_errors) => {
                errors.extend(circuit_errors);
                None
            }
        };

        match (circuit, artifact_id, chat_id) {
            (Some(circuit), Some(artifact_id), Some(chat_id)) if errors.is_empty() => Ok(Self {
                circuit,
                artifact_id,
                chat_id,
            }),
            _ => Err(errors),
        }
    }
}

// ---------------------------------------------------------------------------
// Enqueue
// ---------------------------------------------------------------------------

/// POST /api/v1/diagrams
///
/// Validate a circuit and queue it for rendering. Returns 202 with the job
/// id and an estimate of how long until the processor reaches it.
pub async fn enqueue_diagram(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(body) = body.map_err(|rejection| {
        AppError::invalid_fields(vec![FieldError::new("body", rejection.body_text())])
    })?;
    let input = EnqueueInput::from_body(&body).map_err(AppError::invalid_fields)?;

    let artifact = ArtifactVersionRepo::find_by_id(&state.pool, input.artifact_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "ArtifactVersion",
            id: input.artifact_id,
        })?;
    if artifact.chat_id != input.chat_id {
        return Err(AppError::invalid_fields(vec![FieldError::new(
            "chatId",
            "does not match the artifact's chat",
        )]));
    }

    let hash = circuit_hash(&input.circuit);
    let circuit_json = serde_json::to_value(&input.circuit)
        .map_err(|e| AppError::InternalError(format!("Failed to encode circuit: {e}")))?;

    let job = DiagramJobRepo::enqueue(
        &state.pool,
        &NewDiagramJob {
            circuit_json,
            circuit_hash: hash,
            artifact_id: artifact.id,
            chat_id: artifact.chat_id,
        },
    )
    .await?;

    let position = DiagramJobRepo::queue_position(&state.pool, job.id).await?;
    let estimated_time = estimate_for_position(&state, position.max(1) as u64);

    tracing::info!(
        job_id = job.id,
        artifact_id = artifact.id,
        circuit_hash = %job.circuit_hash,
        position,
        "Diagram job queued",
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(EnqueueResponse {
            job_id: job.id,
            status: DiagramStatus::Queued,
            estimated_time,
        }),
    ))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// GET /api/v1/diagrams/status[?artifactId=N]
///
/// With `artifactId`, returns the latest job for that artifact. Without it,
/// returns queue depth per status and the wait a new job would see.
pub async fn get_status(
    State(state): State<AppState>,
    query: Result<Query<StatusQuery>, QueryRejection>,
) -> AppResult<axum::response::Response> {
    let Query(query) = query.map_err(|_| {
        AppError::invalid_fields(vec![FieldError::new(
            "artifactId",
            "must be a positive integer",
        )])
    })?;

    if let Some(artifact_id) = query.artifact_id {
        let job = DiagramJobRepo::latest_for_artifact(&state.pool, artifact_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "DiagramJob for artifact",
                id: artifact_id,
            })?;
        return Ok(Json(DiagramJobView::from(job)).into_response());
    }

    let counts = DiagramJobRepo::status_counts(&state.pool).await?;
    let estimated_wait = estimate_for_position(&state, counts.queued.max(0) as u64 + 1);

    Ok(Json(QueueStatusResponse {
        queued: counts.queued,
        processing: counts.processing,
        complete: counts.complete,
        failed: counts.failed,
        estimated_wait,
    })
    .into_response())
}

/// GET /api/v1/diagrams/jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DiagramJobView>> {
    let job = DiagramJobRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "DiagramJob",
            id,
        })?;
    Ok(Json(job.into()))
}

fn estimate_for_position(state: &AppState, position: u64) -> u64 {
    let config = state.processor.config();
    estimate_wait_secs(
        position,
        config.batch_size,
        config.min_interval,
        config.run_interval,
    )
}
