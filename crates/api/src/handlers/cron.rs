//! Cron-triggered queue processing.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use ohm_worker::ProcessSummary;

use crate::error::{AppError, AppResult};
use crate::middleware::cron_auth::CronAuth;
use crate::state::AppState;

/// GET|POST /api/v1/cron/process-diagrams
///
/// Run one processor pass and return `{processed, cached, failed, total,
/// duration}`. Requires the cron bearer secret.
///
/// The run executes on its own task, so a caller that disconnects mid-run
/// does not cancel it; the claimed batch is always finished.
pub async fn process_diagrams(
    _cron: CronAuth,
    State(state): State<AppState>,
) -> AppResult<Json<ProcessSummary>> {
    tracing::info!("Cron-triggered diagram queue run");
    let processor = Arc::clone(&state.processor);
    let summary = tokio::spawn(async move { processor.run_once().await })
        .await
        .map_err(|e| AppError::InternalError(format!("Queue run task failed: {e}")))??;
    Ok(Json(summary))
}
