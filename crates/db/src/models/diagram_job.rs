//! Diagram queue models (`diagram_queue` table).

use ohm_core::error::CoreError;
use ohm_core::queue::DiagramStatus;
use ohm_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `diagram_queue` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DiagramJob {
    pub id: DbId,
    pub circuit_json: serde_json::Value,
    pub circuit_hash: String,
    pub artifact_id: DbId,
    pub chat_id: uuid::Uuid,
    pub status: String,
    pub error_message: Option<String>,
    pub diagram_url: Option<String>,
    pub from_cache: bool,
    pub created_at: Timestamp,
    pub claimed_at: Option<Timestamp>,
    pub processed_at: Option<Timestamp>,
}

impl DiagramJob {
    /// Typed view of the `status` column.
    pub fn status(&self) -> Result<DiagramStatus, CoreError> {
        self.status.parse()
    }
}

/// DTO for inserting a job. The circuit must already be validated and hashed.
#[derive(Debug)]
pub struct NewDiagramJob {
    pub circuit_json: serde_json::Value,
    pub circuit_hash: String,
    pub artifact_id: DbId,
    pub chat_id: uuid::Uuid,
}

/// Number of jobs in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub queued: i64,
    pub processing: i64,
    pub complete: i64,
    pub failed: i64,
}

impl StatusCounts {
    /// Build from `(status, count)` rows; unknown statuses are ignored.
    pub fn from_rows(rows: &[(String, i64)]) -> Self {
        let mut counts = Self::default();
        for (status, count) in rows {
            match status.parse::<DiagramStatus>() {
                Ok(DiagramStatus::Queued) => counts.queued = *count,
                Ok(DiagramStatus::Processing) => counts.processing = *count,
                Ok(DiagramStatus::Complete) => counts.complete = *count,
                Ok(DiagramStatus::Failed) => counts.failed = *count,
                Err(_) => {}
            }
        }
        counts
    }
}
