//! Artifact version models (`artifact_versions` table).

use ohm_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `artifact_versions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ArtifactVersion {
    pub id: DbId,
    pub chat_id: uuid::Uuid,
    pub version: i32,
    /// Rendered wiring diagram, set once the queue job completes.
    pub fritzing_url: Option<String>,
    pub diagram_status: Option<String>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new artifact version.
#[derive(Debug, Deserialize)]
pub struct CreateArtifactVersion {
    pub chat_id: uuid::Uuid,
    pub version: Option<i32>,
}
