//! Repository for the `artifact_versions` table.
//!
//! Only the diagram columns are written by the pipeline; versions themselves
//! are created when a design is saved.

use ohm_core::queue::DiagramStatus;
use ohm_core::types::DbId;
use sqlx::PgPool;

use crate::models::artifact_version::{ArtifactVersion, CreateArtifactVersion};

/// Column list for `artifact_versions` queries.
const COLUMNS: &str = "\
    id, chat_id, version, fritzing_url, diagram_status, error_message, \
    created_at, updated_at";

/// Provides access to design artifact versions.
pub struct ArtifactVersionRepo;

impl ArtifactVersionRepo {
    /// Insert a new artifact version. `version` defaults to 1.
    pub async fn create(
        pool: &PgPool,
        input: &CreateArtifactVersion,
    ) -> Result<ArtifactVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO artifact_versions (chat_id, version) \
             VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ArtifactVersion>(&query)
            .bind(input.chat_id)
            .bind(input.version.unwrap_or(1))
            .fetch_one(pool)
            .await
    }

    /// Find an artifact version by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ArtifactVersion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM artifact_versions WHERE id = $1");
        sqlx::query_as::<_, ArtifactVersion>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Record a finished diagram.
    pub async fn record_diagram(pool: &PgPool, id: DbId, diagram_url: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE artifact_versions \
             SET fritzing_url = $2, diagram_status = $3, error_message = NULL, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(diagram_url)
        .bind(DiagramStatus::Complete.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a failed render. Any earlier `fritzing_url` is left in place.
    pub async fn record_failure(pool: &PgPool, id: DbId, error: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE artifact_versions \
             SET diagram_status = $2, error_message = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(DiagramStatus::Failed.as_str())
        .bind(error)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
