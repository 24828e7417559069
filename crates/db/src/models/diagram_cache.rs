//! Diagram cache models (`diagram_cache` table).

use ohm_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `diagram_cache` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DiagramCacheEntry {
    pub circuit_hash: String,
    pub diagram_url: String,
    pub hit_count: i64,
    pub created_at: Timestamp,
    pub last_hit_at: Option<Timestamp>,
}
