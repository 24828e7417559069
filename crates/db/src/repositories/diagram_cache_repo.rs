//! Repository for the `diagram_cache` table.

use sqlx::PgPool;

use crate::models::diagram_cache::DiagramCacheEntry;

/// Column list for `diagram_cache` queries.
const COLUMNS: &str = "circuit_hash, diagram_url, hit_count, created_at, last_hit_at";

/// Lookup and insert for rendered diagrams keyed by circuit hash.
pub struct DiagramCacheRepo;

impl DiagramCacheRepo {
    /// Return the cached URL for `circuit_hash`, recording the hit.
    pub async fn get(pool: &PgPool, circuit_hash: &str) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "UPDATE diagram_cache \
             SET hit_count = hit_count + 1, last_hit_at = NOW() \
             WHERE circuit_hash = $1 \
             RETURNING diagram_url",
        )
        .bind(circuit_hash)
        .fetch_optional(pool)
        .await
    }

    /// Store a rendered URL. The first URL written for a hash wins; the
    /// returned value is whatever the cache now holds.
    pub async fn put(pool: &PgPool, circuit_hash: &str, diagram_url: &str) -> Result<String, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "INSERT INTO diagram_cache (circuit_hash, diagram_url) \
             VALUES ($1, $2) \
             ON CONFLICT (circuit_hash) \
             DO UPDATE SET diagram_url = diagram_cache.diagram_url \
             RETURNING diagram_url",
        )
        .bind(circuit_hash)
        .bind(diagram_url)
        .fetch_one(pool)
        .await
    }

    /// Read an entry without touching its hit counters.
    pub async fn find(
        pool: &PgPool,
        circuit_hash: &str,
    ) -> Result<Option<DiagramCacheEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM diagram_cache WHERE circuit_hash = $1");
        sqlx::query_as::<_, DiagramCacheEntry>(&query)
            .bind(circuit_hash)
            .fetch_optional(pool)
            .await
    }
}
