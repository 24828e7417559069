use std::sync::Arc;

use ohm_worker::QueueProcessor;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind an `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: ohm_db::DbPool,
    /// Server configuration (cron secret, timeouts).
    pub config: Arc<ServerConfig>,
    /// Queue processor shared by the cron endpoint and the optional
    /// in-process scheduler.
    pub processor: Arc<QueueProcessor>,
}
