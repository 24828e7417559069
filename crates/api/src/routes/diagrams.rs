//! Route definitions for diagram submission and polling.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::diagrams;
use crate::state::AppState;

/// Routes mounted at `/diagrams`.
///
/// ```text
/// POST /            -> enqueue_diagram
/// GET  /status      -> get_status
/// GET  /jobs/{id}   -> get_job
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(diagrams::enqueue_diagram))
        .route("/status", get(diagrams::get_status))
        .route("/jobs/{id}", get(diagrams::get_job))
}
