pub mod cron;
pub mod diagrams;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the client-facing `/api/v1` route tree.
///
/// ```text
/// /diagrams                                        enqueue (POST)
/// /diagrams/status                                 artifact or queue status
/// /diagrams/jobs/{id}                              single job
/// ```
///
/// `/api/v1/cron` is mounted separately by the app router (see
/// [`cron::router`]) because it runs without the request timeout.
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/diagrams", diagrams::router())
}
