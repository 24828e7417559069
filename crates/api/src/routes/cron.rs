use axum::routing::get;
use axum::Router;

use crate::handlers::cron;
use crate::state::AppState;

/// Routes mounted at `/api/v1/cron`. Schedulers differ in which verb they send, so
/// both are accepted.
///
/// ```text
/// GET|POST /process-diagrams -> process_diagrams
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/process-diagrams",
        get(cron::process_diagrams).post(cron::process_diagrams),
    )
}
