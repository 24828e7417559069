//! Shared-secret authentication for cron-triggered endpoints.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use ohm_core::error::CoreError;
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::state::AppState;

/// Proof that the request carried `Authorization: Bearer <CRON_SECRET>`.
///
/// Rejects with 401 when the header is missing or wrong, and when no secret
/// is configured at all. Rejection happens before the handler body runs, so
/// an unauthorized call never touches the queue.
///
/// ```ignore
/// async fn process(_cron: CronAuth, State(state): State<AppState>) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CronAuth;

impl FromRequestParts<AppState> for CronAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(secret) = state.config.cron_secret.as_deref() else {
            tracing::warn!("Cron request rejected: CRON_SECRET is not configured");
            return Err(unauthorized("Cron endpoint is not configured"));
        };

        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            unauthorized("Invalid Authorization format. Expected: Bearer <token>")
        })?;

        // Compare digests so the comparison time does not depend on how much
        // of the secret matched.
        if Sha256::digest(token.trim().as_bytes()) != Sha256::digest(secret.as_bytes()) {
            tracing::warn!("Cron request rejected: invalid secret");
            return Err(unauthorized("Invalid cron secret"));
        }

        Ok(CronAuth)
    }
}

fn unauthorized(message: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(message.to_string()))
}
