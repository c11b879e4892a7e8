use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::models::job::JobKind;
use crate::models::user::{Identity, Role};
use crate::state::AppState;

fn require_admin(identity: &Identity) -> Result<(), AppError> {
    if identity.role != Role::Admin {
        return Err(AppError::Forbidden(
            "Only admins may trigger cleanup jobs".into(),
        ));
    }
    Ok(())
}

/// Enqueue the destructive full reset.
pub async fn trigger_cleanup(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_admin(&identity)?;
    let job_id = state.jobs.enqueue_now(JobKind::PurgeAll).await;
    tracing::info!(job_id = %job_id, by = %identity.username, "Cleanup job enqueued");

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "data": { "job_id": job_id, "message": "Cleanup job has been enqueued" },
            "error": null
        })),
    ))
}

/// Enqueue an expired-files-only pass.
pub async fn trigger_expiry_cleanup(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_admin(&identity)?;
    let job_id = state.jobs.enqueue_now(JobKind::PurgeExpired).await;
    tracing::info!(job_id = %job_id, by = %identity.username, "Expiry cleanup job enqueued");

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "data": { "job_id": job_id, "message": "Expiry cleanup job has been enqueued" },
            "error": null
        })),
    ))
}
