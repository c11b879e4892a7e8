use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::services::quota;
use crate::state::AppState;

pub async fn health() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let file_count = state.files.len().await;
    let metrics = state.metrics.snapshot();
    let space = quota::disk_usage(
        &state.config.uploads_dir(),
        state.config.max_disk_space_bytes(),
    );
    let uptime = chrono::Utc::now()
        .signed_duration_since(state.start_time)
        .num_seconds();

    Json(json!({
        "data": {
            "file_count": file_count,
            "used_bytes": space.used,
            "space_status": space.status(
                state.config.warning_threshold_percent,
                state.config.critical_threshold_percent,
            ),
            "uploads": metrics.upload_count,
            "downloads": metrics.download_count,
            "deletes": metrics.delete_count,
            "pending_jobs": state.jobs.len(),
            "uptime_seconds": uptime,
            "version": env!("CARGO_PKG_VERSION"),
        },
        "error": null
    }))
}
